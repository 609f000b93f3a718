// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for drivers, providers and the scan engine
//!
//! Every operation in the crate returns [`KvResult`]. Lower-level engine
//! failures are passed through as [`KvError::StorageEngine`] so callers see a
//! single error type regardless of which backend they opened.

use thiserror::Error;

/// Errors surfaced by the registry, providers and scans
#[derive(Error, Debug)]
pub enum KvError {
    #[error("Driver '{0}' is already registered")]
    DriverAlreadyRegistered(String),

    #[error("Driver '{0}' not found")]
    DriverNotFound(String),

    #[error("A scanner callback is required")]
    ScannerRequired,

    /// The key is absent, or present but expired
    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    #[error("Provider '{0}' is closed")]
    ProviderClosed(String),

    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage engine error: {0}")]
    StorageEngine(String),

    /// Error returned by a scanner callback, handed back to the caller of scan
    #[error("Scanner error: {0}")]
    Scanner(Box<dyn std::error::Error + Send + Sync>),
}

impl KvError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a storage engine error
    pub fn engine<S: Into<String>>(msg: S) -> Self {
        Self::StorageEngine(msg.into())
    }

    /// Wrap an arbitrary callback error so it can be returned from a scanner
    pub fn scanner<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Scanner(err.into())
    }

    /// Whether this is the expected "absent or expired" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::KeyNotFound)
    }
}

#[cfg(feature = "sled-backend")]
impl From<sled::Error> for KvError {
    fn from(e: sled::Error) -> Self {
        match e {
            sled::Error::Io(io) => KvError::Io(io),
            other => KvError::StorageEngine(other.to_string()),
        }
    }
}

/// Result type for every unikv operation
pub type KvResult<T> = Result<T, KvError>;
