// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entry and capability types shared by every driver

use crate::error::{KvError, KvResult};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A single key-value write
///
/// An entry with no value is a deletion marker when passed to
/// [`Provider::batch`](crate::Provider::batch); it never means "store an
/// empty value". A zero TTL means the entry never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Vec<u8>,
    value: Option<Vec<u8>>,
    ttl: Duration,
}

impl Entry {
    /// Create an upsert entry with no expiry
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            ttl: Duration::ZERO,
        }
    }

    /// Create a deletion entry for use in a batch
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: None,
            ttl: Duration::ZERO,
        }
    }

    /// Attach a time-to-live; zero clears it
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether this entry removes its key
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }

    /// Absolute expiry of this entry if it were written at `now`
    pub fn expires_at(&self, now: DateTime<Utc>) -> KvResult<Option<DateTime<Utc>>> {
        if self.ttl.is_zero() {
            return Ok(None);
        }
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| KvError::InvalidTtl(format!("{:?}: {}", self.ttl, e)))?;
        now.checked_add_signed(ttl)
            .map(Some)
            .ok_or_else(|| KvError::InvalidTtl(format!("{:?} overflows the clock", self.ttl)))
    }

    /// Reject entries no driver can store
    pub fn validate(&self) -> KvResult<()> {
        validate_key(&self.key)
    }

    /// Split the entry into its owned parts
    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<u8>>, Duration) {
        (self.key, self.value, self.ttl)
    }
}

/// Keys must be non-empty
pub fn validate_key(key: &[u8]) -> KvResult<()> {
    if key.is_empty() {
        return Err(KvError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

/// Whether writes made while a scan is running can show up in that scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanIsolation {
    /// The scan sees the data as it was when the scan started
    Snapshot,

    /// Concurrent writes may or may not be observed by the running scan
    Live,
}

/// Native feature set of an opened provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Expiry is tracked by the engine itself rather than the value codec
    pub native_ttl: bool,
    /// Visibility of concurrent writes during a scan
    pub scan_isolation: ScanIsolation,
    /// A background maintenance task runs while the provider is open
    pub maintenance: bool,
}
