// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver and provider traits
//!
//! A [`Driver`] is a factory registered under a name. Opening it with a
//! [`DriverConfig`] yields a [`Provider`], one open instance bound to a
//! concrete storage engine. All providers expose the same eight operations
//! with the same semantics, whatever the engine supports natively.

use crate::config::DriverConfig;
use crate::error::KvResult;
use crate::scan::ScanOptions;
use crate::types::{Capabilities, Entry};
use chrono::{DateTime, Utc};

/// Factory for providers of one storage engine
pub trait Driver: Send + Sync {
    /// Name the driver is usually registered under
    fn name(&self) -> &str;

    /// Open a provider
    ///
    /// Fails with [`KvError::InvalidConfig`](crate::KvError::InvalidConfig)
    /// when a required option is missing or malformed, and with an I/O error
    /// when the storage location cannot be prepared.
    fn open(&self, config: &DriverConfig) -> KvResult<Box<dyn Provider>>;
}

/// One opened storage backend
///
/// Every method is safe to call from several threads at once. After
/// [`close`](Provider::close) every other method fails with
/// [`KvError::ProviderClosed`](crate::KvError::ProviderClosed).
pub trait Provider: Send + Sync {
    /// Name of the driver that opened this provider
    fn driver_name(&self) -> &str;

    /// Native feature set of the underlying engine
    fn capabilities(&self) -> Capabilities;

    /// Insert or replace one key
    fn put(&self, entry: Entry) -> KvResult<()>;

    /// Apply upserts and deletions as one atomic unit
    ///
    /// Entries without a value delete their key. Either every entry is
    /// applied or none is.
    fn batch(&self, entries: Vec<Entry>) -> KvResult<()>;

    /// Read a value
    ///
    /// Fails with [`KvError::KeyNotFound`](crate::KvError::KeyNotFound) when
    /// the key is absent or expired.
    fn get(&self, key: &[u8]) -> KvResult<Vec<u8>>;

    /// Absolute expiry of a key, `None` when it never expires
    ///
    /// Fails with [`KvError::KeyNotFound`](crate::KvError::KeyNotFound) under
    /// the same conditions as [`get`](Provider::get).
    fn ttl(&self, key: &[u8]) -> KvResult<Option<DateTime<Utc>>>;

    /// Remove a key; removing an absent key succeeds
    fn delete(&self, key: &[u8]) -> KvResult<()>;

    /// Stop background work and release the engine; safe to call twice
    fn close(&self) -> KvResult<()>;

    /// Visit keys in order, see [`ScanOptions`]
    fn scan(&self, options: ScanOptions<'_>) -> KvResult<()>;
}
