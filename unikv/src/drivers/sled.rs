// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled storage driver implementation
//!
//! Sled has no per-key expiry, so every value is stored wrapped by the
//! [value codec](crate::codec) and expiry is checked lazily on read.
//! Sled iterators are not snapshots: a running scan may or may not observe
//! writes made while it runs.

use crate::codec;
use crate::config::{
    DriverConfig, OPT_CACHE_CAPACITY, OPT_FLUSH_EVERY_MS, OPT_MAINTENANCE_INTERVAL_SECS, OPT_PATH,
    OPT_SYNC_WRITES,
};
use crate::error::{KvError, KvResult};
use crate::maintenance::MaintenanceTask;
use crate::scan::ScanOptions;
use crate::traits::{Driver, Provider};
use crate::types::{validate_key, Capabilities, Entry, ScanIsolation};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name the sled driver registers under
pub const SLED_DRIVER: &str = "sled";

const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024; // 64MB
const DEFAULT_FLUSH_EVERY_MS: u64 = 500;
const DEFAULT_MAINTENANCE_SECS: u64 = 5 * 60;

/// Options understood by the sled driver
#[derive(Debug, Clone, PartialEq)]
pub struct SledOptions {
    /// Database directory
    pub path: PathBuf,
    /// Flush to disk before acknowledging each write
    pub sync_writes: bool,
    /// Page cache size in bytes
    pub cache_capacity: u64,
    /// Sled's own background flush period, `None` disables it
    pub flush_every_ms: Option<u64>,
    /// Period of the durability checkpoint, `None` disables it
    pub maintenance_interval: Option<Duration>,
}

impl SledOptions {
    /// Options with defaults for everything but the path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_writes: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            flush_every_ms: Some(DEFAULT_FLUSH_EVERY_MS),
            maintenance_interval: Some(Duration::from_secs(DEFAULT_MAINTENANCE_SECS)),
        }
    }

    /// Read the sled options out of a driver configuration
    pub fn from_config(config: &DriverConfig) -> KvResult<Self> {
        let path = config.require_str(OPT_PATH)?;
        let flush_every_ms = match config.u64_or(OPT_FLUSH_EVERY_MS, DEFAULT_FLUSH_EVERY_MS)? {
            0 => None,
            ms => Some(ms),
        };
        let interval = config.u64_or(OPT_MAINTENANCE_INTERVAL_SECS, DEFAULT_MAINTENANCE_SECS)?;
        let maintenance_interval = match interval {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            path: PathBuf::from(path),
            sync_writes: config.bool_or(OPT_SYNC_WRITES, false)?,
            cache_capacity: config.u64_or(OPT_CACHE_CAPACITY, DEFAULT_CACHE_CAPACITY)?,
            flush_every_ms,
            maintenance_interval,
        })
    }
}

/// Factory for [`SledProvider`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SledDriver;

impl Driver for SledDriver {
    fn name(&self) -> &str {
        SLED_DRIVER
    }

    fn open(&self, config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
        let options = SledOptions::from_config(config)?;
        Ok(Box::new(SledProvider::open(options)?))
    }
}

/// Sled-backed provider with codec-emulated expiry
pub struct SledProvider {
    db: RwLock<Option<sled::Db>>,
    path: PathBuf,
    sync_writes: bool,
    maintenance: Option<MaintenanceTask>,
}

impl SledProvider {
    /// Open or create a sled database
    ///
    /// Creates the parent directory of `options.path` first. Starts the
    /// checkpoint task when a maintenance interval is configured.
    pub fn open(options: SledOptions) -> KvResult<Self> {
        if let Some(parent) = options.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = sled::Config::new()
            .path(&options.path)
            .cache_capacity(options.cache_capacity)
            .flush_every_ms(options.flush_every_ms)
            .open()?;

        let maintenance = match options.maintenance_interval {
            Some(interval) => {
                let db = db.clone();
                let job = move || checkpoint(&db).map(drop);
                Some(MaintenanceTask::spawn(SLED_DRIVER, interval, job)?)
            }
            None => None,
        };

        log::info!(
            "Opened sled provider at {} (sync_writes: {})",
            options.path.display(),
            options.sync_writes
        );

        Ok(Self {
            db: RwLock::new(Some(db)),
            path: options.path,
            sync_writes: options.sync_writes,
            maintenance,
        })
    }

    /// Database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes the engine currently occupies on disk
    pub fn size_on_disk(&self) -> KvResult<u64> {
        Ok(self.db()?.size_on_disk()?)
    }

    // The handle is cloned out so no lock is held while the engine works
    fn db(&self) -> KvResult<sled::Db> {
        self.db
            .read()
            .clone()
            .ok_or_else(|| KvError::ProviderClosed(SLED_DRIVER.to_string()))
    }

    fn after_write(&self, db: &sled::Db) -> KvResult<()> {
        if self.sync_writes {
            db.flush()?;
        }
        Ok(())
    }

    fn live_payload(&self, key: &[u8]) -> KvResult<codec::StoredPayload> {
        validate_key(key)?;
        let raw = self.db()?.get(key)?.ok_or(KvError::KeyNotFound)?;
        let payload = codec::decode(&raw)?;
        if payload.is_expired(Utc::now()) {
            return Err(KvError::KeyNotFound);
        }
        Ok(payload)
    }
}

/// Durability checkpoint run by the maintenance hook
///
/// Writes out whatever sled has buffered and returns the bytes flushed. With
/// `flush_every_ms` at 0 sled never flushes on its own, and this bounds how
/// much acknowledged data a crash can lose. With the flusher enabled it mostly
/// finds nothing to write and only reports the size on disk.
fn checkpoint(db: &sled::Db) -> KvResult<usize> {
    let flushed = db.flush()?;
    let size = db.size_on_disk()?;
    log::debug!("Checkpoint flushed {} bytes, {} on disk", flushed, size);
    Ok(flushed)
}

fn owned_key(item: sled::Result<(sled::IVec, sled::IVec)>) -> KvResult<(Vec<u8>, sled::IVec)> {
    let (key, raw) = item?;
    Ok((key.to_vec(), raw))
}

fn encode_entry(entry: &Entry, value: &[u8], now: DateTime<Utc>) -> KvResult<Vec<u8>> {
    Ok(codec::encode(value, entry.expires_at(now)?))
}

impl Provider for SledProvider {
    fn driver_name(&self) -> &str {
        SLED_DRIVER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_ttl: false,
            scan_isolation: ScanIsolation::Live,
            maintenance: self.maintenance.is_some(),
        }
    }

    fn put(&self, entry: Entry) -> KvResult<()> {
        entry.validate()?;
        let Some(value) = entry.value() else {
            return self.delete(entry.key());
        };
        let payload = encode_entry(&entry, value, Utc::now())?;

        let db = self.db()?;
        db.insert(entry.key(), payload)?;
        self.after_write(&db)
    }

    fn batch(&self, entries: Vec<Entry>) -> KvResult<()> {
        let now = Utc::now();
        let mut batch = sled::Batch::default();

        // Any error here drops the unapplied batch, leaving the tree untouched
        for entry in &entries {
            entry.validate()?;
            match entry.value() {
                Some(value) => batch.insert(entry.key(), encode_entry(entry, value, now)?),
                None => batch.remove(entry.key()),
            }
        }

        let db = self.db()?;
        db.apply_batch(batch)?;
        self.after_write(&db)
    }

    fn get(&self, key: &[u8]) -> KvResult<Vec<u8>> {
        self.live_payload(key).map(|payload| payload.value)
    }

    fn ttl(&self, key: &[u8]) -> KvResult<Option<DateTime<Utc>>> {
        self.live_payload(key).map(|payload| payload.expires_at)
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        validate_key(key)?;
        let db = self.db()?;
        db.remove(key)?;
        self.after_write(&db)
    }

    fn close(&self) -> KvResult<()> {
        if let Some(task) = &self.maintenance {
            task.stop();
        }

        let Some(db) = self.db.write().take() else {
            return Ok(());
        };
        db.flush()?;
        log::info!("Closed sled provider at {}", self.path.display());
        Ok(())
    }

    fn scan(&self, options: ScanOptions<'_>) -> KvResult<()> {
        let plan = options.into_plan()?;
        let db = self.db()?;
        if plan.bounds.is_empty() {
            return Ok(());
        }

        log::debug!(
            "Sled scan over {:?} (reverse: {})",
            plan.bounds,
            plan.reverse
        );

        let now = Utc::now();
        let records = db.range(plan.bounds.to_range()).map(owned_key);
        let resolve = |_: &[u8], raw: sled::IVec| -> KvResult<Option<Vec<u8>>> {
            let payload = codec::decode(&raw)?;
            Ok((!payload.is_expired(now)).then_some(payload.value))
        };

        if plan.reverse {
            plan.cursor.run(records.rev(), resolve)
        } else {
            plan.cursor.run(records, resolve)
        }
    }
}

impl Drop for SledProvider {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            let path = self.path.display();
            log::warn!("Failed to close sled provider at {}: {}", path, e);
        }
    }
}
