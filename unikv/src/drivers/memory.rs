// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory storage driver
//!
//! Ordered map behind a read/write lock. Expiry is native: each record keeps
//! its absolute expiry next to the value, so no value codec is involved.
//! Nothing is persisted; closing the provider drops the data.

use crate::config::{DriverConfig, OPT_SYNC_WRITES};
use crate::error::{KvError, KvResult};
use crate::scan::ScanOptions;
use crate::traits::{Driver, Provider};
use crate::types::{validate_key, Capabilities, Entry, ScanIsolation};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Name the in-memory driver registers under
pub const MEMORY_DRIVER: &str = "memory";

/// Factory for [`MemoryProvider`]
///
/// Needs no options; `path` is ignored and `sync_writes` is accepted but has
/// nothing to sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryDriver;

impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        MEMORY_DRIVER
    }

    fn open(&self, config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
        // Still reject a malformed value so configs stay portable between drivers
        config.bool_or(OPT_SYNC_WRITES, false)?;
        log::info!("Opened in-memory provider");
        Ok(Box::new(MemoryProvider::new()))
    }
}

#[derive(Debug, Clone)]
struct MemoryRecord {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now < at,
            None => true,
        }
    }
}

type MemoryTable = BTreeMap<Vec<u8>, MemoryRecord>;

/// In-memory provider with native per-key expiry
///
/// Scans copy the requested range under the read lock and run the scanner
/// afterwards, so they are snapshot-isolated and the scanner may write to the
/// same provider. The copy costs O(n) time and memory in the live records of
/// the range and is paid before the scanner sees anything: a scanner that
/// stops after the first record still pays for the whole range. Narrow large
/// scans with a prefix or offset.
pub struct MemoryProvider {
    table: RwLock<Option<MemoryTable>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Some(BTreeMap::new())),
        }
    }

    /// Number of stored records, including expired ones not yet overwritten
    pub fn entry_count(&self) -> KvResult<usize> {
        self.read(|table| Ok(table.len()))
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryTable) -> KvResult<T>) -> KvResult<T> {
        let guard = self.table.read();
        let table = guard.as_ref().ok_or_else(closed)?;
        f(table)
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryTable) -> KvResult<T>) -> KvResult<T> {
        let mut guard = self.table.write();
        let table = guard.as_mut().ok_or_else(closed)?;
        f(table)
    }

    fn live_record(&self, key: &[u8]) -> KvResult<MemoryRecord> {
        validate_key(key)?;
        let now = Utc::now();
        self.read(|table| {
            table
                .get(key)
                .filter(|record| record.is_live(now))
                .cloned()
                .ok_or(KvError::KeyNotFound)
        })
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn closed() -> KvError {
    KvError::ProviderClosed(MEMORY_DRIVER.to_string())
}

fn to_record(entry: Entry, now: DateTime<Utc>) -> KvResult<(Vec<u8>, Option<MemoryRecord>)> {
    entry.validate()?;
    let expires_at = entry.expires_at(now)?;
    let (key, value, _) = entry.into_parts();
    Ok((key, value.map(|value| MemoryRecord { value, expires_at })))
}

impl Provider for MemoryProvider {
    fn driver_name(&self) -> &str {
        MEMORY_DRIVER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            native_ttl: true,
            scan_isolation: ScanIsolation::Snapshot,
            maintenance: false,
        }
    }

    fn put(&self, entry: Entry) -> KvResult<()> {
        if entry.is_delete() {
            return self.delete(entry.key());
        }
        let (key, record) = to_record(entry, Utc::now())?;
        self.write(|table| {
            if let Some(record) = record {
                table.insert(key, record);
            }
            Ok(())
        })
    }

    fn batch(&self, entries: Vec<Entry>) -> KvResult<()> {
        // Validate everything before taking the lock; applying cannot fail
        let now = Utc::now();
        let staged = entries
            .into_iter()
            .map(|entry| to_record(entry, now))
            .collect::<KvResult<Vec<_>>>()?;

        self.write(|table| {
            for (key, record) in staged {
                match record {
                    Some(record) => {
                        table.insert(key, record);
                    }
                    None => {
                        table.remove(&key);
                    }
                }
            }
            Ok(())
        })
    }

    fn get(&self, key: &[u8]) -> KvResult<Vec<u8>> {
        self.live_record(key).map(|record| record.value)
    }

    fn ttl(&self, key: &[u8]) -> KvResult<Option<DateTime<Utc>>> {
        self.live_record(key).map(|record| record.expires_at)
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        validate_key(key)?;
        self.write(|table| {
            table.remove(key);
            Ok(())
        })
    }

    fn close(&self) -> KvResult<()> {
        if self.table.write().take().is_some() {
            log::info!("Closed in-memory provider");
        }
        Ok(())
    }

    fn scan(&self, options: ScanOptions<'_>) -> KvResult<()> {
        let plan = options.into_plan()?;
        let now = Utc::now();

        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self.read(|table| {
            if plan.bounds.is_empty() {
                return Ok(Vec::new());
            }
            let live = |(key, record): (&Vec<u8>, &MemoryRecord)| {
                record
                    .is_live(now)
                    .then(|| (key.clone(), record.value.clone()))
            };
            let range = table.range(plan.bounds.to_range());
            Ok(if plan.reverse {
                range.rev().filter_map(live).collect()
            } else {
                range.filter_map(live).collect()
            })
        })?;

        plan.cursor
            .run(snapshot.into_iter().map(Ok), |_, value| Ok(Some(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::ScanFlow;
    use std::time::Duration;

    #[test]
    fn test_put_get_delete() {
        let provider = MemoryProvider::new();
        provider.put(Entry::new("a", "1")).unwrap();
        assert_eq!(provider.get(b"a").unwrap(), b"1");

        provider.delete(b"a").unwrap();
        assert!(provider.get(b"a").unwrap_err().is_not_found());
        provider.delete(b"a").unwrap();
    }

    #[test]
    fn test_expired_record_stays_stored() {
        let provider = MemoryProvider::new();
        provider
            .put(Entry::new("gone", "x").with_ttl(Duration::from_millis(1)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(provider.get(b"gone").unwrap_err().is_not_found());
        assert!(provider.ttl(b"gone").unwrap_err().is_not_found());
        assert_eq!(provider.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_put_of_delete_entry_removes_key() {
        let provider = MemoryProvider::new();
        provider.put(Entry::new("k", "v")).unwrap();
        provider.put(Entry::delete("k")).unwrap();
        assert!(provider.get(b"k").is_err());
    }

    #[test]
    fn test_scanner_can_write_back() {
        let provider = MemoryProvider::new();
        provider
            .batch(vec![Entry::new("a", "1"), Entry::new("b", "2")])
            .unwrap();

        provider
            .scan(ScanOptions::new().scanner(|key, value| {
                let mut copy = b"copy:".to_vec();
                copy.extend_from_slice(&key);
                provider.put(Entry::new(copy, value))?;
                Ok(ScanFlow::Continue)
            }))
            .unwrap();

        assert_eq!(provider.get(b"copy:a").unwrap(), b"1");
        assert_eq!(provider.get(b"copy:b").unwrap(), b"2");
    }

    #[test]
    fn test_scan_runs_over_copied_range() {
        let provider = MemoryProvider::new();
        provider
            .batch(vec![Entry::new("a", "1"), Entry::new("b", "2")])
            .unwrap();

        // "b" is deleted after the copy is taken, so the scan still yields it
        let mut visited = Vec::new();
        provider
            .scan(ScanOptions::new().scanner(|key, _| {
                provider.delete(b"b")?;
                visited.push(key);
                Ok(match visited.len() {
                    2 => ScanFlow::Done,
                    _ => ScanFlow::Continue,
                })
            }))
            .unwrap();

        assert_eq!(visited, [b"a".to_vec(), b"b".to_vec()]);
        assert!(provider.get(b"b").unwrap_err().is_not_found());
    }

    #[test]
    fn test_closed_provider_fails() {
        let provider = MemoryProvider::new();
        provider.close().unwrap();
        provider.close().unwrap();

        let put = provider.put(Entry::new("k", "v"));
        assert!(matches!(put, Err(KvError::ProviderClosed(_))));
        let get = provider.get(b"k");
        assert!(matches!(get, Err(KvError::ProviderClosed(_))));
        let noop = ScanOptions::new().scanner(|_, _| Ok(ScanFlow::Continue));
        let scan = provider.scan(noop);
        assert!(matches!(scan, Err(KvError::ProviderClosed(_))));
    }

    #[test]
    fn test_open_rejects_malformed_sync_writes() {
        let config = DriverConfig::new().set(OPT_SYNC_WRITES, "always");
        let err = MemoryDriver.open(&config).err().unwrap();
        assert!(matches!(err, KvError::InvalidConfig(_)));
    }
}
