// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Test utilities for unikv integration tests
//!
//! `ProviderFixture` opens a provider through a private registry and keeps
//! any temporary directory alive for as long as the provider is in use, so
//! every contract test can run unchanged against each built-in driver.

#![allow(dead_code)]

use std::ops::Deref;
use tempfile::TempDir;
use unikv::{DriverConfig, Entry, Provider, Registry, ScanFlow, ScanOptions};

/// Install a test logger once; repeated calls are ignored
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An open provider plus whatever it needs to stay valid
pub struct ProviderFixture {
    pub driver: &'static str,
    pub provider: Box<dyn Provider>,
    _dir: Option<TempDir>,
}

impl ProviderFixture {
    pub fn memory() -> Self {
        Self::open("memory", DriverConfig::new(), None)
    }

    #[cfg(feature = "sled-backend")]
    pub fn sled() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = DriverConfig::new()
            .set("path", dir.path().join("db").to_string_lossy().to_string())
            .set("maintenance_interval_secs", 1u64);
        Self::open("sled", config, Some(dir))
    }

    /// One fixture per compiled-in driver, opened as the iterator advances
    pub fn all() -> impl Iterator<Item = Self> {
        let mut openers: Vec<fn() -> Self> = vec![Self::memory];
        #[cfg(feature = "sled-backend")]
        openers.push(Self::sled);
        openers.into_iter().map(|open| open())
    }

    fn open(driver: &'static str, config: DriverConfig, dir: Option<TempDir>) -> Self {
        init_logging();
        let registry = Registry::with_builtin_drivers().expect("Failed to register drivers");
        let provider = registry
            .open(driver, &config)
            .unwrap_or_else(|e| panic!("Failed to open {} provider: {}", driver, e));
        // Captured output names the driver of a failing iteration
        println!("Running against the {} driver", driver);
        Self {
            driver,
            provider,
            _dir: dir,
        }
    }

    /// Put each key with its own name as value
    pub fn seed(&self, keys: &[&str]) {
        let entries = keys.iter().map(|k| Entry::new(*k, *k)).collect();
        self.provider
            .batch(entries)
            .unwrap_or_else(|e| panic!("[{}] seeding failed: {}", self.driver, e));
    }
}

impl Deref for ProviderFixture {
    type Target = dyn Provider;

    fn deref(&self) -> &Self::Target {
        self.provider.as_ref()
    }
}

/// Run a scan to completion and return the visited keys as strings
pub fn scan_keys(provider: &dyn Provider, options: ScanOptions<'_>) -> Vec<String> {
    scan_pairs(provider, options)
        .into_iter()
        .map(|(k, _)| k)
        .collect()
}

/// Run a scan to completion and return (key, value) pairs as strings
pub fn scan_pairs(provider: &dyn Provider, options: ScanOptions<'_>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    provider
        .scan(options.scanner(|k, v| {
            pairs.push((
                String::from_utf8_lossy(&k).to_string(),
                String::from_utf8_lossy(&v).to_string(),
            ));
            Ok(ScanFlow::Continue)
        }))
        .unwrap_or_else(|e| panic!("[{}] scan failed: {}", provider.driver_name(), e));
    pairs
}
