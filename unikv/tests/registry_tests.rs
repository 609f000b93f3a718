// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tests for the process-wide driver registry
//!
//! These share global state, so they run serially.

mod testutils;

use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use unikv::drivers::MemoryDriver;
use unikv::{Driver, DriverConfig, Entry, KvError, KvResult, Provider};

/// Wraps the memory driver and counts how often it is opened
struct CountingDriver {
    opened: Arc<AtomicUsize>,
}

impl Driver for CountingDriver {
    fn name(&self) -> &str {
        "counting"
    }

    fn open(&self, config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        MemoryDriver.open(config)
    }
}

/// Always refuses to open
struct RefusingDriver;

impl Driver for RefusingDriver {
    fn name(&self) -> &str {
        "refusing"
    }

    fn open(&self, _config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
        Err(KvError::config("refusing driver never opens"))
    }
}

#[test]
#[serial]
fn test_builtin_drivers_register_once() {
    testutils::init_logging();

    // Each test binary is its own process, so the global registry starts empty
    unikv::register_builtin_drivers().unwrap();
    let names = unikv::registered_drivers();
    assert!(names.contains(&"memory".to_string()));
    #[cfg(feature = "sled-backend")]
    assert!(names.contains(&"sled".to_string()));

    match unikv::register_builtin_drivers().unwrap_err() {
        KvError::DriverAlreadyRegistered(name) => assert_eq!(name, "memory"),
        other => panic!("unexpected error: {}", other),
    }

    let provider = unikv::open("memory", &DriverConfig::new()).unwrap();
    provider.put(Entry::new("k", "v")).unwrap();
    assert_eq!(provider.get(b"k").unwrap(), b"v");
    assert_eq!(provider.driver_name(), "memory");
}

#[test]
#[serial]
fn test_unknown_driver() {
    match unikv::open("leveldb", &DriverConfig::new()) {
        Err(KvError::DriverNotFound(name)) => assert_eq!(name, "leveldb"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("opened a driver that was never registered"),
    }
}

#[test]
#[serial]
fn test_custom_driver_registration() {
    let opened = Arc::new(AtomicUsize::new(0));
    unikv::register(
        "counting",
        CountingDriver {
            opened: Arc::clone(&opened),
        },
    )
    .unwrap();

    let first = unikv::open("counting", &DriverConfig::new()).unwrap();
    let second = unikv::open("counting", &DriverConfig::new()).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 2);

    // Each open yields an independent provider
    first.put(Entry::new("only-in-first", "1")).unwrap();
    assert!(second.get(b"only-in-first").unwrap_err().is_not_found());

    // The original registration survives a duplicate attempt
    let dup = unikv::register("counting", RefusingDriver);
    assert!(matches!(dup, Err(KvError::DriverAlreadyRegistered(_))));
    assert!(unikv::open("counting", &DriverConfig::new()).is_ok());
    assert_eq!(opened.load(Ordering::SeqCst), 3);
}

#[test]
#[serial]
fn test_driver_open_errors_are_returned_unchanged() {
    unikv::register("refusing", RefusingDriver).unwrap();

    match unikv::open("refusing", &DriverConfig::new()) {
        Err(KvError::InvalidConfig(msg)) => assert_eq!(msg, "refusing driver never opens"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("refusing driver opened"),
    }
}

#[test]
#[serial]
fn test_builtin_driver_config_validation() {
    let registry = unikv::Registry::with_builtin_drivers().unwrap();

    let bad_sync = DriverConfig::new().set("sync_writes", "yes");
    assert!(matches!(
        registry.open("memory", &bad_sync),
        Err(KvError::InvalidConfig(_))
    ));

    #[cfg(feature = "sled-backend")]
    {
        assert!(matches!(
            registry.open("sled", &DriverConfig::new()),
            Err(KvError::InvalidConfig(_))
        ));
        assert!(matches!(
            registry.open("sled", &DriverConfig::new().set("path", "")),
            Err(KvError::InvalidConfig(_))
        ));
    }
}
