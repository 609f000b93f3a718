// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver registry
//!
//! Maps driver names to driver factories and opens providers by name.
//! A [`Registry`] can be used as a standalone value, and one process-wide
//! instance backs the free functions [`register`], [`open`] and
//! [`registered_drivers`].
//!
//! Nothing is registered implicitly: call [`register_builtin_drivers`] (or
//! [`register`] for custom drivers) once at startup, before the first
//! [`open`].
//!
//! # Example
//!
//! ```ignore
//! unikv::register_builtin_drivers()?;
//!
//! let config = DriverConfig::new().set("path", "./data/kv");
//! let provider = unikv::open("sled", &config)?;
//! provider.put(Entry::new("hello", "world"))?;
//! ```

use crate::config::DriverConfig;
use crate::drivers;
use crate::error::{KvError, KvResult};
use crate::traits::{Driver, Provider};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide registry; registrations live as long as the process
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Table of named driver factories
///
/// Names are unique and registrations are never removed.
#[derive(Default)]
pub struct Registry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every driver compiled into this crate
    pub fn with_builtin_drivers() -> KvResult<Self> {
        let registry = Self::new();
        drivers::register_builtin(&registry)?;
        Ok(registry)
    }

    /// Register a driver under `name`
    ///
    /// # Returns
    /// * `Err(KvError::DriverAlreadyRegistered)` if `name` is taken; the
    ///   existing registration is left untouched
    pub fn register<D>(&self, name: &str, driver: D) -> KvResult<()>
    where
        D: Driver + 'static,
    {
        self.register_arc(name, Arc::new(driver))
    }

    /// Register an already shared driver under `name`
    pub fn register_arc(&self, name: &str, driver: Arc<dyn Driver>) -> KvResult<()> {
        let mut drivers = self.drivers.write();
        if drivers.contains_key(name) {
            return Err(KvError::DriverAlreadyRegistered(name.to_string()));
        }
        drivers.insert(name.to_string(), driver);
        log::info!("Registered storage driver: {}", name);
        Ok(())
    }

    /// Open a provider through the driver registered under `name`
    ///
    /// The driver's own result is returned unchanged.
    pub fn open(&self, name: &str, config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
        // Clone the handle so the driver opens without holding the table lock
        let driver = self
            .drivers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| KvError::DriverNotFound(name.to_string()))?;

        driver.open(config)
    }

    /// Whether a driver is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.read().contains_key(name)
    }

    /// Sorted list of registered names
    pub fn driver_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Register a driver in the process-wide registry
pub fn register<D>(name: &str, driver: D) -> KvResult<()>
where
    D: Driver + 'static,
{
    GLOBAL_REGISTRY.register(name, driver)
}

/// Open a provider from the process-wide registry
pub fn open(name: &str, config: &DriverConfig) -> KvResult<Box<dyn Provider>> {
    GLOBAL_REGISTRY.open(name, config)
}

/// Names registered in the process-wide registry
pub fn registered_drivers() -> Vec<String> {
    GLOBAL_REGISTRY.driver_names()
}

/// Register the drivers compiled into this crate in the process-wide registry
///
/// Fails with [`KvError::DriverAlreadyRegistered`] when called twice.
pub fn register_builtin_drivers() -> KvResult<()> {
    drivers::register_builtin(&GLOBAL_REGISTRY)
}
