// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Driver configuration
//!
//! A driver is opened with a recognized-option mapping rather than a typed
//! struct, so a hosting application can load it from whatever format it
//! already uses. Each driver reads the options it understands through the
//! typed accessors below; unknown options are ignored.

use crate::error::{KvError, KvResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Storage location, required by on-disk drivers
pub const OPT_PATH: &str = "path";
/// Durably sync every write before acknowledging it
pub const OPT_SYNC_WRITES: &str = "sync_writes";
/// Engine cache size in bytes
pub const OPT_CACHE_CAPACITY: &str = "cache_capacity";
/// Engine background flush period in milliseconds, 0 disables it
pub const OPT_FLUSH_EVERY_MS: &str = "flush_every_ms";
/// Maintenance hook period in seconds, 0 disables it
pub const OPT_MAINTENANCE_INTERVAL_SECS: &str = "maintenance_interval_secs";

/// Option mapping handed to [`Driver::open`](crate::Driver::open)
///
/// # Example
///
/// ```ignore
/// let config = DriverConfig::new()
///     .set("path", "./data/kv")
///     .set("sync_writes", true);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverConfig {
    options: HashMap<String, Value>,
}

impl DriverConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON object
    pub fn from_json_str(json: &str) -> KvResult<Self> {
        serde_json::from_str(json).map_err(not_an_object)
    }

    /// Set an option, replacing any previous value
    pub fn set<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Raw access to an option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// Read a required string option
    pub fn require_str(&self, key: &str) -> KvResult<&str> {
        match self.options.get(key) {
            None | Some(Value::Null) => {
                Err(KvError::config(format!("missing required option '{}'", key)))
            }
            Some(Value::String(s)) if s.is_empty() => Err(invalid(key, "must not be empty")),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(wrong_type(key, "a string", other)),
        }
    }

    /// Read a boolean option, falling back to `default` when it is absent
    pub fn bool_or(&self, key: &str, default: bool) -> KvResult<bool> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(wrong_type(key, "a boolean", other)),
        }
    }

    /// Read an unsigned integer option if present
    pub fn optional_u64(&self, key: &str) -> KvResult<Option<u64>> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| wrong_type(key, UNSIGNED, n)),
            Some(other) => Err(wrong_type(key, UNSIGNED, other)),
        }
    }

    /// Read an unsigned integer option, falling back to `default` when it is absent
    pub fn u64_or(&self, key: &str, default: u64) -> KvResult<u64> {
        Ok(self.optional_u64(key)?.unwrap_or(default))
    }
}

const UNSIGNED: &str = "a non-negative integer";

fn not_an_object(e: serde_json::Error) -> KvError {
    KvError::config(format!("configuration is not a JSON object: {}", e))
}

fn invalid(key: &str, problem: &str) -> KvError {
    KvError::config(format!("option '{}' {}", key, problem))
}

fn wrong_type(key: &str, expected: &str, got: impl fmt::Display) -> KvError {
    invalid(key, &format!("must be {}, got {}", expected, got))
}
