// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! unikv - A uniform key-value contract over interchangeable storage engines
//!
//! unikv presents one byte-oriented key-value API on top of embedded storage
//! engines with different native features. Every backend offers the same
//! operations with the same semantics:
//!
//! - **Put / Batch / Delete**: upserts, atomic batches (an entry without a
//!   value deletes its key), idempotent deletes
//! - **Get / TTL**: expired keys behave exactly like absent keys
//! - **Scan**: ordered prefix scans, forward or reverse, with an optional
//!   offset and an early-stop result from the scanner
//! - **Per-key expiry**: native where the engine supports it, emulated by a
//!   small value codec where it does not
//!
//! # Architecture
//!
//! ```text
//! Registry (driver name -> Driver)
//!     ↓ open(name, DriverConfig)
//! Provider (put, batch, get, ttl, delete, close, scan)
//!     ↓
//! Concrete drivers (memory, sled) + shared scan engine and value codec
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use unikv::{DriverConfig, Entry, ScanFlow, ScanOptions};
//! use std::time::Duration;
//!
//! unikv::register_builtin_drivers()?;
//! let provider = unikv::open("sled", &DriverConfig::new().set("path", "./data/kv"))?;
//!
//! provider.put(Entry::new("session:1", "alice").with_ttl(Duration::from_secs(60)))?;
//! provider.scan(ScanOptions::new().prefix("session:").scanner(|key, value| {
//!     println!("{:?} = {:?}", key, value);
//!     Ok(ScanFlow::Continue)
//! }))?;
//! provider.close()?;
//! ```

pub mod codec;
pub mod config;
pub mod drivers;
pub mod error;
pub mod maintenance;
pub mod registry;
pub mod scan;
pub mod traits;
pub mod types;

// Re-export the public API
pub use config::DriverConfig;
pub use error::{KvError, KvResult};
pub use registry::{open, register, register_builtin_drivers, registered_drivers, Registry};
pub use scan::{ScanFlow, ScanOptions};
pub use traits::{Driver, Provider};
pub use types::{Capabilities, Entry, ScanIsolation};

/// unikv version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// unikv crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
