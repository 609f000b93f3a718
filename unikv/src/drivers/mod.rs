// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in storage drivers
//!
//! | Driver   | Engine          | Expiry               | Scan isolation | Maintenance      |
//! |----------|-----------------|----------------------|----------------|------------------|
//! | `memory` | ordered map     | native               | snapshot       | none             |
//! | `sled`   | sled (embedded) | emulated (codec)     | live           | checkpoint       |
//!
//! The sled driver is behind the `sled-backend` feature (on by default).

pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;

pub use self::memory::{MemoryDriver, MemoryProvider, MEMORY_DRIVER};
#[cfg(feature = "sled-backend")]
pub use self::sled::{SledDriver, SledOptions, SledProvider, SLED_DRIVER};

use crate::error::KvResult;
use crate::registry::Registry;

/// Register every compiled-in driver under its default name
pub(crate) fn register_builtin(registry: &Registry) -> KvResult<()> {
    registry.register(MEMORY_DRIVER, MemoryDriver)?;
    #[cfg(feature = "sled-backend")]
    registry.register(SLED_DRIVER, SledDriver)?;
    Ok(())
}
