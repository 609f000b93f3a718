// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Value codec for TTL emulation
//!
//! Engines without per-key expiry store every value wrapped in a small frame
//! carrying the absolute expiry instant:
//!
//! ```text
//! ┌──────────┬──────────────────────────────┬─────────────┬───────────┐
//! │ flag (1) │ secs i64 LE (8) nanos u32 (4)│ raw value   │ CRC32 (4) │
//! │          │ present only when flag = 1   │ (any length)│           │
//! └──────────┴──────────────────────────────┴─────────────┴───────────┘
//! ```
//!
//! The header has a fixed size for each flag and the checksum is a fixed
//! trailer, so the raw value is whatever lies between them and can be empty.
//! The frame is local to one backend and is not a shared on-disk format.

use crate::error::{KvError, KvResult};
use chrono::{DateTime, Utc};

const FLAG_NO_EXPIRY: u8 = 0;
const FLAG_EXPIRY: u8 = 1;

const EXPIRY_LEN: usize = 12;
const CHECKSUM_LEN: usize = 4;

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayload {
    pub expires_at: Option<DateTime<Utc>>,
    pub value: Vec<u8>,
}

impl StoredPayload {
    /// Whether the payload is expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }
}

/// Wrap a raw value and its optional absolute expiry
pub fn encode(value: &[u8], expires_at: Option<DateTime<Utc>>) -> Vec<u8> {
    let header_len = 1 + expires_at.map_or(0, |_| EXPIRY_LEN);
    let mut buffer = Vec::with_capacity(header_len + value.len() + CHECKSUM_LEN);

    match expires_at {
        Some(at) => {
            buffer.push(FLAG_EXPIRY);
            buffer.extend_from_slice(&at.timestamp().to_le_bytes());
            buffer.extend_from_slice(&at.timestamp_subsec_nanos().to_le_bytes());
        }
        None => buffer.push(FLAG_NO_EXPIRY),
    }
    buffer.extend_from_slice(value);

    let checksum = crc32fast::hash(&buffer);
    buffer.extend_from_slice(&checksum.to_le_bytes());
    buffer
}

/// Unwrap a frame produced by [`encode`]
pub fn decode(data: &[u8]) -> KvResult<StoredPayload> {
    if data.len() < 1 + CHECKSUM_LEN {
        return Err(corrupt("payload too small"));
    }

    let (body, trailer) = data.split_at(data.len() - CHECKSUM_LEN);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if crc32fast::hash(body) != expected {
        return Err(corrupt("checksum mismatch"));
    }

    match body[0] {
        FLAG_NO_EXPIRY => Ok(StoredPayload {
            expires_at: None,
            value: body[1..].to_vec(),
        }),
        FLAG_EXPIRY => {
            if body.len() < 1 + EXPIRY_LEN {
                return Err(corrupt("truncated expiry"));
            }
            let mut secs = [0u8; 8];
            secs.copy_from_slice(&body[1..9]);
            let mut nanos = [0u8; 4];
            nanos.copy_from_slice(&body[9..13]);

            let secs = i64::from_le_bytes(secs);
            let nanos = u32::from_le_bytes(nanos);
            let expires_at = DateTime::from_timestamp(secs, nanos)
                .ok_or_else(|| corrupt("expiry out of range"))?;

            Ok(StoredPayload {
                expires_at: Some(expires_at),
                value: body[1 + EXPIRY_LEN..].to_vec(),
            })
        }
        flag => Err(corrupt(format!("unknown flag {}", flag))),
    }
}

fn corrupt(msg: impl Into<String>) -> KvError {
    KvError::CorruptPayload(msg.into())
}

/// Absent expiry never expires; otherwise expired once `now` reaches it
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(at) => now >= at,
        None => false,
    }
}
