// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scan engine
//!
//! Every driver exposes the same scan behaviour no matter how its native
//! iterator positions itself. The protocol is split in two halves:
//!
//! - [`ScanBounds`] turns prefix, offset and direction into one key range.
//!   A driver only has to iterate that range in the requested direction.
//! - [`ScanCursor`] consumes the driver's records and applies the offset
//!   boundary rule, expiry skipping, the scanner callback and termination.
//!
//! # Example
//!
//! ```ignore
//! let mut keys = Vec::new();
//! provider.scan(
//!     ScanOptions::new()
//!         .prefix("user:")
//!         .reverse(true)
//!         .scanner(|key, _value| {
//!             keys.push(key);
//!             Ok(if keys.len() == 10 { ScanFlow::Done } else { ScanFlow::Continue })
//!         }),
//! )?;
//! ```

use crate::error::{KvError, KvResult};
use std::fmt;
use std::ops::Bound;

/// What the scan should do after a record has been handed to the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ScanFlow {
    /// Keep going
    Continue,

    /// Stop here; the scan completes successfully
    Done,
}

/// Per-record callback receiving owned copies of the key and value
pub type Scanner<'a> = Box<dyn FnMut(Vec<u8>, Vec<u8>) -> KvResult<ScanFlow> + 'a>;

/// Options for [`Provider::scan`](crate::Provider::scan)
#[derive(Default)]
pub struct ScanOptions<'a> {
    /// Only keys starting with this prefix are visited
    pub prefix: Option<Vec<u8>>,
    /// Start key: the first key >= offset (forward) or <= offset (reverse)
    pub offset: Option<Vec<u8>>,
    /// Visit keys in descending order
    pub reverse: bool,
    /// Emit the record whose key equals `offset`
    pub include_offset: bool,
    /// Required callback
    pub scanner: Option<Scanner<'a>>,
}

impl<'a> ScanOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn offset(mut self, offset: impl Into<Vec<u8>>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn include_offset(mut self, include: bool) -> Self {
        self.include_offset = include;
        self
    }

    pub fn scanner<F>(mut self, scanner: F) -> Self
    where
        F: FnMut(Vec<u8>, Vec<u8>) -> KvResult<ScanFlow> + 'a,
    {
        self.scanner = Some(Box::new(scanner));
        self
    }

    /// Validate the options and split them into a range and a cursor
    ///
    /// Fails with [`KvError::ScannerRequired`] when no scanner is set.
    pub fn into_plan(self) -> KvResult<ScanPlan<'a>> {
        let scanner = self.scanner.ok_or(KvError::ScannerRequired)?;
        let prefix = self.prefix.filter(|p| !p.is_empty());
        let bounds = ScanBounds::new(prefix.as_deref(), self.offset.as_deref(), self.reverse);

        Ok(ScanPlan {
            bounds,
            reverse: self.reverse,
            cursor: ScanCursor {
                offset: self.offset,
                include_offset: self.include_offset,
                boundary_checked: false,
                scanner,
            },
        })
    }
}

impl fmt::Debug for ScanOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("prefix", &self.prefix)
            .field("offset", &self.offset)
            .field("reverse", &self.reverse)
            .field("include_offset", &self.include_offset)
            .field("scanner", &self.scanner.is_some())
            .finish()
    }
}

/// A validated scan: the range to iterate and the cursor that consumes it
pub struct ScanPlan<'a> {
    pub bounds: ScanBounds,
    pub reverse: bool,
    pub cursor: ScanCursor<'a>,
}

/// Key range a driver must iterate for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBounds {
    pub lower: Bound<Vec<u8>>,
    pub upper: Bound<Vec<u8>>,
}

impl ScanBounds {
    /// Intersect the prefix range with the half-range opened by the offset
    ///
    /// Forward scans start at the larger of prefix and offset. Reverse scans
    /// end at the smaller of the offset (inclusive) and the prefix end.
    pub fn new(prefix: Option<&[u8]>, offset: Option<&[u8]>, reverse: bool) -> Self {
        let prefix_end = prefix.and_then(prefix_successor);

        if reverse {
            let lower = match prefix {
                Some(p) => Bound::Included(p.to_vec()),
                None => Bound::Unbounded,
            };
            let upper = match (offset, prefix_end) {
                (None, None) => Bound::Unbounded,
                (None, Some(end)) => Bound::Excluded(end),
                (Some(o), None) => Bound::Included(o.to_vec()),
                (Some(o), Some(end)) if o < end.as_slice() => Bound::Included(o.to_vec()),
                (Some(_), Some(end)) => Bound::Excluded(end),
            };
            Self { lower, upper }
        } else {
            let start = match (prefix, offset) {
                (None, None) => None,
                (Some(p), None) => Some(p),
                (None, Some(o)) => Some(o),
                (Some(p), Some(o)) => Some(p.max(o)),
            };
            let lower = match start {
                Some(s) => Bound::Included(s.to_vec()),
                None => Bound::Unbounded,
            };
            let upper = match prefix_end {
                Some(end) => Bound::Excluded(end),
                None => Bound::Unbounded,
            };
            Self { lower, upper }
        }
    }

    /// True when no key can fall inside the range
    ///
    /// Drivers must check this before building a native range, since ordered
    /// maps panic on inverted bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
            _ => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match &self.lower {
            Bound::Included(lo) => key >= lo.as_slice(),
            Bound::Excluded(lo) => key > lo.as_slice(),
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(hi) => key <= hi.as_slice(),
            Bound::Excluded(hi) => key < hi.as_slice(),
            Bound::Unbounded => true,
        };
        above && below
    }

    /// The bounds as a tuple usable with `range()` APIs
    pub fn to_range(&self) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
        (self.lower.clone(), self.upper.clone())
    }
}

/// Smallest key greater than every key starting with `prefix`
///
/// Returns `None` when no such key exists (empty or all-0xFF prefix).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Per-call scan state that drives a driver's records through the scanner
pub struct ScanCursor<'a> {
    offset: Option<Vec<u8>>,
    include_offset: bool,
    boundary_checked: bool,
    scanner: Scanner<'a>,
}

impl<'a> ScanCursor<'a> {
    /// Consume `records` in the order given
    ///
    /// `resolve` turns a stored record into the caller-visible value, or
    /// `None` when the record is expired and must be skipped. Records come in
    /// with owned keys, so the scanner never sees a buffer the iterator can
    /// reuse.
    pub fn run<I, R, F>(mut self, records: I, mut resolve: F) -> KvResult<()>
    where
        I: IntoIterator<Item = KvResult<(Vec<u8>, R)>>,
        F: FnMut(&[u8], R) -> KvResult<Option<Vec<u8>>>,
    {
        for record in records {
            let (key, raw) = record?;

            if self.is_excluded_boundary(&key) {
                continue;
            }

            let Some(value) = resolve(&key, raw)? else {
                continue;
            };

            match (self.scanner)(key, value)? {
                ScanFlow::Continue => {}
                ScanFlow::Done => break,
            }
        }
        Ok(())
    }

    /// Offset boundary rule, evaluated on the first candidate only
    fn is_excluded_boundary(&mut self, key: &[u8]) -> bool {
        if self.boundary_checked {
            return false;
        }
        self.boundary_checked = true;

        match &self.offset {
            Some(offset) if !self.include_offset => key == offset.as_slice(),
            _ => false,
        }
    }
}
