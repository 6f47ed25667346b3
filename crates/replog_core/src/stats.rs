//! Backlog statistics.
//!
//! Counters are atomic so that readers holding only a shared reference to
//! the backlog can record their activity.
//!
//! # Usage
//!
//! ```rust
//! use replog_core::Backlog;
//!
//! let mut backlog = Backlog::new(64, 16).unwrap();
//! backlog.append(b"SET k v\r\n");
//! backlog.read_range(0).unwrap();
//!
//! let stats = backlog.stats().snapshot();
//! assert_eq!(stats.appends, 1);
//! assert_eq!(stats.bytes_read, 9);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Backlog statistics.
///
/// All counters are monotonically increasing.
#[derive(Debug, Default)]
pub struct BacklogStats {
    // Write side
    /// Total number of non-empty records appended.
    appends: AtomicU64,
    /// Total bytes appended.
    bytes_appended: AtomicU64,
    /// Blocks allocated after construction.
    blocks_allocated: AtomicU64,

    // Eviction
    /// Blocks removed by trimming.
    blocks_evicted: AtomicU64,
    /// Bytes removed by trimming.
    bytes_evicted: AtomicU64,

    // Read side
    /// Successful range reads.
    reads: AtomicU64,
    /// Total bytes returned by range reads.
    bytes_read: AtomicU64,
    /// Range reads rejected because the offset was outside the window.
    unavailable_reads: AtomicU64,
}

impl BacklogStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_append(&self, bytes: u64) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_block_allocated(&self) {
        self.blocks_allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, bytes: u64) {
        self.blocks_evicted.fetch_add(1, Ordering::Relaxed);
        self.bytes_evicted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_unavailable(&self) {
        self.unavailable_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of non-empty records appended.
    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::Relaxed)
    }

    /// Returns the total bytes appended.
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    /// Returns the number of blocks allocated after construction.
    pub fn blocks_allocated(&self) -> u64 {
        self.blocks_allocated.load(Ordering::Relaxed)
    }

    /// Returns the number of blocks evicted by trimming.
    pub fn blocks_evicted(&self) -> u64 {
        self.blocks_evicted.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes evicted by trimming.
    ///
    /// This always equals the backlog's starting offset.
    pub fn bytes_evicted(&self) -> u64 {
        self.bytes_evicted.load(Ordering::Relaxed)
    }

    /// Returns the number of successful range reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the total bytes returned by range reads.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Returns the number of rejected range reads.
    ///
    /// A climbing count usually means the backlog is too small for the
    /// replicas' reconnect pattern.
    pub fn unavailable_reads(&self) -> u64 {
        self.unavailable_reads.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            appends: self.appends(),
            bytes_appended: self.bytes_appended(),
            blocks_allocated: self.blocks_allocated(),
            blocks_evicted: self.blocks_evicted(),
            bytes_evicted: self.bytes_evicted(),
            reads: self.reads(),
            bytes_read: self.bytes_read(),
            unavailable_reads: self.unavailable_reads(),
        }
    }
}

/// A point-in-time snapshot of backlog statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Number of non-empty records appended.
    pub appends: u64,
    /// Total bytes appended.
    pub bytes_appended: u64,
    /// Blocks allocated after construction.
    pub blocks_allocated: u64,
    /// Blocks evicted by trimming.
    pub blocks_evicted: u64,
    /// Bytes evicted by trimming.
    pub bytes_evicted: u64,
    /// Successful range reads.
    pub reads: u64,
    /// Total bytes returned by range reads.
    pub bytes_read: u64,
    /// Rejected range reads.
    pub unavailable_reads: u64,
}
