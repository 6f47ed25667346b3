//! Thread-safe backlog handle.

use crate::backlog::{Backlog, BacklogInfo};
use crate::config::BacklogConfig;
use crate::error::BacklogResult;
use crate::stats::StatsSnapshot;
use parking_lot::RwLock;
use std::sync::Arc;

/// A cloneable, thread-safe handle to a [`Backlog`].
///
/// Appends (and the trimming they trigger) take the write lock, so they
/// never run while a range read is walking the block chain. Range reads
/// take the read lock and may run concurrently with each other.
///
/// The lock is parking_lot's `RwLock`, which is eventually fair: a steady
/// stream of readers does not starve the writer.
///
/// # Example
///
/// ```rust
/// use replog_core::SharedBacklog;
/// use std::thread;
///
/// let backlog = SharedBacklog::new(1024, 64).unwrap();
/// let writer = backlog.clone();
///
/// thread::spawn(move || writer.append(b"PING\r\n")).join().unwrap();
///
/// assert_eq!(backlog.read_range(0).unwrap(), b"PING\r\n");
/// ```
#[derive(Debug, Clone)]
pub struct SharedBacklog {
    inner: Arc<RwLock<Backlog>>,
}

impl SharedBacklog {
    /// Creates a shared backlog.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` or `block_size` is zero.
    pub fn new(capacity: usize, block_size: usize) -> BacklogResult<Self> {
        Ok(Self::from_backlog(Backlog::new(capacity, block_size)?))
    }

    /// Creates a shared backlog from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn with_config(config: BacklogConfig) -> BacklogResult<Self> {
        Ok(Self::from_backlog(Backlog::with_config(config)?))
    }

    /// Wraps an existing backlog.
    #[must_use]
    pub fn from_backlog(backlog: Backlog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(backlog)),
        }
    }

    /// Appends one record. See [`Backlog::append`].
    pub fn append(&self, record: &[u8]) {
        self.inner.write().append(record);
    }

    /// Appends several records under a single write lock.
    ///
    /// Readers observe either none or all of the batch.
    pub fn append_batch<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut backlog = self.inner.write();
        for record in records {
            backlog.append(record);
        }
    }

    /// Reads every byte from `from` to the end. See [`Backlog::read_range`].
    ///
    /// The offsets and the bytes come from one consistent state.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::OffsetUnavailable`](crate::BacklogError::OffsetUnavailable)
    /// if `from` is outside the retained window.
    pub fn read_range(&self, from: u64) -> BacklogResult<Vec<u8>> {
        self.inner.read().read_range(from)
    }

    /// Reads from `from` and also returns the ending offset the bytes run to.
    ///
    /// A replica that applies the bytes can resume from the returned offset
    /// without racing a concurrent append.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is outside the retained window.
    pub fn read_range_with_end(&self, from: u64) -> BacklogResult<(Vec<u8>, u64)> {
        let backlog = self.inner.read();
        let bytes = backlog.read_range(from)?;
        Ok((bytes, backlog.ending_offset()))
    }

    /// Returns true if a range read from `offset` would currently succeed.
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.inner.read().contains_offset(offset)
    }

    /// Returns the oldest readable offset.
    pub fn starting_offset(&self) -> u64 {
        self.inner.read().starting_offset()
    }

    /// Returns the offset just past the last byte written.
    pub fn ending_offset(&self) -> u64 {
        self.inner.read().ending_offset()
    }

    /// Returns a consistent snapshot of the window and sizing.
    pub fn info(&self) -> BacklogInfo {
        self.inner.read().info()
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.read().stats().snapshot()
    }
}

impl From<Backlog> for SharedBacklog {
    fn from(backlog: Backlog) -> Self {
        Self::from_backlog(backlog)
    }
}
