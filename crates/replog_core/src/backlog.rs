//! The replication backlog.
//!
//! A [`Backlog`] keeps the most recent part of an append-only byte stream in
//! a chain of fixed-capacity [`Block`]s. Every byte ever appended has a
//! stream offset; the backlog retains the window
//! `[starting_offset, ending_offset)` and can hand back everything from any
//! offset inside that window to the end.
//!
//! ## Eviction
//!
//! After each append the oldest whole blocks are dropped while the retained
//! byte count exceeds the configured capacity. Eviction never splits a
//! block, so the retained count may sit above capacity by up to one block.
//!
//! ## Block boundaries
//!
//! An offset that falls exactly on the boundary between two blocks resolves
//! to the first byte of the later block. A range read from there copies
//! nothing from the earlier block.

use crate::block::Block;
use crate::config::BacklogConfig;
use crate::error::{BacklogError, BacklogResult};
use crate::stats::BacklogStats;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// A bounded buffer over the tail of an append-only write stream.
///
/// # Invariants
///
/// After every operation:
/// - `ending_offset - starting_offset` equals the retained byte count
/// - the retained byte count equals the sum of every block's used length
/// - at least one block is held
/// - both offsets only ever grow
///
/// `Backlog` itself is not synchronized. Wrap it in a
/// [`SharedBacklog`](crate::SharedBacklog) to share it between a writer and
/// concurrent readers.
///
/// # Example
///
/// ```rust
/// use replog_core::Backlog;
///
/// let mut backlog = Backlog::new(1024, 64).unwrap();
/// backlog.append(b"SET a 1\r\n");
/// backlog.append(b"SET b 2\r\n");
///
/// assert_eq!(backlog.ending_offset(), 18);
/// assert_eq!(backlog.read_range(9).unwrap(), b"SET b 2\r\n");
/// ```
#[derive(Debug)]
pub struct Backlog {
    config: BacklogConfig,
    /// Oldest block first, tail last.
    blocks: VecDeque<Block>,
    /// Sum of `used` across `blocks`.
    used_total: usize,
    /// Stream offset of the first retained byte.
    starting_offset: u64,
    /// Stream offset one past the last byte written.
    ending_offset: u64,
    stats: BacklogStats,
}

/// A point-in-time view of a backlog's window and sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BacklogInfo {
    /// Oldest readable offset.
    pub starting_offset: u64,
    /// Offset the next appended byte will get.
    pub ending_offset: u64,
    /// Bytes currently retained.
    pub used_bytes: usize,
    /// Blocks currently held.
    pub block_count: usize,
    /// Configured soft capacity.
    pub capacity: usize,
    /// Configured default block size.
    pub block_size: usize,
}

impl Backlog {
    /// Creates an empty backlog.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::InvalidConfig`] if `capacity` or `block_size`
    /// is zero.
    pub fn new(capacity: usize, block_size: usize) -> BacklogResult<Self> {
        Self::with_config(
            BacklogConfig::new()
                .capacity(capacity)
                .block_size(block_size),
        )
    }

    /// Creates an empty backlog from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::InvalidConfig`] if the configuration does not
    /// validate.
    pub fn with_config(config: BacklogConfig) -> BacklogResult<Self> {
        config.validate()?;

        let mut blocks = VecDeque::new();
        blocks.push_back(Block::new(config.block_size));

        debug!(
            capacity = config.capacity,
            block_size = config.block_size,
            "created backlog"
        );

        Ok(Self {
            config,
            blocks,
            used_total: 0,
            starting_offset: 0,
            ending_offset: 0,
            stats: BacklogStats::new(),
        })
    }

    /// Appends one already-encoded record to the stream.
    ///
    /// The record fills whatever room is left in the tail block; the rest
    /// goes into a single new block big enough to hold the whole record.
    /// The backlog is trimmed afterwards, which may evict bytes of this very
    /// record if they landed in a block that is no longer the tail.
    ///
    /// Empty records are ignored.
    pub fn append(&mut self, record: &[u8]) {
        let len = record.len();
        if len == 0 {
            return;
        }

        self.ending_offset += len as u64;
        self.used_total += len;

        let available = self.blocks.back().map_or(0, Block::remaining);
        if available >= len {
            self.write_tail(record);
        } else {
            let (head, rest) = record.split_at(available);
            self.write_tail(head);

            let mut block = Block::new(len.max(self.config.block_size));
            block.append(rest);
            debug!(
                block_capacity = block.capacity(),
                ending_offset = self.ending_offset,
                "allocated backlog block"
            );
            self.blocks.push_back(block);
            self.stats.record_block_allocated();
        }

        self.stats.record_append(len as u64);
        trace!(len, ending_offset = self.ending_offset, "appended record");

        self.trim();
    }

    /// Evicts the oldest blocks while retained bytes exceed capacity.
    ///
    /// Eviction is whole-block and stops at the last block, so a capacity
    /// smaller than one block keeps that block resident. [`append`] calls
    /// this already; calling it again is a no-op.
    ///
    /// [`append`]: Backlog::append
    pub fn trim(&mut self) {
        let mut evicted = 0usize;

        while self.used_total > self.config.capacity && self.blocks.len() > 1 {
            let Some(block) = self.blocks.pop_front() else {
                break;
            };
            let used = block.used();
            self.used_total -= used;
            self.starting_offset += used as u64;
            self.stats.record_eviction(used as u64);
            evicted += 1;
        }

        if evicted > 0 {
            debug!(
                evicted,
                starting_offset = self.starting_offset,
                used_bytes = self.used_total,
                "trimmed backlog"
            );
        }

        self.check_invariants();
    }

    /// Returns every byte from `from` up to the ending offset.
    ///
    /// Reading at the ending offset returns an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::OffsetUnavailable`] if `from` is older than
    /// the starting offset or newer than the ending offset.
    pub fn read_range(&self, from: u64) -> BacklogResult<Vec<u8>> {
        let mut out = Vec::new();
        self.read_range_into(from, &mut out)?;
        Ok(out)
    }

    /// Appends every byte from `from` up to the ending offset to `out`.
    ///
    /// Returns the number of bytes copied. `out` is left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::OffsetUnavailable`] if `from` is outside the
    /// retained window.
    pub fn read_range_into(&self, from: u64, out: &mut Vec<u8>) -> BacklogResult<usize> {
        if !self.contains_offset(from) {
            self.stats.record_unavailable();
            debug!(
                offset = from,
                starting_offset = self.starting_offset,
                ending_offset = self.ending_offset,
                "requested offset not in backlog"
            );
            return Err(BacklogError::OffsetUnavailable {
                offset: from,
                starting: self.starting_offset,
                ending: self.ending_offset,
            });
        }

        // Bounded by used_total, which is a usize.
        let len = (self.ending_offset - from) as usize;
        let start_len = out.len();
        out.reserve(len);

        let mut block_end = self.starting_offset;
        for block in &self.blocks {
            let block_start = block_end;
            block_end += block.used() as u64;
            if block_end <= from {
                continue;
            }
            let local = from.saturating_sub(block_start) as usize;
            out.extend_from_slice(&block.as_slice()[local..]);
        }

        debug_assert_eq!(out.len() - start_len, len);
        self.stats.record_read(len as u64);
        Ok(len)
    }

    /// Returns true if a range read from `offset` would succeed.
    #[must_use]
    pub fn contains_offset(&self, offset: u64) -> bool {
        (self.starting_offset..=self.ending_offset).contains(&offset)
    }

    /// Returns the oldest readable offset.
    #[must_use]
    pub fn starting_offset(&self) -> u64 {
        self.starting_offset
    }

    /// Returns the offset just past the last byte written.
    #[must_use]
    pub fn ending_offset(&self) -> u64 {
        self.ending_offset
    }

    /// Returns the number of bytes currently retained.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.used_total
    }

    /// Returns true if no bytes are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used_total == 0
    }

    /// Returns the number of blocks held.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates the blocks, oldest first.
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = &Block> + '_ {
        self.blocks.iter()
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Returns the configured default block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Returns the backlog's statistics.
    #[must_use]
    pub fn stats(&self) -> &BacklogStats {
        &self.stats
    }

    /// Returns a snapshot of the window and sizing.
    #[must_use]
    pub fn info(&self) -> BacklogInfo {
        BacklogInfo {
            starting_offset: self.starting_offset,
            ending_offset: self.ending_offset,
            used_bytes: self.used_total,
            block_count: self.blocks.len(),
            capacity: self.config.capacity,
            block_size: self.config.block_size,
        }
    }

    fn write_tail(&mut self, bytes: &[u8]) {
        if let Some(tail) = self.blocks.back_mut() {
            tail.append(bytes);
        }
    }

    fn check_invariants(&self) {
        debug_assert!(!self.blocks.is_empty(), "backlog lost its last block");
        debug_assert!(self
            .blocks
            .iter()
            .all(|block| block.used() <= block.capacity()));
        debug_assert_eq!(
            self.used_total,
            self.blocks.iter().map(Block::used).sum::<usize>(),
            "used_total out of sync with blocks"
        );
        debug_assert_eq!(
            self.ending_offset - self.starting_offset,
            self.used_total as u64,
            "offset window out of sync with used_total"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backlog(capacity: usize, block_size: usize) -> Backlog {
        Backlog::new(capacity, block_size).unwrap()
    }

    fn capacities(backlog: &Backlog) -> Vec<usize> {
        backlog.blocks().map(Block::capacity).collect()
    }

    #[test]
    fn new_backlog_is_empty() {
        let backlog = backlog(16, 4);
        assert!(backlog.is_empty());
        assert_eq!(backlog.starting_offset(), 0);
        assert_eq!(backlog.ending_offset(), 0);
        assert_eq!(backlog.block_count(), 1);
        assert!(backlog.read_range(0).unwrap().is_empty());
    }

    #[test]
    fn zero_sizes_rejected() {
        assert!(matches!(
            Backlog::new(0, 4),
            Err(BacklogError::InvalidConfig(_))
        ));
        assert!(matches!(
            Backlog::new(4, 0),
            Err(BacklogError::InvalidConfig(_))
        ));
    }

    #[test]
    fn read_without_trimming() {
        let mut backlog = backlog(6, 1);
        backlog.append(&[1]);
        assert_eq!(backlog.ending_offset(), 1);
        backlog.append(&[2, 2]);
        backlog.append(&[3, 3, 3]);

        assert_eq!(backlog.ending_offset(), 6);
        assert_eq!(backlog.starting_offset(), 0);
        assert_eq!(backlog.read_range(0).unwrap(), vec![1, 2, 2, 3, 3, 3]);
        assert_eq!(backlog.read_range(3).unwrap(), vec![3, 3, 3]);
    }

    #[test]
    fn read_after_trimming() {
        let mut backlog = backlog(4, 1);
        backlog.append(&[1]);
        backlog.append(&[2, 2]);
        backlog.append(&[3, 3, 3]);

        assert_eq!(backlog.starting_offset(), 3);
        assert_eq!(backlog.read_range(3).unwrap(), vec![3, 3, 3]);

        backlog.append(&[4, 4, 4, 4]);
        assert_eq!(backlog.starting_offset(), 6);
        assert_eq!(backlog.read_range(6).unwrap(), vec![4, 4, 4, 4]);
    }

    #[test]
    fn stale_and_future_offsets_rejected() {
        let mut backlog = backlog(4, 1);
        backlog.append(&[1]);
        backlog.append(&[2, 2]);
        backlog.append(&[3, 3, 3]);

        let stale = backlog.read_range(0).unwrap_err();
        assert!(stale.is_evicted());
        assert_eq!(
            stale,
            BacklogError::OffsetUnavailable {
                offset: 0,
                starting: 3,
                ending: 6,
            }
        );

        let future = backlog.read_range(7).unwrap_err();
        assert!(future.is_ahead());
        assert_eq!(backlog.stats().unavailable_reads(), 2);
    }

    #[test]
    fn oversized_record_gets_its_own_block() {
        let mut backlog = backlog(1024, 10);
        let first: Vec<u8> = (0..9).collect();
        let second: Vec<u8> = (9..21).collect();

        backlog.append(&first);
        backlog.append(&second);

        let caps = capacities(&backlog);
        assert_eq!(caps.len(), 2);
        assert!(caps[1] >= 12);

        let expected: Vec<u8> = (0..21).collect();
        assert_eq!(backlog.read_range(0).unwrap(), expected);
        assert_eq!(backlog.ending_offset(), 21);
    }

    #[test]
    fn text_records_concatenate() {
        let mut backlog = backlog(999, 10);
        backlog.append(b"set a b\r\n");
        backlog.append(b"set abc def\n");

        let bytes = backlog.read_range(0).unwrap();
        assert_eq!(bytes, b"set a b\r\nset abc def\n");
    }

    #[test]
    fn empty_append_is_noop() {
        let mut backlog = backlog(8, 4);
        backlog.append(b"ab");
        backlog.append(b"");

        assert_eq!(backlog.ending_offset(), 2);
        assert_eq!(backlog.block_count(), 1);
        assert_eq!(backlog.stats().appends(), 1);
    }

    #[test]
    fn read_at_ending_offset_is_empty() {
        let mut backlog = backlog(8, 4);
        backlog.append(b"abcd");
        backlog.append(b"efgh");

        assert!(backlog.read_range(8).unwrap().is_empty());
        assert!(backlog.read_range(9).is_err());
    }

    #[test]
    fn boundary_offset_starts_next_block() {
        let mut backlog = backlog(100, 4);
        backlog.append(b"abcd");
        backlog.append(b"efgh");
        assert_eq!(capacities(&backlog), vec![4, 4]);

        assert_eq!(backlog.read_range(4).unwrap(), b"efgh");
        assert_eq!(backlog.read_range(3).unwrap(), b"defgh");
        assert_eq!(backlog.read_range(5).unwrap(), b"fgh");
    }

    #[test]
    fn boundary_offset_after_eviction() {
        let mut backlog = backlog(8, 4);
        backlog.append(b"abcd");
        backlog.append(b"efgh");
        backlog.append(b"ij");

        assert_eq!(backlog.starting_offset(), 4);
        assert_eq!(backlog.read_range(4).unwrap(), b"efghij");
        assert!(backlog.read_range(3).unwrap_err().is_evicted());
    }

    #[test]
    fn split_record_can_be_partly_evicted() {
        let mut backlog = backlog(4, 4);
        backlog.append(b"ab");
        backlog.append(b"cdefgh");

        // "cd" filled the first block, which is now over capacity.
        assert_eq!(backlog.starting_offset(), 4);
        assert_eq!(backlog.read_range(4).unwrap(), b"efgh");
        assert_eq!(backlog.block_count(), 1);
    }

    #[test]
    fn record_filling_tail_exactly_does_not_allocate() {
        let mut backlog = backlog(100, 4);
        backlog.append(b"ab");
        backlog.append(b"cd");

        assert_eq!(backlog.block_count(), 1);
        assert!(backlog.blocks().next().unwrap().is_full());

        backlog.append(b"e");
        assert_eq!(capacities(&backlog), vec![4, 4]);
        assert_eq!(backlog.stats().blocks_allocated(), 1);
    }

    #[test]
    fn capacity_smaller_than_block_keeps_tail() {
        let mut backlog = backlog(2, 8);
        backlog.append(b"abcdef");

        assert_eq!(backlog.block_count(), 1);
        assert_eq!(backlog.used_bytes(), 6);
        assert_eq!(backlog.read_range(0).unwrap(), b"abcdef");

        backlog.append(b"ghijk");
        assert_eq!(backlog.block_count(), 1);
        assert_eq!(backlog.starting_offset(), 8);
        assert_eq!(backlog.read_range(8).unwrap(), b"ijk");
    }

    #[test]
    fn starting_offset_matches_evicted_bytes() {
        let mut backlog = backlog(10, 3);
        for i in 0..20u8 {
            backlog.append(&[i; 2]);
        }

        let stats = backlog.stats();
        assert_eq!(stats.bytes_evicted(), backlog.starting_offset());
        assert_eq!(
            backlog.ending_offset() - backlog.starting_offset(),
            backlog.used_bytes() as u64
        );
        assert!(backlog.used_bytes() <= backlog.capacity() + backlog.block_size());
    }

    #[test]
    fn read_range_into_appends_to_buffer() {
        let mut backlog = backlog(16, 4);
        backlog.append(b"hello");

        let mut out = b"> ".to_vec();
        let copied = backlog.read_range_into(1, &mut out).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(out, b"> ello");

        let err = backlog.read_range_into(6, &mut out);
        assert!(err.is_err());
        assert_eq!(out, b"> ello");
    }

    #[test]
    fn info_reports_window() {
        let mut backlog = backlog(4, 2);
        backlog.append(b"abc");
        backlog.append(b"de");

        let info = backlog.info();
        assert_eq!(info.starting_offset, backlog.starting_offset());
        assert_eq!(info.ending_offset, 5);
        assert_eq!(info.used_bytes, backlog.used_bytes());
        assert_eq!(info.block_count, backlog.block_count());
        assert_eq!(info.capacity, 4);
        assert_eq!(info.block_size, 2);
    }

    #[test]
    fn contains_offset_matches_window() {
        let mut backlog = backlog(4, 1);
        backlog.append(&[1]);
        backlog.append(&[2, 2]);
        backlog.append(&[3, 3, 3]);

        assert!(!backlog.contains_offset(2));
        assert!(backlog.contains_offset(3));
        assert!(backlog.contains_offset(6));
        assert!(!backlog.contains_offset(7));
    }

    #[test]
    fn stats_track_reads() {
        let mut backlog = backlog(16, 4);
        backlog.append(b"abcdef");
        backlog.read_range(2).unwrap();
        backlog.read_range(6).unwrap();

        let snap = backlog.stats().snapshot();
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.bytes_read, 4);
        assert_eq!(snap.bytes_appended, 6);
    }
}
