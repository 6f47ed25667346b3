//! Backlog configuration.

use crate::error::{BacklogError, BacklogResult};

/// Configuration for a replication backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklogConfig {
    /// Soft upper bound, in bytes, on retained payload.
    ///
    /// Eviction is block-granular, so the backlog may exceed this by up to
    /// one block until the whole oldest block can be dropped.
    pub capacity: usize,

    /// Size of newly allocated blocks.
    ///
    /// Records larger than this get a block sized to fit them.
    pub block_size: usize,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            capacity: 1024 * 1024, // 1 MB
            block_size: 16 * 1024, // 16 KB
        }
    }
}

impl BacklogConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retained-bytes capacity.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the default block size.
    #[must_use]
    pub const fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Checks that both sizes are positive.
    ///
    /// # Errors
    ///
    /// Returns [`BacklogError::InvalidConfig`] if the capacity or the block
    /// size is zero.
    pub fn validate(&self) -> BacklogResult<()> {
        if self.capacity == 0 {
            return Err(BacklogError::InvalidConfig(
                "capacity must be positive".into(),
            ));
        }
        if self.block_size == 0 {
            return Err(BacklogError::InvalidConfig(
                "block size must be positive".into(),
            ));
        }
        Ok(())
    }
}
