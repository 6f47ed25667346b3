//! Error types for backlog operations.

use thiserror::Error;

/// Result type for backlog operations.
pub type BacklogResult<T> = Result<T, BacklogError>;

/// Errors that can occur in backlog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BacklogError {
    /// The requested offset lies outside the retained window.
    ///
    /// Raised both for offsets that were already trimmed away and for
    /// offsets that have not been written yet. Use [`is_evicted`] and
    /// [`is_ahead`] to tell the two apart.
    ///
    /// [`is_evicted`]: BacklogError::is_evicted
    /// [`is_ahead`]: BacklogError::is_ahead
    #[error("offset {offset} not available: backlog holds [{starting}, {ending}]")]
    OffsetUnavailable {
        /// The requested offset.
        offset: u64,
        /// The starting offset at the time of the request.
        starting: u64,
        /// The ending offset at the time of the request.
        ending: u64,
    },

    /// The backlog configuration is invalid.
    #[error("invalid backlog configuration: {0}")]
    InvalidConfig(String),
}

impl BacklogError {
    /// Returns true if the offset was older than anything still retained.
    ///
    /// Callers usually answer this with a full resynchronization.
    #[must_use]
    pub fn is_evicted(&self) -> bool {
        matches!(self, Self::OffsetUnavailable { offset, starting, .. } if offset < starting)
    }

    /// Returns true if the offset was past the last byte written.
    #[must_use]
    pub fn is_ahead(&self) -> bool {
        matches!(self, Self::OffsetUnavailable { offset, ending, .. } if offset > ending)
    }
}
