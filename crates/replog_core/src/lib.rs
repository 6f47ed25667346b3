//! # Replog Core
//!
//! A bounded, offset-addressable replication backlog.
//!
//! A primary appends every serialized write command to the backlog. When a
//! replica reconnects and reports the last offset it applied, the primary
//! asks the backlog for everything from that offset onwards. If the offset
//! is still retained the replica can catch up partially; otherwise the
//! backlog reports it unavailable and the caller falls back to a full
//! resynchronization.
//!
//! ## Design Principles
//!
//! - Records are opaque bytes; the backlog never inspects them
//! - Storage is a chain of fixed-capacity blocks, evicted whole from the head
//! - Offsets are 64-bit and only ever grow
//! - No persistence: a restarted process starts with an empty backlog
//!
//! ## Example
//!
//! ```rust
//! use replog_core::{Backlog, BacklogConfig};
//!
//! let config = BacklogConfig::new().capacity(4).block_size(1);
//! let mut backlog = Backlog::with_config(config).unwrap();
//!
//! backlog.append(&[1]);
//! backlog.append(&[2, 2]);
//! backlog.append(&[3, 3, 3]);
//!
//! assert_eq!(backlog.starting_offset(), 3);
//! assert_eq!(backlog.read_range(3).unwrap(), vec![3, 3, 3]);
//! assert!(backlog.read_range(0).unwrap_err().is_evicted());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backlog;
mod block;
mod config;
mod error;
mod shared;
mod stats;

pub use backlog::{Backlog, BacklogInfo};
pub use block::Block;
pub use config::BacklogConfig;
pub use error::{BacklogError, BacklogResult};
pub use shared::SharedBacklog;
pub use stats::{BacklogStats, StatsSnapshot};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
