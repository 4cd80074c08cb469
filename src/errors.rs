//! Crate-specific error types for mmap-xfer.

use std::io;
use thiserror::Error;

/// Result alias for mmap-xfer operations.
pub type Result<T> = std::result::Result<T, XferError>;

/// Error type covering partitioning, mapping, transfer, advisory and sync failures.
#[derive(Debug, Error)]
pub enum XferError {
    /// Wrapper for `std::io::Error` raised by the file collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Mapping could not be established or torn down.
    #[error("mapping failed: {0}")]
    Mapping(String),

    /// An access-pattern or eviction hint was rejected.
    #[error("advise failed: {0}")]
    Advisory(String),

    /// Dirty pages could not be flushed to the backing medium.
    #[error("sync failed: {0}")]
    Sync(String),

    /// A computed offset/length pair falls outside the mapped region.
    #[error("range out of bounds: offset={offset}, len={len}, total={total}")]
    OutOfBounds {
        /// Requested absolute offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Total length of the mapped region.
        total: u64,
    },

    /// Worker count or rank does not describe a valid partition.
    #[error("invalid partition: {0}")]
    Partition(String),

    /// Operation is not allowed for the mapping's protection or mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// Caller buffer is shorter than the requested transfer length.
    #[error("buffer too small: needed={needed}, available={available}")]
    BufferTooSmall {
        /// Bytes the transfer needs.
        needed: u64,
        /// Bytes the buffer holds.
        available: u64,
    },

    /// The session's mapping has already been torn down.
    #[error("session already closed")]
    SessionClosed,
}
