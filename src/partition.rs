//! Per-worker partitioning of a shared file and the sequential cursor.
//!
//! Every worker owns `aggregate / workers` bytes starting at `rank * rank_size`.
//! The trailing `aggregate % workers` bytes belong to nobody.

use crate::errors::{Result, XferError};
use crate::params::TransferParameters;

/// Byte range of the shared file owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionWindow {
    /// Offset where this worker's partition begins.
    pub rank_offset: u64,
    /// Extent of the partition.
    pub rank_size: u64,
}

impl PartitionWindow {
    /// Absolute offset for a random transfer at `requested` within this partition.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Partition` when the partition is empty.
    pub fn random_offset(&self, requested: u64) -> Result<u64> {
        if self.rank_size == 0 {
            return Err(XferError::Partition(
                "random access into an empty partition".into(),
            ));
        }
        Ok(self.rank_offset + requested % self.rank_size)
    }

    /// One past the last byte of the partition.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.rank_offset + self.rank_size
    }
}

/// Derive the window for `rank` out of `num_tasks` workers.
///
/// # Errors
///
/// Returns `XferError::Partition` if `num_tasks` is zero or `rank` is out of range.
pub fn compute_window(aggregate_size: u64, num_tasks: u64, rank: u64) -> Result<PartitionWindow> {
    if num_tasks == 0 {
        return Err(XferError::Partition("worker count must be greater than zero".into()));
    }
    if rank >= num_tasks {
        return Err(XferError::Partition(format!(
            "rank {rank} out of range for {num_tasks} workers"
        )));
    }
    let rank_size = aggregate_size / num_tasks;
    Ok(PartitionWindow {
        rank_offset: rank * rank_size,
        rank_size,
    })
}

/// Window for the worker described by `params`.
///
/// # Errors
///
/// See [`compute_window`].
pub fn window_for(params: &TransferParameters) -> Result<PartitionWindow> {
    compute_window(params.aggregate_size(), params.num_tasks(), params.rank())
}

/// Sequential position inside the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    current: u64,
}

impl Cursor {
    /// Cursor positioned at the start of `window`.
    #[must_use]
    pub fn at_start(window: &PartitionWindow) -> Self {
        Self {
            current: window.rank_offset,
        }
    }

    /// Current absolute offset.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Move forward by one block.
    pub fn advance(&mut self, block_size: u64) {
        self.current = self.current.saturating_add(block_size);
    }
}
