//! Per-session transfer parameters supplied by the benchmarking harness.

/// How the backing file is opened, and therefore how it is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-only open; the mapping is read-only.
    #[default]
    Read,
    /// Read-write open; the mapping is readable and writable.
    Write,
}

/// Direction of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Copy from the caller buffer into the mapping.
    Write,
    /// Copy from the mapping into the caller buffer.
    Read,
}

/// Parameters that stay fixed for one open-mapping session.
///
/// # Examples
///
/// ```
/// use mmap_xfer::{OpenMode, TransferParameters};
///
/// let params = TransferParameters::new(1024, 4, 2)
///     .block_size(256)
///     .open_mode(OpenMode::Write);
/// assert_eq!(params.rank(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParameters {
    aggregate_size: u64,
    num_tasks: u64,
    rank: u64,
    block_size: u64,
    random_offset: bool,
    sync_per_transfer: bool,
    open_mode: OpenMode,
}

impl TransferParameters {
    /// Parameters for worker `rank` out of `num_tasks` sharing a file of `aggregate_size` bytes.
    ///
    /// Block size defaults to the per-worker share; access is sequential, no per-transfer
    /// sync, read-only open.
    #[must_use]
    pub fn new(aggregate_size: u64, num_tasks: u64, rank: u64) -> Self {
        Self {
            aggregate_size,
            num_tasks,
            rank,
            block_size: aggregate_size.checked_div(num_tasks).unwrap_or(0),
            random_offset: false,
            sync_per_transfer: false,
            open_mode: OpenMode::Read,
        }
    }

    /// Set the unit of sequential cursor advance.
    #[must_use]
    pub fn block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Select random (true) or sequential (false) offsets.
    #[must_use]
    pub fn random_offset(mut self, random: bool) -> Self {
        self.random_offset = random;
        self
    }

    /// Flush and evict the touched range after every transfer.
    #[must_use]
    pub fn sync_per_transfer(mut self, sync: bool) -> Self {
        self.sync_per_transfer = sync;
        self
    }

    /// Set the open mode.
    #[must_use]
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Aggregate file size across all workers.
    #[must_use]
    pub fn aggregate_size(&self) -> u64 {
        self.aggregate_size
    }

    /// Number of workers sharing the file.
    #[must_use]
    pub fn num_tasks(&self) -> u64 {
        self.num_tasks
    }

    /// This worker's rank.
    #[must_use]
    pub fn rank(&self) -> u64 {
        self.rank
    }

    /// Sequential advance per transfer.
    #[must_use]
    pub fn block_size_bytes(&self) -> u64 {
        self.block_size
    }

    /// Whether offsets are randomized.
    #[must_use]
    pub fn is_random(&self) -> bool {
        self.random_offset
    }

    /// Whether each transfer is followed by a flush and eviction.
    #[must_use]
    pub fn syncs_per_transfer(&self) -> bool {
        self.sync_per_transfer
    }

    /// Open mode.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.open_mode
    }
}
