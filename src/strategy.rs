//! Capability interface shared by the mapping strategies.
//!
//! The transfer engine and the lifecycle manager only talk to a mapping
//! through [`MappingStrategy`]; the direct and segmented backends differ
//! solely in how they establish, flush, evict and tear down the region.

use crate::advise::AccessAdvice;
use crate::config::StrategyKind;
use crate::errors::Result;
use crate::flush::FlushMode;
use crate::params::OpenMode;

/// Page protection of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Readable only.
    ReadOnly,
    /// Readable and writable.
    ReadWrite,
}

impl Protection {
    /// Protection implied by an open mode.
    #[must_use]
    pub fn for_mode(mode: OpenMode) -> Self {
        match mode {
            OpenMode::Read => Self::ReadOnly,
            OpenMode::Write => Self::ReadWrite,
        }
    }

    /// Whether writes are permitted.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// A live mapping of the aggregate region, addressed by absolute byte offset.
///
/// All ranges are bounds-checked by the implementation; an out-of-range
/// request fails with `XferError::OutOfBounds` and touches nothing.
pub trait MappingStrategy: Send {
    /// Which strategy produced this mapping.
    fn kind(&self) -> StrategyKind;

    /// Mapped length in bytes.
    fn len(&self) -> u64;

    /// Whether the mapping is empty. Established mappings never are.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Page protection.
    fn protection(&self) -> Protection;

    /// Copy `buf.len()` bytes at `offset` into `buf`.
    fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Copy `data` into the mapping at `offset`.
    fn write_from(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Push dirty data in `[offset, offset+len)` to the backing file.
    fn flush(&mut self, offset: u64, len: u64, mode: FlushMode) -> Result<()>;

    /// Drop cached pages in `[offset, offset+len)`.
    fn evict(&mut self, offset: u64, len: u64) -> Result<()>;

    /// Hint the expected access pattern for `[offset, offset+len)`.
    fn advise(&mut self, offset: u64, len: u64, advice: AccessAdvice) -> Result<()>;

    /// Blocking flush followed by eviction over the same range.
    fn sync_evict(&mut self, offset: u64, len: u64) -> Result<()> {
        self.flush(offset, len, FlushMode::Blocking)?;
        self.evict(offset, len)
    }

    /// Release the mapping.
    fn teardown(self: Box<Self>) -> Result<()>;
}
