//! Direct strategy: one OS-level mapping over the whole aggregate region.

use std::fs::File;

use log::debug;
use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::advise::{memory_advise, AccessAdvice};
use crate::config::StrategyKind;
use crate::errors::{Result, XferError};
use crate::flush::FlushMode;
use crate::strategy::{MappingStrategy, Protection};
use crate::utils::{ensure_in_bounds, mapping_len, page_span, slice_range};

// Error message constants
const ERR_ZERO_SIZE: &str = "cannot map a zero-length region";

/// Where the mapped pages come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Pages shared with the file through the OS page cache.
    SharedFile,
    /// Private, copy-on-write anonymous pages; the file is never touched.
    PrivateAnonymous,
}

enum MapVariant {
    Ro(Mmap),
    Rw(MmapMut),
}

impl MapVariant {
    fn as_ptr(&self) -> *const u8 {
        match self {
            Self::Ro(m) => m.as_ptr(),
            Self::Rw(m) => m.as_ptr(),
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::Ro(m) => &m[..],
            Self::Rw(m) => &m[..],
        }
    }
}

/// Mapping established with a single `mmap` call.
///
/// # Examples
///
/// ```no_run
/// use mmap_xfer::mmap::{Backing, DirectMapping};
/// use mmap_xfer::{MappingStrategy, Protection};
///
/// let file = std::fs::OpenOptions::new().read(true).write(true).open("shared.bin")?;
/// let mut map = DirectMapping::establish(Some(&file), 4096, Protection::ReadWrite, Backing::SharedFile)?;
/// map.write_from(0, b"block")?;
/// # Ok::<(), mmap_xfer::XferError>(())
/// ```
pub struct DirectMapping {
    map: MapVariant,
    len: u64,
    backing: Backing,
}

impl std::fmt::Debug for DirectMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectMapping")
            .field("len", &self.len)
            .field("backing", &self.backing)
            .field("protection", &self.protection())
            .finish()
    }
}

impl DirectMapping {
    /// Map `len` bytes, either from `file` at offset zero or as anonymous memory.
    ///
    /// `file` is ignored for [`Backing::PrivateAnonymous`] and required otherwise.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Mapping` if `len` is zero, does not fit the address space,
    /// no file is supplied for a shared mapping, or the `mmap` call fails.
    pub fn establish(
        file: Option<&File>,
        len: u64,
        protection: Protection,
        backing: Backing,
    ) -> Result<Self> {
        if len == 0 {
            return Err(XferError::Mapping(ERR_ZERO_SIZE.into()));
        }
        let size = mapping_len(len)?;
        let map = match backing {
            Backing::PrivateAnonymous => {
                let anon = MmapOptions::new()
                    .len(size)
                    .map_anon()
                    .map_err(|e| XferError::Mapping(format!("anonymous mmap failed: {e}")))?;
                match protection {
                    Protection::ReadWrite => MapVariant::Rw(anon),
                    Protection::ReadOnly => MapVariant::Ro(
                        anon.make_read_only()
                            .map_err(|e| XferError::Mapping(format!("mprotect failed: {e}")))?,
                    ),
                }
            }
            Backing::SharedFile => {
                let file = file.ok_or(XferError::InvalidMode("shared mapping requires a file"))?;
                let mut opts = MmapOptions::new();
                opts.len(size);
                // SAFETY: the file is sized to at least `len` before mapping, and other
                // workers only write disjoint partitions of it.
                let mapped = unsafe {
                    match protection {
                        Protection::ReadOnly => opts.map(file).map(MapVariant::Ro),
                        Protection::ReadWrite => opts.map_mut(file).map(MapVariant::Rw),
                    }
                };
                mapped.map_err(|e| XferError::Mapping(format!("mmap failed: {e}")))?
            }
        };
        debug!("direct mapping established: len={len} backing={backing:?} protection={protection:?}");
        Ok(Self { map, len, backing })
    }

    /// Where the pages come from.
    #[must_use]
    pub fn backing(&self) -> Backing {
        self.backing
    }

    fn advise_span(&self, offset: u64, len: u64, advice: AccessAdvice) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        ensure_in_bounds(offset, len, self.len)?;
        let (start, span) = page_span(offset, len);
        let (start, end) = slice_range(start, span, self.len)?;
        // SAFETY: start is within the mapping, checked above.
        let addr = unsafe { self.map.as_ptr().add(start) };
        memory_advise(addr, end - start, advice)
    }
}

impl MappingStrategy for DirectMapping {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Direct
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn protection(&self) -> Protection {
        match self.map {
            MapVariant::Ro(_) => Protection::ReadOnly,
            MapVariant::Rw(_) => Protection::ReadWrite,
        }
    }

    fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let (start, end) = slice_range(offset, buf.len() as u64, self.len)?;
        buf.copy_from_slice(&self.map.bytes()[start..end]);
        Ok(())
    }

    fn write_from(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let (start, end) = slice_range(offset, data.len() as u64, self.len)?;
        match &mut self.map {
            MapVariant::Ro(_) => Err(XferError::InvalidMode("cannot write to a read-only mapping")),
            MapVariant::Rw(m) => {
                m[start..end].copy_from_slice(data);
                Ok(())
            }
        }
    }

    fn flush(&mut self, offset: u64, len: u64, mode: FlushMode) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let (start, end) = slice_range(offset, len, self.len)?;
        match &self.map {
            MapVariant::Ro(_) => Ok(()),
            MapVariant::Rw(m) => {
                let res = match mode {
                    FlushMode::Blocking => m.flush_range(start, end - start),
                    FlushMode::NonBlocking => m.flush_async_range(start, end - start),
                };
                res.map_err(|e| XferError::Sync(format!("msync failed: {e}")))
            }
        }
    }

    fn evict(&mut self, offset: u64, len: u64) -> Result<()> {
        self.advise_span(offset, len, AccessAdvice::DontNeed)
    }

    fn advise(&mut self, offset: u64, len: u64, advice: AccessAdvice) -> Result<()> {
        self.advise_span(offset, len, advice)
    }

    fn teardown(self: Box<Self>) -> Result<()> {
        debug!("direct mapping released: len={}", self.len);
        drop(self);
        Ok(())
    }
}
