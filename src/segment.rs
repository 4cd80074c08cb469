//! Segmented strategy: a user-level mapping paged in fixed-size segments.
//!
//! The region is addressed as one flat byte range, but only the segments a
//! transfer touches are resident. Each resident segment is a heap buffer
//! filled from the file on fault (or zero-filled when loading is disabled)
//! and written back when flushed or evicted. With a capacity bound, faulting
//! a new segment first evicts the least recently used one.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::os::unix::fs::FileExt;

use log::debug;

use crate::advise::{file_advise, AccessAdvice};
use crate::config::StrategyKind;
use crate::errors::{Result, XferError};
use crate::flush::FlushMode;
use crate::strategy::{MappingStrategy, Protection};
use crate::utils::{ensure_in_bounds, mapping_len};

/// Parameters for establishing a segmented mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Total size of the flat region.
    pub size: u64,
    /// Bytes per segment.
    pub segment_size: u64,
    /// Page protection.
    pub protection: Protection,
    /// File offset the region starts at.
    pub file_offset: u64,
    /// Maximum resident segments; `None` is unbounded.
    pub capacity: Option<NonZeroUsize>,
    /// Read segment contents from the file on fault.
    pub load_on_fault: bool,
}

struct ResidentSegment {
    data: Vec<u8>,
    dirty: Option<Range<usize>>,
    stamp: u64,
}

impl ResidentSegment {
    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(d) => d.start.min(range.start)..d.end.max(range.end),
            None => range,
        });
    }
}

/// Resident segments plus their recency order.
///
/// Recency is only tracked under a capacity bound.
#[derive(Default)]
struct Residency {
    segments: HashMap<u64, ResidentSegment>,
    // Access stamp -> segment index, oldest first. Stamps start at 1.
    recency: BTreeMap<u64, u64>,
    clock: u64,
    bounded: bool,
}

impl Residency {
    fn new(bounded: bool) -> Self {
        Self {
            bounded,
            ..Self::default()
        }
    }

    fn touch(&mut self, index: u64) {
        if !self.bounded {
            return;
        }
        let Some(seg) = self.segments.get_mut(&index) else {
            return;
        };
        self.recency.remove(&seg.stamp);
        self.clock += 1;
        seg.stamp = self.clock;
        self.recency.insert(self.clock, index);
    }

    fn admit(&mut self, index: u64, data: Vec<u8>) {
        self.segments.insert(
            index,
            ResidentSegment {
                data,
                dirty: None,
                stamp: 0,
            },
        );
        self.touch(index);
    }

    fn least_recent(&self) -> Option<u64> {
        self.recency.first_key_value().map(|(_, &index)| index)
    }

    fn forget(&mut self, index: u64) -> Option<ResidentSegment> {
        let seg = self.segments.remove(&index)?;
        self.recency.remove(&seg.stamp);
        Some(seg)
    }
}

/// The file a segmented mapping pages against.
struct SegmentSource {
    file: File,
    opts: SegmentOptions,
}

impl SegmentSource {
    #[allow(clippy::cast_possible_truncation)]
    fn segment_len(&self, index: u64) -> usize {
        let start = index * self.opts.segment_size;
        // Bounded by segment_size, which fits in usize.
        (self.opts.size - start).min(self.opts.segment_size) as usize
    }

    fn segments_in(&self, offset: u64, len: u64) -> Range<u64> {
        if len == 0 {
            return 0..0;
        }
        let first = offset / self.opts.segment_size;
        let last = (offset + len - 1) / self.opts.segment_size;
        first..last + 1
    }

    fn write_back(&self, index: u64, seg: &mut ResidentSegment) -> Result<()> {
        let Some(dirty) = seg.dirty.take() else {
            return Ok(());
        };
        let pos = self.opts.file_offset + index * self.opts.segment_size + dirty.start as u64;
        self.file
            .write_all_at(&seg.data[dirty.clone()], pos)
            .map_err(|e| {
                seg.dirty = Some(dirty);
                XferError::Sync(format!("segment {index} write-back failed: {e}"))
            })
    }

    /// Write back every resident segment in `indices`, then drop it.
    fn release(&self, res: &mut Residency, indices: impl IntoIterator<Item = u64>) -> Result<()> {
        for index in indices {
            if let Some(seg) = res.segments.get_mut(&index) {
                self.write_back(index, seg)?;
            }
            res.forget(index);
        }
        Ok(())
    }

    fn fault_in(&self, res: &mut Residency, index: u64) -> Result<()> {
        if res.segments.contains_key(&index) {
            res.touch(index);
            return Ok(());
        }
        if let Some(cap) = self.opts.capacity {
            while res.segments.len() >= cap.get() {
                let Some(victim) = res.least_recent() else {
                    break;
                };
                self.release(res, [victim])?;
                debug!("segment {victim} evicted to admit {index}");
            }
        }
        let mut data = vec![0u8; self.segment_len(index)];
        if self.opts.load_on_fault {
            let pos = self.opts.file_offset + index * self.opts.segment_size;
            read_fully_at(&self.file, &mut data, pos)
                .map_err(|e| XferError::Mapping(format!("segment {index} fault-in failed: {e}")))?;
        }
        res.admit(index, data);
        Ok(())
    }

    fn sync_data(&self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|e| XferError::Sync(format!("fdatasync failed: {e}")))
    }

    fn drop_cached(&self, offset: u64, len: u64) -> Result<()> {
        file_advise(
            &self.file,
            self.opts.file_offset + offset,
            len,
            AccessAdvice::DontNeed,
        )
    }
}

/// Capacity-bounded, demand-paged mapping of a file region.
pub struct SegmentedMapping {
    source: SegmentSource,
    segment_count: u64,
    resident: Residency,
}

impl std::fmt::Debug for SegmentedMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentedMapping")
            .field("opts", &self.source.opts)
            .field("resident", &self.resident_segments())
            .finish()
    }
}

impl SegmentedMapping {
    /// Establish a segmented mapping over `file`.
    ///
    /// No segment is resident afterwards; they fault in on first access.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Mapping` for a zero size or segment size, a segment size that
    /// does not fit in memory, or a descriptor that cannot be duplicated.
    pub fn establish(file: &File, opts: SegmentOptions) -> Result<Self> {
        if opts.size == 0 {
            return Err(XferError::Mapping("cannot map a zero-length region".into()));
        }
        if opts.segment_size == 0 {
            return Err(XferError::Mapping("segment size must be greater than zero".into()));
        }
        mapping_len(opts.segment_size)?;
        let file = file
            .try_clone()
            .map_err(|e| XferError::Mapping(format!("cannot duplicate descriptor: {e}")))?;
        let segment_count = opts.size.div_ceil(opts.segment_size);
        debug!(
            "segmented mapping established: size={} segment_size={} segments={} capacity={:?}",
            opts.size, opts.segment_size, segment_count, opts.capacity
        );
        Ok(Self {
            source: SegmentSource { file, opts },
            segment_count,
            resident: Residency::new(opts.capacity.is_some()),
        })
    }

    /// Number of segments currently resident.
    #[must_use]
    pub fn resident_segments(&self) -> usize {
        self.resident.segments.len()
    }

    /// Total number of segments covering the region.
    #[must_use]
    pub fn segment_count(&self) -> u64 {
        self.segment_count
    }

    /// Options the mapping was established with.
    #[must_use]
    pub fn options(&self) -> &SegmentOptions {
        &self.source.opts
    }

    /// Visit `[offset, offset+len)` segment by segment, faulting each in.
    fn for_each_piece<F>(&mut self, offset: u64, len: u64, mut f: F) -> Result<()>
    where
        F: FnMut(&mut ResidentSegment, Range<usize>, Range<usize>),
    {
        let Self {
            source, resident, ..
        } = self;
        ensure_in_bounds(offset, len, source.opts.size)?;
        let mut done = 0usize;
        for index in source.segments_in(offset, len) {
            source.fault_in(resident, index)?;
            let seg_start = index * source.opts.segment_size;
            let from = offset.max(seg_start);
            let to = (offset + len).min(seg_start + source.segment_len(index) as u64);
            #[allow(clippy::cast_possible_truncation)]
            let (inner, piece) = ((from - seg_start) as usize, (to - from) as usize);
            if let Some(seg) = resident.segments.get_mut(&index) {
                f(seg, inner..inner + piece, done..done + piece);
            }
            done += piece;
        }
        Ok(())
    }
}

/// Read until `buf` is full; bytes past end of file stay zero.
fn read_fully_at(file: &File, buf: &mut [u8], mut pos: u64) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read_at(&mut buf[filled..], pos) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                pos += n as u64;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

impl MappingStrategy for SegmentedMapping {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Segmented
    }

    fn len(&self) -> u64 {
        self.source.opts.size
    }

    fn protection(&self) -> Protection {
        self.source.opts.protection
    }

    fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.for_each_piece(offset, buf.len() as u64, |seg, inner, outer| {
            buf[outer].copy_from_slice(&seg.data[inner]);
        })
    }

    fn write_from(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.source.opts.protection.is_writable() {
            return Err(XferError::InvalidMode("cannot write to a read-only mapping"));
        }
        self.for_each_piece(offset, data.len() as u64, |seg, inner, outer| {
            seg.data[inner.clone()].copy_from_slice(&data[outer]);
            seg.mark_dirty(inner);
        })
    }

    fn flush(&mut self, offset: u64, len: u64, mode: FlushMode) -> Result<()> {
        let source = &self.source;
        if len == 0 || !source.opts.protection.is_writable() {
            return Ok(());
        }
        ensure_in_bounds(offset, len, source.opts.size)?;
        for index in source.segments_in(offset, len) {
            if let Some(seg) = self.resident.segments.get_mut(&index) {
                source.write_back(index, seg)?;
            }
        }
        if mode == FlushMode::Blocking {
            source.sync_data()?;
        }
        Ok(())
    }

    fn evict(&mut self, offset: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        ensure_in_bounds(offset, len, self.source.opts.size)?;
        self.source
            .release(&mut self.resident, self.source.segments_in(offset, len))?;
        self.source.drop_cached(offset, len)
    }

    fn advise(&mut self, offset: u64, len: u64, advice: AccessAdvice) -> Result<()> {
        ensure_in_bounds(offset, len, self.source.opts.size)?;
        file_advise(
            &self.source.file,
            self.source.opts.file_offset + offset,
            len,
            advice,
        )
    }

    // Write-back, durability and release of the range happen in one pass.
    fn sync_evict(&mut self, offset: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        ensure_in_bounds(offset, len, self.source.opts.size)?;
        self.source
            .release(&mut self.resident, self.source.segments_in(offset, len))?;
        if self.source.opts.protection.is_writable() {
            self.source.sync_data()?;
        }
        self.source.drop_cached(offset, len)
    }

    fn teardown(mut self: Box<Self>) -> Result<()> {
        let indices: Vec<u64> = self.resident.segments.keys().copied().collect();
        let Self {
            source, resident, ..
        } = &mut *self;
        source
            .release(resident, indices)
            .map_err(|e| XferError::Mapping(format!("teardown failed: {e}")))?;
        debug!("segmented mapping released: size={}", source.opts.size);
        Ok(())
    }
}
