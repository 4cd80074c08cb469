//! Utility helpers for page alignment and safe range calculations.

use crate::errors::{Result, XferError};

/// Get the system page size in bytes.
#[must_use]
pub fn page_size() -> usize {
    unix_page_size()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unix_page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        4096
    } else {
        page_size as usize
    }
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value - value % alignment
}

/// Widen `[offset, offset+len)` so that it starts on a page boundary.
///
/// Advisory primitives reject unaligned addresses; the mapping base is always
/// page aligned, so aligning the offset aligns the address.
#[must_use]
pub fn page_span(offset: u64, len: u64) -> (u64, u64) {
    let start = align_down(offset, page_size() as u64);
    (start, len + (offset - start))
}

/// Ensure the requested [offset, offset+len) range is within [0, total).
/// Returns `Ok(())` if valid; otherwise an `OutOfBounds` error.
///
/// # Errors
///
/// Returns `XferError::OutOfBounds` if the range exceeds bounds or overflows.
pub fn ensure_in_bounds(offset: u64, len: u64, total: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= total => Ok(()),
        _ => Err(XferError::OutOfBounds { offset, len, total }),
    }
}

/// Compute a safe byte slice range for a given total length, returning start..end as usize tuple.
///
/// # Errors
///
/// Returns `XferError::OutOfBounds` if the requested range exceeds the total length.
#[allow(clippy::cast_possible_truncation)]
pub fn slice_range(offset: u64, len: u64, total: u64) -> Result<(usize, usize)> {
    ensure_in_bounds(offset, len, total)?;
    // Bounded by `total`, which is the length of a live mapping and fits in usize.
    let start = offset as usize;
    let end = (offset + len) as usize;
    Ok((start, end))
}

/// Convert a mapping length to `usize`, failing on targets where it cannot be addressed.
///
/// # Errors
///
/// Returns `XferError::Mapping` if `len` does not fit in the address space.
pub fn mapping_len(len: u64) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| XferError::Mapping(format!("length {len} exceeds address space")))
}
