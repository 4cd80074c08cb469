//! Access-pattern and eviction hints for the page-cache manager.

use std::fs::File;

use crate::errors::{Result, XferError};

/// Advice passed to the memory or page-cache manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessAdvice {
    /// No special treatment.
    Normal,
    /// Expect sequential access; read ahead aggressively.
    Sequential,
    /// Expect random access; disable read-ahead.
    Random,
    /// Cached pages in the range are no longer needed.
    DontNeed,
}

impl AccessAdvice {
    /// Advice matching the session's access pattern.
    #[must_use]
    pub fn for_pattern(random: bool) -> Self {
        if random {
            Self::Random
        } else {
            Self::Sequential
        }
    }
}

/// Advise on `len` bytes of mapped memory starting at `addr`.
///
/// `addr` must be page aligned and lie inside a live mapping of at least `len` bytes.
///
/// # Errors
///
/// Returns `XferError::Advisory` if the kernel rejects the hint.
pub(crate) fn memory_advise(addr: *const u8, len: usize, advice: AccessAdvice) -> Result<()> {
    use libc::{
        posix_madvise, POSIX_MADV_DONTNEED, POSIX_MADV_NORMAL, POSIX_MADV_RANDOM,
        POSIX_MADV_SEQUENTIAL,
    };

    if len == 0 {
        return Ok(());
    }
    let flag = match advice {
        AccessAdvice::Normal => POSIX_MADV_NORMAL,
        AccessAdvice::Sequential => POSIX_MADV_SEQUENTIAL,
        AccessAdvice::Random => POSIX_MADV_RANDOM,
        AccessAdvice::DontNeed => POSIX_MADV_DONTNEED,
    };
    // SAFETY: the caller guarantees [addr, addr+len) is inside a live mapping.
    let rc = unsafe { posix_madvise(addr as *mut libc::c_void, len, flag) };
    if rc != 0 {
        let err = std::io::Error::from_raw_os_error(rc);
        return Err(XferError::Advisory(format!("posix_madvise({advice:?}) failed: {err}")));
    }
    Ok(())
}

/// Advise on `[offset, offset+len)` of the file behind `file`.
///
/// Only Linux and Android expose `posix_fadvise`; elsewhere the hint is dropped.
///
/// # Errors
///
/// Returns `XferError::Advisory` if the kernel rejects the hint.
pub(crate) fn file_advise(file: &File, offset: u64, len: u64, advice: AccessAdvice) -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(any(target_os = "linux", target_os = "android"))] {
            use std::os::unix::io::AsRawFd;
            use libc::{
                posix_fadvise, POSIX_FADV_DONTNEED, POSIX_FADV_NORMAL, POSIX_FADV_RANDOM,
                POSIX_FADV_SEQUENTIAL,
            };

            if len == 0 {
                return Ok(());
            }
            let flag = match advice {
                AccessAdvice::Normal => POSIX_FADV_NORMAL,
                AccessAdvice::Sequential => POSIX_FADV_SEQUENTIAL,
                AccessAdvice::Random => POSIX_FADV_RANDOM,
                AccessAdvice::DontNeed => POSIX_FADV_DONTNEED,
            };
            let (Ok(off), Ok(span)) = (libc::off_t::try_from(offset), libc::off_t::try_from(len)) else {
                return Err(XferError::Advisory(format!(
                    "range offset={offset} len={len} exceeds off_t"
                )));
            };
            // SAFETY: posix_fadvise only reads its arguments; the descriptor is owned by `file`.
            let rc = unsafe { posix_fadvise(file.as_raw_fd(), off, span, flag) };
            if rc != 0 {
                let err = std::io::Error::from_raw_os_error(rc);
                return Err(XferError::Advisory(format!("posix_fadvise({advice:?}) failed: {err}")));
            }
            Ok(())
        } else {
            let _ = (file, offset, len, advice);
            Ok(())
        }
    }
}
