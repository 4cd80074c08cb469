//! Flush modes for pushing dirty mapped pages to the backing file.

/// Whether a flush waits for the data to reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Wait until dirty pages are written back (`MS_SYNC`, or `fdatasync` for segments).
    #[default]
    Blocking,
    /// Schedule write-back and return immediately (`MS_ASYNC`, or write-back without `fdatasync`).
    NonBlocking,
}

impl FlushMode {
    /// Build from the `blocking` flag used by the harness.
    #[must_use]
    pub fn from_blocking(blocking: bool) -> Self {
        if blocking {
            Self::Blocking
        } else {
            Self::NonBlocking
        }
    }
}
