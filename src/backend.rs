//! Operation table consumed by the benchmarking harness.
//!
//! Provides the fixed set {create, open, xfer, close, sync, fsync, delete, get_file_size}
//! for one mapping strategy.

use std::path::Path;

use crate::config::{MappingConfig, StrategyKind};
use crate::errors::Result;
use crate::flush::FlushMode;
use crate::params::{Access, TransferParameters};
use crate::posix;
use crate::session::MmapSession;

/// A mapping backend as seen by the harness.
///
/// # Examples
///
/// ```no_run
/// use mmap_xfer::{Access, MmapBackend, OpenMode, TransferParameters};
///
/// let backend = MmapBackend::from_env_direct();
/// let params = TransferParameters::new(1 << 20, 1, 0)
///     .block_size(4096)
///     .open_mode(OpenMode::Write);
/// let mut session = backend.create("ior.bin", &params)?;
/// let mut block = vec![7u8; 4096];
/// backend.xfer(&mut session, Access::Write, &mut block, 4096, 0)?;
/// backend.fsync(&mut session)?;
/// backend.close(&mut session)?;
/// # Ok::<(), mmap_xfer::XferError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapBackend {
    config: MappingConfig,
}

impl MmapBackend {
    /// Backend with an explicit configuration.
    #[must_use]
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    /// Direct ("MMAP") backend with the private-anonymous toggle read from the environment.
    #[must_use]
    pub fn from_env_direct() -> Self {
        Self::new(MappingConfig::from_env(StrategyKind::Direct))
    }

    /// Segmented ("uMMAP") backend with default settings.
    #[must_use]
    pub fn segmented() -> Self {
        Self::new(MappingConfig::segmented())
    }

    /// Name reported to the harness.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.config.strategy().backend_name()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Create and map the shared file.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::create`].
    pub fn create<P: AsRef<Path>>(&self, path: P, params: &TransferParameters) -> Result<MmapSession> {
        MmapSession::create(path, *params, self.config)
    }

    /// Open and map an existing file.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::open`].
    pub fn open<P: AsRef<Path>>(&self, path: P, params: &TransferParameters) -> Result<MmapSession> {
        MmapSession::open(path, *params, self.config)
    }

    /// Transfer one block.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::xfer`].
    pub fn xfer(
        &self,
        session: &mut MmapSession,
        access: Access,
        buffer: &mut [u8],
        length: u64,
        requested_offset: u64,
    ) -> Result<u64> {
        session.xfer(access, buffer, length, requested_offset)
    }

    /// Unmap and close.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::close`].
    pub fn close(&self, session: &mut MmapSession) -> Result<()> {
        session.close()
    }

    /// Flush the whole mapping, waiting for storage when `blocking` is set.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::sync`].
    pub fn sync(&self, session: &mut MmapSession, blocking: bool) -> Result<()> {
        session.sync(FlushMode::from_blocking(blocking))
    }

    /// Flush the whole mapping; failures are only logged.
    ///
    /// # Errors
    ///
    /// See [`MmapSession::fsync`].
    pub fn fsync(&self, session: &mut MmapSession) -> Result<()> {
        session.fsync()
    }

    /// Remove the file.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Io` if removal fails.
    pub fn delete<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        posix::delete(path.as_ref())
    }

    /// Size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Io` if the file cannot be inspected.
    pub fn get_file_size<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        posix::file_size(path.as_ref())
    }
}

#[cfg(feature = "async")]
pub mod r#async {
    //! Async helpers (Tokio) for the file operations that do not touch the mapping.
    use std::path::Path;

    use tokio::fs as tfs;

    use crate::errors::Result;
use crate::flush::FlushMode;

    /// Create the shared file and size it to `size` without blocking the runtime.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Io` if creation or resizing fails.
    pub async fn create_file_async<P: AsRef<Path>>(path: P, size: u64) -> Result<()> {
        let file = tfs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path.as_ref())
            .await?;
        file.set_len(size).await?;
        Ok(())
    }

    /// Size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Io` if the file cannot be inspected.
    pub async fn file_size_async<P: AsRef<Path>>(path: P) -> Result<u64> {
        Ok(tfs::metadata(path).await?.len())
    }

    /// Remove the file.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Io` if removal fails.
    pub async fn delete_async<P: AsRef<Path>>(path: P) -> Result<()> {
        tfs::remove_file(path).await?;
        Ok(())
    }
}
