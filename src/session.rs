//! One worker's open-mapping session and the transfer engine.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::warn;

use crate::config::{MappingConfig, StrategyKind};
use crate::errors::{Result, XferError};
use crate::flush::FlushMode;
use crate::manager;
use crate::params::{Access, OpenMode, TransferParameters};
use crate::partition::{window_for, Cursor, PartitionWindow};
use crate::strategy::MappingStrategy;

/// A worker's view of the shared file: its descriptor, mapping, window and cursor.
///
/// All state is owned by the session; nothing is process-global, so several
/// sessions may run on threads of one process as long as their windows are disjoint.
///
/// # Examples
///
/// ```no_run
/// use mmap_xfer::{Access, MappingConfig, MmapSession, OpenMode, TransferParameters};
///
/// let params = TransferParameters::new(1024, 4, 2)
///     .block_size(256)
///     .open_mode(OpenMode::Write);
/// let mut session = MmapSession::create("shared.bin", params, MappingConfig::direct())?;
/// let mut block = vec![0xAB; 256];
/// session.xfer(Access::Write, &mut block, 256, 0)?;
/// assert_eq!(session.cursor().current(), 768);
/// session.close()?;
/// # Ok::<(), mmap_xfer::XferError>(())
/// ```
pub struct MmapSession {
    path: PathBuf,
    params: TransferParameters,
    config: MappingConfig,
    window: PartitionWindow,
    cursor: Cursor,
    file: Option<File>,
    mapping: Option<Box<dyn MappingStrategy>>,
}

impl std::fmt::Debug for MmapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapSession")
            .field("path", &self.path)
            .field("window", &self.window)
            .field("cursor", &self.cursor)
            .field("strategy", &self.config.strategy())
            .field("open", &self.is_open())
            .finish()
    }
}

impl MmapSession {
    /// Create the shared file, size it to the aggregate and map it.
    ///
    /// A created file is always mapped writable, so the session records
    /// [`OpenMode::Write`] regardless of the mode in `params`.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Partition` for invalid worker parameters, and any
    /// file or mapping error from setup.
    pub fn create<P: AsRef<Path>>(
        path: P,
        params: TransferParameters,
        config: MappingConfig,
    ) -> Result<Self> {
        let params = params.open_mode(OpenMode::Write);
        let window = window_for(&params)?;
        let (file, mapping) = manager::create_mapping(path.as_ref(), &params, &window, &config)?;
        Ok(Self::assemble(path.as_ref(), params, config, window, file, mapping))
    }

    /// Open an existing file and map it.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Partition` for invalid worker parameters, and any
    /// file or mapping error from setup.
    pub fn open<P: AsRef<Path>>(
        path: P,
        params: TransferParameters,
        config: MappingConfig,
    ) -> Result<Self> {
        let window = window_for(&params)?;
        let (file, mapping) = manager::open_mapping(path.as_ref(), &params, &window, &config)?;
        Ok(Self::assemble(path.as_ref(), params, config, window, file, mapping))
    }

    fn assemble(
        path: &Path,
        params: TransferParameters,
        config: MappingConfig,
        window: PartitionWindow,
        file: File,
        mapping: Box<dyn MappingStrategy>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            params,
            config,
            window,
            cursor: Cursor::at_start(&window),
            file: Some(file),
            mapping: Some(mapping),
        }
    }

    /// Transfer `length` bytes between `buffer` and this worker's partition.
    ///
    /// Sequential sessions use and advance the cursor; `requested_offset` is only
    /// consulted for random access, where it wraps inside the partition.
    /// Returns `length` on success.
    ///
    /// # Errors
    ///
    /// Returns `XferError::BufferTooSmall` if `buffer` holds fewer than `length` bytes,
    /// `XferError::OutOfBounds` if the transfer would leave the mapping,
    /// `XferError::SessionClosed` after [`MmapSession::close`], and any flush error
    /// from a per-transfer sync.
    pub fn xfer(
        &mut self,
        access: Access,
        buffer: &mut [u8],
        length: u64,
        requested_offset: u64,
    ) -> Result<u64> {
        let available = buffer.len() as u64;
        if length > available {
            return Err(XferError::BufferTooSmall { needed: length, available });
        }
        let offset = if self.params.is_random() {
            self.window.random_offset(requested_offset)?
        } else {
            self.cursor.current()
        };

        let mapping = self.mapping.as_mut().ok_or(XferError::SessionClosed)?;
        #[allow(clippy::cast_possible_truncation)]
        let buf = &mut buffer[..length as usize];
        match access {
            Access::Write => mapping.write_from(offset, buf)?,
            Access::Read => mapping.read_into(offset, buf)?,
        }

        if self.params.syncs_per_transfer() {
            match mapping.sync_evict(offset, length) {
                Ok(()) => {}
                Err(e @ XferError::Advisory(_)) => self.config.advisory_policy().handle(e)?,
                Err(e) => return Err(e),
            }
        }

        if !self.params.is_random() {
            self.cursor.advance(self.params.block_size_bytes());
        }
        Ok(length)
    }

    /// Flush the whole mapping with the given mode.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Sync` if the flush fails, or `XferError::SessionClosed`.
    pub fn sync(&mut self, mode: FlushMode) -> Result<()> {
        let mapping = self.mapping.as_mut().ok_or(XferError::SessionClosed)?;
        let len = mapping.len();
        mapping.flush(0, len, mode)
    }

    /// Blocking flush of the whole mapping. A flush failure is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns `XferError::SessionClosed` after [`MmapSession::close`].
    pub fn fsync(&mut self) -> Result<()> {
        match self.sync(FlushMode::Blocking) {
            Err(XferError::SessionClosed) => Err(XferError::SessionClosed),
            Err(e) => {
                warn!("fsync of {} failed: {e}", self.path.display());
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Tear down the mapping and close the file.
    ///
    /// # Errors
    ///
    /// Returns `XferError::Mapping` if the mapping cannot be released, or
    /// `XferError::SessionClosed` if it already was.
    pub fn close(&mut self) -> Result<()> {
        let mapping = self.mapping.take().ok_or(XferError::SessionClosed)?;
        let file = self.file.take().ok_or(XferError::SessionClosed)?;
        manager::release(mapping, file)
    }

    /// Whether the mapping is still live.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.mapping.is_some()
    }

    /// This worker's partition.
    #[must_use]
    pub fn window(&self) -> PartitionWindow {
        self.window
    }

    /// Sequential cursor.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Parameters the session was opened with.
    #[must_use]
    pub fn params(&self) -> &TransferParameters {
        &self.params
    }

    /// Strategy backing the mapping.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.config.strategy()
    }

    /// Mapped length, or zero once closed.
    #[must_use]
    pub fn mapped_len(&self) -> u64 {
        self.mapping.as_ref().map_or(0, |m| m.len())
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
