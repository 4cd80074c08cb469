//! POSIX file collaborator: creating, opening, sizing and deleting the shared file.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::errors::Result;
use crate::params::{OpenMode, TransferParameters};

/// Create (or join) the shared file, opened read-write.
///
/// Existing contents are kept: other workers may already be writing their partitions.
///
/// # Errors
///
/// Returns `XferError::Io` if the file cannot be created or opened.
pub fn create(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;
    Ok(file)
}

/// Open an existing file for the session's open mode.
///
/// # Errors
///
/// Returns `XferError::Io` if the file cannot be opened.
pub fn open(path: &Path, params: &TransferParameters) -> Result<File> {
    let mut opts = OpenOptions::new();
    opts.read(true);
    if params.mode() == OpenMode::Write {
        opts.write(true);
    }
    Ok(opts.open(path)?)
}

/// Set the file length to `size`, growing or shrinking it.
///
/// # Errors
///
/// Returns `XferError::Io` if `ftruncate` fails.
pub fn truncate(file: &File, size: u64) -> Result<()> {
    file.set_len(size)?;
    Ok(())
}

/// Size in bytes of the file at `path`.
///
/// # Errors
///
/// Returns `XferError::Io` if the file cannot be inspected.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)?.len())
}

/// Remove the file at `path`.
///
/// # Errors
///
/// Returns `XferError::Io` if the file cannot be removed.
pub fn delete(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    Ok(())
}
