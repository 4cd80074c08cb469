//! Mapping lifecycle: session setup order, establishment, priming hints and teardown.
//!
//! Create: create file, size it to the aggregate, map.
//! Open: open file, check its size, map.
//! A mapping that fails to prime is torn down before the error surfaces.

use std::fs::File;
use std::path::Path;

use log::{debug, warn};

use crate::advise::AccessAdvice;
use crate::config::{MappingConfig, StrategyKind};
use crate::errors::{Result, XferError};
use crate::mmap::{Backing, DirectMapping};
use crate::params::{OpenMode, TransferParameters};
use crate::partition::PartitionWindow;
use crate::posix;
use crate::segment::{SegmentOptions, SegmentedMapping};
use crate::strategy::{MappingStrategy, Protection};

/// Map the aggregate region of `file` with the configured strategy, then prime it.
///
/// # Errors
///
/// Returns `XferError::Mapping` if establishment fails, or the priming hint's error
/// under a strict advisory policy.
pub fn establish(
    file: &File,
    params: &TransferParameters,
    window: &PartitionWindow,
    config: &MappingConfig,
) -> Result<Box<dyn MappingStrategy>> {
    let protection = Protection::for_mode(params.mode());
    let size = params.aggregate_size();
    let mapping: Box<dyn MappingStrategy> = match config.strategy() {
        StrategyKind::Direct => {
            let backing = if config.is_private_anonymous() {
                Backing::PrivateAnonymous
            } else {
                Backing::SharedFile
            };
            Box::new(DirectMapping::establish(Some(file), size, protection, backing)?)
        }
        StrategyKind::Segmented => Box::new(SegmentedMapping::establish(
            file,
            SegmentOptions {
                size,
                segment_size: params.block_size_bytes(),
                protection,
                file_offset: 0,
                capacity: config.capacity(),
                load_on_fault: config.loads_on_fault(),
            },
        )?),
    };

    // The direct mapping is primed as a whole; the segment pager only for this worker's window.
    let (offset, len) = match config.strategy() {
        StrategyKind::Direct => (0, size),
        StrategyKind::Segmented => (window.rank_offset, window.rank_size),
    };
    prime_or_release(mapping, offset, len, params, config)
}

/// Prime `mapping`, releasing it if priming fails. The priming error wins over
/// any failure to release.
fn prime_or_release(
    mut mapping: Box<dyn MappingStrategy>,
    offset: u64,
    len: u64,
    params: &TransferParameters,
    config: &MappingConfig,
) -> Result<Box<dyn MappingStrategy>> {
    if let Err(e) = prime(&mut *mapping, offset, len, params, config) {
        if let Err(teardown_err) = mapping.teardown() {
            warn!("releasing unprimed mapping failed: {teardown_err}");
        }
        return Err(e);
    }
    Ok(mapping)
}

fn prime(
    mapping: &mut dyn MappingStrategy,
    offset: u64,
    len: u64,
    params: &TransferParameters,
    config: &MappingConfig,
) -> Result<()> {
    let policy = config.advisory_policy();
    let pattern = AccessAdvice::for_pattern(params.is_random());
    if let Err(e) = mapping.advise(offset, len, pattern) {
        policy.handle(e)?;
    }
    // Start from a cold cache.
    if let Err(e) = mapping.advise(offset, len, AccessAdvice::DontNeed) {
        policy.handle(e)?;
    }
    Ok(())
}

/// Create the shared file, size it to the aggregate and map it.
///
/// The mapping is always writable, whatever open mode `params` carries.
///
/// # Errors
///
/// Returns `XferError::Io` from the file collaborator or any establishment error.
pub fn create_mapping(
    path: &Path,
    params: &TransferParameters,
    window: &PartitionWindow,
    config: &MappingConfig,
) -> Result<(File, Box<dyn MappingStrategy>)> {
    let file = posix::create(path)?;
    posix::truncate(&file, params.aggregate_size())?;
    let create_params = params.open_mode(OpenMode::Write);
    let mapping = establish(&file, &create_params, window, config)?;
    debug!("created {} for rank {}", path.display(), params.rank());
    Ok((file, mapping))
}

/// Open an existing file and map it without resizing.
///
/// # Errors
///
/// Returns `XferError::Mapping` if the file is shorter than the aggregate size
/// (unless the mapping is anonymous), plus any file or establishment error.
pub fn open_mapping(
    path: &Path,
    params: &TransferParameters,
    window: &PartitionWindow,
    config: &MappingConfig,
) -> Result<(File, Box<dyn MappingStrategy>)> {
    let file = posix::open(path, params)?;
    let on_disk = file.metadata()?.len();
    let anonymous = config.strategy() == StrategyKind::Direct && config.is_private_anonymous();
    if on_disk < params.aggregate_size() && !anonymous {
        return Err(XferError::Mapping(format!(
            "file is {on_disk} bytes, shorter than aggregate size {}",
            params.aggregate_size()
        )));
    }
    let mapping = establish(&file, params, window, config)?;
    debug!("opened {} for rank {}", path.display(), params.rank());
    Ok((file, mapping))
}

/// Release a mapping and then its file.
///
/// # Errors
///
/// Returns `XferError::Mapping` if the mapping cannot be released.
pub fn release(mapping: Box<dyn MappingStrategy>, file: File) -> Result<()> {
    mapping.teardown()?;
    drop(file);
    Ok(())
}
