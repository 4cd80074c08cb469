//! Integration tests for sessions backed by the segmented (uMMAP) strategy.

use mmap_xfer::{
    Access, MappingConfig, MmapBackend, MmapSession, OpenMode, StrategyKind, TransferParameters,
    XferError,
};
use std::fs;
use std::num::NonZeroUsize;
use tempfile::tempdir;

fn params(rank: u64) -> TransferParameters {
    TransferParameters::new(4096, 4, rank)
        .block_size(256)
        .open_mode(OpenMode::Write)
}

#[test]
fn sequential_blocks_reach_the_file_after_close() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seq.bin");

    let config = MappingConfig::segmented().segment_capacity(NonZeroUsize::new(2));
    let mut session = MmapSession::create(&path, params(1), config).expect("create");
    assert_eq!(session.strategy(), StrategyKind::Segmented);
    for i in 0..4u8 {
        let mut block = vec![0x10 + i; 256];
        session.xfer(Access::Write, &mut block, 256, 0).expect("write");
    }
    assert_eq!(session.cursor().current(), 1024 + 4 * 256);
    session.close().expect("close");

    let on_disk = fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), 4096);
    for i in 0..4usize {
        let start = 1024 + i * 256;
        assert!(on_disk[start..start + 256].iter().all(|&b| b == 0x10 + i as u8));
    }
    assert!(on_disk[..1024].iter().all(|&b| b == 0));
    assert!(on_disk[2048..].iter().all(|&b| b == 0));
}

#[test]
fn round_trip_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("round_trip.bin");

    let mut writer = MmapSession::create(&path, params(3), MappingConfig::segmented()).unwrap();
    let mut data: Vec<u8> = (0..256u32).map(|i| (i * 7) as u8).collect();
    let expected = data.clone();
    writer.xfer(Access::Write, &mut data, 256, 0).unwrap();
    writer.close().unwrap();

    let read_params = TransferParameters::new(4096, 4, 3).block_size(256);
    let mut reader = MmapSession::open(&path, read_params, MappingConfig::segmented()).unwrap();
    let mut back = vec![0u8; 256];
    reader.xfer(Access::Read, &mut back, 256, 0).unwrap();
    assert_eq!(back, expected);
    reader.close().unwrap();
}

#[test]
fn per_transfer_sync_is_visible_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sync.bin");

    let p = params(0).sync_per_transfer(true);
    let mut session = MmapSession::create(&path, p, MappingConfig::segmented()).unwrap();
    let mut block = vec![0xEE; 256];
    session.xfer(Access::Write, &mut block, 256, 0).unwrap();
    let on_disk = fs::read(&path).unwrap();
    assert!(on_disk[..256].iter().all(|&b| b == 0xEE));
    session.close().unwrap();
}

#[test]
fn boundary_at_end_of_region() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("boundary.bin");

    let p = params(3).random_offset(true);
    let mut session = MmapSession::create(&path, p, MappingConfig::segmented()).unwrap();
    let mut block = vec![2u8; 1025];
    // Rank 3 starts at 3072; requested 0 maps there, and 1024 bytes end exactly at 4096.
    session.xfer(Access::Write, &mut block, 1024, 0).expect("exact end");
    let err = session.xfer(Access::Write, &mut block, 1025, 0).unwrap_err();
    assert!(matches!(err, XferError::OutOfBounds { offset: 3072, len: 1025, total: 4096 }));
    session.close().unwrap();
}

#[test]
fn zero_block_size_cannot_be_segmented() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zero_block.bin");

    let p = params(0).block_size(0);
    let err = MmapSession::create(&path, p, MappingConfig::segmented()).unwrap_err();
    assert!(matches!(err, XferError::Mapping(_)));
}

#[test]
fn backend_reports_ummap() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("backend.bin");

    let backend = MmapBackend::segmented();
    assert_eq!(backend.name(), "uMMAP");
    let mut session = backend.create(&path, &params(2)).unwrap();
    let mut block = vec![5u8; 256];
    assert_eq!(backend.xfer(&mut session, Access::Write, &mut block, 256, 0).unwrap(), 256);
    backend.sync(&mut session, false).unwrap();
    backend.fsync(&mut session).unwrap();
    backend.close(&mut session).unwrap();
    assert!(matches!(backend.sync(&mut session, true), Err(XferError::SessionClosed)));
    assert_eq!(backend.get_file_size(&path).unwrap(), 4096);
    backend.delete(&path).unwrap();
    assert!(!path.exists());
}
