//! Private anonymous mode: the mapping never reaches the backing file.

use mmap_xfer::{
    Access, MappingConfig, MmapBackend, MmapSession, OpenMode, StrategyKind, TransferParameters,
    MEMALLOC_ENV,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn writes_never_reach_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anon.bin");

    let params = TransferParameters::new(8192, 2, 0)
        .block_size(4096)
        .random_offset(true)
        .open_mode(OpenMode::Write);
    let config = MappingConfig::direct().private_anonymous(true);
    let mut writer = MmapSession::create(&path, params, config).expect("create");
    let mut block = vec![0xA5u8; 4096];
    writer.xfer(Access::Write, &mut block, 4096, 0).expect("write");
    writer.fsync().expect("fsync");

    // The writer sees its own data.
    let mut own = vec![0u8; 4096];
    writer.xfer(Access::Read, &mut own, 4096, 0).expect("read back");
    assert!(own.iter().all(|&b| b == 0xA5));

    // A concurrent shared reopen of the file observes nothing.
    let shared = TransferParameters::new(8192, 2, 0).block_size(4096);
    let mut observer = MmapSession::open(&path, shared, MappingConfig::direct()).expect("open shared");
    let mut seen = vec![0xFFu8; 4096];
    observer.xfer(Access::Read, &mut seen, 4096, 0).expect("read shared");
    assert!(seen.iter().all(|&b| b == 0));
    observer.close().expect("close observer");

    writer.close().expect("close writer");
    assert!(fs::read(&path).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn environment_toggle_selects_anonymous_backing() {
    let config = MappingConfig::from_lookup(StrategyKind::Direct, |key| {
        (key == MEMALLOC_ENV).then(|| "true".to_string())
    });
    assert!(config.is_private_anonymous());

    let backend = MmapBackend::new(config);
    assert_eq!(backend.name(), "MMAP");
    assert!(backend.config().is_private_anonymous());
}
