#![cfg(feature = "async")]
//! Async file helpers used alongside a mapping backend.

use mmap_xfer::backend::r#async::{create_file_async, delete_async, file_size_async};
use mmap_xfer::{Access, MappingConfig, MmapSession, TransferParameters};
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread")]
async fn create_then_map_then_delete() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("async.bin");

    create_file_async(&path, 2048).await.expect("create");
    assert_eq!(file_size_async(&path).await.expect("size"), 2048);

    let params = TransferParameters::new(2048, 2, 1).block_size(1024);
    let mut session = MmapSession::open(&path, params, MappingConfig::direct()).expect("open");
    let mut buf = vec![1u8; 1024];
    session.xfer(Access::Read, &mut buf, 1024, 0).expect("read");
    assert!(buf.iter().all(|&b| b == 0));
    session.close().expect("close");

    delete_async(&path).await.expect("delete");
    assert!(!path.exists());
}
