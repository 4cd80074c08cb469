//! Several workers sharing one file from threads of the same process.

use mmap_xfer::{Access, MappingConfig, MmapSession, OpenMode, TransferParameters};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

const WORKERS: u64 = 4;
const BLOCK: u64 = 512;
const BLOCKS_PER_WORKER: u64 = 4;
const AGGREGATE: u64 = WORKERS * BLOCK * BLOCKS_PER_WORKER;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_xfer_workers_{}_{}", name, std::process::id()));
    p
}

fn run_workers(path: &Path, config: MappingConfig) {
    // Size the file once so every worker can join it.
    let params = TransferParameters::new(AGGREGATE, WORKERS, 0)
        .block_size(BLOCK)
        .open_mode(OpenMode::Write);
    MmapSession::create(path, params, config)
        .expect("create")
        .close()
        .expect("close");

    let handles: Vec<_> = (0..WORKERS)
        .map(|rank| {
            let path = path.to_path_buf();
            thread::spawn(move || {
                let params = TransferParameters::new(AGGREGATE, WORKERS, rank)
                    .block_size(BLOCK)
                    .open_mode(OpenMode::Write);
                let mut session = MmapSession::open(&path, params, config).expect("open");
                for _ in 0..BLOCKS_PER_WORKER {
                    let mut block = vec![rank as u8 + 1; BLOCK as usize];
                    session
                        .xfer(Access::Write, &mut block, BLOCK, 0)
                        .expect("xfer");
                }
                session.fsync().expect("fsync");
                session.close().expect("close");
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }
}

fn assert_partitions(path: &Path) {
    let data = fs::read(path).expect("read");
    assert_eq!(data.len() as u64, AGGREGATE);
    let share = (AGGREGATE / WORKERS) as usize;
    for (rank, chunk) in data.chunks(share).enumerate() {
        assert!(
            chunk.iter().all(|&b| b == rank as u8 + 1),
            "partition {rank} holds foreign bytes"
        );
    }
}

#[test]
fn direct_workers_fill_disjoint_partitions() {
    let path = tmp_path("direct");
    let _ = fs::remove_file(&path);
    run_workers(&path, MappingConfig::direct());
    assert_partitions(&path);
    let _ = fs::remove_file(&path);
}

#[test]
fn segmented_workers_fill_disjoint_partitions() {
    let path = tmp_path("segmented");
    let _ = fs::remove_file(&path);
    run_workers(&path, MappingConfig::segmented());
    assert_partitions(&path);
    let _ = fs::remove_file(&path);
}
