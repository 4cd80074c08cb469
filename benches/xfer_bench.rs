use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmap_xfer::{Access, MappingConfig, MmapSession, OpenMode, TransferParameters};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

// Simple helper to build a unique temp path per bench
fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_xfer_bench_{}_{}", name, std::process::id()));
    p
}

const AGGREGATE: u64 = 16 * 1024 * 1024;

fn configs() -> Vec<(&'static str, MappingConfig)> {
    vec![
        ("direct", MappingConfig::direct()),
        ("anonymous", MappingConfig::direct().private_anonymous(true)),
        ("segmented", MappingConfig::segmented()),
        (
            "segmented_cap8",
            MappingConfig::segmented().segment_capacity(NonZeroUsize::new(8)),
        ),
    ]
}

fn bench_sequential_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_write");
    for &block in &[4_u64 * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(AGGREGATE));
        for (name, config) in configs() {
            group.bench_with_input(BenchmarkId::new(name, block), &block, |b, &blk| {
                let path = tmp_path(&format!("seq_{name}_{blk}"));
                let _ = fs::remove_file(&path);
                let params = TransferParameters::new(AGGREGATE, 1, 0)
                    .block_size(blk)
                    .open_mode(OpenMode::Write);
                let mut payload = vec![0xAB_u8; blk as usize];
                b.iter(|| {
                    let mut session = MmapSession::create(&path, params, config).expect("create");
                    for _ in 0..AGGREGATE / blk {
                        session
                            .xfer(Access::Write, &mut payload, blk, 0)
                            .expect("xfer");
                    }
                    session.close().expect("close");
                });
                let _ = fs::remove_file(&path);
            });
        }
    }
    group.finish();
}

fn bench_random_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_read");
    let block = 4096_u64;
    let transfers = 1024_u64;
    group.throughput(Throughput::Bytes(block * transfers));
    for (name, config) in configs() {
        let path = tmp_path(&format!("rand_{name}"));
        let _ = fs::remove_file(&path);
        let create = TransferParameters::new(AGGREGATE, 1, 0)
            .block_size(block)
            .open_mode(OpenMode::Write);
        MmapSession::create(&path, create, MappingConfig::direct())
            .expect("create")
            .close()
            .expect("close");

        let params = TransferParameters::new(AGGREGATE, 1, 0)
            .block_size(block)
            .random_offset(true);
        let mut session = MmapSession::open(&path, params, config).expect("open");
        let mut buf = vec![0u8; block as usize];
        group.bench_function(name, |b| {
            b.iter(|| {
                // Multiplicative hash keeps offsets spread without an RNG dependency.
                for i in 0..transfers {
                    let offset = (i.wrapping_mul(0x9E37_79B9_7F4A_7C15) % (AGGREGATE / block)) * block;
                    session
                        .xfer(Access::Read, &mut buf, block, offset)
                        .expect("xfer");
                }
                criterion::black_box(&buf);
            });
        });
        session.close().expect("close");
        let _ = fs::remove_file(&path);
    }
    group.finish();
}

fn bench_per_transfer_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("per_transfer_sync");
    let block = 64 * 1024_u64;
    let aggregate = 4 * 1024 * 1024_u64;
    group.throughput(Throughput::Bytes(aggregate));
    for (name, config) in [
        ("direct", MappingConfig::direct()),
        ("segmented", MappingConfig::segmented()),
    ] {
        let path = tmp_path(&format!("sync_{name}"));
        let _ = fs::remove_file(&path);
        let params = TransferParameters::new(aggregate, 1, 0)
            .block_size(block)
            .sync_per_transfer(true)
            .open_mode(OpenMode::Write);
        let mut payload = vec![0x5A_u8; block as usize];
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut session = MmapSession::create(&path, params, config).expect("create");
                for _ in 0..aggregate / block {
                    session
                        .xfer(Access::Write, &mut payload, block, 0)
                        .expect("xfer");
                }
                session.close().expect("close");
            });
        });
        let _ = fs::remove_file(&path);
    }
    group.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .warm_up_time(std::time::Duration::from_millis(300))
        .measurement_time(std::time::Duration::from_secs(3))
}

criterion_group! {
    name = xfer_benches;
    config = criterion_config();
    targets =
        bench_sequential_write,
        bench_random_read,
        bench_per_transfer_sync
}

criterion_main!(xfer_benches);
