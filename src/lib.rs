//! # mmap-xfer: memory-mapped transfer backend for parallel I/O benchmarks
//!
//! Many workers share one file. Each worker maps the file (or anonymous
//! memory standing in for it), owns a disjoint partition of it, and moves
//! blocks between its buffers and the mapping instead of issuing read/write
//! syscalls. Flushes and cache-eviction hints keep writes durable and page
//! cache pressure bounded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_xfer::{Access, MappingConfig, MmapSession, OpenMode, TransferParameters};
//!
//! // Worker 1 of 4 over a 4 MiB shared file, 64 KiB blocks.
//! let params = TransferParameters::new(4 << 20, 4, 1)
//!     .block_size(64 << 10)
//!     .open_mode(OpenMode::Write);
//! let mut session = MmapSession::create("shared.bin", params, MappingConfig::direct())?;
//!
//! let mut block = vec![0x5A; 64 << 10];
//! session.xfer(Access::Write, &mut block, 64 << 10, 0)?;
//! session.fsync()?;
//! session.close()?;
//! # Ok::<(), mmap_xfer::XferError>(())
//! ```
//!
//! ## Modules
//!
//! - [`partition`]: per-worker windows and the sequential cursor
//! - [`mmap`]: direct strategy (shared file or private anonymous mapping)
//! - [`segment`]: segmented strategy (user-level pager with a residency bound)
//! - [`manager`]: session setup, priming hints and teardown
//! - [`session`]: the transfer engine
//! - [`backend`]: the harness-facing operation table
//!
//! ## Feature Flags
//!
//! - `async`: Tokio helpers for create/delete/size of the shared file

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/mmap-xfer")]

#[cfg(not(unix))]
compile_error!("mmap-xfer requires a Unix target");

pub mod advise;
pub mod backend;
pub mod config;
pub mod errors;
pub mod flush;
pub mod manager;
pub mod mmap;
pub mod params;
pub mod partition;
pub mod posix;
pub mod segment;
pub mod session;
pub mod strategy;
pub mod utils;

pub use advise::AccessAdvice;
pub use backend::MmapBackend;
pub use config::{AdvisoryPolicy, MappingConfig, StrategyKind, MEMALLOC_ENV};
pub use errors::{Result, XferError};
pub use flush::FlushMode;
pub use params::{Access, OpenMode, TransferParameters};
pub use partition::{compute_window, Cursor, PartitionWindow};
pub use session::MmapSession;
pub use strategy::{MappingStrategy, Protection};
