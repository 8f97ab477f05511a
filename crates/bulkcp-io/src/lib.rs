//! Chunked, cancelable copy primitives for bulkcp
//!
//! This crate provides the low-level copy machinery used by the task
//! engine:
//!
//! - **File copy**: fixed-size chunked copy with per-chunk progress
//!   callbacks and cooperative cancellation
//! - **Tree copy**: depth-first recursive directory copy with fail-fast
//!   error propagation
//! - **Source scanning**: one-shot totals computation over a source list
//! - **Controls**: the pause/cancel surface observed at every chunk and
//!   entry boundary
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkcp_io::{copy_file, CopyControls, CopyOptions};
//! use std::path::Path;
//!
//! # async fn example() -> bulkcp_types::Result<()> {
//! let controls = CopyControls::unrestricted();
//! let mut on_progress = |p: bulkcp_io::CopyProgress| {
//!     println!("{}: {} bytes", p.file.display(), p.bytes_copied);
//! };
//! let bytes = copy_file(
//!     Path::new("source.bin"),
//!     Path::new("dest.bin"),
//!     &CopyOptions::default(),
//!     &mut on_progress,
//!     &controls,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod control;
pub mod copy;
pub mod reader;
pub mod scan;
pub mod tree;
pub mod writer;


pub use control::CopyControls;
pub use copy::{copy_file, CopyOptions, CopyProgress};
pub use reader::ChunkedReader;
pub use scan::{measure_sources, SourceTotals};
pub use tree::{copy_tree, TreeCopyStats};
pub use writer::ChunkedWriter;
