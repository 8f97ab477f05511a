//! Source walking for task totals

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Totals for a set of source items, computed once before copying starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceTotals {
    /// Total bytes across all files
    pub total_bytes: u64,
    /// Total number of files (directories are structure, not items)
    pub total_items: u64,
}

impl SourceTotals {
    /// Merge another set of totals into this one
    pub fn merge(&mut self, other: SourceTotals) {
        self.total_bytes += other.total_bytes;
        self.total_items += other.total_items;
    }
}

/// Walk a source list and compute its totals.
///
/// Files are counted directly; directories are walked recursively.
/// Missing or unreadable entries contribute nothing — the copy itself
/// surfaces the real error later. Totals are a snapshot: the engine never
/// recomputes them, even if sources change mid-copy.
pub fn measure_sources(items: &[PathBuf]) -> SourceTotals {
    let mut totals = SourceTotals::default();

    for item in items {
        totals.merge(measure_one(item));
    }

    debug!(
        "Measured {} source item(s): {} files, {} bytes",
        items.len(),
        totals.total_items,
        totals.total_bytes
    );
    totals
}

fn measure_one(item: &Path) -> SourceTotals {
    let Ok(metadata) = std::fs::metadata(item) else {
        return SourceTotals::default();
    };

    if metadata.is_file() {
        return SourceTotals {
            total_bytes: metadata.len(),
            total_items: 1,
        };
    }

    if metadata.is_dir() {
        let mut totals = SourceTotals::default();
        for entry in WalkDir::new(item).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                if let Ok(meta) = entry.metadata() {
                    totals.total_bytes += meta.len();
                    totals.total_items += 1;
                }
            }
        }
        return totals;
    }

    SourceTotals::default()
}
