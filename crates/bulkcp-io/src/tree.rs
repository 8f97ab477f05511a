//! Recursive directory copy

use crate::copy::{copy_file, CopyOptions, ProgressFn};
use crate::CopyControls;
use bulkcp_types::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Statistics for a completed tree copy
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCopyStats {
    /// Number of files copied
    pub files_copied: u64,
    /// Number of directories created
    pub directories_created: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
}

/// Copy a directory tree.
///
/// When `destination` already exists, the source directory is nested
/// inside it by its own base name (copy-into-existing-folder semantics);
/// otherwise `destination` becomes the copied root. Entries are processed
/// depth-first in file-name order; the controls are checked before each
/// entry and at every chunk inside file copies. The first error aborts
/// the whole call.
pub async fn copy_tree(
    source: &Path,
    destination: &Path,
    options: &CopyOptions,
    on_progress: ProgressFn<'_>,
    controls: &CopyControls,
) -> Result<TreeCopyStats> {
    let metadata = tokio::fs::metadata(source).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: source.to_path_buf(),
        },
        _ => Error::Io {
            message: format!("Failed to read metadata for '{}': {}", source.display(), e),
        },
    })?;

    if !metadata.is_dir() {
        return Err(Error::other(format!(
            "Source '{}' is not a directory",
            source.display()
        )));
    }

    let root = if tokio::fs::metadata(destination)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        match source.file_name() {
            Some(name) => destination.join(name),
            None => {
                return Err(Error::other(format!(
                    "Source '{}' has no directory name",
                    source.display()
                )))
            }
        }
    } else {
        destination.to_path_buf()
    };

    let mut stats = TreeCopyStats::default();
    copy_tree_inner(source, &root, options, on_progress, controls, &mut stats).await?;

    debug!(
        "Tree copy completed: {} -> {} ({} files, {} bytes)",
        source.display(),
        root.display(),
        stats.files_copied,
        stats.bytes_copied
    );
    Ok(stats)
}

/// Depth-first recursion over one directory level.
fn copy_tree_inner<'a>(
    source: &'a Path,
    destination: &'a Path,
    options: &'a CopyOptions,
    on_progress: ProgressFn<'a>,
    controls: &'a CopyControls,
    stats: &'a mut TreeCopyStats,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|e| Error::Io {
                message: format!(
                    "Failed to create directory '{}': {}",
                    destination.display(),
                    e
                ),
            })?;
        stats.directories_created += 1;

        let mut entries = sorted_entries(source).await?;

        for (name, path) in entries.drain(..) {
            controls.checkpoint().await?;

            let file_type = tokio::fs::symlink_metadata(&path)
                .await
                .map_err(|e| Error::Io {
                    message: format!("Failed to read metadata for '{}': {}", path.display(), e),
                })?;
            let dest_path = destination.join(&name);

            if file_type.is_file() {
                let bytes =
                    copy_file(&path, &dest_path, options, &mut *on_progress, controls).await?;
                stats.files_copied += 1;
                stats.bytes_copied += bytes;
            } else if file_type.is_dir() {
                copy_tree_inner(&path, &dest_path, options, &mut *on_progress, controls, stats)
                    .await?;
            } else {
                // Symlinks and special files are not part of the copy set.
                debug!("Skipping special entry: {}", path.display());
            }
        }

        Ok(())
    })
}

/// Collect directory entries sorted by file name so traversal order is
/// deterministic for a given listing.
async fn sorted_entries(dir: &Path) -> Result<Vec<(std::ffi::OsString, PathBuf)>> {
    let mut reader = tokio::fs::read_dir(dir).await.map_err(|e| Error::Io {
        message: format!("Failed to read directory '{}': {}", dir.display(), e),
    })?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(|e| Error::Io {
        message: format!("Failed to read directory entry: {}", e),
    })? {
        entries.push((entry.file_name(), entry.path()));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::CopyProgress;
    use tempfile::TempDir;

    async fn build_sample_tree(base: &Path) {
        tokio::fs::create_dir_all(base.join("docs/nested")).await.unwrap();
        tokio::fs::create_dir_all(base.join("empty")).await.unwrap();
        tokio::fs::write(base.join("a.txt"), vec![b'a'; 1024]).await.unwrap();
        tokio::fs::write(base.join("docs/b.txt"), vec![b'b'; 2048]).await.unwrap();
        tokio::fs::write(base.join("docs/nested/c.txt"), b"").await.unwrap();
    }

    #[tokio::test]
    async fn test_tree_copy_into_fresh_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dst");
        build_sample_tree(&source).await;

        let mut on_progress = |_: CopyProgress| {};
        let stats = copy_tree(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.bytes_copied, 3072);
        assert_eq!(
            tokio::fs::read(dest.join("a.txt")).await.unwrap(),
            vec![b'a'; 1024]
        );
        assert_eq!(
            tokio::fs::read(dest.join("docs/b.txt")).await.unwrap(),
            vec![b'b'; 2048]
        );
        assert!(dest.join("docs/nested/c.txt").exists());
        assert!(dest.join("empty").is_dir());
    }

    #[tokio::test]
    async fn test_tree_copy_nests_into_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photos");
        let dest = temp_dir.path().join("backup");
        tokio::fs::create_dir_all(&source).await.unwrap();
        tokio::fs::create_dir_all(&dest).await.unwrap();
        tokio::fs::write(source.join("pic.raw"), b"raw").await.unwrap();

        let mut on_progress = |_: CopyProgress| {};
        copy_tree(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap();

        // Nested under the source's own name, mirroring copy-into-folder.
        assert_eq!(
            tokio::fs::read(dest.join("photos/pic.raw")).await.unwrap(),
            b"raw"
        );
    }

    #[tokio::test]
    async fn test_tree_copy_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut on_progress = |_: CopyProgress| {};
        let err = copy_tree(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("dst"),
            &CopyOptions::default(),
            &mut on_progress,
            &CopyControls::unrestricted(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_tree_copy_cancellation_stops_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dst");
        tokio::fs::create_dir_all(&source).await.unwrap();
        for i in 0..20 {
            tokio::fs::write(source.join(format!("file-{i:02}.bin")), vec![0u8; 8192])
                .await
                .unwrap();
        }

        let controls = CopyControls::unrestricted();
        let cancel = controls.cancel_token().clone();
        let mut seen = 0u32;
        let mut on_progress = move |p: CopyProgress| {
            if p.bytes_copied == 0 {
                seen += 1;
                if seen == 3 {
                    cancel.cancel();
                }
            }
        };

        let err = copy_tree(
            &source,
            &dest,
            &CopyOptions::default(),
            &mut on_progress,
            &controls,
        )
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
        // Far fewer than 20 files made it across before the abort.
        let mut copied = 0;
        let mut reader = tokio::fs::read_dir(&dest).await.unwrap();
        while let Some(entry) = reader.next_entry().await.unwrap() {
            if entry.file_type().await.unwrap().is_file() {
                copied += 1;
            }
        }
        assert!(copied < 20);
    }
}
