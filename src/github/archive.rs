// src/github/archive.rs
// =============================================================================
// Unpacks a GitHub source tarball into a scratch directory.
//
// GitHub tarballs always contain exactly one top-level directory named
// `{owner}-{repo}-{sha}/`. We unpack everything under a fresh temp dir and
// hand back a SourceTree pointing at that top-level directory.
//
// The SourceTree owns the temp dir: when it is dropped (success, error, or
// early return) the whole scratch directory is deleted.
//
// Extraction limits:
// - at most MAX_ENTRY_COUNT entries and MAX_EXTRACTED_SIZE bytes
// - absolute paths and `..` components are rejected
// - only regular files and directories are written; links and devices are
//   skipped
//
// Rust concepts:
// - Drop/RAII: TempDir removes itself when the SourceTree goes away
// - Iterators: Walking tar entries one at a time, never the whole archive
//   in memory twice
// - Path components: Checking every piece of an entry path before joining
// =============================================================================

use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

const MAX_ENTRY_COUNT: usize = 100_000;
const MAX_EXTRACTED_SIZE: u64 = 2_000_000_000;

// An extracted source snapshot, alive for one module's processing attempt
#[derive(Debug)]
pub struct SourceTree {
    // Held for its Drop; removing it deletes `root` too
    _scratch: TempDir,
    root: PathBuf,
}

impl SourceTree {
    // Unpacks gzip-compressed tar bytes into a new scratch directory
    pub fn from_tarball(data: &[u8]) -> FetchResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("module-fetch-")
            .tempdir()
            .map_err(|e| FetchError::io("failed to create scratch directory", e))?;

        let extract_dir = scratch.path().join("src");
        std::fs::create_dir_all(&extract_dir)
            .map_err(|e| FetchError::io("failed to create extraction directory", e))?;

        unpack_tarball(data, &extract_dir)?;
        let root = single_top_level_dir(&extract_dir)?;
        debug!("Source extracted to {}", root.display());

        Ok(SourceTree {
            _scratch: scratch,
            root,
        })
    }

    // Wraps an already-populated scratch directory
    #[cfg(test)]
    pub fn from_dir(scratch: TempDir, root: PathBuf) -> Self {
        SourceTree {
            _scratch: scratch,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn unpack_tarball(data: &[u8], dest: &Path) -> FetchResult<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(data));
    archive.set_preserve_permissions(false);

    let mut entry_count = 0usize;
    let mut total_size: u64 = 0;

    let entries = archive
        .entries()
        .map_err(|e| FetchError::Archive(format!("failed to read archive entries: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| FetchError::Archive(format!("failed to read archive entry: {}", e)))?;

        entry_count += 1;
        if entry_count > MAX_ENTRY_COUNT {
            return Err(FetchError::Archive(format!(
                "archive exceeds maximum entry count ({})",
                MAX_ENTRY_COUNT
            )));
        }

        let entry_type = entry.header().entry_type();
        if !matches!(entry_type, tar::EntryType::Regular | tar::EntryType::Directory) {
            // pax headers, symlinks, devices
            continue;
        }

        total_size = total_size.saturating_add(entry.header().size().unwrap_or(0));
        if total_size > MAX_EXTRACTED_SIZE {
            return Err(FetchError::Archive(format!(
                "archive exceeds maximum extracted size ({} bytes)",
                MAX_EXTRACTED_SIZE
            )));
        }

        let entry_path = entry
            .path()
            .map_err(|e| FetchError::Archive(format!("failed to read entry path: {}", e)))?
            .into_owned();

        if !is_safe_relative(&entry_path) {
            return Err(FetchError::Archive(format!(
                "refusing to unpack unsafe path '{}'",
                entry_path.display()
            )));
        }

        let target = dest.join(&entry_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FetchError::io(format!("failed to create {}", parent.display()), e))?;
        }

        entry.unpack(&target).map_err(|e| {
            FetchError::Archive(format!("failed to unpack {}: {}", entry_path.display(), e))
        })?;
    }

    Ok(())
}

fn is_safe_relative(path: &Path) -> bool {
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// Returns the first top-level directory, or an Archive error if the archive
// expanded into nothing.
fn single_top_level_dir(extract_dir: &Path) -> FetchResult<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(extract_dir)
        .map_err(|e| FetchError::io("failed to list extracted archive", e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter()
        .next()
        .ok_or_else(|| FetchError::Archive("archive contains no top-level directory".to_string()))
}
