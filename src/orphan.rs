//! Stale-destination reconciliation
//!
//! Two modes. Force-clean wipes each destination root before classification,
//! so every run starts from nothing. Incremental mode runs after
//! classification and removes only true orphans: destination entries that
//! exist on disk but are not produced by the current source set.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::Pairing;
use crate::error::{fs_err, DistlinkResult};
use crate::probe::{lstat_kind, EntryKind};

/// What the incremental pass deleted, for reporting.
#[derive(Debug, Clone, Default)]
pub struct RemovalSummary {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl RemovalSummary {
    pub fn total(&self) -> usize {
        self.files.len() + self.dirs.len()
    }
}

/// Force-clean: delete each pairing's destination root entirely.
/// Returns the roots that actually existed and were removed.
pub fn force_clean(pairings: &[Pairing]) -> DistlinkResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for pairing in pairings {
        let dst = &pairing.destination;
        match lstat_kind(dst)? {
            EntryKind::Missing => {}
            EntryKind::Dir => {
                fs::remove_dir_all(dst).map_err(|e| fs_err(dst, e))?;
                removed.push(dst.clone());
            }
            EntryKind::File | EntryKind::Symlink => {
                fs::remove_file(dst).map_err(|e| fs_err(dst, e))?;
                removed.push(dst.clone());
            }
        }
    }
    Ok(removed)
}

/// Incremental mode: remove destination entries the current run will not
/// produce. Files go first, then directories children-before-parents, so
/// `remove_dir` only ever sees empty directories.
///
/// Only directory-pairing roots are scanned; a single-file pairing does not
/// own its destination's parent directory, so nothing there is touched.
pub fn remove_stale(
    roots: &BTreeSet<PathBuf>,
    expected_files: &HashSet<PathBuf>,
    expected_dirs: &BTreeSet<PathBuf>,
) -> DistlinkResult<RemovalSummary> {
    let mut present_files = Vec::new();
    let mut present_dirs = Vec::new();
    for root in roots {
        if lstat_kind(root)? == EntryKind::Dir {
            collect_present(root, &mut present_files, &mut present_dirs)?;
        }
    }

    let mut summary = RemovalSummary::default();

    for file in present_files {
        if !expected_files.contains(&file) {
            fs::remove_file(&file).map_err(|e| fs_err(&file, e))?;
            summary.files.push(file);
        }
    }

    // Deepest directories first
    present_dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in present_dirs {
        if !expected_dirs.contains(&dir) {
            fs::remove_dir(&dir).map_err(|e| fs_err(&dir, e))?;
            summary.dirs.push(dir);
        }
    }

    Ok(summary)
}

fn collect_present(
    dir: &Path,
    files: &mut Vec<PathBuf>,
    dirs: &mut Vec<PathBuf>,
) -> DistlinkResult<()> {
    dirs.push(dir.to_path_buf());
    for entry in fs::read_dir(dir).map_err(|e| fs_err(dir, e))? {
        let entry = entry.map_err(|e| fs_err(dir, e))?;
        let path = entry.path();
        // lstat: a symlink is a removable entry, never a subtree to walk
        match lstat_kind(&path)? {
            EntryKind::Dir => collect_present(&path, files, dirs)?,
            EntryKind::Missing => {}
            EntryKind::File | EntryKind::Symlink => files.push(path),
        }
    }
    Ok(())
}
