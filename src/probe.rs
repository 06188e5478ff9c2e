//! Filesystem probe
//!
//! Thin wrappers over stat/lstat that the classifier and reconcilers share:
//! entry kind without following symlinks, inode-identity comparison, and
//! modification-time ordering.

use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{fs_err, DistlinkResult};

/// What a path is, observed via lstat (symlinks are not followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Missing,
}

/// Probe a path without following symlinks.
pub fn lstat_kind(path: &Path) -> DistlinkResult<EntryKind> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            if ft.is_symlink() {
                Ok(EntryKind::Symlink)
            } else if ft.is_dir() {
                Ok(EntryKind::Dir)
            } else {
                Ok(EntryKind::File)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
        Err(e) => Err(fs_err(path, e)),
    }
}

/// Metadata following symlinks, with path context on failure.
pub fn stat(path: &Path) -> DistlinkResult<Metadata> {
    fs::metadata(path).map_err(|e| fs_err(path, e))
}

/// Whether two metadata records refer to the same underlying storage object
/// (hardlinked or literally the same file). Only meaningful on Unix; other
/// platforms conservatively report false, which forces a content refresh.
#[cfg(unix)]
pub fn same_identity(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
pub fn same_identity(_a: &Metadata, _b: &Metadata) -> bool {
    false
}

/// Modification time, defaulting to the epoch where the platform cannot say.
pub fn mtime(meta: &Metadata) -> SystemTime {
    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}
