//! Directory materializer
//!
//! Creates every directory the classifier identified, parents included,
//! before any file reconciliation starts. Idempotent: an existing directory
//! is fine; an existing non-directory is a conflict the caller has to see
//! (the reconciler upstream is the one allowed to delete things).

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{fs_err, DistlinkResult};
use crate::probe::{lstat_kind, EntryKind};

/// Ensure every directory in the set exists.
pub fn ensure_dirs<'a>(dirs: impl IntoIterator<Item = &'a PathBuf>) -> DistlinkResult<()> {
    for dir in dirs {
        match lstat_kind(dir)? {
            EntryKind::Dir => {}
            EntryKind::Missing => {
                fs::create_dir_all(dir).map_err(|e| fs_err(dir, e))?;
            }
            EntryKind::File | EntryKind::Symlink => {
                return Err(fs_err(
                    dir,
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "destination exists and is not a directory",
                    ),
                ));
            }
        }
    }
    Ok(())
}
