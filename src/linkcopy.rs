//! Link-or-copy engine
//!
//! Reconciles one source file with one destination path. The fast path is a
//! hardlink; when the filesystem refuses (cross-device, permissions), a
//! relative symlink; when that also fails, a streamed byte copy carrying the
//! source's permission bits.
//!
//! Before creating anything, the destination is inspected for staleness. The
//! short-circuit policy is newer-or-equal ⇒ already up to date: a destination
//! at least as fresh as its source is trusted and left alone, which makes
//! back-to-back runs idempotent.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{fs_err, DistlinkResult};
use crate::probe::{lstat_kind, mtime, same_identity, stat, EntryKind};

/// Which engine is asking for the staleness verdict. A transform output is
/// never legitimately a link to its source, so identity-equality and
/// correct-looking symlinks count as stale there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    Link,
    Transform,
}

/// Per-file verdict, recomputed every run and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    UpToDate,
    Rebuild,
}

/// How the destination ended up satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    UpToDate,
    Hardlinked,
    Symlinked,
    Copied,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpToDate => "up-to-date",
            Self::Hardlinked => "hardlinked",
            Self::Symlinked => "symlinked",
            Self::Copied => "copied",
        }
    }
}

/// Which link strategies are allowed. Both on by default; tests (and callers
/// on filesystems with known-broken linking) can switch stages off to force
/// the fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct LinkPolicy {
    pub hardlink: bool,
    pub symlink: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            hardlink: true,
            symlink: true,
        }
    }
}

/// The link target this engine would write for `dst`: `src` expressed
/// relative to `dst`'s directory, so the destination tree stays relocatable.
/// Computed structurally; paths are taken as given, never canonicalized.
pub fn relative_target(src: &Path, dst: &Path) -> PathBuf {
    let base = dst.parent().unwrap_or_else(|| Path::new(""));
    if src.is_absolute() != base.is_absolute() {
        return src.to_path_buf();
    }

    let src_parts: Vec<Component> = src.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let mut shared = 0;
    while shared < src_parts.len()
        && shared < base_parts.len()
        && src_parts[shared] == base_parts[shared]
    {
        shared += 1;
    }

    let mut target = PathBuf::new();
    for _ in shared..base_parts.len() {
        target.push("..");
    }
    for part in &src_parts[shared..] {
        target.push(part.as_os_str());
    }
    if target.as_os_str().is_empty() {
        target.push(".");
    }
    target
}

/// Inspect `dst` and clear it if stale. Returns `UpToDate` when the
/// destination can be trusted as-is; otherwise the path is gone on return
/// and the caller should create it.
pub fn clear_stale(src: &Path, dst: &Path, mode: ReconcileMode) -> DistlinkResult<FileDecision> {
    match lstat_kind(dst)? {
        EntryKind::Missing => return Ok(FileDecision::Rebuild),
        EntryKind::Dir => {
            fs::remove_dir_all(dst).map_err(|e| fs_err(dst, e))?;
            return Ok(FileDecision::Rebuild);
        }
        EntryKind::Symlink => {
            if mode == ReconcileMode::Link {
                let target = fs::read_link(dst).map_err(|e| fs_err(dst, e))?;
                if target == relative_target(src, dst) {
                    return Ok(FileDecision::UpToDate);
                }
            }
            fs::remove_file(dst).map_err(|e| fs_err(dst, e))?;
            return Ok(FileDecision::Rebuild);
        }
        EntryKind::File => {}
    }

    let src_meta = stat(src)?;
    let dst_meta = stat(dst)?;

    if same_identity(&src_meta, &dst_meta) {
        match mode {
            // Already the same storage object; nothing to do.
            ReconcileMode::Link => return Ok(FileDecision::UpToDate),
            // A compiled artifact must never literally be its own source.
            ReconcileMode::Transform => {
                fs::remove_file(dst).map_err(|e| fs_err(dst, e))?;
                return Ok(FileDecision::Rebuild);
            }
        }
    }

    if mtime(&dst_meta) >= mtime(&src_meta) {
        return Ok(FileDecision::UpToDate);
    }

    fs::remove_file(dst).map_err(|e| fs_err(dst, e))?;
    Ok(FileDecision::Rebuild)
}

/// Reconcile one copy-bucket file: staleness check, then the
/// hardlink → symlink → copy chain.
pub fn reconcile(src: &Path, dst: &Path, policy: LinkPolicy) -> DistlinkResult<Outcome> {
    if clear_stale(src, dst, ReconcileMode::Link)? == FileDecision::UpToDate {
        return Ok(Outcome::UpToDate);
    }

    if policy.hardlink && fs::hard_link(src, dst).is_ok() {
        return Ok(Outcome::Hardlinked);
    }

    if policy.symlink && make_symlink(&relative_target(src, dst), dst).is_ok() {
        return Ok(Outcome::Symlinked);
    }

    copy_with_mode(src, dst)?;
    Ok(Outcome::Copied)
}

#[cfg(unix)]
fn make_symlink(target: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(windows)]
fn make_symlink(target: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, dst)
}

/// Streamed byte copy preserving the source's permission bits. Descriptors
/// are closed as soon as the copy finishes.
fn copy_with_mode(src: &Path, dst: &Path) -> DistlinkResult<()> {
    let src_meta = stat(src)?;
    let mut reader = fs::File::open(src).map_err(|e| fs_err(src, e))?;
    let mut writer = fs::File::create(dst).map_err(|e| fs_err(dst, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| fs_err(dst, e))?;
    drop(writer);
    drop(reader);
    fs::set_permissions(dst, src_meta.permissions()).map_err(|e| fs_err(dst, e))?;
    Ok(())
}
