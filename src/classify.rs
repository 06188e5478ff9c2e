//! Tree classifier
//!
//! Stage 1 of a sync run: expand every pairing into the three work buckets
//! (directories to create, files to transform, files to copy) without writing
//! anything. Sibling entries are classified in parallel and merged; the merge
//! is plain concatenation, so ordering never matters downstream.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Config;
use crate::error::{fs_err, DistlinkError, DistlinkResult};
use crate::probe::stat;

/// One source → destination mapping supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl Pairing {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Parse a `SRC:DST` command-line argument.
    pub fn parse(spec: &str) -> DistlinkResult<Self> {
        match spec.split_once(':') {
            Some((src, dst)) if !src.is_empty() && !dst.is_empty() => {
                Ok(Self::new(src, dst))
            }
            _ => Err(DistlinkError::InvalidPairing {
                spec: spec.to_string(),
            }),
        }
    }
}

/// A single file scheduled for transfer or transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Aggregated result of classifying all pairings.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Destination directories to create, parents included.
    pub directories: BTreeSet<PathBuf>,
    /// Files routed through the transform capability.
    pub transforms: Vec<WorkItem>,
    /// Files copied or linked verbatim.
    pub copies: Vec<WorkItem>,
}

impl Classification {
    /// Unordered merge; bucket membership is all that matters.
    pub fn merge(&mut self, other: Classification) {
        self.directories.extend(other.directories);
        self.transforms.extend(other.transforms);
        self.copies.extend(other.copies);
    }

    pub fn file_count(&self) -> usize {
        self.transforms.len() + self.copies.len()
    }

    fn file(source: PathBuf, destination: PathBuf, config: &Config) -> Self {
        let mut out = Self::default();
        let item = WorkItem {
            source: source.clone(),
            destination,
        };
        if config.is_transformable(&source) {
            out.transforms.push(item);
        } else {
            out.copies.push(item);
        }
        out
    }
}

/// Classify every pairing, validating all sources up front.
///
/// Every missing source is collected into a single error before any walk
/// begins, so the caller sees the full list rather than the first casualty.
pub fn classify_all(pairings: &[Pairing], config: &Config) -> DistlinkResult<Classification> {
    let missing: Vec<PathBuf> = pairings
        .iter()
        .filter(|p| fs::metadata(&p.source).is_err())
        .map(|p| p.source.clone())
        .collect();
    if !missing.is_empty() {
        return Err(DistlinkError::MissingSource { paths: missing });
    }

    pairings
        .par_iter()
        .map(|p| classify_pairing(p, config))
        .try_reduce(Classification::default, |mut acc, next| {
            acc.merge(next);
            Ok(acc)
        })
}

/// Classify one pairing. A file source lands straight in a bucket with no
/// directory entry; a directory source is walked recursively.
pub fn classify_pairing(pairing: &Pairing, config: &Config) -> DistlinkResult<Classification> {
    let meta = stat(&pairing.source)?;
    if meta.is_dir() {
        classify_tree(&pairing.source, &pairing.destination, config)
    } else {
        Ok(Classification::file(
            pairing.source.clone(),
            pairing.destination.clone(),
            config,
        ))
    }
}

fn classify_tree(source: &Path, destination: &Path, config: &Config) -> DistlinkResult<Classification> {
    let mut out = Classification::default();
    out.directories.insert(destination.to_path_buf());

    let mut names: Vec<OsString> = Vec::new();
    for entry in fs::read_dir(source).map_err(|e| fs_err(source, e))? {
        let entry = entry.map_err(|e| fs_err(source, e))?;
        names.push(entry.file_name());
    }

    // One task per child entry; symlinks are followed, so a link to a
    // directory is walked like a directory.
    let children = names
        .par_iter()
        .map(|name| {
            let child_src = source.join(name);
            let child_dst = destination.join(name);
            let meta = stat(&child_src)?;
            if meta.is_dir() {
                classify_tree(&child_src, &child_dst, config)
            } else {
                Ok(Classification::file(child_src, child_dst, config))
            }
        })
        .try_reduce(Classification::default, |mut acc, next| {
            acc.merge(next);
            Ok(acc)
        })?;

    out.merge(children);
    Ok(out)
}
