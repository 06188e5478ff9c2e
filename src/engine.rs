//! Sync engine orchestration
//!
//! Stage boundaries are strict: classification completes before validation,
//! validation passes before any directory is created, directories exist
//! before any file task starts. Within the file phase, the copy and
//! transform sets are disjoint (the validator guarantees it), so the two
//! phases fan out in parallel with no shared mutable state.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use rayon::prelude::*;

use crate::classify::{classify_all, Classification, Pairing};
use crate::config::Config;
use crate::error::{DistlinkError, DistlinkResult};
use crate::linkcopy::{reconcile, LinkPolicy, Outcome};
use crate::materialize::ensure_dirs;
use crate::orphan::{force_clean, remove_stale, RemovalSummary};
use crate::transform::{map_path, reconcile_transform, TransformDisposition, Transformer};
use crate::validate::validate;

/// What one full run did.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Destination roots wiped by force-clean mode.
    pub cleaned_roots: Vec<PathBuf>,
    /// Stale entries removed in incremental mode.
    pub removed: RemovalSummary,
    /// Directories the run guarantees exist.
    pub directories: usize,
    /// Transform destinations actually (re)written.
    pub transformed: Vec<PathBuf>,
    /// Copy destinations actually (re)written, with the strategy that stuck.
    pub copied: Vec<(PathBuf, Outcome)>,
    /// Files found already correct and left alone.
    pub up_to_date: usize,
}

impl SyncSummary {
    pub fn written(&self) -> usize {
        self.transformed.len() + self.copied.len()
    }
}

/// Classify and validate without touching the filesystem. Dry-run surface.
pub fn plan(pairings: &[Pairing], config: &Config) -> DistlinkResult<Classification> {
    let classification = classify_all(pairings, config)?;
    validate(&classification, &config.map_suffix)?;
    Ok(classification)
}

/// Run a full synchronization pass.
pub fn run<T: Transformer + ?Sized>(
    pairings: &[Pairing],
    config: &Config,
    transformer: &T,
    policy: LinkPolicy,
) -> DistlinkResult<SyncSummary> {
    let mut summary = SyncSummary::default();

    if config.clean {
        summary.cleaned_roots = force_clean(pairings)?;
    }

    let classification = classify_all(pairings, config)?;
    validate(&classification, &config.map_suffix)?;

    // Parents of single-file pairing destinations are not in the classified
    // set; they still count as directories this run owns, so they must be in
    // place before the file phase and must survive orphan removal when they
    // nest under another pairing's destination root.
    let mut dirs = classification.directories.clone();
    for item in classification.transforms.iter().chain(&classification.copies) {
        let mut cursor = item.destination.as_path();
        while let Some(parent) = cursor.parent() {
            if parent.as_os_str().is_empty()
                || parent.parent().is_none()
                || !dirs.insert(parent.to_path_buf())
            {
                break;
            }
            cursor = parent;
        }
    }

    if !config.clean {
        let roots: BTreeSet<PathBuf> = pairings
            .iter()
            .map(|p| p.destination.clone())
            .filter(|d| classification.directories.contains(d))
            .collect();
        let mut expected_files: HashSet<PathBuf> = classification
            .copies
            .iter()
            .map(|item| item.destination.clone())
            .collect();
        for item in &classification.transforms {
            expected_files.insert(item.destination.clone());
            expected_files.insert(map_path(&item.destination, &config.map_suffix));
        }
        summary.removed = remove_stale(&roots, &expected_files, &dirs)?;
    }

    ensure_dirs(&dirs)?;
    summary.directories = classification.directories.len();

    let (copy_results, transform_results) = rayon::join(
        || {
            classification
                .copies
                .par_iter()
                .map(|item| {
                    reconcile(&item.source, &item.destination, policy)
                        .map(|outcome| (item.destination.clone(), outcome))
                })
                .collect::<Vec<_>>()
        },
        || {
            classification
                .transforms
                .par_iter()
                .map(|item| {
                    reconcile_transform(
                        &item.source,
                        &item.destination,
                        transformer,
                        &config.transform_options,
                        &config.map_suffix,
                    )
                    .map(|disposition| (item.destination.clone(), disposition))
                })
                .collect::<Vec<_>>()
        },
    );

    // All file tasks have run; now surface the first failure, if any.
    // Partially written state is deliberately left in place.
    let mut first_error: Option<DistlinkError> = None;
    for result in copy_results {
        match result {
            Ok((_, Outcome::UpToDate)) => summary.up_to_date += 1,
            Ok((dst, outcome)) => summary.copied.push((dst, outcome)),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    for result in transform_results {
        match result {
            Ok((_, TransformDisposition::UpToDate)) => summary.up_to_date += 1,
            Ok((dst, TransformDisposition::Written)) => summary.transformed.push(dst),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    Ok(summary)
}
