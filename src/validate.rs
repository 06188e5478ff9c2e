//! Collision validator
//!
//! Runs between classification and any filesystem mutation. Builds the full
//! set of paths the run will write (copy destinations, transform destinations,
//! and each transform destination's synthesized map path) and rejects the run
//! if any of them collides with a declared input or with another output.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::classify::Classification;
use crate::error::{DistlinkError, DistlinkResult};
use crate::transform::map_path;

/// Validate the aggregated classification before anything is written.
pub fn validate(classification: &Classification, map_suffix: &str) -> DistlinkResult<()> {
    let inputs: HashSet<&PathBuf> = classification
        .transforms
        .iter()
        .chain(&classification.copies)
        .map(|item| &item.source)
        .collect();

    let mut written: Vec<PathBuf> = Vec::with_capacity(
        classification.copies.len() + classification.transforms.len() * 2,
    );
    for item in &classification.copies {
        written.push(item.destination.clone());
    }
    for item in &classification.transforms {
        written.push(item.destination.clone());
        written.push(map_path(&item.destination, map_suffix));
    }

    let mut overlaps: Vec<PathBuf> = written
        .iter()
        .filter(|p| inputs.contains(p))
        .cloned()
        .collect();
    if !overlaps.is_empty() {
        overlaps.sort();
        overlaps.dedup();
        return Err(DistlinkError::Overlap { paths: overlaps });
    }

    let mut seen: HashMap<&PathBuf, usize> = HashMap::new();
    for path in &written {
        *seen.entry(path).or_insert(0) += 1;
    }
    let mut duplicates: Vec<PathBuf> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(path, _)| path.clone())
        .collect();
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(DistlinkError::DuplicateOutput { paths: duplicates });
    }

    Ok(())
}
