//! Transform engine
//!
//! Invokes the external transform capability per classified file and writes
//! the primary output plus its map artifact. Shares the staleness
//! short-circuit with the link-or-copy engine, with one twist: a transform
//! output is never legitimately a link to its source, so identity-equality
//! means "remove and redo".

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::error::{fs_err, DistlinkError, DistlinkResult};
use crate::linkcopy::{clear_stale, relative_target, FileDecision, ReconcileMode};
use crate::probe::stat;

/// What a transformer hands back for one file.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Primary output, written to the destination path.
    pub code: String,
    /// Structured map data, pretty-printed next to the primary output.
    pub map: Value,
}

/// The pluggable transformation capability. `Sync` so the engine can share
/// one instance across its parallel file tasks.
pub trait Transformer: Sync {
    fn transform(
        &self,
        source: &Path,
        content: &str,
        options: &Map<String, Value>,
    ) -> DistlinkResult<TransformOutput>;
}

/// Built-in transformer that passes content through untouched and emits an
/// identity source map. Keeps the binary usable without a real toolchain.
#[derive(Debug, Default)]
pub struct Passthrough;

impl Transformer for Passthrough {
    fn transform(
        &self,
        source: &Path,
        content: &str,
        options: &Map<String, Value>,
    ) -> DistlinkResult<TransformOutput> {
        let filename = options
            .get("filename")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| source.display().to_string());
        let map = json!({
            "version": 3,
            "sources": [filename],
            "sourceRoot": options.get("sourceRoot").cloned().unwrap_or(Value::Null),
            "names": [],
            "mappings": "",
        });
        Ok(TransformOutput {
            code: content.to_string(),
            map,
        })
    }
}

/// The map artifact path for a destination: destination + suffix.
pub fn map_path(dst: &Path, suffix: &str) -> PathBuf {
    let mut os = dst.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Merge option layers: defaults lose to caller options, caller options lose
/// to engine-forced keys. Pure function; nothing shared is mutated.
pub fn effective_options(
    defaults: &Map<String, Value>,
    caller: &Map<String, Value>,
    forced: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in caller {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in forced {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// The keys the engine computes itself, regardless of caller overrides.
pub fn forced_options(src: &Path, dst: &Path, map_suffix: &str) -> Map<String, Value> {
    let filename = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let map_name = map_path(dst, map_suffix)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let src_dir = src.parent().unwrap_or_else(|| Path::new(""));
    let source_root = relative_target(src_dir, dst);

    let mut forced = Map::new();
    forced.insert("sourceMap".into(), Value::Bool(true));
    forced.insert("filename".into(), Value::String(filename));
    forced.insert("sourceMapTarget".into(), Value::String(map_name));
    forced.insert(
        "sourceRoot".into(),
        Value::String(source_root.display().to_string()),
    );
    forced
}

/// Whether the transform actually ran for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformDisposition {
    UpToDate,
    Written,
}

/// Reconcile one transform-bucket file: staleness check, transform, write
/// primary with trailing map marker, write the map artifact. Both writes
/// carry the source file's permission bits.
pub fn reconcile_transform<T: Transformer + ?Sized>(
    src: &Path,
    dst: &Path,
    transformer: &T,
    caller_options: &Map<String, Value>,
    map_suffix: &str,
) -> DistlinkResult<TransformDisposition> {
    if clear_stale(src, dst, ReconcileMode::Transform)? == FileDecision::UpToDate {
        return Ok(TransformDisposition::UpToDate);
    }

    let content = fs::read_to_string(src).map_err(|e| fs_err(src, e))?;
    let src_meta = stat(src)?;

    let forced = forced_options(src, dst, map_suffix);
    let options = effective_options(&Map::new(), caller_options, &forced);

    let output = transformer.transform(src, &content, &options)?;

    let map_file = map_path(dst, map_suffix);
    let map_name = map_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut primary = output.code;
    if !primary.ends_with('\n') {
        primary.push('\n');
    }
    primary.push_str("//# sourceMappingURL=");
    primary.push_str(&map_name);
    primary.push('\n');

    let map_json = serde_json::to_string_pretty(&output.map).map_err(|e| {
        DistlinkError::Transform {
            path: src.to_path_buf(),
            message: format!("unserializable map data: {e}"),
        }
    })?;

    write_with_mode(dst, primary.as_bytes(), &src_meta)?;
    write_with_mode(&map_file, map_json.as_bytes(), &src_meta)?;

    Ok(TransformDisposition::Written)
}

fn write_with_mode(path: &Path, bytes: &[u8], src_meta: &fs::Metadata) -> DistlinkResult<()> {
    fs::write(path, bytes).map_err(|e| fs_err(path, e))?;
    fs::set_permissions(path, src_meta.permissions()).map_err(|e| fs_err(path, e))?;
    Ok(())
}
