//! Error types for distlink
//!
//! Uses `thiserror` for a closed error enum. Every variant that concerns
//! concrete filesystem paths carries them, so callers can map errors to
//! diagnostics and exit codes without parsing display strings.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for distlink operations
pub type DistlinkResult<T> = Result<T, DistlinkError>;

/// Main error type for distlink operations
#[derive(Error, Debug)]
pub enum DistlinkError {
    /// One or more pairing sources do not exist. Detected before any walk.
    #[error("source path(s) not found: {}", join_paths(.paths))]
    MissingSource { paths: Vec<PathBuf> },

    /// An output path coincides with a declared input path. Pre-flight.
    #[error("output would overwrite input: {}", join_paths(.paths))]
    Overlap { paths: Vec<PathBuf> },

    /// Two logical outputs (including synthesized map paths) collide. Pre-flight.
    #[error("duplicate output path(s): {}", join_paths(.paths))]
    DuplicateOutput { paths: Vec<PathBuf> },

    /// The external transform capability failed for a file. Propagated unmodified.
    #[error("transform failed for {path}: {message}")]
    Transform { path: PathBuf, message: String },

    /// A filesystem operation failed at a known path.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error without a more specific path context
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `SRC:DST` pairing argument that could not be split
    #[error("invalid pairing '{spec}': expected SRC:DST")]
    InvalidPairing { spec: String },

    /// A `--option` argument that could not be split into KEY=VALUE
    #[error("invalid option '{spec}': expected KEY=VALUE")]
    InvalidOption { spec: String },

    /// Configuration file could not be read or parsed
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl DistlinkError {
    /// Stable machine-readable discriminant for CLI/json consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSource { .. } => "missing-source",
            Self::Overlap { .. } => "overlap",
            Self::DuplicateOutput { .. } => "duplicate-output",
            Self::Transform { .. } => "transform",
            Self::Filesystem { .. } | Self::Io(_) => "filesystem",
            Self::InvalidPairing { .. } => "invalid-pairing",
            Self::InvalidOption { .. } => "invalid-option",
            Self::Config { .. } => "config",
        }
    }

    /// Offending paths, for diagnostics. Empty when the error has none.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            Self::MissingSource { paths }
            | Self::Overlap { paths }
            | Self::DuplicateOutput { paths } => paths.clone(),
            Self::Transform { path, .. }
            | Self::Filesystem { path, .. }
            | Self::Config { path, .. } => vec![path.clone()],
            Self::Io(_) | Self::InvalidPairing { .. } | Self::InvalidOption { .. } => Vec::new(),
        }
    }

    /// Process exit code for the binary. Pre-flight and runtime failures get
    /// distinct codes so CI can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingSource { .. } => 10,
            Self::Overlap { .. } => 11,
            Self::DuplicateOutput { .. } => 12,
            Self::Transform { .. } => 13,
            Self::Filesystem { .. } | Self::Io(_) => 14,
            Self::InvalidPairing { .. } | Self::InvalidOption { .. } | Self::Config { .. } => 2,
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap an IO error with the path it happened at.
pub fn fs_err(path: &std::path::Path, source: std::io::Error) -> DistlinkError {
    DistlinkError::Filesystem {
        path: path.to_path_buf(),
        source,
    }
}
