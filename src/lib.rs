//! distlink - directory-tree synchronization with pluggable source transforms
//!
//! Given a set of source → destination pairings, distlink mirrors each source
//! tree into its destination: recognized source files go through a pluggable
//! transform capability (primary output plus a map artifact), everything else
//! is hardlinked, symlinked, or copied, and the destination is reconciled
//! against stale state from earlier runs.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod linkcopy;
pub mod materialize;
pub mod orphan;
pub mod probe;
pub mod transform;
pub mod validate;

// Re-exports for convenience
pub use classify::{Classification, Pairing, WorkItem};
pub use config::Config;
pub use engine::{plan, run, SyncSummary};
pub use error::{DistlinkError, DistlinkResult};
pub use linkcopy::{LinkPolicy, Outcome};
pub use transform::{Passthrough, TransformOutput, Transformer};
