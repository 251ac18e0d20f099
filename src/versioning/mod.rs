//! Policy versioning
//!
//! Structural diffs between policies and a versioned store of committed
//! policy revisions.

pub mod diff;
pub mod store;

pub use diff::{ChangeType, DiffEntry, DiffResult, PolicyDiffer, TransformSnapshot};
pub use store::{PolicyStore, PolicyVersion, PolicyVersionMetadata};
