//! feedsync - Reconciliation Layer
//!
//! Implements:
//! - Speculative local mutation before the remote call
//! - Overwrite with the authoritative result on success
//! - Rollback to the last confirmed state on failure
//! - Sequence fencing of overlapping invocations on the same post
//! - Dropping results that settle after the viewer changed

mod fence;
mod operation;
mod reconciler;

pub use fence::*;
pub use operation::*;
pub use reconciler::*;
