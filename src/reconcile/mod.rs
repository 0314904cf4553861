//! Drive a local working copy towards a desired remote and branch.
//!
//! Both reconcilers re-read state from disk on every call and converge: a
//! second call with the same inputs is a no-op.

mod branch;
mod remote;

pub use branch::{BranchAction, reconcile_branch};
pub use remote::{RemoteAction, reconcile_remote};
