//! Git integration layer.
//!
//! The reconcilers and pipelines only talk to the [`Vcs`] trait. The
//! production implementation is [`Git2Vcs`], built on the `git2` crate;
//! tests substitute scripted implementations to drive failure paths.
//!
//! Failures carry a [`VcsErrorKind`] so callers decide on recovery from the
//! category, never from the message text.

mod git2_backend;

use std::fmt;
use std::path::Path;
use thiserror::Error;

pub use git2_backend::Git2Vcs;

/// Failure category of a VCS operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsErrorKind {
    /// The requested local branch does not exist.
    BranchNotFound,
    /// The directory is not a working copy.
    NotARepository,
    /// A named remote, ref or object is missing.
    NotFound,
    /// Commit attempted with no staged difference.
    NothingToCommit,
    /// The remote refused the update (non-fast-forward, hook, protected ref).
    Rejected,
    /// Local and remote histories diverged; a fast-forward is impossible.
    Diverged,
    /// Pushed, but recording the upstream tracking branch failed.
    Upstream,
    /// Working tree changes would be overwritten.
    Conflict,
    /// Network-level failure talking to the remote.
    Transport,
    /// Credentials were refused.
    Auth,
    Other,
}

impl VcsErrorKind {
    /// Whether a failed upstream-establishing push may be retried as a plain push.
    pub fn allows_plain_push_retry(self) -> bool {
        !matches!(self, VcsErrorKind::Transport | VcsErrorKind::Auth)
    }
}

#[derive(Debug, Clone, Error)]
#[error("git {op} failed: {message}")]
pub struct VcsError {
    kind: VcsErrorKind,
    op: &'static str,
    message: String,
}

impl VcsError {
    pub fn new(kind: VcsErrorKind, op: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            op,
            message: message.into(),
        }
    }

    /// Failure category; callers branch on this, never on the message.
    pub fn kind(&self) -> VcsErrorKind {
        self.kind
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a push records the upstream relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushMode {
    /// Push and set `branch.<name>.remote/merge` (`git push -u`).
    SetUpstream,
    Plain,
}

/// Hex id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(pub String);

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credentials offered to remotes over HTTPS; SSH goes through the agent.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub token: Option<String>,
}

/// Identity recorded on commits.
#[derive(Debug, Clone)]
pub struct Signer {
    pub name: String,
    pub email: String,
}

/// The version-control command surface the engine drives.
///
/// All operations take the working copy path explicitly; implementations
/// must not cache repository state between calls.
pub trait Vcs: Send + Sync {
    /// Whether `path` can be opened as a working copy (no upward search).
    fn is_repository(&self, path: &Path) -> bool;
    /// Branch HEAD points at, including an unborn one. `None` when detached.
    fn current_branch(&self, path: &Path) -> Result<Option<String>, VcsError>;
    /// URL of remote `name`; `None` when the remote is absent or has no URL.
    fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>, VcsError>;
    /// Names of all configured remotes.
    fn remote_names(&self, path: &Path) -> Result<Vec<String>, VcsError>;
    /// Create git metadata in an existing directory.
    fn init(&self, path: &Path) -> Result<(), VcsError>;
    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), VcsError>;
    fn remove_remote(&self, path: &Path, name: &str) -> Result<(), VcsError>;
    /// Switch to an existing local branch; [`VcsErrorKind::BranchNotFound`] when absent.
    fn checkout(&self, path: &Path, branch: &str) -> Result<(), VcsError>;
    /// Create `branch` at the current position and switch to it.
    fn checkout_new(&self, path: &Path, branch: &str) -> Result<(), VcsError>;
    /// Stage new, modified and deleted files.
    fn stage_all(&self, path: &Path) -> Result<(), VcsError>;
    /// Commit the index on HEAD.
    ///
    /// # Errors
    /// [`VcsErrorKind::NothingToCommit`] when the index matches HEAD.
    fn commit(&self, path: &Path, message: &str) -> Result<CommitId, VcsError>;
    /// Push `branch` to `remote`, recording the upstream when `mode` asks for it.
    fn push(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
        mode: PushMode,
    ) -> Result<(), VcsError>;
    /// Clone `url` into `dest` with `branch` checked out.
    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<(), VcsError>;
    /// Fetch `branch` from `remote` and fast-forward the local branch onto it.
    fn pull(&self, path: &Path, remote: &str, branch: &str) -> Result<(), VcsError>;
    /// Commit HEAD resolves to; `None` on an unborn branch.
    fn head_commit(&self, path: &Path) -> Result<Option<CommitId>, VcsError>;
}
