//! Upload side: publish a local project directory to its remote.

mod push;

use std::path::{Path, PathBuf};
use tracing::info;

use crate::acquire::Installer;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::git::{CommitId, PushMode, Vcs};
use crate::reconcile::{reconcile_branch, reconcile_remote};

pub use push::{PushState, push_with_fallback};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub path: PathBuf,
    /// Repository identifier: URL, `acct/repo` or bare name under the configured account.
    pub target: String,
    pub branch: String,
    pub message: String,
}

impl SyncRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
            branch: "main".to_string(),
            message: message.into(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub path: PathBuf,
    pub remote_url: Option<String>,
    pub commit: Option<CommitId>,
    /// Push form that succeeded.
    pub push_mode: PushMode,
}

fn validate(req: &SyncRequest, manifests: &[String]) -> Result<()> {
    if req.message.trim().is_empty() {
        return Err(Error::Validation("commit message is empty".into()));
    }
    if req.target.trim().is_empty() {
        return Err(Error::Validation("target repository is empty".into()));
    }
    if req.branch.trim().is_empty() {
        return Err(Error::Validation("branch name is empty".into()));
    }
    if !req.path.is_dir() {
        return Err(Error::Validation(format!(
            "{} does not exist or is not a directory",
            req.path.display()
        )));
    }
    if !has_manifest(&req.path, manifests) {
        return Err(Error::Validation(format!(
            "{} has no project manifest (expected one of: {})",
            req.path.display(),
            manifests.join(", ")
        )));
    }
    Ok(())
}

fn has_manifest(dir: &Path, manifests: &[String]) -> bool {
    manifests.iter().any(|m| dir.join(m).is_file())
}

impl<V: Vcs, I: Installer> Engine<V, I> {
    /// Stage, commit and push everything under `req.path` to `req.target`.
    ///
    /// Stages run strictly in order; each requires the previous one:
    /// 1. validate, reconcile the remote (repository exists afterwards),
    ///    reconcile the branch (HEAD is on `req.branch` afterwards);
    /// 2. stage all changes;
    /// 3. commit, failing with `NothingToCommit` on an empty change set;
    /// 4. push with the upstream fallback.
    pub fn synchronize_upload(&self, req: &SyncRequest) -> Result<SyncResult> {
        validate(req, &self.config.manifests)?;
        let path = req.path.as_path();
        let _guard = self.locks.acquire(path);

        let remote = self.config.remote_name.as_str();
        let endpoint = self
            .resolver
            .resolve(&self.resolver.reference_for(&req.target));
        reconcile_remote(&self.vcs, path, remote, &endpoint).map_err(|source| {
            Error::RemoteConfig {
                path: path.to_path_buf(),
                source,
            }
        })?;
        reconcile_branch(&self.vcs, path, &req.branch).map_err(Error::vcs(path))?;

        self.vcs.stage_all(path).map_err(Error::vcs(path))?;

        let commit = self
            .vcs
            .commit(path, &req.message)
            .map_err(Error::vcs(path))?;

        let push_mode =
            push_with_fallback(&self.vcs, path, remote, &req.branch).map_err(Error::vcs(path))?;

        info!(path = %path.display(), url = %endpoint.canonical_url, %commit, ?push_mode, "upload complete");
        Ok(SyncResult {
            path: path.to_path_buf(),
            remote_url: Some(endpoint.canonical_url),
            commit: Some(commit),
            push_mode,
        })
    }
}
