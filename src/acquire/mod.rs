//! Download side: obtain a ready-to-use working copy for a remote.

mod cleanup;
mod helper;
mod install;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::endpoint::RemoteEndpoint;
use crate::engine::Engine;
use crate::error::{AcquireStage, Error, Result};
use crate::git::{CommitId, Vcs};
use crate::reconcile::reconcile_remote;

pub use cleanup::{CleanupOutcome, RecoveryWarning, cleanup};
pub use helper::{HelperOutcome, ensure_helper_script};
pub use install::{CommandInstaller, InstallError, InstallOutput, Installer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionRequest {
    /// Web URL, transport URL, `acct/repo` or bare repository name.
    pub reference: String,
    pub branch: String,
    pub target: PathBuf,
}

impl AcquisitionRequest {
    pub fn new(reference: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            branch: "main".to_string(),
            target: target.into(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

/// How the working copy came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// An existing working copy was updated in place.
    Reused,
    Cloned,
    /// Updating the existing directory failed; it was removed and cloned fresh.
    Recloned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionResult {
    pub path: PathBuf,
    pub remote_url: Option<String>,
    pub commit: Option<CommitId>,
    pub how: Acquired,
}

fn validate(req: &AcquisitionRequest) -> Result<()> {
    if req.reference.trim().is_empty() {
        return Err(Error::Validation("remote reference is empty".into()));
    }
    if req.branch.trim().is_empty() {
        return Err(Error::Validation("branch name is empty".into()));
    }
    if req.target.as_os_str().is_empty() {
        return Err(Error::Validation("target path is empty".into()));
    }
    Ok(())
}

impl<V: Vcs, I: Installer> Engine<V, I> {
    /// Ensure a ready working copy of `req.reference` exists at `req.target`.
    ///
    /// Order: resolve endpoint, create parent, probe, then update-in-place or
    /// clone, install dependencies, ensure the helper script. A failure in the
    /// clone, install or helper step removes the target before the error is
    /// returned.
    pub fn acquire_project(&self, req: &AcquisitionRequest) -> Result<AcquisitionResult> {
        validate(req)?;
        let target = req.target.as_path();
        let _guard = self.locks.acquire(target);

        let endpoint = self
            .resolver
            .resolve(&self.resolver.reference_for(&req.reference));

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(Error::io("create directory", parent))?;
        }

        let state = self.probe(target);
        if state.exists && !state.is_dir {
            return Err(Error::Validation(format!(
                "{} exists and is not a directory",
                target.display()
            )));
        }

        let how = if state.is_dir {
            match self.update_in_place(target, &endpoint, &req.branch) {
                Ok(()) => Acquired::Reused,
                Err(e) => {
                    warn!(path = %target.display(), error = %e, "update failed, recloning");
                    cleanup(target);
                    self.clone_fresh(target, &endpoint, &req.branch)?;
                    Acquired::Recloned
                }
            }
        } else {
            self.clone_fresh(target, &endpoint, &req.branch)?;
            Acquired::Cloned
        };

        if let Some(installer) = &self.installer {
            let out = installer
                .install(target)
                .map_err(|e| self.abort(target, AcquireStage::Install, e.into()))?;
            debug!(output = %out.combined, "dependency install finished");
        }

        ensure_helper_script(
            target,
            &self.config.helper_script,
            &self.config.helper_template,
        )
        .map_err(|e| self.abort(target, AcquireStage::Helper, e))?;

        let commit = self.vcs.head_commit(target).unwrap_or_else(|e| {
            debug!(path = %target.display(), error = %e, "could not read head commit");
            None
        });
        info!(path = %target.display(), url = %endpoint.canonical_url, ?how, "project acquired");
        Ok(AcquisitionResult {
            path: target.to_path_buf(),
            remote_url: Some(endpoint.canonical_url),
            commit,
            how,
        })
    }

    /// Non-destructive path: point the remote at `endpoint` and fast-forward `branch`.
    fn update_in_place(
        &self,
        target: &Path,
        endpoint: &RemoteEndpoint,
        branch: &str,
    ) -> Result<()> {
        let remote = &self.config.remote_name;
        reconcile_remote(&self.vcs, target, remote, endpoint).map_err(|source| {
            Error::RemoteConfig {
                path: target.to_path_buf(),
                source,
            }
        })?;
        self.vcs
            .pull(target, remote, branch)
            .map_err(Error::vcs(target))
    }

    fn clone_fresh(
        &self,
        target: &Path,
        endpoint: &RemoteEndpoint,
        branch: &str,
    ) -> Result<()> {
        self.vcs
            .clone_repo(&endpoint.canonical_url, branch, target)
            .map_err(|e| self.abort(target, AcquireStage::Clone, Error::vcs(target)(e)))
    }

    /// Clean up `target` and wrap the failure. A failed cleanup is logged by
    /// [`cleanup`] and never replaces `source`.
    fn abort(&self, target: &Path, stage: AcquireStage, source: Error) -> Error {
        cleanup(target);
        Error::Acquisition {
            path: target.to_path_buf(),
            stage,
            source: Box::new(source),
        }
    }
}
