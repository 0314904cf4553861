//! Crate entry point for **ferry**.
//!
//! ferry moves project working copies between a local workspace and a
//! hosting account. The library side is the reconciliation [`Engine`]:
//! upload ([`Engine::synchronize_upload`]) and download
//! ([`Engine::acquire_project`]) drive a working copy to the desired state
//! regardless of what is on disk beforehand. The `cmd_*` functions are the
//! thin CLI layer on top of it.

mod acquire;
mod cli;
mod config;
mod endpoint;
mod engine;
mod error;
mod git;
mod github;
mod lock;
mod paths;
mod probe;
mod progress;
mod reconcile;
mod sync;
mod upload;

#[cfg(test)]
mod testing;

pub use acquire::{
    Acquired, AcquisitionRequest, AcquisitionResult, CleanupOutcome, CommandInstaller,
    HelperOutcome, InstallError, InstallOutput, Installer, RecoveryWarning, cleanup,
    ensure_helper_script,
};
pub use cli::{build_engine, cmd_download, cmd_resolve, cmd_status, cmd_upload};
pub use config::{Project, Settings, load_config, load_config_from};
pub use endpoint::{EndpointResolver, Protocol, RemoteEndpoint, ResolverConfig};
pub use engine::{Engine, EngineConfig};
pub use error::{AcquireStage, Error, Result};
pub use git::{
    CommitId, Credentials, Git2Vcs, PushMode, Signer, Vcs, VcsError, VcsErrorKind,
};
pub use github::{GithubClient, GithubError, RepoSummary, cmd_create, cmd_repos};
pub use paths::{Paths, ferry_home, paths};
pub use probe::{WorkingCopyState, probe};
pub use reconcile::{BranchAction, RemoteAction, reconcile_branch, reconcile_remote};
pub use sync::cmd_sync;
pub use upload::{PushState, SyncRequest, SyncResult, push_with_fallback};
