use std::path::{Path, PathBuf};

use crate::acquire::{CommandInstaller, Installer};
use crate::endpoint::{EndpointResolver, ResolverConfig};
use crate::git::{Git2Vcs, Vcs};
use crate::lock::PathLocks;
use crate::probe::{WorkingCopyState, probe};

/// Values the engine needs, passed in explicitly at construction.
///
/// The engine never reads environment variables or well-known paths itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remote name reconciled in every working copy.
    pub remote_name: String,
    /// File names marking a directory as an uploadable project.
    pub manifests: Vec<String>,
    pub helper_script: String,
    pub helper_template: PathBuf,
    pub resolver: ResolverConfig,
}

/// The reconciliation engine.
///
/// Upload is [`Engine::synchronize_upload`], download is
/// [`Engine::acquire_project`]. Both hold a per-path lock for their full
/// duration; no other state survives between calls.
pub struct Engine<V = Git2Vcs, I = CommandInstaller> {
    pub(crate) config: EngineConfig,
    pub(crate) resolver: EndpointResolver,
    pub(crate) vcs: V,
    pub(crate) installer: Option<I>,
    pub(crate) locks: PathLocks,
}

impl<V: Vcs, I: Installer> Engine<V, I> {
    /// `installer = None` skips the dependency installation step.
    pub fn new(config: EngineConfig, vcs: V, installer: Option<I>) -> Self {
        let resolver = EndpointResolver::new(config.resolver.clone());
        Self {
            config,
            resolver,
            vcs,
            installer,
            locks: PathLocks::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn probe(&self, path: &Path) -> WorkingCopyState {
        probe(&self.vcs, path, &self.config.remote_name)
    }
}
