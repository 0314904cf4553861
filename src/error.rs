use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acquire::InstallError;
use crate::git::VcsError;

/// Step of the acquisition pipeline that failed terminally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStage {
    Clone,
    Install,
    Helper,
}

impl fmt::Display for AcquireStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcquireStage::Clone => "clone",
            AcquireStage::Install => "dependency install",
            AcquireStage::Helper => "helper script",
        })
    }
}

/// Errors surfaced by [`crate::Engine`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Request rejected before any side effect.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("failed to configure remote for {}: {source}", path.display())]
    RemoteConfig {
        path: PathBuf,
        #[source]
        source: VcsError,
    },

    #[error("{source} ({})", path.display())]
    Vcs {
        path: PathBuf,
        #[source]
        source: VcsError,
    },

    /// Terminal acquisition failure; cleanup of `path` has already been attempted.
    #[error("acquisition of {} failed during {stage}: {source}", path.display())]
    Acquisition {
        path: PathBuf,
        stage: AcquireStage,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io<'a>(
        op: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(io::Error) -> Error + 'a {
        move |source| Error::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn vcs(path: &Path) -> impl FnOnce(VcsError) -> Error + '_ {
        move |source| Error::Vcs {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The underlying VCS failure, looking through acquisition wrapping.
    pub fn vcs_error(&self) -> Option<&VcsError> {
        match self {
            Error::RemoteConfig { source, .. } | Error::Vcs { source, .. } => Some(source),
            Error::Acquisition { source, .. } => source.vcs_error(),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
