use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Cleanup could not remove partially-materialized state.
///
/// Reported and logged only; it never replaces the error that triggered cleanup.
#[derive(Debug, Error)]
#[error("failed to remove {}: {source}", path.display())]
pub struct RecoveryWarning {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug)]
pub enum CleanupOutcome {
    Removed,
    Absent,
    Failed(RecoveryWarning),
}

/// Best-effort recursive removal of `path` so a retry starts clean.
///
/// Symlinks are removed, never followed.
pub fn cleanup(path: &Path) -> CleanupOutcome {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return CleanupOutcome::Absent,
        Err(e) => return failed(path, e),
    };
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Ok(()) => {
            info!(path = %path.display(), "removed partial working copy");
            CleanupOutcome::Removed
        }
        Err(e) => failed(path, e),
    }
}

fn failed(path: &Path, source: io::Error) -> CleanupOutcome {
    let w = RecoveryWarning {
        path: path.to_path_buf(),
        source,
    };
    warn!(warning = %w, "cleanup failed");
    CleanupOutcome::Failed(w)
}
