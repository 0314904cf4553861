use std::path::Path;
use tracing::debug;

use crate::endpoint::RemoteEndpoint;
use crate::git::{Vcs, VcsError};
use crate::probe::probe;

/// What [`reconcile_remote`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// The directory had no git metadata; initialized and registered the remote.
    Initialized,
    Added,
    Repointed,
    Unchanged,
}

/// Ensure `path` is a working copy whose `remote` points at `desired`.
///
/// Precondition: `path` is an existing directory. On return the remote
/// exists exactly once with `desired.canonical_url`.
pub fn reconcile_remote<V: Vcs + ?Sized>(
    vcs: &V,
    path: &Path,
    remote: &str,
    desired: &RemoteEndpoint,
) -> Result<RemoteAction, VcsError> {
    let state = probe(vcs, path, remote);
    let url = desired.canonical_url.as_str();

    let action = if !state.is_version_controlled {
        vcs.init(path)?;
        vcs.add_remote(path, remote, url)?;
        RemoteAction::Initialized
    } else {
        match state.remote_url.as_deref() {
            None => {
                // A remote entry without a url still blocks `remote add`.
                if vcs.remote_names(path)?.iter().any(|n| n == remote) {
                    vcs.remove_remote(path, remote)?;
                }
                vcs.add_remote(path, remote, url)?;
                RemoteAction::Added
            }
            Some(current) if current != url => {
                vcs.remove_remote(path, remote)?;
                vcs.add_remote(path, remote, url)?;
                RemoteAction::Repointed
            }
            Some(_) => RemoteAction::Unchanged,
        }
    };

    debug!(path = %path.display(), remote, url, ?action, "remote reconciled");
    Ok(action)
}
