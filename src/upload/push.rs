//! Push with upstream-establishing first attempt and a plain-push fallback.
//!
//! ```text
//! Upstream --ok--> done
//!    |
//!    +--retryable failure--> Plain --ok--> done
//!    |                         |
//!    +--transport/auth------> error <--any failure
//! ```

use std::path::Path;
use tracing::debug;

use crate::git::{PushMode, Vcs, VcsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    Upstream,
    Plain,
}

impl PushState {
    pub fn mode(self) -> PushMode {
        match self {
            PushState::Upstream => PushMode::SetUpstream,
            PushState::Plain => PushMode::Plain,
        }
    }

    /// State to enter after a failed attempt; `None` when the failure is terminal.
    pub fn on_failure(self, err: &VcsError) -> Option<PushState> {
        match self {
            PushState::Upstream if err.kind().allows_plain_push_retry() => Some(PushState::Plain),
            _ => None,
        }
    }
}

/// Run the push state machine to completion, returning the mode that succeeded.
pub fn push_with_fallback<V: Vcs + ?Sized>(
    vcs: &V,
    path: &Path,
    remote: &str,
    branch: &str,
) -> Result<PushMode, VcsError> {
    let mut state = PushState::Upstream;
    loop {
        match vcs.push(path, remote, branch, state.mode()) {
            Ok(()) => return Ok(state.mode()),
            Err(err) => match state.on_failure(&err) {
                Some(next) => {
                    debug!(branch, error = %err, ?next, "push attempt failed, retrying");
                    state = next;
                }
                None => return Err(err),
            },
        }
    }
}
