use std::path::Path;
use tracing::debug;

use crate::git::{Vcs, VcsError, VcsErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchAction {
    AlreadyCurrent,
    Switched,
    /// Created from the current position, then switched to.
    Created,
}

/// Ensure `branch` is checked out in the working copy at `path`.
///
/// Only [`VcsErrorKind::BranchNotFound`] is recovered from, by creating the
/// branch; every other checkout failure is returned unchanged.
pub fn reconcile_branch<V: Vcs + ?Sized>(
    vcs: &V,
    path: &Path,
    branch: &str,
) -> Result<BranchAction, VcsError> {
    if vcs.current_branch(path)?.as_deref() == Some(branch) {
        return Ok(BranchAction::AlreadyCurrent);
    }

    let action = match vcs.checkout(path, branch) {
        Ok(()) => BranchAction::Switched,
        Err(e) if e.kind() == VcsErrorKind::BranchNotFound => {
            vcs.checkout_new(path, branch)?;
            BranchAction::Created
        }
        Err(e) => return Err(e),
    };
    debug!(path = %path.display(), branch, ?action, "branch reconciled");
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedVcs, commit_all, git2_vcs, write};
    use git2::Repository;
    use tempfile::tempdir;

    #[test]
    fn absent_branch_is_created_from_current_position() {
        let td = tempdir().unwrap();
        let repo = Repository::init(td.path()).unwrap();
        write(&td.path().join("a.txt"), "a");
        let base = commit_all(&repo, "base");

        let vcs = git2_vcs();
        let action = reconcile_branch(&vcs, td.path(), "feature").unwrap();
        assert_eq!(action, BranchAction::Created);
        assert_eq!(vcs.current_branch(td.path()).unwrap().as_deref(), Some("feature"));
        let tip = repo.refname_to_id("refs/heads/feature").unwrap();
        assert_eq!(tip, base);
    }

    #[test]
    fn existing_branch_is_switched_to() {
        let td = tempdir().unwrap();
        let repo = Repository::init(td.path()).unwrap();
        write(&td.path().join("a.txt"), "a");
        commit_all(&repo, "base");
        let vcs = git2_vcs();
        let original = vcs.current_branch(td.path()).unwrap().unwrap();

        reconcile_branch(&vcs, td.path(), "feature").unwrap();
        let action = reconcile_branch(&vcs, td.path(), &original).unwrap();
        assert_eq!(action, BranchAction::Switched);
        assert_eq!(vcs.current_branch(td.path()).unwrap(), Some(original));
    }

    #[test]
    fn unborn_repository_points_head_at_branch() {
        let td = tempdir().unwrap();
        let vcs = git2_vcs();
        vcs.init(td.path()).unwrap();
        reconcile_branch(&vcs, td.path(), "release").unwrap();
        assert_eq!(vcs.current_branch(td.path()).unwrap().as_deref(), Some("release"));
        let again = reconcile_branch(&vcs, td.path(), "release").unwrap();
        assert_eq!(again, BranchAction::AlreadyCurrent);
    }

    #[test]
    fn other_checkout_failures_are_fatal() {
        let td = tempdir().unwrap();
        let vcs = ScriptedVcs::default();
        vcs.fail_checkout(VcsErrorKind::Conflict);
        let err = reconcile_branch(&vcs, td.path(), "feature").unwrap_err();
        assert_eq!(err.kind(), VcsErrorKind::Conflict);
        assert!(!vcs.calls().iter().any(|c| c.starts_with("checkout_new")));
    }
}
