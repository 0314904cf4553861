use std::path::{Path, PathBuf};
use tracing::debug;

use crate::git::Vcs;

/// Observed version-control state of a local path.
///
/// Always produced fresh by [`probe`]; the filesystem may change under us
/// between requests, so this is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopyState {
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
    pub is_version_controlled: bool,
    pub current_branch: Option<String>,
    pub remote_url: Option<String>,
}

impl WorkingCopyState {
    pub fn has_remote(&self) -> bool {
        self.remote_url.is_some()
    }
}

/// Inspect `path` without mutating it.
///
/// A missing path or a plain directory is a valid state, not an error. Read
/// failures on an existing working copy are logged and reported as unknown.
pub fn probe<V: Vcs + ?Sized>(vcs: &V, path: &Path, remote: &str) -> WorkingCopyState {
    let exists = path.exists();
    let is_dir = path.is_dir();
    let is_version_controlled = is_dir && vcs.is_repository(path);

    let (current_branch, remote_url) = if is_version_controlled {
        let branch = vcs.current_branch(path).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "could not read current branch");
            None
        });
        let url = vcs.remote_url(path, remote).unwrap_or_else(|e| {
            debug!(path = %path.display(), error = %e, "could not read remote url");
            None
        });
        (branch, url)
    } else {
        (None, None)
    };

    WorkingCopyState {
        path: path.to_path_buf(),
        exists,
        is_dir,
        is_version_controlled,
        current_branch,
        remote_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::git2_vcs;
    use tempfile::tempdir;

    #[test]
    fn missing_path_is_a_valid_state() {
        let td = tempdir().unwrap();
        let st = probe(&git2_vcs(), &td.path().join("nope"), "origin");
        assert!(!st.exists);
        assert!(!st.is_version_controlled);
        assert_eq!(st.current_branch, None);
    }

    #[test]
    fn plain_directory_is_uninitialized() {
        let td = tempdir().unwrap();
        let st = probe(&git2_vcs(), td.path(), "origin");
        assert!(st.exists && st.is_dir);
        assert!(!st.is_version_controlled);
    }

    #[test]
    fn file_path_is_not_a_working_copy() {
        let td = tempdir().unwrap();
        let f = td.path().join("file");
        std::fs::write(&f, "x").unwrap();
        let st = probe(&git2_vcs(), &f, "origin");
        assert!(st.exists && !st.is_dir);
        assert!(!st.is_version_controlled);
    }

    #[test]
    fn working_copy_reports_branch_and_remote() {
        let td = tempdir().unwrap();
        let vcs = git2_vcs();
        vcs.init(td.path()).unwrap();
        vcs.checkout_new(td.path(), "main").unwrap();
        let st = probe(&vcs, td.path(), "origin");
        assert!(st.is_version_controlled);
        assert!(!st.has_remote());
        assert_eq!(st.current_branch.as_deref(), Some("main"));

        vcs.add_remote(td.path(), "origin", "git@github.com:a/b.git")
            .unwrap();
        let st = probe(&vcs, td.path(), "origin");
        assert_eq!(st.remote_url.as_deref(), Some("git@github.com:a/b.git"));
    }
}
