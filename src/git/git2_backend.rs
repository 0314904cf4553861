use git2::{
    BranchType, Cred, ErrorClass, ErrorCode, FetchOptions, IndexAddOption, PushOptions,
    RemoteCallbacks, Repository, Signature,
    build::{CheckoutBuilder, RepoBuilder},
};
use std::cell::RefCell;
use std::path::Path;

use super::{CommitId, Credentials, PushMode, Signer, Vcs, VcsError, VcsErrorKind};

/// [`Vcs`] implementation backed by libgit2.
///
/// Every call opens the repository afresh; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Git2Vcs {
    credentials: Credentials,
    signer: Signer,
}

/// Map a libgit2 error onto a failure category using its code and class.
fn classify(op: &'static str, err: git2::Error) -> VcsError {
    let kind = match (err.code(), err.class()) {
        (ErrorCode::Auth, _) => VcsErrorKind::Auth,
        (ErrorCode::NotFastForward, _) => VcsErrorKind::Rejected,
        (ErrorCode::Conflict | ErrorCode::MergeConflict | ErrorCode::Uncommitted, _) => {
            VcsErrorKind::Conflict
        }
        (ErrorCode::NotFound | ErrorCode::UnbornBranch, _) => VcsErrorKind::NotFound,
        (ErrorCode::Certificate, _)
        | (_, ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssh | ErrorClass::Ssl) => {
            VcsErrorKind::Transport
        }
        _ => VcsErrorKind::Other,
    };
    VcsError::new(kind, op, err.message())
}

/// Open the working copy at `path` without searching parent directories.
///
/// # Errors
/// [`VcsErrorKind::NotARepository`] when `path` has no git metadata.
fn open(path: &Path, op: &'static str) -> Result<Repository, VcsError> {
    Repository::open(path).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            VcsError::new(
                VcsErrorKind::NotARepository,
                op,
                format!("{} is not a git working copy", path.display()),
            )
        } else {
            classify(op, e)
        }
    })
}

/// Target of a symbolic HEAD, e.g. `refs/heads/main`; `None` when detached.
fn head_target(repo: &Repository, op: &'static str) -> Result<Option<String>, VcsError> {
    let head = repo.find_reference("HEAD").map_err(|e| classify(op, e))?;
    Ok(head.symbolic_target().map(str::to_string))
}

impl Git2Vcs {
    pub fn new(credentials: Credentials, signer: Signer) -> Self {
        Self {
            credentials,
            signer,
        }
    }

    /// Callbacks offering SSH-agent keys, then the configured token, then defaults.
    ///
    /// libgit2 re-invokes the credential callback after each rejection, so the
    /// number of attempts is capped.
    fn remote_callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let creds = self.credentials.clone();
        let mut attempts = 0u8;
        let mut cb = RemoteCallbacks::new();
        cb.credentials(move |_url, username_from_url, allowed| {
            attempts += 1;
            if attempts > 3 {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Callback,
                    "credentials rejected by remote",
                ));
            }
            if allowed.is_ssh_key() {
                return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
            }
            if allowed.is_user_pass_plaintext()
                && let Some(token) = &creds.token
            {
                return Cred::userpass_plaintext(&creds.username, token);
            }
            Cred::default()
        });
        cb
    }

    fn fetch_options<'a>(&self) -> FetchOptions<'a> {
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(self.remote_callbacks());
        fo
    }
}

impl Vcs for Git2Vcs {
    fn is_repository(&self, path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    fn current_branch(&self, path: &Path) -> Result<Option<String>, VcsError> {
        let repo = open(path, "status")?;
        Ok(head_target(&repo, "status")?
            .and_then(|t| t.strip_prefix("refs/heads/").map(str::to_string)))
    }

    fn remote_url(&self, path: &Path, name: &str) -> Result<Option<String>, VcsError> {
        let repo = open(path, "remote get-url")?;
        match repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(classify("remote get-url", e)),
        }
    }

    fn remote_names(&self, path: &Path) -> Result<Vec<String>, VcsError> {
        let repo = open(path, "remote")?;
        let names = repo.remotes().map_err(|e| classify("remote", e))?;
        Ok(names.iter().flatten().map(str::to_string).collect())
    }

    fn init(&self, path: &Path) -> Result<(), VcsError> {
        Repository::init(path)
            .map(|_| ())
            .map_err(|e| classify("init", e))
    }

    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), VcsError> {
        let repo = open(path, "remote add")?;
        repo.remote(name, url)
            .map(|_| ())
            .map_err(|e| classify("remote add", e))
    }

    fn remove_remote(&self, path: &Path, name: &str) -> Result<(), VcsError> {
        let repo = open(path, "remote remove")?;
        repo.remote_delete(name)
            .map_err(|e| classify("remote remove", e))
    }

    fn checkout(&self, path: &Path, branch: &str) -> Result<(), VcsError> {
        let repo = open(path, "checkout")?;
        let refname = format!("refs/heads/{branch}");
        if head_target(&repo, "checkout")?.as_deref() == Some(refname.as_str()) {
            return Ok(());
        }

        let reference = match repo.find_branch(branch, BranchType::Local) {
            Ok(b) => b.into_reference(),
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(VcsError::new(
                    VcsErrorKind::BranchNotFound,
                    "checkout",
                    format!("branch {branch} not found"),
                ));
            }
            Err(e) => return Err(classify("checkout", e)),
        };
        let commit = reference
            .peel_to_commit()
            .map_err(|e| classify("checkout", e))?;
        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| classify("checkout", e))?;
        repo.set_head(&refname)
            .map_err(|e| classify("checkout", e))
    }

    fn checkout_new(&self, path: &Path, branch: &str) -> Result<(), VcsError> {
        let repo = open(path, "checkout -b")?;
        match repo.head() {
            Ok(head) => {
                let commit = head
                    .peel_to_commit()
                    .map_err(|e| classify("checkout -b", e))?;
                repo.branch(branch, &commit, false)
                    .map_err(|e| classify("checkout -b", e))?;
            }
            // No commits yet: pointing HEAD at the new name is all `checkout -b` does.
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {}
            Err(e) => return Err(classify("checkout -b", e)),
        }
        repo.set_head(&format!("refs/heads/{branch}"))
            .map_err(|e| classify("checkout -b", e))
    }

    fn stage_all(&self, path: &Path) -> Result<(), VcsError> {
        let repo = open(path, "add")?;
        let mut index = repo.index().map_err(|e| classify("add", e))?;
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .map_err(|e| classify("add", e))?;
        index
            .update_all(["*"], None)
            .map_err(|e| classify("add", e))?;
        index.write().map_err(|e| classify("add", e))
    }

    fn commit(&self, path: &Path, message: &str) -> Result<CommitId, VcsError> {
        let repo = open(path, "commit")?;
        let mut index = repo.index().map_err(|e| classify("commit", e))?;
        let tree_id = index.write_tree().map_err(|e| classify("commit", e))?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit().map_err(|e| classify("commit", e))?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(classify("commit", e)),
        };
        let unchanged = match &parent {
            Some(p) => p.tree_id() == tree_id,
            None => index.is_empty(),
        };
        if unchanged {
            return Err(VcsError::new(
                VcsErrorKind::NothingToCommit,
                "commit",
                "nothing to commit, working tree clean",
            ));
        }

        let tree = repo.find_tree(tree_id).map_err(|e| classify("commit", e))?;
        let sig = Signature::now(&self.signer.name, &self.signer.email)
            .map_err(|e| classify("commit", e))?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(|e| classify("commit", e))?;
        Ok(CommitId(oid.to_string()))
    }

    fn push(
        &self,
        path: &Path,
        remote_name: &str,
        branch: &str,
        mode: PushMode,
    ) -> Result<(), VcsError> {
        let repo = open(path, "push")?;
        let mut remote = repo
            .find_remote(remote_name)
            .map_err(|e| classify("push", e))?;
        let local_ref = format!("refs/heads/{branch}");
        let refspec = format!("{local_ref}:{local_ref}");

        let rejected: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut cb = self.remote_callbacks();
            cb.push_update_reference(|refname, status| {
                if let Some(msg) = status {
                    *rejected.borrow_mut() = Some(format!("{refname}: {msg}"));
                }
                Ok(())
            });
            let mut opts = PushOptions::new();
            opts.remote_callbacks(cb);
            remote
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|e| classify("push", e))?;
        }
        if let Some(msg) = rejected.into_inner() {
            return Err(VcsError::new(VcsErrorKind::Rejected, "push", msg));
        }

        let oid = repo
            .refname_to_id(&local_ref)
            .map_err(|e| classify("push", e))?;
        repo.reference(
            &format!("refs/remotes/{remote_name}/{branch}"),
            oid,
            true,
            "ferry: update remote tracking ref after push",
        )
        .map_err(|e| classify("push", e))?;

        if mode == PushMode::SetUpstream {
            let mut local = repo
                .find_branch(branch, BranchType::Local)
                .map_err(|e| classify("push", e))?;
            local
                .set_upstream(Some(&format!("{remote_name}/{branch}")))
                .map_err(|e| VcsError::new(VcsErrorKind::Upstream, "push", e.message()))?;
        }
        Ok(())
    }

    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<(), VcsError> {
        let mut builder = RepoBuilder::new();
        builder.branch(branch);
        builder.fetch_options(self.fetch_options());
        builder
            .clone(url, dest)
            .map(|_| ())
            .map_err(|e| classify("clone", e))
    }

    /// Local commits ahead of the remote are kept; a local branch that
    /// neither contains nor is contained in the fetched tip is `Diverged`.
    fn pull(&self, path: &Path, remote_name: &str, branch: &str) -> Result<(), VcsError> {
        let repo = open(path, "pull")?;
        let mut remote = repo
            .find_remote(remote_name)
            .map_err(|e| classify("pull", e))?;
        let tracking = format!("refs/remotes/{remote_name}/{branch}");
        let refspec = format!("+refs/heads/{branch}:{tracking}");
        let mut fo = self.fetch_options();
        remote
            .fetch(&[refspec.as_str()], Some(&mut fo), None)
            .map_err(|e| classify("fetch", e))?;

        let fetched = repo
            .find_reference(&tracking)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| classify("pull", e))?;
        let local_ref = format!("refs/heads/{branch}");

        let tip = match repo.find_reference(&local_ref) {
            Ok(local) => {
                let local_oid = local.target().ok_or_else(|| {
                    VcsError::new(VcsErrorKind::Other, "pull", "local branch is symbolic")
                })?;
                let descends = |a, b| {
                    repo.graph_descendant_of(a, b)
                        .map_err(|e| classify("pull", e))
                };
                if local_oid == fetched.id() || descends(local_oid, fetched.id())? {
                    local_oid
                } else if descends(fetched.id(), local_oid)? {
                    fetched.id()
                } else {
                    return Err(VcsError::new(
                        VcsErrorKind::Diverged,
                        "pull",
                        format!("{branch} and {remote_name}/{branch} have diverged"),
                    ));
                }
            }
            Err(e) if e.code() == ErrorCode::NotFound => fetched.id(),
            Err(e) => return Err(classify("pull", e)),
        };

        let target = repo.find_commit(tip).map_err(|e| classify("pull", e))?;
        repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| classify("pull", e))?;
        repo.reference(&local_ref, tip, true, "ferry: fast-forward")
            .map_err(|e| classify("pull", e))?;
        repo.set_head(&local_ref)
            .map_err(|e| classify("pull", e))
    }

    fn head_commit(&self, path: &Path) -> Result<Option<CommitId>, VcsError> {
        let repo = open(path, "rev-parse")?;
        match repo.head() {
            Ok(head) => Ok(head.target().map(|oid| CommitId(oid.to_string()))),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(classify("rev-parse", e)),
        }
    }
}
