//! Shared fixtures for unit tests.

use git2::{IndexAddOption, Oid, Repository, Signature, build::RepoBuilder};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::acquire::{InstallError, InstallOutput, Installer};
use crate::endpoint::ResolverConfig;
use crate::engine::{Engine, EngineConfig};
use crate::git::{
    CommitId, Credentials, Git2Vcs, PushMode, Signer, Vcs, VcsError, VcsErrorKind,
};

pub fn git2_vcs() -> Git2Vcs {
    Git2Vcs::new(
        Credentials::default(),
        Signer {
            name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
        },
    )
}

pub fn test_engine<V: Vcs>(
    vcs: V,
    helper_template: PathBuf,
    installer: Option<RecordingInstaller>,
) -> Engine<V, RecordingInstaller> {
    let config = EngineConfig {
        remote_name: "origin".to_string(),
        manifests: vec!["package.json".to_string()],
        helper_script: "run.sh".to_string(),
        helper_template,
        resolver: ResolverConfig {
            web_prefix: "https://github.com/".to_string(),
            canonical_prefix: "git@github.com:".to_string(),
            account: Some("acct".to_string()),
        },
    };
    Engine::new(config, vcs, installer)
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Stage everything and commit on HEAD, bypassing the code under test.
pub fn commit_all(repo: &Repository, msg: &str) -> Oid {
    let mut idx = repo.index().unwrap();
    idx.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
    idx.write().unwrap();
    let tree_id = idx.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
        .unwrap()
}

/// Bare repository at `<root>/remote.git` with one commit of `files` on `branch`.
pub fn seeded_remote(root: &Path, branch: &str, files: &[(&str, &str)]) -> PathBuf {
    let bare = root.join("remote.git");
    Repository::init_bare(&bare).unwrap();

    let seed = root.join("seed");
    let repo = Repository::init(&seed).unwrap();
    repo.set_head(&format!("refs/heads/{branch}")).unwrap();
    for (name, body) in files {
        write(&seed.join(name), body);
    }
    commit_all(&repo, "seed");

    let mut remote = repo.remote("origin", bare.to_str().unwrap()).unwrap();
    let spec = format!("refs/heads/{branch}:refs/heads/{branch}");
    remote.push(&[spec.as_str()], None).unwrap();
    bare
}

static SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// Add a commit with one file to `branch` of the bare repository `remote`.
pub fn push_commit(remote: &Path, branch: &str, file: &str, body: &str) -> Oid {
    let n = SCRATCH.fetch_add(1, Ordering::SeqCst);
    let scratch = remote.with_file_name(format!("scratch-{n}"));
    let repo = RepoBuilder::new()
        .branch(branch)
        .clone(remote.to_str().unwrap(), &scratch)
        .unwrap();
    write(&scratch.join(file), body);
    let oid = commit_all(&repo, &format!("add {file}"));
    let mut origin = repo.find_remote("origin").unwrap();
    let spec = format!("refs/heads/{branch}:refs/heads/{branch}");
    origin.push(&[spec.as_str()], None).unwrap();
    oid
}

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    repo: bool,
    branch: Option<String>,
    remotes: Vec<(String, String)>,
    checkout_failure: Option<VcsErrorKind>,
    push_failures: HashMap<PushMode, VcsErrorKind>,
}

/// In-memory [`Vcs`] that records mutating calls and fails on demand.
#[derive(Default)]
pub struct ScriptedVcs {
    script: Mutex<Script>,
}

impl ScriptedVcs {
    pub const COMMIT: &'static str = "c0ffee";

    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut self.script.lock().unwrap())
    }

    fn record(&self, call: String) {
        self.with(|s| s.calls.push(call));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn fail_checkout(&self, kind: VcsErrorKind) {
        self.with(|s| s.checkout_failure = Some(kind));
    }

    pub fn fail_push(&self, mode: PushMode, kind: VcsErrorKind) {
        self.with(|s| s.push_failures.insert(mode, kind));
    }
}

impl Vcs for ScriptedVcs {
    fn is_repository(&self, _path: &Path) -> bool {
        self.with(|s| s.repo)
    }

    fn current_branch(&self, _path: &Path) -> Result<Option<String>, VcsError> {
        Ok(self.with(|s| s.branch.clone()))
    }

    fn remote_url(&self, _path: &Path, name: &str) -> Result<Option<String>, VcsError> {
        Ok(self.with(|s| {
            s.remotes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, u)| u.clone())
        }))
    }

    fn remote_names(&self, _path: &Path) -> Result<Vec<String>, VcsError> {
        Ok(self.with(|s| s.remotes.iter().map(|(n, _)| n.clone()).collect()))
    }

    fn init(&self, _path: &Path) -> Result<(), VcsError> {
        self.record("init".to_string());
        self.with(|s| {
            s.repo = true;
            s.branch = Some("master".to_string());
        });
        Ok(())
    }

    fn add_remote(&self, _path: &Path, name: &str, url: &str) -> Result<(), VcsError> {
        self.record(format!("remote add {name} {url}"));
        self.with(|s| s.remotes.push((name.to_string(), url.to_string())));
        Ok(())
    }

    fn remove_remote(&self, _path: &Path, name: &str) -> Result<(), VcsError> {
        self.record(format!("remote remove {name}"));
        self.with(|s| s.remotes.retain(|(n, _)| n != name));
        Ok(())
    }

    fn checkout(&self, _path: &Path, branch: &str) -> Result<(), VcsError> {
        self.record(format!("checkout {branch}"));
        self.with(|s| match s.checkout_failure {
            Some(kind) => Err(VcsError::new(kind, "checkout", "scripted")),
            None if s.branch.as_deref() == Some(branch) => Ok(()),
            None => Err(VcsError::new(
                VcsErrorKind::BranchNotFound,
                "checkout",
                "scripted",
            )),
        })
    }

    fn checkout_new(&self, _path: &Path, branch: &str) -> Result<(), VcsError> {
        self.record(format!("checkout_new {branch}"));
        self.with(|s| s.branch = Some(branch.to_string()));
        Ok(())
    }

    fn stage_all(&self, _path: &Path) -> Result<(), VcsError> {
        self.record("stage_all".to_string());
        Ok(())
    }

    fn commit(&self, _path: &Path, message: &str) -> Result<CommitId, VcsError> {
        self.record(format!("commit {message}"));
        Ok(CommitId(Self::COMMIT.to_string()))
    }

    fn push(
        &self,
        _path: &Path,
        _remote: &str,
        branch: &str,
        mode: PushMode,
    ) -> Result<(), VcsError> {
        self.record(format!("push {branch} {mode:?}"));
        match self.with(|s| s.push_failures.get(&mode).copied()) {
            Some(kind) => Err(VcsError::new(kind, "push", "scripted")),
            None => Ok(()),
        }
    }

    fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<(), VcsError> {
        self.record(format!("clone {url} {branch}"));
        fs::create_dir_all(dest)
            .map_err(|e| VcsError::new(VcsErrorKind::Other, "clone", e.to_string()))?;
        self.with(|s| s.repo = true);
        Ok(())
    }

    fn pull(&self, _path: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.record(format!("pull {remote} {branch}"));
        Ok(())
    }

    fn head_commit(&self, _path: &Path) -> Result<Option<CommitId>, VcsError> {
        Ok(None)
    }
}

/// Installer that records the directories it ran in.
#[derive(Default)]
pub struct RecordingInstaller {
    fail: bool,
    seen: Mutex<Vec<PathBuf>>,
}

impl RecordingInstaller {
    pub fn failing() -> Self {
        Self {
            fail: true,
            seen: Mutex::default(),
        }
    }

    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl Installer for RecordingInstaller {
    fn install(&self, dir: &Path) -> Result<InstallOutput, InstallError> {
        self.seen.lock().unwrap().push(dir.to_path_buf());
        if self.fail {
            return Err(InstallError::Failed {
                program: "npm".to_string(),
                status: "exit status: 1".to_string(),
                output: "ERR! missing script".to_string(),
            });
        }
        Ok(InstallOutput {
            combined: "added 0 packages".to_string(),
        })
    }
}
