use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};

/// Per-path mutual exclusion for engine requests.
///
/// Requests on different paths run in parallel; a second request on a path
/// that is already busy blocks until the first one's guard is dropped.
#[derive(Debug, Default)]
pub struct PathLocks {
    busy: Mutex<HashSet<PathBuf>>,
    freed: Condvar,
}

/// Releases the path when dropped, on every exit path of the request.
#[derive(Debug)]
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    key: PathBuf,
}

impl PathLocks {
    pub fn acquire(&self, path: &Path) -> PathGuard<'_> {
        let key = lock_key(path);
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        while busy.contains(&key) {
            busy = self
                .freed
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(key.clone());
        PathGuard { locks: self, key }
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        let mut busy = self
            .locks
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        busy.remove(&self.key);
        self.locks.freed.notify_all();
    }
}

/// Canonical form of the nearest existing ancestor joined with the missing tail.
///
/// The key for a path does not change when the path itself is created later.
fn lock_key(path: &Path) -> PathBuf {
    let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut tail = Vec::new();
    let mut cur = abs.as_path();
    loop {
        if let Ok(real) = fs::canonicalize(cur) {
            return tail.iter().rev().fold(real, |key, name| key.join(name));
        }
        match (cur.parent(), cur.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                cur = parent;
            }
            _ => return abs,
        }
    }
}
