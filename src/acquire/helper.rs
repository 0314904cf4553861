use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperOutcome {
    Present,
    Installed,
}

fn make_executable(p: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perm = fs::metadata(p)?.permissions();
    perm.set_mode(0o755);
    fs::set_permissions(p, perm)
}

/// Make sure `<dir>/<name>` exists and is executable, copying `template` if absent.
///
/// The copy goes through a temporary sibling and a rename so a crash never
/// leaves a truncated script behind.
pub fn ensure_helper_script(dir: &Path, name: &str, template: &Path) -> Result<HelperOutcome> {
    let dst = dir.join(name);
    let outcome = if dst.is_file() {
        HelperOutcome::Present
    } else {
        let tmp: PathBuf = dir.join(format!(".{name}.new"));
        fs::copy(template, &tmp).map_err(Error::io("copy helper template", template))?;
        fs::rename(&tmp, &dst).map_err(Error::io("install helper script", &dst))?;
        HelperOutcome::Installed
    };
    make_executable(&dst).map_err(Error::io("chmod helper script", &dst))?;
    Ok(outcome)
}
