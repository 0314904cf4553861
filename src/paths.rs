use anyhow::{Result, anyhow};
use std::{env, path::PathBuf};

/// Well-known locations under the ferry home directory.
#[derive(Clone, Debug)]
pub struct Paths {
    pub config: PathBuf,
    pub templates: PathBuf,
    pub projects: PathBuf,
}

/// Resolve the ferry home: `$XDG_CONFIG_HOME/.ferry`, else `$HOME/.config/.ferry`.
pub fn ferry_home() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .ok_or_else(|| anyhow!("neither XDG_CONFIG_HOME nor HOME is set"))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(base.join(".ferry"))
}

pub fn paths() -> Result<Paths> {
    let home = ferry_home()?;
    Ok(Paths {
        config: home.join("config.toml"),
        templates: home.join("templates"),
        projects: home.join("projects"),
    })
}
