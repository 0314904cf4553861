use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::acquire::CommandInstaller;
use crate::endpoint::ResolverConfig;
use crate::engine::EngineConfig;
use crate::git::{Credentials, Signer};
use crate::paths::{Paths, paths};

/// Top-level configuration loaded from `config.toml`.
///
/// Every section is optional. Example:
/// ```toml
/// [github]
/// account = "octocat"
/// token   = "ghp_..."
///
/// [author]
/// name  = "Octo Cat"
/// email = "octo@example.com"
///
/// [workspace]
/// default_branch = "main"
/// manifests      = ["package.json"]
/// helper_script  = "run.sh"
///
/// [install]
/// program = "npm"
/// args    = ["install"]
///
/// [[projects]]
/// repo = "octocat/hello-world"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github: GithubSettings,
    pub author: AuthorSettings,
    pub workspace: WorkspaceSettings,
    pub install: InstallSettings,
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub account: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
    pub web_prefix: String,
    pub canonical_prefix: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            account: None,
            token: None,
            api_url: "https://api.github.com".to_string(),
            web_prefix: "https://github.com/".to_string(),
            canonical_prefix: "git@github.com:".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthorSettings {
    pub name: String,
    pub email: String,
}

impl Default for AuthorSettings {
    fn default() -> Self {
        Self {
            name: "ferry".to_string(),
            email: "ferry@localhost".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub default_branch: String,
    pub manifests: Vec<String>,
    pub helper_script: String,
    /// Defaults to `<ferry home>/templates`.
    pub template_dir: Option<PathBuf>,
    /// Defaults to `<ferry home>/projects`.
    pub projects_dir: Option<PathBuf>,
    /// Parallel jobs for `ferry sync`; defaults to the number of CPUs.
    pub jobs: Option<usize>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            manifests: vec!["package.json".to_string()],
            helper_script: "run.sh".to_string(),
            template_dir: None,
            projects_dir: None,
            jobs: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InstallSettings {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "npm".to_string(),
            args: vec!["install".to_string()],
        }
    }
}

/// A project entry under `[[projects]]`, acquired by `ferry sync`.
#[derive(Debug, Deserialize, Clone)]
pub struct Project {
    pub repo: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Settings {
    /// Resolver prefixes and account from `[github]`.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            web_prefix: self.github.web_prefix.clone(),
            canonical_prefix: self.github.canonical_prefix.clone(),
            account: self.github.account.clone(),
        }
    }

    /// Build the engine's explicit configuration.
    ///
    /// The helper template is `<template_dir>/<helper_script>`, where
    /// `template_dir` falls back to `<ferry home>/templates`.
    pub fn engine_config(&self, p: &Paths) -> EngineConfig {
        let template_dir = self
            .workspace
            .template_dir
            .clone()
            .unwrap_or_else(|| p.templates.clone());
        EngineConfig {
            remote_name: "origin".to_string(),
            manifests: self.workspace.manifests.clone(),
            helper_script: self.workspace.helper_script.clone(),
            helper_template: template_dir.join(&self.workspace.helper_script),
            resolver: self.resolver_config(),
        }
    }

    /// HTTPS credentials: the account (or `git`) plus the optional token.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self
                .github
                .account
                .clone()
                .unwrap_or_else(|| "git".to_string()),
            token: self.github.token.clone(),
        }
    }

    pub fn signer(&self) -> Signer {
        Signer {
            name: self.author.name.clone(),
            email: self.author.email.clone(),
        }
    }

    /// `None` when the install step is disabled.
    pub fn installer(&self) -> Option<CommandInstaller> {
        self.install
            .enabled
            .then(|| CommandInstaller::new(&self.install.program, &self.install.args))
    }

    /// Parent directory for projects acquired without an explicit path.
    pub fn projects_dir(&self, p: &Paths) -> PathBuf {
        self.workspace
            .projects_dir
            .clone()
            .unwrap_or_else(|| p.projects.clone())
    }

    /// Worker count for batch sync; zero or unset means one per CPU.
    pub fn jobs(&self) -> usize {
        self.workspace.jobs.filter(|n| *n > 0).unwrap_or_else(num_cpus::get)
    }
}

/// Load `config.toml` from the ferry home. A missing file yields defaults.
pub fn load_config() -> Result<Settings> {
    let p = paths()?;
    if !p.config.exists() {
        return Ok(Settings::default());
    }
    load_config_from(&p.config)
}

/// Parse `path` as a ferry config.
///
/// # Errors
/// Fails when the file cannot be read or is not valid TOML for [`Settings`];
/// the message names the file.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    let cfg: Settings = toml::from_str(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let td = tempdir().unwrap();
        let f = td.path().join("config.toml");
        fs::write(&f, "").unwrap();
        let cfg = load_config_from(&f).unwrap();
        assert_eq!(cfg.workspace.default_branch, "main");
        assert_eq!(cfg.github.canonical_prefix, "git@github.com:");
        assert_eq!(cfg.install.program, "npm");
        assert!(cfg.install.enabled);
        assert!(cfg.projects.is_empty());
    }

    #[test]
    fn sections_override_defaults() {
        let td = tempdir().unwrap();
        let f = td.path().join("config.toml");
        fs::write(
            &f,
            r#"
[github]
account = "acct"
token = "secret"

[workspace]
manifests = ["Cargo.toml", "package.json"]
helper_script = "dev.sh"
template_dir = "/opt/tmpl"
jobs = 3

[install]
enabled = false

[[projects]]
repo = "acct/one"

[[projects]]
repo = "two"
path = "/srv/two"
branch = "dev"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&f).unwrap();
        assert_eq!(cfg.credentials().username, "acct");
        assert_eq!(cfg.credentials().token.as_deref(), Some("secret"));
        assert_eq!(cfg.jobs(), 3);
        assert!(cfg.installer().is_none());
        assert_eq!(cfg.projects.len(), 2);
        assert_eq!(cfg.projects[1].branch.as_deref(), Some("dev"));

        let p = Paths {
            config: f.clone(),
            templates: td.path().join("templates"),
            projects: td.path().join("projects"),
        };
        let ec = cfg.engine_config(&p);
        assert_eq!(ec.helper_template, PathBuf::from("/opt/tmpl/dev.sh"));
        assert_eq!(ec.manifests, vec!["Cargo.toml", "package.json"]);
        assert_eq!(ec.resolver.account.as_deref(), Some("acct"));
    }

    #[test]
    fn invalid_toml_is_reported_with_path() {
        let td = tempdir().unwrap();
        let f = td.path().join("config.toml");
        fs::write(&f, "[[projects]\nrepo=").unwrap();
        let err = load_config_from(&f).unwrap_err();
        assert!(format!("{err}").contains("config.toml"));
    }
}
