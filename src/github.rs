//! Account-level GitHub REST calls: list and create repositories.

use anyhow::{Context, Result};
use colored::Colorize;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::load_config;

const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github token is not configured ([github] token in config.toml)")]
    MissingToken,
    #[error("invalid github token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    pub html_url: String,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRepo<'a> {
    name: &'a str,
    private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// Blocking client for the authenticated user's repositories.
pub struct GithubClient {
    client: Client,
    api: String,
}

impl GithubClient {
    /// Build a client against `api_url` (e.g. `https://api.github.com`).
    ///
    /// # Errors
    /// [`GithubError::MissingToken`] when `token` is absent or empty.
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self, GithubError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(GithubError::MissingToken)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ferry"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            api: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// All repositories visible to the authenticated user, following pagination.
    pub fn list_repos(&self) -> Result<Vec<RepoSummary>, GithubError> {
        let url = format!("{}/user/repos", self.api);
        let mut all = Vec::new();
        for page in 1.. {
            let batch: Vec<RepoSummary> = self
                .client
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()?
                .error_for_status()?
                .json()?;
            debug!(page, count = batch.len(), "listed repositories");
            let last = batch.len() < PER_PAGE;
            all.extend(batch);
            if last {
                break;
            }
        }
        Ok(all)
    }

    /// Create `name` under the authenticated account.
    ///
    /// # Arguments
    /// - `private`: repository visibility.
    /// - `description`: omitted from the request when `None`.
    pub fn create_repo(
        &self,
        name: &str,
        private: bool,
        description: Option<&str>,
    ) -> Result<RepoSummary, GithubError> {
        let body = CreateRepo {
            name,
            private,
            description,
        };
        let repo = self
            .client
            .post(format!("{}/user/repos", self.api))
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(repo)
    }
}

fn client_from_config() -> Result<GithubClient> {
    let cfg = load_config()?;
    GithubClient::new(&cfg.github.api_url, cfg.github.token.as_deref())
        .context("failed to build github client")
}

/// CLI command: list the account's repositories.
pub fn cmd_repos() -> Result<()> {
    let client = client_from_config()?;
    for r in client.list_repos()? {
        let vis = if r.private {
            "private".yellow()
        } else {
            "public".green()
        };
        match r.description.as_deref().filter(|d| !d.is_empty()) {
            Some(d) => println!("- {} [{}] {}", r.full_name, vis, d.dimmed()),
            None => println!("- {} [{}]", r.full_name, vis),
        }
    }
    Ok(())
}

/// CLI command: create a repository under the authenticated account.
pub fn cmd_create(name: &str, private: bool, description: Option<&str>) -> Result<()> {
    let client = client_from_config()?;
    let repo = client
        .create_repo(name, private, description)
        .with_context(|| format!("failed to create repository {}", name))?;
    println!("{}", repo.html_url);
    Ok(())
}
