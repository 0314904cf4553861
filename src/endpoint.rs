//! Remote reference normalization.
//!
//! Every remote the engine talks to goes through [`EndpointResolver::resolve`]
//! first, so a repository has exactly one URL form in `origin`, no matter
//! whether the caller handed us the browser URL or the transport URL.

use regex::Regex;

/// Transport family of a remote URL, derived purely from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ssh,
    Https,
    Local,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub canonical_url: String,
    pub protocol: Protocol,
}

impl RemoteEndpoint {
    /// Last path segment without a `.git` suffix, e.g. `repo` for `git@host:acct/repo.git`.
    pub fn repo_name(&self) -> Option<&str> {
        let tail = self
            .canonical_url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()?;
        let name = tail.strip_suffix(".git").unwrap_or(tail);
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Browser-facing prefix, e.g. `https://github.com/`.
    pub web_prefix: String,
    /// Canonical transport prefix, e.g. `git@github.com:`.
    pub canonical_prefix: String,
    /// Account used to expand bare repository names.
    pub account: Option<String>,
}

/// Rewrites remote references into their canonical transport form.
pub struct EndpointResolver {
    cfg: ResolverConfig,
    web: Regex,
    scp: Regex,
}

impl EndpointResolver {
    /// Compile the matchers for `cfg`.
    ///
    /// A missing trailing `/` on `web_prefix` is added.
    pub fn new(mut cfg: ResolverConfig) -> Self {
        if !cfg.web_prefix.ends_with('/') {
            cfg.web_prefix.push('/');
        }
        let pattern = format!(
            r"^{}([^/\s]+)/([^/\s]+?)(?:\.git)?/*$",
            regex::escape(&cfg.web_prefix)
        );
        let web = Regex::new(&pattern).unwrap();
        let scp = Regex::new(r"^[\w.-]+@[\w.-]+:").unwrap();
        Self { cfg, web, scp }
    }

    /// Rewrite a web-viewable reference to the canonical transport form;
    /// anything else passes through unchanged.
    pub fn resolve(&self, reference: &str) -> RemoteEndpoint {
        let reference = reference.trim();
        let canonical_url = match self.web.captures(reference) {
            Some(c) => format!("{}{}/{}.git", self.cfg.canonical_prefix, &c[1], &c[2]),
            None => reference.to_string(),
        };
        let protocol = self.classify(&canonical_url);
        RemoteEndpoint {
            canonical_url,
            protocol,
        }
    }

    /// Expand `repo` or `acct/repo` shorthand into a web-viewable reference.
    ///
    /// URLs and path-like identifiers (`/`, `.`, `~`) are returned as-is.
    pub fn reference_for(&self, identifier: &str) -> String {
        let id = identifier.trim();
        if id.contains("://")
            || self.scp.is_match(id)
            || id.starts_with(['/', '.', '~'])
        {
            return id.to_string();
        }
        match id.split_once('/') {
            Some((acct, repo)) if !acct.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                format!("{}{}/{}", self.cfg.web_prefix, acct, repo)
            }
            None if !id.is_empty() => match &self.cfg.account {
                Some(acct) => format!("{}{}/{}", self.cfg.web_prefix, acct, id),
                None => id.to_string(),
            },
            _ => id.to_string(),
        }
    }

    fn classify(&self, url: &str) -> Protocol {
        if url.starts_with("https://") || url.starts_with("http://") {
            Protocol::Https
        } else if url.starts_with("ssh://") || self.scp.is_match(url) {
            Protocol::Ssh
        } else if url.starts_with("file://") || !url.contains(':') {
            Protocol::Local
        } else {
            Protocol::Other
        }
    }
}
