//! Single-project commands behind the `ferry` binary.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::acquire::{AcquisitionRequest, CommandInstaller};
use crate::config::{Settings, load_config};
use crate::endpoint::EndpointResolver;
use crate::engine::Engine;
use crate::git::Git2Vcs;
use crate::paths::{Paths, paths};
use crate::progress::{ok_style, spinner};
use crate::upload::SyncRequest;

/// Engine wired from `config.toml`.
pub fn build_engine(settings: &Settings, p: &Paths) -> Engine<Git2Vcs, CommandInstaller> {
    Engine::new(
        settings.engine_config(p),
        Git2Vcs::new(settings.credentials(), settings.signer()),
        settings.installer(),
    )
}

fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

/// Stage, commit and push `path` to `repo`.
pub fn cmd_upload(path: &Path, repo: &str, message: &str, branch: Option<&str>) -> Result<()> {
    let p = paths()?;
    let settings = load_config()?;
    let engine = build_engine(&settings, &p);
    let branch = branch.unwrap_or(&settings.workspace.default_branch);

    let pb = spinner(format!("uploading {}", path.display()));
    let req = SyncRequest::new(path, repo, message).with_branch(branch);
    let res = match engine.synchronize_upload(&req) {
        Ok(res) => res,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("upload of {} failed", path.display()));
        }
    };

    pb.set_style(ok_style());
    pb.finish_with_message(format!(
        "pushed {} to {} ({})",
        res.commit.as_ref().map_or("-", |c| short(&c.0)),
        res.remote_url.as_deref().unwrap_or("-"),
        branch
    ));
    Ok(())
}

/// Fetch `repo` into `path`, defaulting to `<projects_dir>/<repo name>`.
pub fn cmd_download(repo: &str, path: Option<&Path>, branch: Option<&str>) -> Result<()> {
    let p = paths()?;
    let settings = load_config()?;
    let engine = build_engine(&settings, &p);
    let branch = branch.unwrap_or(&settings.workspace.default_branch);

    let target = match path {
        Some(t) => t.to_path_buf(),
        None => {
            let endpoint = engine.resolver().resolve(&engine.resolver().reference_for(repo));
            let name = endpoint
                .repo_name()
                .with_context(|| format!("cannot derive a directory name from {}", repo))?;
            settings.projects_dir(&p).join(name)
        }
    };

    let pb = spinner(format!("downloading {}", repo));
    let req = AcquisitionRequest::new(repo, &target).with_branch(branch);
    let res = match engine.acquire_project(&req) {
        Ok(res) => res,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("download of {} failed", repo));
        }
    };

    pb.set_style(ok_style());
    pb.finish_with_message(format!("{} ready at {} ({:?})", repo, res.path.display(), res.how));
    Ok(())
}

/// Print the probed working copy state of `path`.
pub fn cmd_status(path: &Path) -> Result<()> {
    let p = paths()?;
    let settings = load_config()?;
    let engine = build_engine(&settings, &p);
    let st = engine.probe(path);

    let yes_no = |b: bool| if b { "yes".green() } else { "no".red() };
    println!("{} {}", "path:".bold(), st.path.display());
    println!("  exists:      {}", yes_no(st.exists));
    println!("  directory:   {}", yes_no(st.is_dir));
    println!("  repository:  {}", yes_no(st.is_version_controlled));
    println!(
        "  branch:      {}",
        st.current_branch.as_deref().unwrap_or("-")
    );
    println!(
        "  remote:      {} ({})",
        st.remote_url.as_deref().unwrap_or("-"),
        engine.config().remote_name
    );
    Ok(())
}

/// Print the canonical form of a remote reference.
pub fn cmd_resolve(reference: &str) -> Result<()> {
    let settings = load_config()?;
    let resolver = EndpointResolver::new(settings.resolver_config());
    let endpoint = resolver.resolve(&resolver.reference_for(reference));
    println!("{} ({:?})", endpoint.canonical_url, endpoint.protocol);
    Ok(())
}
