mod jobs;

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar};
use rayon::prelude::*;
use std::fs;
use std::time::Duration;
use tracing::{info, warn};

use crate::acquire::{AcquisitionResult, Installer};
use crate::cli::build_engine;
use crate::config::load_config;
use crate::engine::Engine;
use crate::error::Error;
use crate::git::Vcs;
use crate::paths::paths;
use crate::progress::{err_style, ok_style, spinner_style};

pub use jobs::{SyncJob, build_jobs};

/// Acquire every project listed under `[[projects]]`.
///
/// Jobs run in parallel on a pool of `workspace.jobs` threads, each with its
/// own spinner. A failing job is reported on its line and the rest keep going;
/// the command fails at the end if any job failed.
pub fn cmd_sync() -> Result<()> {
    let p = paths()?;
    let settings = load_config()?;
    if settings.projects.is_empty() {
        eprintln!("no projects in {}", p.config.display());
        return Ok(());
    }

    let projects_dir = settings.projects_dir(&p);
    fs::create_dir_all(&projects_dir)
        .with_context(|| format!("failed to create {}", projects_dir.display()))?;

    let engine = build_engine(&settings, &p);
    let jobs = build_jobs(&settings, engine.resolver(), &projects_dir);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.jobs())
        .build()
        .context("failed to start worker pool")?;
    let mp = MultiProgress::new();
    let results = pool.install(|| run_jobs(&engine, &jobs, &mp));

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        bail!("{} of {} projects failed to sync", failed, jobs.len());
    }
    Ok(())
}

/// Run `jobs` on the current rayon pool, one spinner per job in `mp`.
pub fn run_jobs<V: Vcs, I: Installer>(
    engine: &Engine<V, I>,
    jobs: &[SyncJob],
    mp: &MultiProgress,
) -> Vec<Result<AcquisitionResult, Error>> {
    let run_style = spinner_style();
    let done_style = ok_style();
    let fail_style = err_style();

    let mut bars: Vec<ProgressBar> = Vec::with_capacity(jobs.len());
    for j in jobs {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(run_style.clone());
        pb.set_message(format!("syncing {}", j.display));
        pb.enable_steady_tick(Duration::from_millis(80));
        bars.push(pb);
    }

    jobs.par_iter()
        .enumerate()
        .map(|(idx, job)| {
            let pb = &bars[idx];
            let res = engine.acquire_project(&job.request);
            match &res {
                Ok(r) => {
                    info!(project = %job.display, how = ?r.how, "synced");
                    pb.set_style(done_style.clone());
                    pb.finish_with_message(format!(
                        "synced {} -> {}",
                        job.display,
                        r.path.display()
                    ));
                }
                Err(e) => {
                    warn!(project = %job.display, error = %e, "sync failed");
                    pb.set_style(fail_style.clone());
                    pb.finish_with_message(format!("syncing {} (error: {})", job.display, e));
                }
            }
            res
        })
        .collect()
}
