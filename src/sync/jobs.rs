use std::path::Path;

use crate::acquire::AcquisitionRequest;
use crate::config::Settings;
use crate::endpoint::EndpointResolver;

/// One `[[projects]]` entry turned into an acquisition.
#[derive(Clone, Debug)]
pub struct SyncJob {
    pub display: String,
    pub request: AcquisitionRequest,
}

/// Build acquisition jobs from `settings.projects`.
///
/// A project without `path` lands in `<projects_dir>/<repo name>`; when no
/// repository name can be derived the identifier is slugged (`/` becomes `__`).
/// Entries with an empty `repo` are skipped.
pub fn build_jobs(
    settings: &Settings,
    resolver: &EndpointResolver,
    projects_dir: &Path,
) -> Vec<SyncJob> {
    let mut jobs = Vec::new();
    for pr in &settings.projects {
        let repo = pr.repo.trim();
        if repo.is_empty() {
            continue;
        }
        let target = match &pr.path {
            Some(p) => p.clone(),
            None => {
                let endpoint = resolver.resolve(&resolver.reference_for(repo));
                let name = endpoint
                    .repo_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| repo.replace('/', "__"));
                projects_dir.join(name)
            }
        };
        let branch = pr
            .branch
            .clone()
            .unwrap_or_else(|| settings.workspace.default_branch.clone());
        jobs.push(SyncJob {
            display: repo.to_string(),
            request: AcquisitionRequest::new(repo, target).with_branch(branch),
        });
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Project;
    use std::path::PathBuf;

    fn project(repo: &str, path: Option<&str>, branch: Option<&str>) -> Project {
        Project {
            repo: repo.to_string(),
            path: path.map(PathBuf::from),
            branch: branch.map(str::to_string),
        }
    }

    #[test]
    fn jobs_default_to_projects_dir_and_default_branch() {
        let mut settings = Settings::default();
        settings.github.account = Some("acct".to_string());
        settings.workspace.default_branch = "trunk".to_string();
        settings.projects = vec![
            project("site", None, None),
            project("other/tool", Some("/srv/tool"), Some("dev")),
            project("  ", None, None),
        ];
        let resolver = EndpointResolver::new(settings.resolver_config());

        let jobs = build_jobs(&settings, &resolver, Path::new("/work"));
        assert_eq!(jobs.len(), 2);

        assert_eq!(jobs[0].display, "site");
        assert_eq!(jobs[0].request.target, PathBuf::from("/work/site"));
        assert_eq!(jobs[0].request.branch, "trunk");

        assert_eq!(jobs[1].request.target, PathBuf::from("/srv/tool"));
        assert_eq!(jobs[1].request.branch, "dev");
        assert_eq!(jobs[1].request.reference, "other/tool");
    }
}
