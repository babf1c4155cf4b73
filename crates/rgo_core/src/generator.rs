use std::collections::BTreeMap;
use std::sync::Arc;

use git_cmd::Repo;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{
    ConfigStore, Error, GitOp, GoWorkspace, LogReporter, Phase, ProgressPhase, RepoSpec, Reporter,
    Result, RgoConfig, ServiceTreeBuilder, WorkspacePaths, write_package_metadata,
};

/// Upper bound on concurrent repository fetches.
const FETCH_WORKERS: usize = 8;

/// Plans and executes a full regeneration: fetch every configured IDL repo,
/// then rebuild the service trees whose repo revision changed.
///
/// `run` is idempotent: with no external changes a second run fetches
/// nothing and touches no files.
#[derive(Debug)]
pub struct RgoGenerator {
    paths: WorkspacePaths,
    store: Arc<ConfigStore>,
    reporter: Arc<dyn Reporter>,
    phase: Phase,
    fetch_workers: usize,
}

/// What one `run` did, for logging and editor notifications.
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Repo name → resolved HEAD, for repos that were actually touched.
    pub changed_repos: BTreeMap<String, String>,
    pub generated_services: Vec<String>,
    pub failed_repos: Vec<String>,
    pub failed_services: Vec<String>,
}

impl RgoGenerator {
    pub fn new(paths: WorkspacePaths, store: Arc<ConfigStore>) -> Self {
        Self {
            paths,
            store,
            reporter: Arc::new(LogReporter),
            phase: Phase::Edit,
            fetch_workers: FETCH_WORKERS,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Render the build-phase client instead of the edit-phase stub.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Run a full regeneration.
    ///
    /// Only a failure to read the configuration is fatal; every per-repo and
    /// per-binding failure is logged, reported, and contained to its item.
    pub async fn run(&self) -> Result<GenerationSummary> {
        let config = self.store.read()?;
        let mut summary = GenerationSummary::default();

        self.reporter.progress_begin(ProgressPhase::FetchIdl);
        self.fetch_repos(&config, &mut summary).await;
        self.reporter.progress_end(ProgressPhase::FetchIdl);

        if !summary.changed_repos.is_empty() {
            self.pin_commits(&config, &summary.changed_repos);
        }

        self.reporter.progress_begin(ProgressPhase::CodeGen);
        self.generate_services(&config, &mut summary);
        self.reporter.progress_end(ProgressPhase::CodeGen);

        info!(
            "regeneration finished: {} repos changed, {} services generated",
            summary.changed_repos.len(),
            summary.generated_services.len()
        );
        Ok(summary)
    }

    /// Phase 1: bring every configured repo to its pinned revision, in
    /// parallel, recording resolved heads for the repos that were touched.
    async fn fetch_repos(&self, config: &RgoConfig, summary: &mut GenerationSummary) {
        let semaphore = Arc::new(Semaphore::new(self.fetch_workers));
        let mut workers = JoinSet::new();

        for repo in config.repos.clone() {
            let paths = self.paths.clone();
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let name = repo.repo_name.clone();
                let result =
                    tokio::task::spawn_blocking(move || sync_repo(&paths, &repo)).await;
                (name, result)
            });
        }

        while let Some(joined) = workers.join_next().await {
            let Ok((name, result)) = joined else {
                // A worker task can only abort on panic; the repo is lost
                // for this cycle.
                continue;
            };
            match result {
                Ok(Ok(Some(commit))) => {
                    debug!("repo {name} moved to {commit}");
                    summary.changed_repos.insert(name, commit);
                }
                Ok(Ok(None)) => debug!("repo {name} already at pinned commit"),
                Ok(Err(e)) => {
                    error!("failed to sync repo {name}: {e:#}");
                    self.reporter.error(&format!("failed to sync repo {name}: {e}"));
                    summary.failed_repos.push(name);
                }
                Err(e) => {
                    error!("repo worker for {name} panicked: {e}");
                    summary.failed_repos.push(name);
                }
            }
        }
    }

    /// Write the resolved commits back into the YAML config.
    fn pin_commits(&self, config: &RgoConfig, changed: &BTreeMap<String, String>) {
        let mut repos = config.repos.clone();
        for repo in &mut repos {
            if let Some(commit) = changed.get(&repo.repo_name) {
                repo.commit = commit.clone();
            }
        }
        if let Err(e) = self.store.rewrite("idl_repos", &repos) {
            error!("cannot pin resolved commits into config: {e:#}");
            self.reporter
                .error(&format!("cannot update pinned commits: {e}"));
        }
    }

    /// Phase 2: rebuild the bindings whose repo changed, serially.
    fn generate_services(&self, config: &RgoConfig, summary: &mut GenerationSummary) {
        let builder = ServiceTreeBuilder::new(&self.paths, config);
        let mut built_any = false;

        for binding in &config.idls {
            if !summary.changed_repos.contains_key(&binding.repo_name) {
                continue;
            }
            if config.repo_for(binding).is_none() {
                warn!(
                    "binding {} references unknown repo {}; skipping",
                    binding.service_name, binding.repo_name
                );
                continue;
            }

            let result = builder
                .build(binding, self.phase)
                .and_then(|()| write_package_metadata(&self.paths, &binding.format_service_name));
            match result {
                Ok(()) => {
                    built_any = true;
                    summary
                        .generated_services
                        .push(binding.service_name.clone());
                }
                Err(e) => {
                    error!("failed to generate {}: {e:#}", binding.service_name);
                    self.reporter
                        .error(&format!("failed to generate {}: {e}", binding.service_name));
                    summary.failed_services.push(binding.service_name.clone());
                }
            }
        }

        if built_any {
            let workspace = GoWorkspace::new(self.paths.project_dir(), config.mode);
            if let Err(e) = workspace.sync() {
                warn!("go work sync failed: {e:#}");
            }
        }
    }
}

/// Decision for one repo in the fetch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepoAction {
    /// No pinned commit: throw away any stale clone and resolve the branch
    /// head fresh.
    CloneFresh,
    /// Pinned commit but no clone yet.
    CloneAtCommit,
    /// Clone present but not at the pinned commit.
    SyncToPinned,
    UpToDate,
}

fn plan_repo_action(pinned_commit: &str, dir_exists: bool, current_head: Option<&str>) -> RepoAction {
    if pinned_commit.is_empty() {
        RepoAction::CloneFresh
    } else if !dir_exists {
        RepoAction::CloneAtCommit
    } else if current_head != Some(pinned_commit) {
        RepoAction::SyncToPinned
    } else {
        RepoAction::UpToDate
    }
}

/// Bring one repo's checkout to the configured revision.
///
/// Returns the resolved HEAD when the checkout was touched, `None` when it
/// was already at the pinned commit.
fn sync_repo(paths: &WorkspacePaths, repo: &RepoSpec) -> Result<Option<String>> {
    let dir = paths.idl_repo_dir(&repo.repo_name);
    let dir_exists = dir.exists();

    let git_err = |op: GitOp| {
        let repo_name = repo.repo_name.clone();
        move |source: anyhow::Error| Error::Git {
            op,
            repo: repo_name,
            source,
        }
    };

    let current_head = if dir_exists && !repo.commit.is_empty() {
        let checkout = Repo::new(dir.clone()).map_err(git_err(GitOp::Head))?;
        Some(checkout.head().map_err(git_err(GitOp::Head))?)
    } else {
        None
    };

    match plan_repo_action(&repo.commit, dir_exists, current_head.as_deref()) {
        RepoAction::CloneFresh => {
            if dir_exists {
                fs_err::remove_dir_all(&dir).map_err(|e| Error::Io {
                    path: dir.clone(),
                    source: e,
                })?;
            }
            let checkout = Repo::clone_at(&repo.git_url, &repo.branch, dir, "")
                .map_err(git_err(GitOp::Clone))?;
            let head = checkout.head().map_err(git_err(GitOp::Head))?;
            Ok(Some(head))
        }
        RepoAction::CloneAtCommit => {
            let checkout = Repo::clone_at(&repo.git_url, &repo.branch, dir, &repo.commit)
                .map_err(git_err(GitOp::Clone))?;
            let head = checkout.head().map_err(git_err(GitOp::Head))?;
            Ok(Some(head))
        }
        RepoAction::SyncToPinned => {
            let checkout = Repo::new(dir).map_err(git_err(GitOp::Pull))?;
            checkout
                .update_to(&repo.branch, &repo.commit)
                .map_err(git_err(GitOp::Pull))?;
            let head = checkout.head().map_err(git_err(GitOp::Head))?;
            Ok(Some(head))
        }
        RepoAction::UpToDate => Ok(None),
    }
}
