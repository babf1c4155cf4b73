//! Thin wrapper around the `git` command line, covering the handful of
//! operations needed to materialize a repository at a pinned revision:
//! clone, pull, forced checkout, and reading `HEAD`.

#[cfg(feature = "test_fixture")]
pub mod test_fixture;

use std::process::Command;

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};

/// A local checkout of a git repository.
#[derive(Debug, Clone)]
pub struct Repo {
    directory: Utf8PathBuf,
}

impl Repo {
    /// Wrap an existing checkout. Fails if the directory doesn't contain one.
    pub fn new(directory: impl Into<Utf8PathBuf>) -> anyhow::Result<Self> {
        let repo = Self {
            directory: directory.into(),
        };
        repo.git(&["rev-parse", "--git-dir"])
            .with_context(|| format!("{} is not a git repository", repo.directory))?;
        Ok(repo)
    }

    /// Clone `url` into `directory`, limited to `branch`.
    ///
    /// When `commit` is non-empty the checkout is moved to that revision:
    /// first with a plain `checkout`, and if the commit isn't reachable from
    /// the cloned branch, by fetching it from `origin` explicitly.
    pub fn clone_at(
        url: &str,
        branch: &str,
        directory: impl Into<Utf8PathBuf>,
        commit: &str,
    ) -> anyhow::Result<Self> {
        let directory = directory.into();
        if let Some(parent) = directory.parent() {
            fs_err::create_dir_all(parent)?;
        }
        git_in(
            directory.parent().unwrap_or(Utf8Path::new(".")),
            &[
                "clone",
                "--single-branch",
                "--branch",
                branch,
                url,
                directory.as_str(),
            ],
        )
        .with_context(|| format!("cannot clone {url} into {directory}"))?;

        let repo = Self { directory };
        if !commit.is_empty() {
            repo.checkout_forced(commit)?;
        }
        Ok(repo)
    }

    /// Pull `branch` from origin and, when `commit` is non-empty, force the
    /// working tree onto that revision.
    pub fn update_to(&self, branch: &str, commit: &str) -> anyhow::Result<()> {
        self.git(&["pull", "origin", branch, "--force"])
            .with_context(|| format!("cannot pull branch {branch} in {}", self.directory))?;
        if !commit.is_empty() {
            self.git(&["checkout", "--force", commit])
                .with_context(|| format!("cannot checkout {commit} in {}", self.directory))?;
        }
        Ok(())
    }

    /// Current `HEAD` as a full hex hash.
    pub fn head(&self) -> anyhow::Result<String> {
        self.git(&["rev-parse", "HEAD"]).context("cannot read HEAD")
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    fn checkout_forced(&self, commit: &str) -> anyhow::Result<()> {
        if self.git(&["checkout", commit]).is_ok() {
            return Ok(());
        }
        // The commit isn't in the cloned branch history. Ask origin for it.
        self.git(&["fetch", "origin", commit])
            .with_context(|| format!("cannot fetch commit {commit} from origin"))?;
        self.git(&["checkout", commit])
            .with_context(|| format!("cannot checkout fetched commit {commit}"))?;
        Ok(())
    }

    /// Run a git command in the repository directory.
    ///
    /// Returns the trimmed stdout. On a non-zero exit the error message
    /// carries git's stderr.
    pub fn git(&self, args: &[&str]) -> anyhow::Result<String> {
        git_in(&self.directory, args)
    }
}

fn git_in(directory: &Utf8Path, args: &[&str]) -> anyhow::Result<String> {
    debug!("running git {} in {directory}", args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(directory)
        .args(args)
        .output()
        .context("cannot run git. Is it installed?")?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    trace!("git stdout: {stdout}");

    if output.status.success() {
        Ok(stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(anyhow!("git {} failed: {stderr}", args.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixture::LocalRepo;

    #[test]
    fn clone_at_checks_out_branch_head() {
        test_logs::init();
        let upstream = LocalRepo::with_commits(&["first", "second"]);
        let dest = tempfile::tempdir().unwrap();
        let dest_dir = Utf8PathBuf::from_path_buf(dest.path().join("clone")).unwrap();

        let repo = Repo::clone_at(upstream.url().as_str(), "main", &dest_dir, "").unwrap();
        assert_eq!(repo.head().unwrap(), upstream.head());
    }

    #[test]
    fn clone_at_pins_older_commit() {
        test_logs::init();
        let upstream = LocalRepo::with_commits(&["first", "second"]);
        let first = upstream.commits()[0].clone();
        let dest = tempfile::tempdir().unwrap();
        let dest_dir = Utf8PathBuf::from_path_buf(dest.path().join("clone")).unwrap();

        let repo = Repo::clone_at(upstream.url().as_str(), "main", &dest_dir, &first).unwrap();
        assert_eq!(repo.head().unwrap(), first);
    }

    #[test]
    fn update_to_follows_new_upstream_commits() {
        test_logs::init();
        let mut upstream = LocalRepo::with_commits(&["first"]);
        let dest = tempfile::tempdir().unwrap();
        let dest_dir = Utf8PathBuf::from_path_buf(dest.path().join("clone")).unwrap();
        let repo = Repo::clone_at(upstream.url().as_str(), "main", &dest_dir, "").unwrap();

        upstream.commit("second");
        repo.update_to("main", "").unwrap();
        assert_eq!(repo.head().unwrap(), upstream.head());
    }

    #[test]
    fn failed_command_reports_stderr() {
        test_logs::init();
        let upstream = LocalRepo::with_commits(&["first"]);
        let repo = Repo::new(upstream.directory().to_owned()).unwrap();
        let err = repo.git(&["checkout", "no-such-ref"]).unwrap_err();
        assert!(err.to_string().contains("git checkout no-such-ref failed"));
    }
}
