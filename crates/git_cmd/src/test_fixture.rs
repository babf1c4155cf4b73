//! Helpers to build throwaway local repositories for tests.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::Repo;

/// A git repository in a temporary directory, usable as a clone source via
/// its `file://` URL.
#[derive(Debug)]
pub struct LocalRepo {
    _dir: TempDir,
    directory: Utf8PathBuf,
    commits: Vec<String>,
}

impl LocalRepo {
    /// Create a repository on branch `main` with one empty commit per message.
    pub fn with_commits(messages: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let directory = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        run_git(&directory, &["init", "--initial-branch", "main"]);
        run_git(&directory, &["config", "user.email", "test@example.com"]);
        run_git(&directory, &["config", "user.name", "test"]);
        // Allow `git pull` from clones of this fixture.
        run_git(&directory, &["config", "receive.denyCurrentBranch", "ignore"]);

        let mut repo = Self {
            _dir: dir,
            directory,
            commits: vec![],
        };
        for message in messages {
            repo.commit(message);
        }
        repo
    }

    /// Add an empty commit and return its hash.
    pub fn commit(&mut self, message: &str) -> String {
        run_git(
            &self.directory,
            &["commit", "--allow-empty", "-m", message],
        );
        let head = self.head();
        self.commits.push(head.clone());
        head
    }

    pub fn head(&self) -> String {
        Repo::new(self.directory.clone()).unwrap().head().unwrap()
    }

    /// Commit hashes in creation order.
    pub fn commits(&self) -> &[String] {
        &self.commits
    }

    /// `file://` URL usable as a clone source.
    pub fn url(&self) -> String {
        format!("file://{}", self.directory)
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }
}

fn run_git(directory: &Utf8Path, args: &[&str]) {
    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(directory)
        .args(args)
        .output()
        .expect("cannot run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
