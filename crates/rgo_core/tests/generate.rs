//! End-to-end tests of the fetch phase and config pinning, backed by local
//! git repositories. Bindings are left empty so no Go toolchain is needed.

use std::sync::Arc;

use camino::Utf8PathBuf;
use git_cmd::test_fixture::LocalRepo;
use rgo_core::{ConfigStore, RgoGenerator, WorkspacePaths};

struct TestProject {
    _dir: tempfile::TempDir,
    paths: WorkspacePaths,
    store: Arc<ConfigStore>,
}

fn project_with_config(config: &str) -> TestProject {
    test_logs::init();
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let project_dir = root.join("project");
    fs_err::create_dir_all(&project_dir).unwrap();

    let config_path = project_dir.join("rgo_config.yaml");
    fs_err::write(&config_path, config).unwrap();

    TestProject {
        _dir: dir,
        paths: WorkspacePaths::new(root.join("cache"), project_dir),
        store: Arc::new(ConfigStore::new(config_path)),
    }
}

fn config_for(upstream: &LocalRepo, commit: &str) -> String {
    format!(
        r#"project_module: demo
idl_repos:
  - repo_name: svc_repo
    git_url: {url}
    branch: main
    commit: "{commit}"
idls: []
"#,
        url = upstream.url()
    )
}

#[tokio::test]
async fn fresh_run_clones_and_pins_the_resolved_head() {
    let upstream = LocalRepo::with_commits(&["first", "second"]);
    let project = project_with_config(&config_for(&upstream, ""));

    let generator = RgoGenerator::new(project.paths.clone(), Arc::clone(&project.store));
    let summary = generator.run().await.unwrap();

    assert_eq!(summary.changed_repos["svc_repo"], upstream.head());
    assert!(project.paths.idl_repo_dir("svc_repo").join(".git").exists());

    let config = project.store.read().unwrap();
    assert_eq!(config.repos[0].commit, upstream.head());
}

#[tokio::test]
async fn second_run_is_a_noop() {
    let upstream = LocalRepo::with_commits(&["first"]);
    let project = project_with_config(&config_for(&upstream, ""));
    let generator = RgoGenerator::new(project.paths.clone(), Arc::clone(&project.store));

    generator.run().await.unwrap();
    let after_first = fs_err::read_to_string(project.store.path()).unwrap();

    let summary = generator.run().await.unwrap();
    assert!(summary.changed_repos.is_empty());
    assert!(summary.failed_repos.is_empty());

    let after_second = fs_err::read_to_string(project.store.path()).unwrap();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn pinning_an_older_commit_forces_the_checkout_back() {
    let upstream = LocalRepo::with_commits(&["first", "second"]);
    let older = upstream.commits()[0].clone();
    let project = project_with_config(&config_for(&upstream, ""));
    let generator = RgoGenerator::new(project.paths.clone(), Arc::clone(&project.store));

    generator.run().await.unwrap();

    // The user pins an older commit by editing the config.
    fs_err::write(project.store.path(), config_for(&upstream, &older)).unwrap();

    let summary = generator.run().await.unwrap();
    assert_eq!(summary.changed_repos["svc_repo"], older);

    let checkout = git_cmd::Repo::new(project.paths.idl_repo_dir("svc_repo")).unwrap();
    assert_eq!(checkout.head().unwrap(), older);
}

#[tokio::test]
async fn a_failing_repo_does_not_block_the_others() {
    let upstream = LocalRepo::with_commits(&["first"]);
    let config = format!(
        r#"idl_repos:
  - repo_name: broken
    git_url: file:///nonexistent/repo
    branch: main
    commit: ""
  - repo_name: svc_repo
    git_url: {url}
    branch: main
    commit: ""
idls: []
"#,
        url = upstream.url()
    );
    let project = project_with_config(&config);
    let generator = RgoGenerator::new(project.paths.clone(), Arc::clone(&project.store));

    let summary = generator.run().await.unwrap();
    assert_eq!(summary.failed_repos, ["broken"]);
    assert_eq!(summary.changed_repos["svc_repo"], upstream.head());

    // The failed repo keeps its empty pin; the good one is pinned.
    let config = project.store.read().unwrap();
    assert_eq!(config.repos[0].commit, "");
    assert_eq!(config.repos[1].commit, upstream.head());
}
