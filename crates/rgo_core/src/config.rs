use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PROJECT_MODULE: &str = "rgo";

/// How the IDE discovers the generated packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Through the external packages driver (`GOPACKAGESDRIVER`).
    #[default]
    Driver,
    /// Through a `go.work` workspace maintained with `go work` commands.
    Work,
}

/// A remote repository holding IDL files, pinned to a revision.
///
/// An empty `commit` asks the generator to resolve the branch head and write
/// it back into the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub repo_name: String,
    pub git_url: String,
    pub branch: String,
    #[serde(default)]
    pub commit: String,
}

/// Binds a wire-level service name to an IDL file inside a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlBinding {
    pub service_name: String,
    /// Identifier-safe form of `service_name`, filled on read.
    #[serde(skip)]
    pub format_service_name: String,
    pub idl_path: String,
    pub repo_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RgoConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub project_module: String,
    #[serde(default, rename = "idl_repos")]
    pub repos: Vec<RepoSpec>,
    #[serde(default)]
    pub idls: Vec<IdlBinding>,
}

impl RgoConfig {
    /// Fill derived and defaulted fields after deserialization.
    fn normalize(&mut self) {
        if self.project_module.is_empty() {
            self.project_module = DEFAULT_PROJECT_MODULE.to_string();
        }
        for idl in &mut self.idls {
            idl.format_service_name = format_service_name(&idl.service_name);
        }
    }

    /// The repository a binding points at, if the config declares it.
    pub fn repo_for(&self, binding: &IdlBinding) -> Option<&RepoSpec> {
        self.repos.iter().find(|r| r.repo_name == binding.repo_name)
    }
}

/// Lowercase the service name and map `-` and `.` to `_`, producing a valid
/// Go package and module path segment.
pub fn format_service_name(service_name: &str) -> String {
    service_name.to_lowercase().replace(['-', '.'], "_")
}

/// Owns reads and rewrites of `rgo_config.yaml`.
///
/// The generator is the single writer: rewrites are serialized by an
/// in-process lock, and the config watcher is muted for the duration of a
/// write so it doesn't observe our own change.
#[derive(Debug)]
pub struct ConfigStore {
    path: Utf8PathBuf,
    write_lock: Mutex<()>,
    muted: AtomicBool,
}

impl ConfigStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            muted: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn read(&self) -> Result<RgoConfig> {
        let contents = fs_err::read_to_string(&self.path).map_err(|e| Error::ConfigIo {
            path: self.path.clone(),
            source: e,
        })?;
        let mut config: RgoConfig =
            serde_yaml::from_str(&contents).map_err(|e| Error::ConfigParse {
                path: self.path.clone(),
                source: e,
            })?;
        config.normalize();
        Ok(config)
    }

    /// Replace one top-level key of the YAML document, leaving every other
    /// key untouched.
    pub fn rewrite(&self, key: &str, value: impl Serialize) -> anyhow::Result<()> {
        let _write = self.write_lock.lock().expect("config write lock poisoned");
        let _mute = self.mute_watcher();

        let contents = fs_err::read_to_string(&self.path)?;
        let mut doc: serde_yaml::Mapping = serde_yaml::from_str(&contents)?;
        doc.insert(
            serde_yaml::Value::String(key.to_string()),
            serde_yaml::to_value(value)?,
        );
        let serialized = serde_yaml::to_string(&doc)?;
        fs_err::write(&self.path, serialized)?;
        Ok(())
    }

    /// Whether watcher callbacks should ignore change events right now.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn mute_watcher(&self) -> MuteGuard<'_> {
        self.muted.store(true, Ordering::SeqCst);
        MuteGuard { store: self }
    }
}

struct MuteGuard<'a> {
    store: &'a ConfigStore,
}

impl Drop for MuteGuard<'_> {
    fn drop(&mut self) {
        self.store.muted.store(false, Ordering::SeqCst);
    }
}
