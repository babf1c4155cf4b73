use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};

use crate::{PACKAGES_FILE, fs_utils};

/// Environment variable overriding the cache root.
pub const RGO_BASE_PATH_ENV: &str = "RGO_BASE_PATH";

/// Root directory under which every project keeps its caches:
/// `$RGO_BASE_PATH` when set, `<home>/.rgo/cache` otherwise.
pub fn cache_root() -> anyhow::Result<Utf8PathBuf> {
    if let Ok(base) = std::env::var(RGO_BASE_PATH_ENV) {
        return Ok(Utf8PathBuf::from(base));
    }
    let home = dirs::home_dir().context("cannot determine home directory")?;
    let home = Utf8PathBuf::from_path_buf(home)
        .map_err(|p| anyhow::anyhow!("home directory {p:?} is not valid UTF-8"))?;
    Ok(home.join(".rgo").join("cache"))
}

/// Per-project namespace under the cache root.
///
/// The key depends only on the absolute path of the project directory, so
/// two checkouts of the same project at different paths get distinct caches.
pub fn project_key(project_dir: &Utf8Path) -> String {
    let digest = Sha256::digest(project_dir.as_str().as_bytes());
    let basename = project_dir.file_name().unwrap_or("root");
    format!("{basename}_{digest:x}")
}

/// All paths the pipeline reads and writes, derived from the project
/// directory and the cache root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    project_dir: Utf8PathBuf,
    cache_dir: Utf8PathBuf,
}

impl WorkspacePaths {
    pub fn new(cache_root: Utf8PathBuf, project_dir: Utf8PathBuf) -> Self {
        let cache_dir = cache_root.join(project_key(&project_dir));
        Self {
            project_dir,
            cache_dir,
        }
    }

    /// Paths for the process's current directory.
    pub fn from_current_dir() -> anyhow::Result<Self> {
        Ok(Self::new(cache_root()?, fs_utils::current_directory()?))
    }

    /// The user's project directory (where `rgo_config.yaml` and `go.work`
    /// live).
    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }

    /// The per-project cache directory.
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    /// Checkout directory of an IDL repository.
    pub fn idl_repo_dir(&self, repo_name: &str) -> Utf8PathBuf {
        self.cache_dir.join("idl").join(repo_name)
    }

    /// Root of the generated per-service Go module.
    pub fn service_dir(&self, format_service_name: &str) -> Utf8PathBuf {
        self.cache_dir.join("repo").join(format_service_name)
    }

    pub fn pkg_meta_root(&self) -> Utf8PathBuf {
        self.cache_dir.join("pkg_meta")
    }

    pub fn pkg_meta_dir(&self, format_service_name: &str) -> Utf8PathBuf {
        self.pkg_meta_root().join(format_service_name)
    }

    /// The serialized package descriptors for one service.
    pub fn pkg_meta_file(&self, format_service_name: &str) -> Utf8PathBuf {
        self.pkg_meta_dir(format_service_name).join(PACKAGES_FILE)
    }

    pub fn log_dir(&self) -> Utf8PathBuf {
        self.cache_dir.join("log")
    }

    /// The Go workspace file at the project root.
    pub fn go_work_file(&self) -> Utf8PathBuf {
        self.project_dir.join("go.work")
    }

    /// The configuration file at the project root.
    pub fn config_file(&self) -> Utf8PathBuf {
        self.project_dir.join(crate::RGO_CONFIG_FILE)
    }
}
