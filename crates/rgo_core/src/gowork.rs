use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{Mode, Result, gotool::run_go};

/// Go language version pinned into generated modules and workspaces.
pub const GO_VERSION: &str = "1.18";

/// In-memory form of a `go.work` file.
///
/// Only the `go` directive and `use` entries are modeled; that is all the
/// pipeline ever writes. The project module is always the first entry,
/// as `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoWork {
    pub go_version: String,
    pub uses: Vec<String>,
}

impl Default for GoWork {
    fn default() -> Self {
        Self {
            go_version: GO_VERSION.to_string(),
            uses: vec![".".to_string()],
        }
    }
}

impl GoWork {
    pub fn parse(contents: &str) -> Self {
        let mut go_version = GO_VERSION.to_string();
        let mut uses = vec![];
        let mut in_use_block = false;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if in_use_block {
                if line == ")" {
                    in_use_block = false;
                } else {
                    uses.push(line.to_string());
                }
            } else if let Some(version) = line.strip_prefix("go ") {
                go_version = version.trim().to_string();
            } else if line == "use (" {
                in_use_block = true;
            } else if let Some(entry) = line.strip_prefix("use ") {
                uses.push(entry.trim().to_string());
            }
        }
        Self { go_version, uses }
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.uses.iter().any(|u| u == entry)
    }

    pub fn add_use(&mut self, entry: &str) {
        if !self.contains(entry) {
            self.uses.push(entry.to_string());
        }
    }

    pub fn remove_use(&mut self, entry: &str) {
        self.uses.retain(|u| u != entry);
    }

    /// True when only the project module itself is left.
    pub fn only_project_entry(&self) -> bool {
        self.uses == ["."]
    }
}

impl std::fmt::Display for GoWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "go {}", self.go_version)?;
        writeln!(f)?;
        writeln!(f, "use (")?;
        for entry in &self.uses {
            writeln!(f, "\t{entry}")?;
        }
        writeln!(f, ")")
    }
}

/// Maintains the `go.work` file at the project root.
///
/// Driver mode edits the file textually; work mode reaches the identical end
/// state through `go work` subcommands.
#[derive(Debug)]
pub struct GoWorkspace<'a> {
    project_dir: &'a Utf8Path,
    mode: Mode,
}

impl<'a> GoWorkspace<'a> {
    pub fn new(project_dir: &'a Utf8Path, mode: Mode) -> Self {
        Self { project_dir, mode }
    }

    fn file(&self) -> Utf8PathBuf {
        self.project_dir.join("go.work")
    }

    fn read(&self) -> GoWork {
        match fs_err::read_to_string(self.file()) {
            Ok(contents) => GoWork::parse(&contents),
            Err(_) => GoWork::default(),
        }
    }

    fn write(&self, work: &GoWork) -> Result<()> {
        fs_err::write(self.file(), work.to_string()).map_err(|e| crate::Error::Toolchain {
            tool: "go.work".to_string(),
            output: e.to_string(),
        })
    }

    /// Add a module directory to the workspace, creating `go.work` (with the
    /// project module as first entry) when missing.
    pub fn add(&self, module_dir: &Utf8Path) -> Result<()> {
        debug!("adding {module_dir} to go.work");
        match self.mode {
            Mode::Driver => {
                let mut work = self.read();
                work.add_use(module_dir.as_str());
                self.write(&work)
            }
            Mode::Work => {
                if !self.file().exists() {
                    run_go(self.project_dir, &["work", "init", "."])?;
                    run_go(self.project_dir, &["work", "edit", &format!("-go={GO_VERSION}")])?;
                }
                run_go(self.project_dir, &["work", "use", module_dir.as_str()])?;
                Ok(())
            }
        }
    }

    /// Drop a module directory from the workspace. Deletes `go.work` when
    /// only the project module entry remains.
    pub fn remove(&self, module_dir: &Utf8Path) -> Result<()> {
        if !self.file().exists() {
            return Ok(());
        }
        debug!("removing {module_dir} from go.work");
        match self.mode {
            Mode::Driver => {
                let mut work = self.read();
                work.remove_use(module_dir.as_str());
                if work.only_project_entry() {
                    fs_err::remove_file(self.file()).ok();
                    Ok(())
                } else {
                    self.write(&work)
                }
            }
            Mode::Work => {
                run_go(
                    self.project_dir,
                    &["work", "edit", "-dropuse", module_dir.as_str()],
                )?;
                if self.read().only_project_entry() {
                    fs_err::remove_file(self.file()).ok();
                }
                Ok(())
            }
        }
    }

    /// Run `go work sync`; called once after all services of a run.
    pub fn sync(&self) -> Result<()> {
        run_go(self.project_dir, &["work", "sync"]).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn project() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn parse_and_serialize_round_trip() {
        let contents = "go 1.18\n\nuse (\n\t.\n\t/cache/repo/svc_one\n)\n";
        let work = GoWork::parse(contents);
        assert_eq!(work.go_version, "1.18");
        assert_eq!(work.uses, [".", "/cache/repo/svc_one"]);
        assert_eq!(work.to_string(), contents);
    }

    #[test]
    fn parse_single_use_directive() {
        let work = GoWork::parse("go 1.21\nuse ./svc\n");
        assert_eq!(work.uses, ["./svc"]);
        assert_eq!(work.go_version, "1.21");
    }

    #[test]
    fn add_creates_file_with_project_entry_first() {
        let (_guard, dir) = project();
        let workspace = GoWorkspace::new(&dir, Mode::Driver);
        workspace.add(Utf8Path::new("/cache/repo/svc_one")).unwrap();

        let work = GoWork::parse(&fs_err::read_to_string(dir.join("go.work")).unwrap());
        assert_eq!(work.uses, [".", "/cache/repo/svc_one"]);
    }

    #[test]
    fn add_is_idempotent() {
        let (_guard, dir) = project();
        let workspace = GoWorkspace::new(&dir, Mode::Driver);
        workspace.add(Utf8Path::new("/cache/repo/svc_one")).unwrap();
        workspace.add(Utf8Path::new("/cache/repo/svc_one")).unwrap();

        let work = GoWork::parse(&fs_err::read_to_string(dir.join("go.work")).unwrap());
        assert_eq!(work.uses, [".", "/cache/repo/svc_one"]);
    }

    #[test]
    fn remove_deletes_file_when_only_project_remains() {
        let (_guard, dir) = project();
        let workspace = GoWorkspace::new(&dir, Mode::Driver);
        workspace.add(Utf8Path::new("/cache/repo/svc_one")).unwrap();
        workspace.add(Utf8Path::new("/cache/repo/svc_two")).unwrap();

        workspace.remove(Utf8Path::new("/cache/repo/svc_one")).unwrap();
        assert!(dir.join("go.work").exists());

        workspace.remove(Utf8Path::new("/cache/repo/svc_two")).unwrap();
        assert!(!dir.join("go.work").exists());
    }

    #[test]
    fn remove_on_missing_file_is_a_noop() {
        let (_guard, dir) = project();
        let workspace = GoWorkspace::new(&dir, Mode::Driver);
        workspace.remove(Utf8Path::new("/cache/repo/svc_one")).unwrap();
        assert!(!dir.join("go.work").exists());
    }
}
