use camino::Utf8PathBuf;
use tracing::{debug, info};

use crate::gotool::run_go;
use crate::idl;
use crate::{
    CLIENT_FILE, ClientRender, Error, GO_VERSION, GoWorkspace, IdlBinding, KitexCommand, Phase,
    Result, RgoConfig, WorkspacePaths, render_client,
};

/// Builds the self-contained Go module of one service:
/// `go.mod` + `kitex_gen/…` + the rendered `rgo_cli.go`.
#[derive(Debug)]
pub struct ServiceTreeBuilder<'a> {
    paths: &'a WorkspacePaths,
    config: &'a RgoConfig,
}

impl<'a> ServiceTreeBuilder<'a> {
    pub fn new(paths: &'a WorkspacePaths, config: &'a RgoConfig) -> Self {
        Self { paths, config }
    }

    /// Location of the binding's IDL file inside its checked-out repo.
    pub fn idl_path(&self, binding: &IdlBinding) -> Utf8PathBuf {
        self.paths
            .idl_repo_dir(&binding.repo_name)
            .join(&binding.idl_path)
    }

    /// (Re)generate the service module for `binding`.
    pub fn build(&self, binding: &IdlBinding, phase: Phase) -> Result<()> {
        let idl_path = self.idl_path(binding);
        let idl = idl::parse_file(&idl_path)?;
        if idl.go_namespace().is_none() {
            return Err(Error::NoGoNamespace { path: idl_path });
        }

        let service_dir = self.paths.service_dir(&binding.format_service_name);
        fs_err::create_dir_all(&service_dir).map_err(|e| Error::Io {
            path: service_dir.clone(),
            source: e,
        })?;

        let module = &self.config.project_module;
        if !service_dir.join("go.mod").exists() {
            let module_path = format!("{module}/{}", binding.format_service_name);
            debug!("initializing module {module_path} in {service_dir}");
            run_go(&service_dir, &["mod", "init", &module_path])?;
            run_go(&service_dir, &["mod", "edit", &format!("-go={GO_VERSION}")])?;
        }

        KitexCommand::new(&idl_path, &service_dir, module).run()?;

        let client_source = render_client(&ClientRender {
            phase,
            idl: &idl,
            service_name: &binding.service_name,
            format_service_name: &binding.format_service_name,
            project_module: module,
        })?;
        let client_file = service_dir.join(CLIENT_FILE);
        fs_err::write(&client_file, client_source).map_err(|e| Error::Io {
            path: client_file,
            source: e,
        })?;

        run_go(&service_dir, &["mod", "tidy"])?;

        GoWorkspace::new(self.paths.project_dir(), self.config.mode).add(&service_dir)?;

        info!(
            "generated service tree for {} in {service_dir}",
            binding.service_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_service_name;
    use camino::Utf8PathBuf;

    fn workspace() -> (tempfile::TempDir, WorkspacePaths) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let paths = WorkspacePaths::new(root.join("cache"), root.join("project"));
        (dir, paths)
    }

    fn binding(idl_path: &str) -> IdlBinding {
        IdlBinding {
            service_name: "svc.one".to_string(),
            format_service_name: format_service_name("svc.one"),
            idl_path: idl_path.to_string(),
            repo_name: "orders".to_string(),
        }
    }

    fn config() -> RgoConfig {
        RgoConfig {
            project_module: "rgo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn non_thrift_idl_is_rejected_before_touching_the_tree() {
        let (_guard, paths) = workspace();
        let config = config();
        let builder = ServiceTreeBuilder::new(&paths, &config);
        let binding = binding("svc/one.proto");

        fs_err::create_dir_all(paths.idl_repo_dir("orders").join("svc")).unwrap();
        fs_err::write(builder.idl_path(&binding), "syntax = \"proto3\";").unwrap();

        let err = builder.build(&binding, Phase::Edit).unwrap_err();
        assert!(matches!(err, Error::UnsupportedIdlExtension { .. }));
        assert!(!paths.service_dir("svc_one").exists());
    }

    #[test]
    fn missing_go_namespace_is_rejected_before_touching_the_tree() {
        let (_guard, paths) = workspace();
        let config = config();
        let builder = ServiceTreeBuilder::new(&paths, &config);
        let binding = binding("svc/one.thrift");

        fs_err::create_dir_all(paths.idl_repo_dir("orders").join("svc")).unwrap();
        fs_err::write(
            builder.idl_path(&binding),
            "namespace java j\nservice S { }",
        )
        .unwrap();

        let err = builder.build(&binding, Phase::Edit).unwrap_err();
        assert!(matches!(err, Error::NoGoNamespace { .. }));
        assert!(!paths.service_dir("svc_one").exists());
    }

    #[test]
    fn idl_path_is_rooted_in_the_repo_checkout() {
        let (_guard, paths) = workspace();
        let config = config();
        let builder = ServiceTreeBuilder::new(&paths, &config);
        let path = builder.idl_path(&binding("svc/one.thrift"));
        assert!(path.starts_with(paths.idl_repo_dir("orders")));
        assert!(path.as_str().ends_with("svc/one.thrift"));
    }
}
