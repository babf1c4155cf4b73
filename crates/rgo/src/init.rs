use anyhow::bail;
use camino::Utf8Path;
use rgo_core::{RGO_CONFIG_FILE, fs_utils};

const STARTER_CONFIG: &str = r#"# RGO configuration.
#
# mode: driver            # package discovery: driver (default) or work
# project_module: rgo     # module prefix of the generated service packages

idl_repos:
  - repo_name: example_repo
    git_url: git@github.com:example/idl.git
    branch: main
    commit: ""            # empty means: resolve the branch head on first run

idls:
  - service_name: example.service
    idl_path: example/service.thrift
    repo_name: example_repo
"#;

/// Seed a starter `rgo_config.yaml` in the current directory.
pub fn init() -> anyhow::Result<()> {
    let dir = fs_utils::current_directory()?;
    init_at(&dir)?;
    println!("wrote {}", dir.join(RGO_CONFIG_FILE));
    Ok(())
}

fn init_at(dir: &Utf8Path) -> anyhow::Result<()> {
    let config_file = dir.join(RGO_CONFIG_FILE);
    if config_file.exists() {
        bail!("{config_file} already exists");
    }
    fs_err::write(&config_file, STARTER_CONFIG)?;
    Ok(())
}
