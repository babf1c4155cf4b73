use tracing::{info, warn};

use crate::{GoWorkspace, RgoConfig, WorkspacePaths};

/// Remove everything the generator produced for the configured bindings:
/// their `go.work` entries, generated module trees, and package metadata.
///
/// When dropping the last binding leaves only the project module in
/// `go.work`, the file itself is deleted.
pub fn clean(paths: &WorkspacePaths, config: &RgoConfig) -> anyhow::Result<()> {
    let workspace = GoWorkspace::new(paths.project_dir(), config.mode);

    for binding in &config.idls {
        let service_dir = paths.service_dir(&binding.format_service_name);
        if let Err(e) = workspace.remove(&service_dir) {
            warn!("cannot drop {service_dir} from go.work: {e:#}");
        }
        if service_dir.exists() {
            fs_err::remove_dir_all(&service_dir)?;
        }
        let meta_dir = paths.pkg_meta_dir(&binding.format_service_name);
        if meta_dir.exists() {
            fs_err::remove_dir_all(&meta_dir)?;
        }
        info!("cleaned service {}", binding.service_name);
    }

    Ok(())
}
