use camino::Utf8Path;
use tracing::{debug, warn};

use crate::{
    Error, GoList, PACKAGES_FILE, PackageDescriptor, Result, WorkspacePaths, fs_utils,
};

/// Load the packages of a freshly built service module and serialize their
/// descriptors to `pkg_meta/<service>/rgo_packages.json`.
///
/// The list is import-closed (`go list -deps`), so the driver can answer
/// load requests from the file alone. The write is atomic: the driver may
/// read concurrently and must never see a partial file.
pub fn write_package_metadata(
    paths: &WorkspacePaths,
    format_service_name: &str,
) -> Result<()> {
    let service_dir = paths.service_dir(format_service_name);
    let loader = GoList {
        dir: &service_dir,
        env: vec![],
        build_flags: &[],
        tests: false,
    };
    let packages = loader.load(&["./...".to_string()], true)?;

    let out_file = paths.pkg_meta_file(format_service_name);
    debug!(
        "writing {} package descriptors to {out_file}",
        packages.len()
    );
    let data = serde_json::to_vec(&packages).map_err(|e| Error::MetadataWrite {
        path: out_file.clone(),
        source: e.into(),
    })?;
    fs_utils::write_atomically(&out_file, &data).map_err(|e| Error::MetadataWrite {
        path: out_file.clone(),
        source: e,
    })
}

/// Read every service's serialized descriptors under `pkg_meta/`.
///
/// A missing root yields an empty list; an unreadable or malformed file is
/// skipped with a warning so one broken service doesn't hide the others.
pub fn read_all_package_metadata(pkg_meta_root: &Utf8Path) -> Vec<PackageDescriptor> {
    let mut packages = vec![];
    let entries = match fs_err::read_dir(pkg_meta_root) {
        Ok(entries) => entries,
        Err(_) => return packages,
    };

    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let file = entry.path().join(PACKAGES_FILE);
        let contents = match fs_err::read_to_string(&file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!("cannot read {}: {e}", file.display());
                continue;
            }
        };
        match serde_json::from_str::<Vec<PackageDescriptor>>(&contents) {
            Ok(mut descriptors) => packages.append(&mut descriptors),
            Err(e) => warn!("cannot parse {}: {e}", file.display()),
        }
    }
    packages
}
