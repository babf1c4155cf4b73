//! External packages driver for the Go language server.
//!
//! gopls invokes this binary (through `GOPACKAGESDRIVER`) with load patterns
//! as arguments and one JSON request on stdin. The response merges what the
//! default `go list`-backed driver reports with the pre-serialized RGO
//! service packages from the cache.
//!
//! The process always exits 0: gopls falls back to plain `go list` when a
//! driver fails, and that fallback would hide the injected packages.

mod merge;
mod overlay;

use std::io::{Read, Write};
use std::sync::Mutex;

use anyhow::Context;
use rgo_core::{
    ConfigStore, DEFAULT_PROJECT_MODULE, DriverRequest, DriverResponse, GoList, WorkspacePaths,
    parse_env_entries, read_all_package_metadata,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Packages commonly imported by generated client code; the response must
/// contain them even when the request's patterns don't pull them in.
const ALLOWLIST: &[&str] = &[
    "context",
    "fmt",
    "github.com/cloudwego/kitex/client",
    "github.com/cloudwego/kitex/client/callopt",
];

fn main() {
    let paths = WorkspacePaths::from_current_dir();
    if let Ok(paths) = &paths {
        init_logs(paths);
    }

    let patterns: Vec<String> = std::env::args().skip(1).collect();
    let result = paths.and_then(|paths| {
        run(
            &paths,
            std::io::stdin().lock(),
            std::io::stdout().lock(),
            &patterns,
        )
    });
    if let Err(e) = result {
        error!("driver failed: {e:?}");
        eprintln!("error: {e:?}");
        // Deliberately no non-zero exit here; see module docs.
    }
}

fn init_logs(paths: &WorkspacePaths) {
    let log_dir = paths.log_dir();
    fs_err::create_dir_all(&log_dir).ok();
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("rgo_packages_driver.log"))
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RGO_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok();
}

fn run(
    paths: &WorkspacePaths,
    input: impl Read,
    output: impl Write,
    patterns: &[String],
) -> anyhow::Result<()> {
    let mut request: DriverRequest =
        serde_json::from_reader(input).context("cannot decode driver request")?;
    request.strip_driver_env();
    debug!("driver request: mode={}, {} patterns", request.mode, patterns.len());

    let project_module = ConfigStore::new(paths.config_file())
        .read()
        .map(|config| config.project_module)
        .unwrap_or_else(|_| DEFAULT_PROJECT_MODULE.to_string());

    // Unsaved editor buffers ride along as a go `-overlay` file.
    let overlay = overlay::materialize(&request.overlay)?;
    let mut build_flags = request.build_flags.clone();
    if let Some(overlay) = &overlay {
        build_flags.push(format!("-overlay={}", overlay.manifest()));
    }

    let loader = GoList {
        dir: paths.project_dir(),
        env: parse_env_entries(&request.env),
        build_flags: &build_flags,
        tests: request.tests,
    };

    let mut response = default_driver_response(&loader, patterns)?;
    merge::drop_broken_project_packages(&mut response.packages, &project_module);

    let injected = read_all_package_metadata(&paths.pkg_meta_root());
    debug!("injecting {} generated packages", injected.len());
    merge::inject_generated(&mut response, injected);

    for pkg in merge::missing_allowlist(&response, ALLOWLIST) {
        match loader.load(&[pkg.clone()], false) {
            Ok(mut packages) => response.packages.append(&mut packages),
            Err(e) => debug!("cannot load allow-listed package {pkg}: {e}"),
        }
    }

    serde_json::to_writer(output, &response).context("cannot encode driver response")?;
    Ok(())
}

/// What the default `go list`-backed driver would answer: the packages
/// matching the patterns as roots, plus their transitive import closure.
fn default_driver_response(
    loader: &GoList<'_>,
    patterns: &[String],
) -> anyhow::Result<DriverResponse> {
    let roots = loader.load_roots(patterns)?;
    let packages = loader.load(patterns, true)?;
    Ok(DriverResponse {
        roots,
        packages,
        extra: serde_json::Map::new(),
    })
}
