use std::process::{Command, Output};

use camino::Utf8Path;
use tracing::debug;

use crate::{Error, Result};

/// Run `go` with the given arguments in `dir`, returning its stdout.
///
/// Non-zero exits surface as [`Error::Toolchain`] carrying the combined
/// output.
pub fn run_go(dir: &Utf8Path, args: &[&str]) -> Result<String> {
    run_go_with_env(dir, args, &[])
}

/// Like [`run_go`], but with a fully replaced environment (used by the
/// packages driver, which must forward the requesting process's env).
pub fn run_go_with_env(dir: &Utf8Path, args: &[&str], env: &[(String, String)]) -> Result<String> {
    debug!("running go {} in {dir}", args.join(" "));

    let mut cmd = Command::new("go");
    cmd.current_dir(dir).args(args);
    if !env.is_empty() {
        cmd.env_clear().envs(env.iter().map(|(k, v)| (k, v)));
    }

    let output = cmd.output().map_err(|e| Error::Toolchain {
        tool: format!("go {}", args.join(" ")),
        output: format!("cannot run go: {e}. Is it installed?"),
    })?;
    check_output(args, output)
}

fn check_output(args: &[&str], output: Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if output.status.success() {
        Ok(stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Toolchain {
            tool: format!("go {}", args.join(" ")),
            output: format!("{}{stderr}", stdout.trim()),
        })
    }
}

/// Split `KEY=VALUE` environment entries, dropping malformed ones.
pub fn parse_env_entries(entries: &[String]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}
