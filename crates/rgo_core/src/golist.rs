//! Loads package descriptors by shelling out to `go list`, the same backend
//! the default packages driver uses.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::gotool::run_go_with_env;
use crate::{Error, ImportRef, PackageDescriptor, Result};

/// One `go list` invocation scope: where to run and with what environment.
#[derive(Debug)]
pub struct GoList<'a> {
    pub dir: &'a Utf8Path,
    /// Replacement environment; empty means inherit the process env.
    pub env: Vec<(String, String)>,
    pub build_flags: &'a [String],
    pub tests: bool,
}

impl GoList<'_> {
    /// Load the packages matching `patterns`. With `deps` the result is
    /// closed under imports: every transitive dependency gets a descriptor.
    pub fn load(&self, patterns: &[String], deps: bool) -> Result<Vec<PackageDescriptor>> {
        let mut args: Vec<&str> = vec!["list", "-e", "-json", "-compiled=true"];
        if deps {
            args.push("-deps");
        }
        if self.tests {
            args.push("-test");
        }
        for flag in self.build_flags {
            args.push(flag);
        }
        args.push("--");
        for pattern in patterns {
            args.push(pattern);
        }

        let stdout = run_go_with_env(self.dir, &args, &self.env)?;
        parse_go_list_output(&stdout)
    }

    /// Ids of the packages directly matching `patterns`.
    pub fn load_roots(&self, patterns: &[String]) -> Result<Vec<String>> {
        Ok(self
            .load(patterns, false)?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    #[serde(default)]
    dir: String,
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    compiled_go_files: Vec<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    error: Option<GoListError>,
    #[serde(default)]
    deps_errors: Option<Vec<GoListError>>,
    #[serde(default)]
    module: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListError {
    #[serde(default)]
    pos: String,
    #[serde(default)]
    err: String,
}

/// Parse the concatenated JSON objects `go list -json` emits and convert
/// them into driver descriptors.
pub fn parse_go_list_output(stdout: &str) -> Result<Vec<PackageDescriptor>> {
    let mut packages = vec![];
    for record in serde_json::Deserializer::from_str(stdout).into_iter::<GoListPackage>() {
        let record = record.map_err(|e| Error::Toolchain {
            tool: "go list".to_string(),
            output: format!("cannot parse go list output: {e}"),
        })?;
        packages.push(to_descriptor(record));
    }
    Ok(packages)
}

fn to_descriptor(record: GoListPackage) -> PackageDescriptor {
    let dir = Utf8PathBuf::from(&record.dir);
    let absolute = |file: &String| {
        if Utf8Path::new(file).is_absolute() {
            file.clone()
        } else {
            dir.join(file).into_string()
        }
    };

    let imports: BTreeMap<String, ImportRef> = record
        .imports
        .iter()
        .map(|path| (path.clone(), ImportRef { id: path.clone() }))
        .collect();

    let mut errors = vec![];
    if let Some(error) = &record.error {
        errors.push(error_value(error));
    }
    for error in record.deps_errors.iter().flatten() {
        errors.push(error_value(error));
    }

    let mut extra = serde_json::Map::new();
    if let Some(module) = record.module {
        extra.insert("Module".to_string(), module);
    }

    PackageDescriptor {
        id: record.import_path.clone(),
        name: record.name,
        pkg_path: record.import_path,
        go_files: record.go_files.iter().map(absolute).collect(),
        compiled_go_files: record.compiled_go_files.iter().map(absolute).collect(),
        imports,
        errors,
        extra,
    }
}

fn error_value(error: &GoListError) -> serde_json::Value {
    serde_json::json!({ "Pos": error.pos, "Msg": error.err, "Kind": 0 })
}
