use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One package in the packages-driver protocol.
///
/// The named fields are the ones the pipeline produces and inspects; any
/// additional fields coming from the default driver are carried through
/// verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub pkg_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub go_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compiled_go_files: Vec<String>,
    /// Import path → reference to another descriptor, by id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub imports: BTreeMap<String, ImportRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageDescriptor {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Reference to another package descriptor, resolved by string key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    pub id: String,
}

/// The request the Go language server writes to the driver's stdin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverRequest {
    #[serde(default)]
    pub mode: u64,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub build_flags: Vec<String>,
    #[serde(default)]
    pub tests: bool,
    /// File path → base64-encoded contents of unsaved editor buffers.
    #[serde(default)]
    pub overlay: BTreeMap<String, String>,
}

impl DriverRequest {
    /// Drop any `GOPACKAGESDRIVER` entry from the forwarded environment so
    /// the spawned `go` commands don't recurse into this driver.
    pub fn strip_driver_env(&mut self) {
        self.env
            .retain(|entry| entry.split('=').next() != Some("GOPACKAGESDRIVER"));
    }
}

/// The response the driver writes to stdout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverResponse {
    pub roots: Vec<String>,
    pub packages: Vec<PackageDescriptor>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
