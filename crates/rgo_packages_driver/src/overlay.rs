//! Materializes the request's overlay (unsaved editor buffers) into the
//! `-overlay` manifest format understood by `go list`.

use std::collections::BTreeMap;

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use camino::{Utf8Path, Utf8PathBuf};
use rgo_core::fs_utils;

/// Decoded overlay files in a temporary directory, kept alive for the
/// duration of the `go list` invocations.
#[derive(Debug)]
pub struct Overlay {
    _dir: tempfile::TempDir,
    manifest: Utf8PathBuf,
}

impl Overlay {
    /// Path of the JSON manifest to pass as `-overlay=<path>`.
    pub fn manifest(&self) -> &Utf8Path {
        &self.manifest
    }
}

/// Write the base64-encoded buffers to disk and produce the manifest.
/// Returns `None` for an empty overlay.
pub fn materialize(overlay: &BTreeMap<String, String>) -> anyhow::Result<Option<Overlay>> {
    if overlay.is_empty() {
        return Ok(None);
    }

    let dir = tempfile::tempdir().context("cannot create overlay directory")?;
    let dir_path = fs_utils::to_utf8_path(dir.path())?.to_owned();

    let mut replace = serde_json::Map::new();
    for (i, (path, encoded)) in overlay.iter().enumerate() {
        let contents = STANDARD
            .decode(encoded)
            .with_context(|| format!("overlay entry {path} is not valid base64"))?;
        let file = dir_path.join(format!("overlay_{i}"));
        fs_err::write(&file, contents)?;
        replace.insert(path.clone(), serde_json::Value::String(file.into_string()));
    }

    let manifest = dir_path.join("overlay.json");
    let body = serde_json::json!({ "Replace": replace });
    fs_err::write(&manifest, serde_json::to_vec(&body)?)?;

    Ok(Some(Overlay {
        _dir: dir,
        manifest,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overlay_is_none() {
        assert!(materialize(&BTreeMap::new()).unwrap().is_none());
    }

    #[test]
    fn buffers_are_decoded_and_mapped_in_the_manifest() {
        let mut overlay = BTreeMap::new();
        overlay.insert(
            "/project/main.go".to_string(),
            STANDARD.encode("package main"),
        );

        let materialized = materialize(&overlay).unwrap().unwrap();
        let manifest: serde_json::Value =
            serde_json::from_str(&fs_err::read_to_string(materialized.manifest()).unwrap())
                .unwrap();

        let replacement = manifest["Replace"]["/project/main.go"].as_str().unwrap();
        assert_eq!(
            fs_err::read_to_string(replacement).unwrap(),
            "package main"
        );
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let mut overlay = BTreeMap::new();
        overlay.insert("/project/main.go".to_string(), "@@not-base64@@".to_string());
        assert!(materialize(&overlay).is_err());
    }
}
