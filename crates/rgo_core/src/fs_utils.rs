use std::io::Write;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};

pub fn current_directory() -> anyhow::Result<Utf8PathBuf> {
    let current_dir = std::env::current_dir().context("cannot determine current directory")?;
    Utf8PathBuf::from_path_buf(dunce::canonicalize(&current_dir)?)
        .map_err(|p| anyhow::anyhow!("cannot convert {p:?} to Utf8PathBuf"))
}

pub fn to_utf8_path(path: &std::path::Path) -> anyhow::Result<&Utf8Path> {
    Utf8Path::from_path(path).with_context(|| format!("cannot convert {path:?} to Utf8Path"))
}

/// Write `contents` to `path` atomically: the bytes land in a temporary file
/// in the same directory, which is then renamed over the destination.
/// Readers either see the old file or the complete new one.
pub fn write_atomically(path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{path} has no parent directory"))?;
    fs_err::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("cannot create temporary file in {parent}"))?;
    tmp.write_all(contents)
        .with_context(|| format!("cannot write temporary file for {path}"))?;
    tmp.persist(path)
        .with_context(|| format!("cannot persist {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("out.json")).unwrap();
        write_atomically(&path, b"one").unwrap();
        write_atomically(&path, b"two").unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn atomic_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("a/b/out.json")).unwrap();
        write_atomically(&path, b"data").unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "data");
    }
}
