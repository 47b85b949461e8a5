//! Filesystem helpers

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    debug!("Created directory {}", dir.display());
    Ok(())
}

/// Create the directory an output file will be written into.
pub fn ensure_parent_dir(file: &Path) -> Result<()> {
    match file.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// `<stem>_converted.<extension>` in the current directory.
pub fn converted_file_name(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{stem}_converted.{extension}"))
}
