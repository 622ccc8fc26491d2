//! Storage Adapter
//!
//! File-backed implementations of the persistence ports. Both files are
//! replaced atomically (write temp file, fsync, rename) so a crash mid-write
//! leaves the previous version intact.

mod json_document;
mod checkpoint_file;

pub use json_document::{JsonDocumentStore, DEFAULT_DATA_FILE};
pub use checkpoint_file::JsonCheckpointFile;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ports::PersistError;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents` atomically
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp).map_err(|e| PersistError::io(&tmp, e))?;
    file.write_all(contents).map_err(|e| PersistError::io(&tmp, e))?;
    file.sync_all().map_err(|e| PersistError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| PersistError::io(path, e))
}

/// Read a file, treating a missing or blank file as absent
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content))
}
