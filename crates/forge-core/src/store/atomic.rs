//! Atomic file operations for safe JSON persistence.
//!
//! Writes go through a temp file created in the target's own directory:
//! 1. Serialize and write to the temp file
//! 2. fsync so the bytes reach disk
//! 3. Rename over the target path
//!
//! A reader therefore sees either the old document or the new one, never a
//! partially written file.

use crate::{ForgeError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if reading or parsing
/// fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ForgeError::Io {
                message: format!("Failed to read {}", path.display()),
                path: Some(path.to_path_buf()),
                source: Some(e),
            })
        }
    };

    let data: T = serde_json::from_str(&contents).map_err(|e| ForgeError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically.
///
/// Output is pretty-printed with two-space indentation and a trailing newline.
/// A symlinked target is resolved first, so the link survives and its target
/// receives the new content.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let resolved;
    let path = if path.is_symlink() {
        resolved = fs::canonicalize(path).map_err(|e| ForgeError::io_with_path(e, path))?;
        resolved.as_path()
    } else {
        path
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| ForgeError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    let mut serialized = serde_json::to_string_pretty(data).map_err(|e| ForgeError::Json {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;
    serialized.push('\n');

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| ForgeError::Io {
        message: format!("Failed to create temp file in {}", parent.display()),
        path: Some(parent.to_path_buf()),
        source: Some(e),
    })?;

    temp.write_all(serialized.as_bytes())
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ForgeError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        })?;

    temp.persist(path).map_err(|e| ForgeError::Io {
        message: format!("Failed to replace {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}
