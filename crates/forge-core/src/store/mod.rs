//! Whole-document access to the store.
//!
//! The store is a tree of independent JSON files. Nothing here knows about
//! categories or identifiers; callers address documents by path.

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json};

use crate::config::PathsConfig;
use crate::{ForgeError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Read/write access to whole documents.
///
/// Every method addresses a single file. Writes replace a file atomically;
/// there is no cross-file transaction.
pub trait DocumentStore {
    /// Read a document. Returns `None` when the file does not exist.
    fn read(&self, path: &Path) -> Result<Option<Value>>;

    /// Replace a document's content.
    fn write(&self, path: &Path, document: &Value) -> Result<()>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Move a document. Fails with [`ForgeError::RenameCollision`] if `to`
    /// already exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// JSON documents directly inside `dir`, sorted by file name.
    /// Symlinks are classified by their target. An absent directory yields an
    /// empty list.
    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Subdirectories directly inside `dir`, sorted by name.
    /// An absent directory yields an empty list.
    fn list_dirs(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// [`DocumentStore`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentStore;

impl FsDocumentStore {
    pub fn new() -> Self {
        Self
    }

    fn list_entries(&self, dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        // Symlinked projects and shards are part of the store.
        let mut out = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                ForgeError::io_with_path(e.into(), path)
            })?;

            if want_dirs {
                if entry.file_type().is_dir() {
                    out.push(entry.into_path());
                }
                continue;
            }

            let is_document = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| ext == PathsConfig::DOCUMENT_EXTENSION);
            if is_document {
                out.push(entry.into_path());
            }
        }
        Ok(out)
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &Path) -> Result<Option<Value>> {
        atomic_read_json(path)
    }

    fn write(&self, path: &Path, document: &Value) -> Result<()> {
        atomic_write_json(path, document)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if to.exists() {
            return Err(ForgeError::RenameCollision {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| ForgeError::io_with_path(e, parent))?;
        }
        fs::rename(from, to).map_err(|e| ForgeError::Io {
            message: format!("Failed to rename {} to {}", from.display(), to.display()),
            path: Some(from.to_path_buf()),
            source: Some(e),
        })?;
        debug!("Renamed {} -> {}", from.display(), to.display());
        Ok(())
    }

    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.list_entries(dir, false)
    }

    fn list_dirs(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.list_entries(dir, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new();
        assert!(store
            .read(&temp_dir.path().join("absent.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_documents_sorted_json_only() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(dir.join("b.json"), "{}").unwrap();
        std::fs::write(dir.join("a.json"), "{}").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();
        std::fs::write(dir.join("c.json.bak"), "{}").unwrap();
        std::fs::create_dir(dir.join("nested.json")).unwrap();
        std::fs::write(dir.join("nested.json").join("inner.json"), "{}").unwrap();

        let store = FsDocumentStore::new();
        let docs = store.list_documents(dir).unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new();
        let missing = temp_dir.path().join("nope");
        assert!(store.list_documents(&missing).unwrap().is_empty());
        assert!(store.list_dirs(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_list_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::create_dir(dir.join("p2")).unwrap();
        std::fs::create_dir(dir.join("p1")).unwrap();
        std::fs::write(dir.join("README.md"), "").unwrap();

        let store = FsDocumentStore::new();
        let dirs = store.list_dirs(dir).unwrap();
        assert_eq!(dirs, vec![dir.join("p1"), dir.join("p2")]);
    }

    #[test]
    fn test_rename_refuses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("a.json");
        let to = temp_dir.path().join("b.json");
        let store = FsDocumentStore::new();
        store.write(&from, &json!({"id": "a"})).unwrap();
        store.write(&to, &json!({"id": "b"})).unwrap();

        let err = store.rename(&from, &to).unwrap_err();
        assert!(matches!(err, ForgeError::RenameCollision { .. }));
        assert_eq!(store.read(&to).unwrap(), Some(json!({"id": "b"})));
        assert!(from.exists());
    }

    #[test]
    fn test_rename_moves_document() {
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("a.json");
        let to = temp_dir.path().join("b.json");
        let store = FsDocumentStore::new();
        store.write(&from, &json!({"id": "b"})).unwrap();

        store.rename(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(store.read(&to).unwrap(), Some(json!({"id": "b"})));
    }

    #[cfg(unix)]
    #[test]
    fn test_listing_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let store = FsDocumentStore::new();
        let outside = temp_dir.path().join("outside");
        store
            .write(&outside.join("specs/s1.json"), &json!({"style": "pixel"}))
            .unwrap();

        let projects = temp_dir.path().join("projects");
        fs::create_dir_all(&projects).unwrap();
        symlink(&outside, projects.join("p1")).unwrap();

        let specs = temp_dir.path().join("specs");
        fs::create_dir_all(&specs).unwrap();
        symlink(outside.join("specs/s1.json"), specs.join("linked.json")).unwrap();

        assert_eq!(store.list_dirs(&projects).unwrap(), vec![projects.join("p1")]);
        assert_eq!(
            store.list_documents(&specs).unwrap(),
            vec![specs.join("linked.json")]
        );
    }
}
