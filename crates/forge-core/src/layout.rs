//! On-disk layout of the store and shard enumeration.
//!
//! ```text
//! <root>/
//!   projects/<projectId>/
//!     project.json
//!     catalogs/{tags,asset-types,styles,scenarios,palettes}.json
//!     specs/*.json
//!     assets/*.json
//!     checkpoints/<checkpointId>.json
//!     loras/<loraId>.json
//!   shared/loras/<loraId>.json
//! ```

use crate::config::PathsConfig;
use crate::store::DocumentStore;
use crate::{ForgeError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Category of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardCategory {
    Project,
    TagsCatalog,
    AssetTypesCatalog,
    StylesCatalog,
    ScenariosCatalog,
    PalettesCatalog,
    Spec,
    Asset,
    Checkpoint,
    Lora,
}

impl ShardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShardCategory::Project => "project",
            ShardCategory::TagsCatalog => "catalog:tags",
            ShardCategory::AssetTypesCatalog => "catalog:assetTypes",
            ShardCategory::StylesCatalog => "catalog:styles",
            ShardCategory::ScenariosCatalog => "catalog:scenarios",
            ShardCategory::PalettesCatalog => "catalog:palettes",
            ShardCategory::Spec => "spec",
            ShardCategory::Asset => "asset",
            ShardCategory::Checkpoint => "checkpoint",
            ShardCategory::Lora => "lora",
        }
    }
}

impl fmt::Display for ShardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a category lives relative to a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A single fixed document.
    File(PathBuf),
    /// Every `*.json` directly inside a directory.
    Dir(PathBuf),
}

/// A project directory or the shared area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardScope {
    Project(String),
    Shared,
}

impl fmt::Display for ShardScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardScope::Project(id) => write!(f, "project {id}"),
            ShardScope::Shared => f.write_str("shared"),
        }
    }
}

/// A located document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub category: ShardCategory,
    pub scope: ShardScope,
    pub path: PathBuf,
}

/// Path templates for a store rooted at `root`.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PathsConfig::PROJECTS_DIR_NAME)
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id)
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.root.join(PathsConfig::SHARED_DIR_NAME)
    }

    /// Location of `category` within `scope`, or `None` if the scope never
    /// holds that category. Only LoRA records exist in the shared area.
    pub fn location(&self, scope: &ShardScope, category: ShardCategory) -> Option<Location> {
        let base = match scope {
            ShardScope::Project(id) => self.project_dir(id),
            ShardScope::Shared => {
                return match category {
                    ShardCategory::Lora => Some(Location::Dir(
                        self.shared_dir().join(PathsConfig::LORAS_DIR_NAME),
                    )),
                    _ => None,
                };
            }
        };

        let catalogs = base.join(PathsConfig::CATALOGS_DIR_NAME);
        let location = match category {
            ShardCategory::Project => Location::File(base.join(PathsConfig::PROJECT_FILENAME)),
            ShardCategory::TagsCatalog => {
                Location::File(catalogs.join(PathsConfig::TAGS_CATALOG_FILENAME))
            }
            ShardCategory::AssetTypesCatalog => {
                Location::File(catalogs.join(PathsConfig::ASSET_TYPES_CATALOG_FILENAME))
            }
            ShardCategory::StylesCatalog => {
                Location::File(catalogs.join(PathsConfig::STYLES_CATALOG_FILENAME))
            }
            ShardCategory::ScenariosCatalog => {
                Location::File(catalogs.join(PathsConfig::SCENARIOS_CATALOG_FILENAME))
            }
            ShardCategory::PalettesCatalog => {
                Location::File(catalogs.join(PathsConfig::PALETTES_CATALOG_FILENAME))
            }
            ShardCategory::Spec => Location::Dir(base.join(PathsConfig::SPECS_DIR_NAME)),
            ShardCategory::Asset => Location::Dir(base.join(PathsConfig::ASSETS_DIR_NAME)),
            ShardCategory::Checkpoint => {
                Location::Dir(base.join(PathsConfig::CHECKPOINTS_DIR_NAME))
            }
            ShardCategory::Lora => Location::Dir(base.join(PathsConfig::LORAS_DIR_NAME)),
        };
        Some(location)
    }

    /// Path of the document whose file stem is `id`, for directory
    /// categories (`<dir>/<id>.json`).
    pub fn keyed_document_path(
        &self,
        scope: &ShardScope,
        category: ShardCategory,
        id: &str,
    ) -> Option<PathBuf> {
        match self.location(scope, category)? {
            Location::Dir(dir) => {
                Some(dir.join(format!("{id}.{}", PathsConfig::DOCUMENT_EXTENSION)))
            }
            Location::File(_) => None,
        }
    }

    /// Render `path` relative to the store root with `/` separators.
    pub fn display_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// Enumerates concrete shard paths through a [`DocumentStore`].
pub struct ShardLocator<'a, S: DocumentStore + ?Sized> {
    layout: &'a StoreLayout,
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> ShardLocator<'a, S> {
    pub fn new(layout: &'a StoreLayout, store: &'a S) -> Self {
        Self { layout, store }
    }

    /// Project scopes in directory order, or only `project_id` when given.
    ///
    /// A named project that has no directory is an error.
    pub fn project_scopes(&self, project_id: Option<&str>) -> Result<Vec<ShardScope>> {
        if let Some(id) = project_id {
            let dir = self.layout.project_dir(id);
            if !dir.is_dir() {
                return Err(ForgeError::ProjectNotFound {
                    project_id: id.to_string(),
                });
            }
            return Ok(vec![ShardScope::Project(id.to_string())]);
        }

        let projects_dir = self.layout.projects_dir();
        let scopes: Vec<ShardScope> = self
            .store
            .list_dirs(&projects_dir)?
            .into_iter()
            .filter_map(|dir| {
                dir.file_name()
                    .map(|name| ShardScope::Project(name.to_string_lossy().to_string()))
            })
            .collect();
        debug!(
            "Found {} project(s) under {}",
            scopes.len(),
            projects_dir.display()
        );
        Ok(scopes)
    }

    /// Existing documents of `category` within `scope`, in file-name order.
    pub fn locate(&self, scope: &ShardScope, category: ShardCategory) -> Result<Vec<Shard>> {
        let paths = match self.layout.location(scope, category) {
            None => Vec::new(),
            Some(Location::File(path)) => {
                if self.store.exists(&path) {
                    vec![path]
                } else {
                    Vec::new()
                }
            }
            Some(Location::Dir(dir)) => self.store.list_documents(&dir)?,
        };

        Ok(paths
            .into_iter()
            .map(|path| Shard {
                category,
                scope: scope.clone(),
                path,
            })
            .collect())
    }
}
