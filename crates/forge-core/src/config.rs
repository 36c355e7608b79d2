//! Centralized configuration for the forge store.
//!
//! Path constants for the on-disk layout, plus the operator's optional local
//! config file (`config/local.json`) that can point at a non-default data root.

use crate::store::atomic_read_json;
use crate::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory and file names of the store layout.
pub struct PathsConfig;

impl PathsConfig {
    pub const PROJECTS_DIR_NAME: &'static str = "projects";
    pub const SHARED_DIR_NAME: &'static str = "shared";
    pub const CATALOGS_DIR_NAME: &'static str = "catalogs";
    pub const SPECS_DIR_NAME: &'static str = "specs";
    pub const ASSETS_DIR_NAME: &'static str = "assets";
    pub const CHECKPOINTS_DIR_NAME: &'static str = "checkpoints";
    pub const LORAS_DIR_NAME: &'static str = "loras";

    pub const PROJECT_FILENAME: &'static str = "project.json";
    pub const TAGS_CATALOG_FILENAME: &'static str = "tags.json";
    pub const ASSET_TYPES_CATALOG_FILENAME: &'static str = "asset-types.json";
    pub const STYLES_CATALOG_FILENAME: &'static str = "styles.json";
    pub const SCENARIOS_CATALOG_FILENAME: &'static str = "scenarios.json";
    pub const PALETTES_CATALOG_FILENAME: &'static str = "palettes.json";

    pub const DOCUMENT_EXTENSION: &'static str = "json";
}

/// Defaults used when nothing else names a data root.
pub struct StoreConfig;

impl StoreConfig {
    pub const DEFAULT_DATA_ROOT: &'static str = "data";
    pub const DEFAULT_LOCAL_CONFIG: &'static str = "config/local.json";
    pub const DATA_ROOT_ENV: &'static str = "FORGE_DATA_ROOT";
}

/// Operator-local configuration (`config/local.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalConfig {
    #[serde(default)]
    pub data_root: Option<PathBuf>,
}

impl LocalConfig {
    /// Load the local config file. A missing file yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        atomic_read_json::<LocalConfig>(path).map_err(|e| ForgeError::Config {
            message: format!("Failed to load {}: {}", path.display(), e),
        })
    }
}

/// Resolve the store root.
///
/// Precedence: explicit flag, then the environment variable, then `dataRoot`
/// from the local config file, then `./data`. A relative `dataRoot` in the
/// config file is taken relative to the current directory.
pub fn resolve_store_root(
    explicit: Option<&Path>,
    env_value: Option<&str>,
    config_path: &Path,
) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }

    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        debug!("Using store root from {}", StoreConfig::DATA_ROOT_ENV);
        return Ok(PathBuf::from(value));
    }

    if let Some(local) = LocalConfig::load(config_path)? {
        if let Some(root) = local.data_root {
            debug!("Using store root from {}", config_path.display());
            return Ok(root);
        }
    }

    Ok(PathBuf::from(StoreConfig::DEFAULT_DATA_ROOT))
}
