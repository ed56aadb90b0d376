//! Reading a hand-authored catalog from JSON.

use std::path::{Path, PathBuf};

use polybind_types::{Action, CatalogError, StructDef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Catalog;

/// On-disk catalog layout: contributing action lists plus struct types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub lists: Vec<Vec<Action>>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed catalog {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CatalogError),
}

/// Load and validate a catalog file.
pub fn load_json(path: &Path) -> Result<Catalog, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CatalogFile = serde_json::from_str(&data).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Catalog::new(file.lists, file.structs)?)
}
