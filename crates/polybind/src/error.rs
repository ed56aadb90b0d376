//! Driver error types.

use std::path::PathBuf;

use polybind_catalog::LoadError;
use polybind_codegen::CodegenError;
use polybind_types::CatalogError;
use thiserror::Error;

/// Everything that can stop a generation run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DriverError::Io { path, source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>) -> impl FnOnce(serde_json::Error) -> Self {
        let path = path.into();
        move |source| DriverError::Json { path, source }
    }
}

/// Driver result type alias.
pub type DriverResult<T> = Result<T, DriverError>;
