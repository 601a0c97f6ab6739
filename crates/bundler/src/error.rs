use std::io;
use std::path::PathBuf;

use crosswind_core::ConfigError;
use crosswind_transform::TransformError;
use thiserror::Error;

/// 构建错误（致命）
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("cannot resolve `{specifier}` imported from {importer}")]
    UnresolvedImport { importer: String, specifier: String },

    #[error("entry module not found: {0}")]
    MissingEntry(PathBuf),

    #[error(transparent)]
    Parse(#[from] TransformError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
