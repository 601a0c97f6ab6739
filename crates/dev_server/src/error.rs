use std::io;
use std::path::PathBuf;

use crosswind_core::ConfigError;
use thiserror::Error;

/// 开发服务器错误
#[derive(Error, Debug)]
pub enum DevServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("connection error: {0}")]
    Connection(#[from] io::Error),
}
