//! CLI error types.

use autofd_core::AutofdError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config {0:?} lists no functions")]
    EmptyBatch(PathBuf),

    #[error(transparent)]
    Generation(#[from] AutofdError),

    #[error("{failed} of {total} derivatives failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("could not write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
