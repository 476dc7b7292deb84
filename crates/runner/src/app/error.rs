use std::io;
use std::path::PathBuf;

use scene_engine::{ArchiveCompileError, ArchiveError, SceneError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum RunnerError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}{}: {message}", field_suffix(.field))]
    ParseConfig {
        path: PathBuf,
        field: String,
        message: String,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Compile(#[from] ArchiveCompileError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("failed to write snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

fn field_suffix(field: &str) -> String {
    if field.is_empty() || field == "." {
        String::new()
    } else {
        format!(" at {field}")
    }
}
