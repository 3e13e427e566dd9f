use std::path::PathBuf;

use thiserror::Error;

use crate::models::InferenceError;

/// Failures that end a translation run. None of them are retried.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("option `enable_{0}` is set but `{0}` has no value")]
    MissingOptionKey(String),

    #[error("inference failed on chunk {chunk}/{total}: {source}")]
    InferenceFailure {
        chunk: usize,
        total: usize,
        #[source]
        source: InferenceError,
    },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    Decode(PathBuf),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
