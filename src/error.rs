use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by model loading and by the parser lifecycle.
///
/// Lookup misses and empty parses are not errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("model format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("model directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("address parser is not ready, call setup first")]
    NotReady,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_model(msg: impl Into<String>) -> Self {
        Error::InvalidModel(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
