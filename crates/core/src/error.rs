//! Error taxonomy for an analyze run.
//!
//! A single file failing to read or parse is reported and skipped; a scan
//! failure, a configuration problem, a store failure, or a broken internal
//! invariant aborts the run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("cannot access {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parser failed on {file}: {message}")]
    Parser { file: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Graph store transaction failure. Carries the backend's error code when the
/// backend exposes one.
#[derive(Error, Debug)]
#[error("graph store error{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
pub struct StoreError {
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}
