//! Error types for the snapshot exporter

use std::path::PathBuf;

use thiserror::Error;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Boxed error handed back by host collaborators (schema generation etc.)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Snapshot export errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("Schema generation failed")]
    SchemaGeneration(#[source] BoxError),

    #[error("Invalid schema document {file}: {reason}")]
    InvalidSchema { file: String, reason: String },

    #[error("Configuration error")]
    Config(#[from] config_crate::ConfigError),
}

impl SnapshotError {
    /// Attach the offending path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Extension for attaching paths to `std::io::Result`
pub(crate) trait IoResultExt<T> {
    fn at_path(self, path: &std::path::Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at_path(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| SnapshotError::io(path, source))
    }
}
