//! Error type for the fallible edges of the crate
//!
//! Generation itself never fails: degenerate geometry falls back and bad
//! numeric settings are clamped. Only configuration parsing and file output
//! can produce a `PlantError`.

use std::path::PathBuf;

/// Errors raised while loading settings or writing meshes.
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl PlantError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlantError>;
