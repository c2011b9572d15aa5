use std::path::PathBuf;

use photostudio_proto::TransportError;
use thiserror::Error;

/// Result type alias for conversation handling.
pub type StudioResult<T> = std::result::Result<T, StudioError>;

/// Errors that abort handling of a single event.
///
/// Generation failures are not errors here: they are ordinary outcomes
/// handled inside the state machine.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The chat transport rejected a send that the transition depends on.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors raised while loading a style catalog.
#[derive(Debug, Error)]
pub enum StyleCatalogError {
    #[error("failed to read style catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse style catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("style catalog is empty")]
    Empty,

    #[error("duplicate style key: {0}")]
    DuplicateKey(String),

    #[error("invalid style key {0:?}: keys must be non-empty and contain no whitespace")]
    InvalidKey(String),
}
