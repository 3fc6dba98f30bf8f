use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Persisted state error: {0}")]
    Persist(#[from] bincode::Error),

    #[error("Device database error: {0}")]
    Database(#[from] serde_json::Error),

    #[error("Source unavailable: {}", path.display())]
    SourceUnavailable { path: PathBuf },

    #[error("Malformed {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("Unsupported persisted version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Operation interrupted")]
    Interrupted,

    #[error("Track not found: {key}")]
    TrackNotFound { key: String },

    #[error("Unreadable tags in {}: {message}", path.display())]
    Tags { path: PathBuf, message: String },

    #[error("A collection named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("No collection named '{name}'")]
    UnknownCollection { name: String },

    #[error("Not a music folder or device: {}", path.display())]
    UnrecognizedPath { path: PathBuf },

    #[error("Collection '{name}' is busy")]
    Disabled { name: String },
}

pub type Result<T> = std::result::Result<T, CollectionError>;
