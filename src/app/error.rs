use thiserror::Error;

use crate::config::ConfigError;
use crate::parser::StructureError;

#[derive(Error, Debug)]
pub enum StorywatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Story not found: {0}")]
    StoryNotFound(i64),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, StorywatchError>;
