use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Draft already exists for item {0}")]
    DraftAlreadyExists(String),

    #[error("No corresponding entry found for item {0}")]
    NoCorrespondingEntry(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Content conversion error: {0}")]
    Content(String),

    #[error("Repository error ({status}): {message}")]
    Repository { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Errors cross the IPC/JSON boundary as plain strings
impl Serialize for StudioError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
