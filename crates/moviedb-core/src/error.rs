use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding service returned status {status}: {body}")]
    RemoteService { status: u16, body: String },

    #[error("Document store unavailable: {0}")]
    Connection(String),

    #[error("Vector search query rejected: {0}")]
    Query(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

impl Error {
    /// HTTP status carried by a `RemoteService` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteService { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
