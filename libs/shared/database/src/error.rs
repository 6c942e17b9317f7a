use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The store rejected a write because of a unique constraint.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Storage not configured: {0}")]
    NotConfigured(String),
}
