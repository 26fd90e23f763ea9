//! Crate-wide error taxonomy.
//!
//! Core operations fall into four failure classes: user input that fails
//! validation, lookups that resolve to nothing, storage faults, and the
//! AI-assistance collaborator being unreachable. Assist failures are
//! recovered locally with fallback strings and never surface from the
//! public assist API; the variant exists for the internal request path.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed user input. The operation was aborted before
    /// any write happened.
    #[error("validation: {0}")]
    Validation(String),

    /// A referenced entity (client, order, account) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Document store failure.
    #[error("storage: {0}")]
    Storage(String),

    /// A stored document could not be encoded or decoded.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The AI assistance service failed or is not configured.
    #[error("external service unavailable: {0}")]
    ExternalService(String),

    /// Unexpected internal failure (e.g. password hashing).
    #[error("internal: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ExternalService(e.to_string())
    }
}
