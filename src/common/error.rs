//! Error types for replikv

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Put Errors ===
    #[error("not enough peers for replication factor {required} (available: {available})")]
    InsufficientPeers { required: usize, available: usize },

    #[error("{missing} of {required} replicas have not been created")]
    ReplicationShortfall { missing: usize, required: usize },

    // === Collaborator Errors ===
    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),

    // === Config Errors ===
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
