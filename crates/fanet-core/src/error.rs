//! Error types for FANET routing

use thiserror::Error;

/// Main error type for FANET routing
#[derive(Error, Debug)]
pub enum FanetError {
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown routing algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(u32),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for FANET operations
pub type Result<T> = std::result::Result<T, FanetError>;
