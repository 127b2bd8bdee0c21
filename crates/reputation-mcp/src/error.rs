use reputation_core::ReputationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error(transparent)]
    Reputation(#[from] ReputationError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Rate limit exceeded for {0}, try again later")]
    RateLimited(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, McpError>;
