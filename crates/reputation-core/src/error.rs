//! Error types for Reputation Core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReputationError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid commitment: {0}")]
    InvalidCommitment(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),
}

pub type ReputationResult<T> = Result<T, ReputationError>;
