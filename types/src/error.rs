//! Parse errors for domain types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("unknown duration option: {0}")]
    UnknownDuration(String),

    #[error("{0}")]
    Other(String),
}
