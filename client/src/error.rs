use thiserror::Error;

use symposium_chain::ChainError;
use symposium_types::ProposalId;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("session is offline; chain writes are unavailable")]
    Offline,

    #[error("a write is already in flight on this tracker")]
    WriteInFlight,

    #[error("{0}")]
    Other(String),
}
