use thiserror::Error;

use symposium_types::{ChainId, TxHash};

#[derive(Debug, Error)]
pub enum ChainError {
    /// No reachable node, or no account to send from.
    #[error("not connected: {0}")]
    Connection(String),

    #[error("wrong network: expected chain {expected}, connected to {actual}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },

    #[error("no Symposium contract deployed on chain {chain_id}")]
    ContractUnavailable { chain_id: ChainId },

    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("transaction {hash} reverted")]
    TransactionReverted { hash: TxHash },

    #[error("{0} not found")]
    NotFound(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("ABI decoding failed: {0}")]
    Abi(String),
}

impl ChainError {
    /// Whether the failure came from the transaction itself rather than the
    /// transport or a read.
    pub fn is_transaction_failure(&self) -> bool {
        matches!(
            self,
            Self::TransactionRejected(_) | Self::TransactionReverted { .. }
        )
    }
}
