//! The chain seam: every read, write and event poll the client performs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use symposium_types::{ChainId, OpinionId, ProposalId, Stance, Timestamp, TxHash, Wei};

use crate::error::ChainError;
use crate::events::ContractEvent;

/// A proposal as the contract reports it. The only typed record built from
/// raw contract output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProposal {
    pub id: ProposalId,
    pub title: String,
    pub details: String,
    pub expires_at: Timestamp,
    pub finalized: bool,
    /// Meaningful only once `finalized`.
    pub yes_wins: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    /// `false` when execution reverted.
    pub success: bool,
}

/// Node-side handle of an installed log filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterId(pub String);

/// Everything the client needs from the chain.
///
/// Implemented by [`crate::SymposiumContract`] over JSON-RPC and by an
/// in-memory double for tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<ChainId, ChainError>;

    /// Whether contract code is deployed at the configured address.
    async fn has_contract(&self) -> Result<bool, ChainError>;

    async fn proposal_count(&self) -> Result<u64, ChainError>;

    async fn proposal(&self, id: ProposalId) -> Result<ChainProposal, ChainError>;

    async fn vote_cost(&self) -> Result<Wei, ChainError>;

    async fn create_proposal(
        &self,
        title: &str,
        details: &str,
        duration_secs: u64,
    ) -> Result<PendingTransaction, ChainError>;

    async fn create_opinion(
        &self,
        proposal: ProposalId,
        stance: Stance,
        text: &str,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError>;

    async fn vote_for_opinion(
        &self,
        proposal: ProposalId,
        opinion: OpinionId,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError>;

    async fn finalize_proposal(&self, proposal: ProposalId)
        -> Result<PendingTransaction, ChainError>;

    async fn claim_reward(&self, proposal: ProposalId) -> Result<PendingTransaction, ChainError>;

    /// Wait until the transaction is mined and return its receipt.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, ChainError>;

    async fn install_event_filter(&self) -> Result<FilterId, ChainError>;

    /// Contract events since the previous poll of `filter`.
    async fn poll_events(&self, filter: &FilterId) -> Result<Vec<ContractEvent>, ChainError>;

    async fn uninstall_event_filter(&self, filter: &FilterId) -> Result<(), ChainError>;
}

/// A submitted transaction awaiting confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: TxHash,
}

impl PendingTransaction {
    pub fn new(hash: TxHash) -> Self {
        Self { hash }
    }

    /// Wait for the receipt; a reverted execution is an error.
    pub async fn confirm(&self, chain: &dyn ChainClient) -> Result<Receipt, ChainError> {
        let receipt = chain.wait_for_receipt(self.hash).await?;
        if receipt.success {
            Ok(receipt)
        } else {
            Err(ChainError::TransactionReverted { hash: self.hash })
        }
    }
}
