//! Typed adapter for the deployed Symposium contract.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use symposium_types::{
    Address, ChainId, OpinionId, ProposalId, Stance, Timestamp, TxHash, Wei, VOTE_COST,
};

use crate::abi::{encode_call, Decoder, Token};
use crate::client::{ChainClient, ChainProposal, FilterId, PendingTransaction, Receipt};
use crate::error::ChainError;
use crate::events::{ContractEvent, ContractEventKind};
use crate::rpc::{parse_data, parse_u64_quantity, JsonRpcClient, RawLog};

pub const PROPOSAL_COUNT: &str = "proposalCount()";
pub const PROPOSALS: &str = "proposals(uint256)";
pub const VOTE_COST_FN: &str = "VOTE_COST()";
pub const CREATE_PROPOSAL: &str = "createProposal(string,string,uint256)";
pub const CREATE_OPINION: &str = "createOpinion(uint256,bool,string)";
pub const VOTE_FOR_OPINION: &str = "voteForOpinion(uint256,uint256)";
pub const FINALIZE_PROPOSAL: &str = "finalizeProposal(uint256)";
pub const CLAIM_REWARD: &str = "claimReward(uint256)";

/// Decode the `proposals(uint256)` return tuple
/// `(string title, string details, uint256 expireTime, bool isFinalized, bool yesWins)`.
pub fn decode_proposal(id: ProposalId, data: &[u8]) -> Result<ChainProposal, ChainError> {
    let d = Decoder::new(data);
    let expire = d.uint(2)?;
    let expire = u64::try_from(expire)
        .map_err(|_| ChainError::Abi(format!("expireTime {expire} out of range")))?;
    Ok(ChainProposal {
        id,
        title: d.string(0)?,
        details: d.string(1)?,
        expires_at: Timestamp::new(expire),
        finalized: d.boolean(3)?,
        yes_wins: d.boolean(4)?,
    })
}

/// Reduce a raw log to an event; malformed optional fields are dropped.
pub fn decode_log(log: &RawLog) -> ContractEvent {
    let kind = log
        .topics
        .first()
        .and_then(|t| parse_data(t).ok())
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .map(|t| ContractEventKind::from_topic(&t))
        .unwrap_or(ContractEventKind::Unknown);
    ContractEvent {
        kind,
        block_number: log
            .block_number
            .as_deref()
            .and_then(|b| parse_u64_quantity(b).ok()),
        tx_hash: log.transaction_hash.as_deref().and_then(|h| h.parse().ok()),
    }
}

fn u64_token(v: u64) -> Token {
    Token::Uint(v as u128)
}

/// [`ChainClient`] over JSON-RPC for one contract deployment.
///
/// Transactions are sent from `sender`, an account the node holds unlocked.
pub struct SymposiumContract {
    rpc: JsonRpcClient,
    address: Address,
    sender: Option<Address>,
    receipt_poll_interval: Duration,
}

impl SymposiumContract {
    pub fn new(rpc: JsonRpcClient, address: Address, sender: Option<Address>) -> Self {
        Self {
            rpc,
            address,
            sender,
            receipt_poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    async fn read(&self, signature: &str, args: &[Token]) -> Result<Vec<u8>, ChainError> {
        self.rpc
            .eth_call(&self.address, &encode_call(signature, args))
            .await
    }

    async fn write(
        &self,
        signature: &str,
        args: &[Token],
        value: Wei,
    ) -> Result<PendingTransaction, ChainError> {
        let from = self
            .sender
            .ok_or_else(|| ChainError::Connection("no wallet connected".into()))?;
        let hash = self
            .rpc
            .send_transaction(&from, &self.address, &encode_call(signature, args), value)
            .await?;
        debug!(function = signature, %hash, "transaction submitted");
        Ok(PendingTransaction::new(hash))
    }
}

#[async_trait]
impl ChainClient for SymposiumContract {
    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        Ok(ChainId(self.rpc.chain_id().await?))
    }

    async fn has_contract(&self) -> Result<bool, ChainError> {
        Ok(!self.rpc.get_code(&self.address).await?.is_empty())
    }

    async fn proposal_count(&self) -> Result<u64, ChainError> {
        let raw = self.read(PROPOSAL_COUNT, &[]).await?;
        let count = Decoder::new(&raw).uint(0)?;
        u64::try_from(count).map_err(|_| ChainError::Abi(format!("proposal count {count}")))
    }

    async fn proposal(&self, id: ProposalId) -> Result<ChainProposal, ChainError> {
        let raw = self.read(PROPOSALS, &[u64_token(id.0)]).await?;
        if raw.is_empty() {
            return Err(ChainError::NotFound(format!("proposal {id}")));
        }
        decode_proposal(id, &raw)
    }

    async fn vote_cost(&self) -> Result<Wei, ChainError> {
        let read = async {
            let raw = self.read(VOTE_COST_FN, &[]).await?;
            let cost = Decoder::new(&raw).uint(0)?;
            Ok::<_, ChainError>(Wei::new(cost))
        };
        match read.await {
            Ok(cost) => Ok(cost),
            Err(e) => {
                warn!(error = %e, fallback = %VOTE_COST, "vote cost read failed, using default");
                Ok(VOTE_COST)
            }
        }
    }

    async fn create_proposal(
        &self,
        title: &str,
        details: &str,
        duration_secs: u64,
    ) -> Result<PendingTransaction, ChainError> {
        self.write(
            CREATE_PROPOSAL,
            &[
                Token::String(title.to_string()),
                Token::String(details.to_string()),
                u64_token(duration_secs),
            ],
            Wei::ZERO,
        )
        .await
    }

    async fn create_opinion(
        &self,
        proposal: ProposalId,
        stance: Stance,
        text: &str,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError> {
        self.write(
            CREATE_OPINION,
            &[
                u64_token(proposal.0),
                Token::Bool(stance.is_yes()),
                Token::String(text.to_string()),
            ],
            value,
        )
        .await
    }

    async fn vote_for_opinion(
        &self,
        proposal: ProposalId,
        opinion: OpinionId,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError> {
        self.write(
            VOTE_FOR_OPINION,
            &[u64_token(proposal.0), u64_token(opinion.0)],
            value,
        )
        .await
    }

    async fn finalize_proposal(
        &self,
        proposal: ProposalId,
    ) -> Result<PendingTransaction, ChainError> {
        self.write(FINALIZE_PROPOSAL, &[u64_token(proposal.0)], Wei::ZERO)
            .await
    }

    async fn claim_reward(&self, proposal: ProposalId) -> Result<PendingTransaction, ChainError> {
        self.write(CLAIM_REWARD, &[u64_token(proposal.0)], Wei::ZERO)
            .await
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, ChainError> {
        loop {
            if let Some(raw) = self.rpc.transaction_receipt(&hash).await? {
                let block_number = raw
                    .block_number
                    .as_deref()
                    .map(parse_u64_quantity)
                    .transpose()?;
                let success = match raw.status.as_deref() {
                    Some(status) => parse_u64_quantity(status)? == 1,
                    None => true,
                };
                debug!(%hash, ?block_number, success, "receipt received");
                return Ok(Receipt {
                    hash,
                    block_number,
                    success,
                });
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    async fn install_event_filter(&self) -> Result<FilterId, ChainError> {
        Ok(FilterId(self.rpc.new_filter(&self.address).await?))
    }

    async fn poll_events(&self, filter: &FilterId) -> Result<Vec<ContractEvent>, ChainError> {
        let logs = self.rpc.filter_changes(&filter.0).await?;
        Ok(logs.iter().map(decode_log).collect())
    }

    async fn uninstall_event_filter(&self, filter: &FilterId) -> Result<(), ChainError> {
        if !self.rpc.uninstall_filter(&filter.0).await? {
            debug!(filter = %filter.0, "filter was already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{encode, topic};
    use crate::events::VOTE_CAST;

    fn proposal_payload(expire: u128, finalized: u128, yes: u128) -> Vec<u8> {
        encode(&[
            Token::String("Raise quorum".into()),
            Token::String("Quorum to 10%".into()),
            Token::Uint(expire),
            Token::Uint(finalized),
            Token::Uint(yes),
        ])
    }

    #[test]
    fn decodes_proposal_tuple() {
        let p = decode_proposal(ProposalId(4), &proposal_payload(1_700_086_400, 1, 0)).unwrap();
        assert_eq!(p.id, ProposalId(4));
        assert_eq!(p.title, "Raise quorum");
        assert_eq!(p.details, "Quorum to 10%");
        assert_eq!(p.expires_at, Timestamp::new(1_700_086_400));
        assert!(p.finalized);
        assert!(!p.yes_wins);
    }

    #[test]
    fn rejects_malformed_flags() {
        let err = decode_proposal(ProposalId(1), &proposal_payload(1, 3, 0)).unwrap_err();
        assert!(matches!(err, ChainError::Abi(_)));
    }

    #[test]
    fn rejects_expiry_beyond_u64() {
        let err = decode_proposal(ProposalId(1), &proposal_payload(u128::MAX, 0, 0)).unwrap_err();
        assert!(matches!(err, ChainError::Abi(_)));
    }

    #[test]
    fn classifies_logs_by_first_topic() {
        let log = RawLog {
            topics: vec![format!("0x{}", hex::encode(topic(VOTE_CAST)))],
            block_number: Some("0x2a".into()),
            transaction_hash: Some(format!("0x{}", "ab".repeat(32))),
        };
        let event = decode_log(&log);
        assert_eq!(event.kind, ContractEventKind::VoteCast);
        assert_eq!(event.block_number, Some(42));
        assert!(event.tx_hash.is_some());

        let bare = RawLog {
            topics: vec![],
            block_number: Some("nope".into()),
            transaction_hash: None,
        };
        let event = decode_log(&bare);
        assert_eq!(event.kind, ContractEventKind::Unknown);
        assert_eq!(event.block_number, None);
    }

    #[tokio::test]
    async fn writes_without_sender_are_connection_errors() {
        let rpc = JsonRpcClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let contract = SymposiumContract::new(rpc, Address::ZERO, None);
        let err = contract.claim_reward(ProposalId(1)).await.unwrap_err();
        assert!(matches!(err, ChainError::Connection(_)));
    }
}
