//! Contract event classification.
//!
//! Events only signal that chain state moved; their payloads are not decoded.

use serde::{Deserialize, Serialize};
use std::fmt;

use symposium_types::TxHash;

use crate::abi::topic;

pub const PROPOSAL_CREATED: &str = "ProposalCreated(uint256,address,string,uint256)";
pub const OPINION_CREATED: &str = "OpinionCreated(uint256,uint256,address,bool)";
pub const VOTE_CAST: &str = "VoteCast(uint256,uint256,address)";
pub const PROPOSAL_FINALIZED: &str = "ProposalFinalized(uint256,bool)";
pub const REWARD_CLAIMED: &str = "RewardClaimed(uint256,address,uint256)";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractEventKind {
    ProposalCreated,
    OpinionCreated,
    VoteCast,
    ProposalFinalized,
    RewardClaimed,
    /// A log from the contract with a topic this client does not know.
    Unknown,
}

impl ContractEventKind {
    pub const KNOWN: [ContractEventKind; 5] = [
        Self::ProposalCreated,
        Self::OpinionCreated,
        Self::VoteCast,
        Self::ProposalFinalized,
        Self::RewardClaimed,
    ];

    pub fn signature(&self) -> Option<&'static str> {
        match self {
            Self::ProposalCreated => Some(PROPOSAL_CREATED),
            Self::OpinionCreated => Some(OPINION_CREATED),
            Self::VoteCast => Some(VOTE_CAST),
            Self::ProposalFinalized => Some(PROPOSAL_FINALIZED),
            Self::RewardClaimed => Some(REWARD_CLAIMED),
            Self::Unknown => None,
        }
    }

    pub fn topic(&self) -> Option<[u8; 32]> {
        self.signature().map(topic)
    }

    /// Classify a log by its first topic.
    pub fn from_topic(topic0: &[u8; 32]) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.topic().as_ref() == Some(topic0))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ContractEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProposalCreated => "ProposalCreated",
            Self::OpinionCreated => "OpinionCreated",
            Self::VoteCast => "VoteCast",
            Self::ProposalFinalized => "ProposalFinalized",
            Self::RewardClaimed => "RewardClaimed",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// One contract log, reduced to what the client acts on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub kind: ContractEventKind,
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

impl ContractEvent {
    pub fn new(kind: ContractEventKind) -> Self {
        Self {
            kind,
            block_number: None,
            tx_hash: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_topics_round_trip_to_their_kind() {
        for kind in ContractEventKind::KNOWN {
            let t = kind.topic().unwrap();
            assert_eq!(ContractEventKind::from_topic(&t), kind);
        }
    }

    #[test]
    fn foreign_topic_is_unknown() {
        let transfer = topic("Transfer(address,address,uint256)");
        assert_eq!(
            ContractEventKind::from_topic(&transfer),
            ContractEventKind::Unknown
        );
        assert_eq!(ContractEventKind::Unknown.topic(), None);
    }
}
