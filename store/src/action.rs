//! Actions accepted by the reducer.

use serde::{Deserialize, Serialize};
use std::fmt;

use symposium_types::{
    OpinionDraft, OpinionId, Proposal, ProposalDraft, ProposalId, ProposalPatch, Wei, VOTE_COST,
};

use crate::simulate::Perturbation;

/// Identifies one speculative write from `Speculate` until its `Settle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriteId(pub u64);

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// A data-changing operation on the proposal collection.
///
/// Mutations carry user intent; ids are resolved against the collection at
/// the moment the mutation is applied or recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Prepend a proposal with id `max(existing, 0) + 1` and zeroed stake.
    CreateProposal(ProposalDraft),
    /// Append an opinion with one vote and `stake` already committed.
    AddOpinion {
        proposal: ProposalId,
        draft: OpinionDraft,
        stake: Wei,
    },
    /// One more vote and `stake` more on an existing opinion.
    VoteForOpinion {
        proposal: ProposalId,
        opinion: OpinionId,
        stake: Wei,
    },
    /// Shallow-merge a partial record into the matching proposal.
    UpdateProposal(ProposalPatch),
}

impl Mutation {
    /// `AddOpinion` staking the protocol's fixed vote cost.
    pub fn add_opinion(proposal: ProposalId, draft: OpinionDraft) -> Self {
        Self::AddOpinion {
            proposal,
            draft,
            stake: VOTE_COST,
        }
    }

    pub fn vote(proposal: ProposalId, opinion: OpinionId, stake: Wei) -> Self {
        Self::VoteForOpinion {
            proposal,
            opinion,
            stake,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateProposal(_) => "create_proposal",
            Self::AddOpinion { .. } => "add_opinion",
            Self::VoteForOpinion { .. } => "vote_for_opinion",
            Self::UpdateProposal(_) => "update_proposal",
        }
    }
}

/// How a speculative write ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The transaction landed; the change becomes confirmed state.
    Confirmed,
    /// The transaction was rejected or reverted; the change is dropped.
    Failed,
}

/// Every state transition the store knows.
#[derive(Clone, Debug)]
pub enum Action {
    /// Overwrite the confirmed collection after a full chain read.
    ReplaceAll(Vec<Proposal>),
    /// Apply a mutation as confirmed state.
    Mutate(Mutation),
    /// Record a mutation as a pending speculative write.
    Speculate { write: WriteId, mutation: Mutation },
    /// Resolve a pending speculative write.
    Settle { write: WriteId, outcome: Settlement },
    /// Something changed on chain; bump the version only.
    Touch,
    SetLoading(bool),
    SetError(Option<String>),
    /// Offline simulation step.
    Tick(Vec<Perturbation>),
}

impl Action {
    pub fn create_proposal(draft: ProposalDraft) -> Self {
        Self::Mutate(Mutation::CreateProposal(draft))
    }

    pub fn add_opinion(proposal: ProposalId, draft: OpinionDraft) -> Self {
        Self::Mutate(Mutation::add_opinion(proposal, draft))
    }

    pub fn vote_for_opinion(proposal: ProposalId, opinion: OpinionId, stake: Wei) -> Self {
        Self::Mutate(Mutation::vote(proposal, opinion, stake))
    }

    pub fn update_proposal(patch: ProposalPatch) -> Self {
        Self::Mutate(Mutation::UpdateProposal(patch))
    }

    /// Loading and error flags are transient UI state and leave the version alone.
    pub fn bumps_version(&self) -> bool {
        !matches!(self, Self::SetLoading(_) | Self::SetError(_))
    }
}
