//! Resolved changes and the ledger of speculative writes.
//!
//! A [`Mutation`] is user intent. Resolving it against the current
//! collection fixes every locally assigned id and timestamp, producing a
//! [`Change`] that can be replayed over any base without drifting.

use symposium_types::{
    Opinion, OpinionId, Proposal, ProposalId, ProposalPatch, Timestamp, Wei, JUST_NOW,
};

use crate::action::{Mutation, WriteId};
use crate::shares::reweigh;

/// A mutation with its local ids fixed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    ProposalCreated(Proposal),
    OpinionAdded {
        proposal: ProposalId,
        opinion: Opinion,
    },
    OpinionVoted {
        proposal: ProposalId,
        opinion: OpinionId,
        stake: Wei,
    },
    ProposalPatched(ProposalPatch),
}

/// Next proposal id: `max(existing ids, 0) + 1`.
pub fn next_proposal_id(proposals: &[Proposal]) -> ProposalId {
    ProposalId(proposals.iter().map(|p| p.id.0).max().unwrap_or(0) + 1)
}

impl Change {
    pub fn resolve(mutation: Mutation, proposals: &[Proposal], now: Timestamp) -> Self {
        match mutation {
            Mutation::CreateProposal(draft) => Self::ProposalCreated(Proposal {
                id: next_proposal_id(proposals),
                title: draft.title,
                description: draft.description,
                proposed_by: draft.proposed_by,
                expiry: draft.duration.label().to_string(),
                expires_at: Some(now.saturating_add_secs(draft.duration.secs())),
                total_stake: Wei::ZERO,
                yes_share: 0,
                no_share: 0,
                last_updated: now,
                opinions: Vec::new(),
                finalized: None,
                winning_side_is_yes: None,
                claimable: None,
            }),
            Mutation::AddOpinion {
                proposal,
                draft,
                stake,
            } => {
                let id = proposals
                    .iter()
                    .find(|p| p.id == proposal)
                    .map(Proposal::next_opinion_id)
                    .unwrap_or(OpinionId(1));
                Self::OpinionAdded {
                    proposal,
                    opinion: Opinion {
                        id,
                        stance: draft.stance,
                        content: draft.content,
                        author: draft.author,
                        vote_count: 1,
                        stake_total: stake,
                        created_at: JUST_NOW.to_string(),
                    },
                }
            }
            Mutation::VoteForOpinion {
                proposal,
                opinion,
                stake,
            } => Self::OpinionVoted {
                proposal,
                opinion,
                stake,
            },
            Mutation::UpdateProposal(patch) => Self::ProposalPatched(patch),
        }
    }

    /// The proposal this change targets.
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated(p) => p.id,
            Self::OpinionAdded { proposal, .. } | Self::OpinionVoted { proposal, .. } => *proposal,
            Self::ProposalPatched(patch) => patch.id,
        }
    }

    /// Point a change aimed at proposal `from` at `to` instead. Creates are
    /// left alone.
    pub fn retarget(&mut self, from: ProposalId, to: ProposalId) {
        let target = match self {
            Self::ProposalCreated(_) => return,
            Self::OpinionAdded { proposal, .. } | Self::OpinionVoted { proposal, .. } => proposal,
            Self::ProposalPatched(patch) => &mut patch.id,
        };
        if *target == from {
            *target = to;
        }
    }

    /// Apply to `proposals`, stamping `last_updated = at`.
    ///
    /// Returns `false` when the target proposal or opinion does not exist;
    /// `proposals` is then left untouched. A stored id that collides with
    /// one already present is reassigned `max + 1` and kept for later replays.
    pub fn apply(&mut self, proposals: &mut Vec<Proposal>, at: Timestamp) -> bool {
        match self {
            Self::ProposalCreated(created) => {
                if proposals.iter().any(|p| p.id == created.id) {
                    created.id = next_proposal_id(proposals);
                }
                proposals.insert(0, created.clone());
                true
            }
            Self::OpinionAdded { proposal, opinion } => {
                let Some(target) = proposals.iter_mut().find(|p| p.id == *proposal) else {
                    return false;
                };
                if target.opinion(opinion.id).is_some() {
                    opinion.id = target.next_opinion_id();
                }
                target.opinions.push(opinion.clone());
                reweigh(target, opinion.stake_total);
                target.last_updated = at;
                true
            }
            Self::OpinionVoted {
                proposal,
                opinion,
                stake,
            } => {
                let Some(target) = proposals.iter_mut().find(|p| p.id == *proposal) else {
                    return false;
                };
                let Some(voted) = target.opinion_mut(*opinion) else {
                    return false;
                };
                voted.vote_count = voted.vote_count.saturating_add(1);
                voted.stake_total = voted.stake_total.saturating_add(*stake);
                reweigh(target, *stake);
                target.last_updated = at;
                true
            }
            Self::ProposalPatched(patch) => {
                let Some(target) = proposals.iter_mut().find(|p| p.id == patch.id) else {
                    return false;
                };
                patch.apply_to(target);
                target.last_updated = at;
                true
            }
        }
    }
}

/// One speculative write awaiting its transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    pub write: WriteId,
    pub change: Change,
    /// When the write was recorded; replays stamp this, not the replay time.
    pub at: Timestamp,
    /// Confirmed on chain but its target was not yet in the confirmed base.
    /// Dropped by the next full read.
    pub confirmed: bool,
}
