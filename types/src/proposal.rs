//! Proposals, opinions and the partial records used to create or patch them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Wei;
use crate::params::DurationOption;
use crate::time::Timestamp;

/// Proposal id. Assigned locally (`max + 1`) for optimistic creates; the
/// chain's id is authoritative once a full read lands.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

/// Opinion id, unique within its proposal's opinion list.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OpinionId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for OpinionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side an opinion takes on its proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Yes.
    Support,
    /// No.
    Oppose,
}

impl Stance {
    pub fn from_yes(yes: bool) -> Self {
        if yes {
            Self::Support
        } else {
            Self::Oppose
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Support)
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Support => f.write_str("yes"),
            Self::Oppose => f.write_str("no"),
        }
    }
}

/// A staked stance with commentary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opinion {
    pub id: OpinionId,
    pub stance: Stance,
    pub content: String,
    /// Display name of the author.
    pub author: String,
    /// Starts at 1: the creator's implicit vote.
    pub vote_count: u32,
    /// Only ever increases; no slashing is modelled.
    pub stake_total: Wei,
    /// Relative or absolute timestamp label.
    pub created_at: String,
}

/// A votable item with a yes/no outcome and an expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposed_by: String,
    /// Display label derived from the duration or the expiry timestamp.
    pub expiry: String,
    /// Absolute expiry when known (always known for chain-read proposals).
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Intended to equal the sum of opinion stakes; the optimistic paths do
    /// not enforce it.
    pub total_stake: Wei,
    /// Percentage in `[0, 100]`.
    pub yes_share: u8,
    /// Percentage in `[0, 100]`.
    pub no_share: u8,
    pub last_updated: Timestamp,
    /// Insertion order is display order.
    pub opinions: Vec<Opinion>,
    #[serde(default)]
    pub finalized: Option<bool>,
    #[serde(default)]
    pub winning_side_is_yes: Option<bool>,
    #[serde(default)]
    pub claimable: Option<bool>,
}

impl Proposal {
    pub fn opinion(&self, id: OpinionId) -> Option<&Opinion> {
        self.opinions.iter().find(|o| o.id == id)
    }

    pub fn opinion_mut(&mut self, id: OpinionId) -> Option<&mut Opinion> {
        self.opinions.iter_mut().find(|o| o.id == id)
    }

    /// Next opinion id: `max(existing ids, 0) + 1`.
    pub fn next_opinion_id(&self) -> OpinionId {
        OpinionId(self.opinions.iter().map(|o| o.id.0).max().unwrap_or(0) + 1)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.unwrap_or(false)
    }
}

/// User input for a new proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub proposed_by: String,
    pub duration: DurationOption,
}

/// User input for a new opinion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionDraft {
    pub stance: Stance,
    pub content: String,
    pub author: String,
}

/// Partial proposal record shallow-merged by `UpdateProposal`.
///
/// `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalPatch {
    pub id: ProposalId,
    #[serde(default)]
    pub finalized: Option<bool>,
    #[serde(default)]
    pub winning_side_is_yes: Option<bool>,
    #[serde(default)]
    pub claimable: Option<bool>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl ProposalPatch {
    pub fn new(id: ProposalId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn finalized(mut self, finalized: bool) -> Self {
        self.finalized = Some(finalized);
        self
    }

    pub fn winning_side_is_yes(mut self, yes: bool) -> Self {
        self.winning_side_is_yes = Some(yes);
        self
    }

    pub fn claimable(mut self, claimable: bool) -> Self {
        self.claimable = Some(claimable);
        self
    }

    /// Merge the set fields into `proposal`. Returns whether anything was set.
    pub fn apply_to(&self, proposal: &mut Proposal) -> bool {
        let mut touched = false;
        if let Some(v) = self.finalized {
            proposal.finalized = Some(v);
            touched = true;
        }
        if let Some(v) = self.winning_side_is_yes {
            proposal.winning_side_is_yes = Some(v);
            touched = true;
        }
        if let Some(v) = self.claimable {
            proposal.claimable = Some(v);
            touched = true;
        }
        if let Some(v) = &self.expiry {
            proposal.expiry = v.clone();
            touched = true;
        }
        if let Some(v) = self.expires_at {
            proposal.expires_at = Some(v);
            touched = true;
        }
        touched
    }
}
