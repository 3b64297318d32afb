use std::collections::HashMap;

use symposium_types::{Proposal, ProposalId};

use crate::action::WriteId;
use crate::pending::PendingWrite;

/// Store state: the read model plus what it is derived from.
///
/// `proposals` is always `base` with every pending change replayed on top,
/// in the order the writes were recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub proposals: Vec<Proposal>,
    /// Change-detection token. Session-local; carries no ordering meaning.
    pub version: u64,
    pub is_loading: bool,
    pub last_error: Option<String>,
    base: Vec<Proposal>,
    pending: Vec<PendingWrite>,
}

impl State {
    /// State whose confirmed collection is `proposals`, with nothing pending.
    pub fn with_proposals(proposals: Vec<Proposal>) -> Self {
        Self {
            proposals: proposals.clone(),
            base: proposals,
            ..Default::default()
        }
    }

    /// Confirmed state, as of the last full read plus folded-in confirmations.
    pub fn base(&self) -> &[Proposal] {
        &self.base
    }

    pub fn pending(&self) -> &[PendingWrite] {
        &self.pending
    }

    pub fn is_pending(&self, write: WriteId) -> bool {
        self.pending.iter().any(|p| p.write == write)
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub(crate) fn base_mut(&mut self) -> &mut Vec<Proposal> {
        &mut self.base
    }

    pub(crate) fn pending_mut(&mut self) -> &mut Vec<PendingWrite> {
        &mut self.pending
    }

    pub(crate) fn replace_base(&mut self, proposals: Vec<Proposal>) {
        self.base = proposals;
    }

    /// Recompute `proposals` from `base` and the pending ledger.
    ///
    /// A pending create whose id is now taken moves to a free one, and every
    /// later entry aimed at its old id moves with it.
    pub(crate) fn rebuild(&mut self) {
        let mut view = self.base.clone();
        let mut moved: HashMap<ProposalId, ProposalId> = HashMap::new();
        for entry in &mut self.pending {
            let target = entry.change.proposal_id();
            if let Some(&to) = moved.get(&target) {
                entry.change.retarget(target, to);
            }
            let before = entry.change.proposal_id();
            if !entry.change.apply(&mut view, entry.at) {
                tracing::trace!(write = %entry.write, "pending change has no target");
            }
            let after = entry.change.proposal_id();
            if before != after {
                tracing::debug!(
                    write = %entry.write,
                    from = %before,
                    to = %after,
                    "pending proposal moved"
                );
                moved.insert(before, after);
            }
        }
        self.proposals = view;
    }
}
