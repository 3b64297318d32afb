//! Full read of the contract's proposals into store records.

use std::sync::Arc;
use tracing::{debug, warn};

use symposium_chain::{ChainClient, ChainError, ChainProposal};
use symposium_store::views::expiry_label;
use symposium_store::{Action, Store};
use symposium_types::{Proposal, ProposalId, Timestamp, Wei};

/// Build the store record for a chain proposal.
///
/// Chain fields overwrite. Opinions, stake, shares and the proposer label
/// are not exposed by the contract and carry over from `prior`.
/// `last_updated` only moves when a chain field changed.
pub fn merge(chain: ChainProposal, prior: Option<&Proposal>, now: Timestamp) -> Proposal {
    let winning_side_is_yes = chain.finalized.then_some(chain.yes_wins);
    let claimed = prior.is_some_and(|p| p.is_finalized() && p.claimable == Some(false));

    let unchanged = prior.is_some_and(|p| {
        p.title == chain.title
            && p.description == chain.details
            && p.expires_at == Some(chain.expires_at)
            && p.finalized == Some(chain.finalized)
            && p.winning_side_is_yes == winning_side_is_yes
    });

    Proposal {
        id: chain.id,
        expiry: expiry_label(chain.expires_at, now),
        expires_at: Some(chain.expires_at),
        proposed_by: prior
            .map(|p| p.proposed_by.clone())
            .unwrap_or_else(|| format!("@user{}", chain.id.0)),
        total_stake: prior.map(|p| p.total_stake).unwrap_or(Wei::ZERO),
        yes_share: prior.map(|p| p.yes_share).unwrap_or(0),
        no_share: prior.map(|p| p.no_share).unwrap_or(0),
        last_updated: match prior {
            Some(p) if unchanged => p.last_updated,
            _ => now,
        },
        opinions: prior.map(|p| p.opinions.clone()).unwrap_or_default(),
        finalized: Some(chain.finalized),
        winning_side_is_yes,
        claimable: Some(chain.finalized && !claimed),
        title: chain.title,
        description: chain.details,
    }
}

/// Whether a stored record and a chain read describe the same proposal.
/// Titles and details never change on chain.
fn same_record(stored: &Proposal, read: &ChainProposal) -> bool {
    stored.title == read.title && stored.description == read.details
}

/// Merge a full read into store records, newest first.
///
/// Each read takes its local fields from the base record with the same id,
/// provided it is the same proposal. Otherwise a base record of the same
/// proposal filed under a guessed id is used, so a confirmed create keeps
/// its labels once the chain's id is known.
pub fn merge_all(reads: Vec<ChainProposal>, base: &[Proposal], now: Timestamp) -> Vec<Proposal> {
    let guessed: Vec<&Proposal> = base
        .iter()
        .filter(|p| !reads.iter().any(|r| r.id == p.id && same_record(p, r)))
        .collect();

    reads
        .into_iter()
        .map(|read| {
            let prior = base
                .iter()
                .find(|p| p.id == read.id && same_record(p, &read))
                .or_else(|| guessed.iter().copied().find(|p| same_record(p, &read)));
            merge(read, prior, now)
        })
        .collect()
}

/// Read every proposal from the chain, newest first.
///
/// A failing count read fails the load. A failing single read is logged and
/// that proposal is left out.
pub async fn read_proposals(chain: &dyn ChainClient) -> Result<Vec<ChainProposal>, ChainError> {
    let count = chain.proposal_count().await?;
    debug!(count, "loading proposals");

    let mut reads = Vec::with_capacity(count as usize);
    for n in (1..=count).rev() {
        match chain.proposal(ProposalId(n)).await {
            Ok(read) => reads.push(read),
            Err(e) => warn!(proposal = n, error = %e, "failed to load proposal, skipping"),
        }
    }
    Ok(reads)
}

/// [`read_proposals`] merged over `base`.
pub async fn load_proposals(
    chain: &dyn ChainClient,
    base: &[Proposal],
    now: Timestamp,
) -> Result<Vec<Proposal>, ChainError> {
    let reads = read_proposals(chain).await?;
    Ok(merge_all(reads, base, now))
}

/// Runs full reads into one store. Cheap to clone into background tasks.
#[derive(Clone)]
pub struct Refresher {
    chain: Arc<dyn ChainClient>,
    store: Arc<Store>,
}

impl Refresher {
    pub fn new(chain: Arc<dyn ChainClient>, store: Arc<Store>) -> Self {
        Self { chain, store }
    }

    /// `SetLoading(true)`, read, then `ReplaceAll` or `SetError`, then
    /// `SetLoading(false)`. Returns the store version after the read.
    ///
    /// The read is merged over the base as it stands when `ReplaceAll`
    /// applies, so writes confirmed while the read was in flight are kept.
    pub async fn refresh(&self) -> Result<u64, ChainError> {
        self.store.dispatch(Action::SetLoading(true));
        let outcome = match read_proposals(self.chain.as_ref()).await {
            Ok(reads) => {
                debug!(count = reads.len(), "proposals refreshed");
                let now = self.store.clock().now();
                let version = self.store.dispatch_with(|state| {
                    Action::ReplaceAll(merge_all(reads, state.base(), now))
                });
                self.store.dispatch(Action::SetError(None));
                Ok(version)
            }
            Err(e) => {
                warn!(error = %e, "failed to load proposals");
                self.store.dispatch(Action::SetError(Some(e.to_string())));
                Err(e)
            }
        };
        self.store.dispatch(Action::SetLoading(false));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symposium_types::{Opinion, OpinionId, Stance, VOTE_COST};

    const NOW: Timestamp = Timestamp::new(1_700_000_000);

    fn read(id: u64, finalized: bool, yes_wins: bool) -> ChainProposal {
        ChainProposal {
            id: ProposalId(id),
            title: format!("title {id}"),
            details: "details".into(),
            expires_at: NOW.saturating_add_secs(90_000),
            finalized,
            yes_wins,
        }
    }

    #[test]
    fn fresh_proposal_gets_placeholder_fields() {
        let p = merge(read(3, false, false), None, NOW);
        assert_eq!(p.proposed_by, "@user3");
        assert_eq!(p.expiry, "1d");
        assert_eq!(p.total_stake, Wei::ZERO);
        assert!(p.opinions.is_empty());
        assert_eq!(p.finalized, Some(false));
        assert_eq!(p.winning_side_is_yes, None);
        assert_eq!(p.claimable, Some(false));
        assert_eq!(p.last_updated, NOW);
    }

    #[test]
    fn local_fields_carry_over_and_chain_fields_win() {
        let mut prior = merge(read(1, false, false), None, Timestamp::new(5));
        prior.proposed_by = "@alice".into();
        prior.total_stake = VOTE_COST;
        prior.yes_share = 100;
        prior.opinions.push(Opinion {
            id: OpinionId(1),
            stance: Stance::Support,
            content: "x".into(),
            author: "anon".into(),
            vote_count: 1,
            stake_total: VOTE_COST,
            created_at: "just now".into(),
        });

        let p = merge(read(1, true, true), Some(&prior), NOW);
        assert_eq!(p.title, "title 1");
        assert_eq!(p.proposed_by, "@alice");
        assert_eq!(p.total_stake, VOTE_COST);
        assert_eq!(p.yes_share, 100);
        assert_eq!(p.opinions.len(), 1);
        assert_eq!(p.winning_side_is_yes, Some(true));
        assert_eq!(p.claimable, Some(true));
        assert_eq!(p.last_updated, NOW);
    }

    #[test]
    fn unchanged_read_keeps_last_updated() {
        let prior = merge(read(1, false, false), None, Timestamp::new(5));
        let p = merge(read(1, false, false), Some(&prior), NOW);
        assert_eq!(p.last_updated, Timestamp::new(5));
    }

    #[test]
    fn another_proposal_at_the_same_id_starts_fresh() {
        let mut guess = merge(read(1, false, false), None, NOW);
        guess.title = "mine".into();
        guess.proposed_by = "@alice".into();
        guess.total_stake = VOTE_COST;

        let mut mine = read(2, false, false);
        mine.title = "mine".into();
        let merged = merge_all(vec![mine, read(1, false, false)], &[guess], NOW);

        assert_eq!(merged.iter().map(|p| p.id.0).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(merged[0].proposed_by, "@alice");
        assert_eq!(merged[0].total_stake, VOTE_COST);
        assert_eq!(merged[1].proposed_by, "@user1");
        assert_eq!(merged[1].total_stake, Wei::ZERO);
    }

    #[test]
    fn local_claim_survives_refresh() {
        let mut prior = merge(read(1, true, false), None, NOW);
        prior.claimable = Some(false);
        let p = merge(read(1, true, false), Some(&prior), NOW);
        assert_eq!(p.claimable, Some(false));
    }
}
