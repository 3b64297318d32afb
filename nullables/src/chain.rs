//! Nullable chain: an in-memory Symposium contract.
//!
//! Writes take effect at submission when they are going to succeed, emit
//! the matching contract event, and get an immediately available receipt.
//! Failures are scripted with [`NullChain::reject_next`] and
//! [`NullChain::revert_next`].

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use symposium_chain::{
    ChainClient, ChainError, ChainProposal, ContractEvent, ContractEventKind, FilterId,
    PendingTransaction, Receipt,
};
use symposium_types::{
    ChainId, Clock, OpinionId, ProposalId, Stance, Timestamp, TxHash, Wei, VOTE_COST,
};

use crate::clock::NullClock;

/// A write as the contract received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentCall {
    CreateProposal {
        title: String,
        details: String,
        duration_secs: u64,
    },
    CreateOpinion {
        proposal: ProposalId,
        stance: Stance,
        text: String,
        value: Wei,
    },
    VoteForOpinion {
        proposal: ProposalId,
        opinion: OpinionId,
        value: Wei,
    },
    FinalizeProposal(ProposalId),
    ClaimReward(ProposalId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Failure {
    Reject,
    Revert,
}

#[derive(Debug)]
struct ChainState {
    chain_id: ChainId,
    deployed: bool,
    reachable: bool,
    vote_cost: Wei,
    proposals: Vec<ChainProposal>,
    opinion_counts: HashMap<ProposalId, u64>,
    unreadable: HashSet<ProposalId>,
    finalize_yes_wins: bool,
    next_failure: Option<Failure>,
    receipts: HashMap<TxHash, bool>,
    next_tx: u64,
    sent: Vec<SentCall>,
    events: Vec<ContractEvent>,
    filters: HashMap<FilterId, usize>,
    next_filter: u64,
}

type ReadHook = Box<dyn FnOnce() + Send>;

/// In-memory [`ChainClient`] for tests and examples.
pub struct NullChain {
    clock: Arc<NullClock>,
    state: Mutex<ChainState>,
    read_hook: Mutex<Option<ReadHook>>,
}

impl NullChain {
    pub fn new(chain_id: ChainId, clock: Arc<NullClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(ChainState {
                chain_id,
                deployed: true,
                reachable: true,
                vote_cost: VOTE_COST,
                proposals: Vec::new(),
                opinion_counts: HashMap::new(),
                unreadable: HashSet::new(),
                finalize_yes_wins: true,
                next_failure: None,
                receipts: HashMap::new(),
                next_tx: 1,
                sent: Vec::new(),
                events: Vec::new(),
                filters: HashMap::new(),
                next_filter: 1,
            }),
            read_hook: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a proposal directly, as if created in an earlier session.
    pub fn add_proposal(&self, title: &str, details: &str, expires_at: Timestamp) -> ProposalId {
        let mut state = self.lock();
        let id = ProposalId(state.proposals.len() as u64 + 1);
        state.proposals.push(ChainProposal {
            id,
            title: title.to_string(),
            details: details.to_string(),
            expires_at,
            finalized: false,
            yes_wins: false,
        });
        id
    }

    /// Make reads of `id` fail.
    pub fn make_unreadable(&self, id: ProposalId) {
        self.lock().unreadable.insert(id);
    }

    pub fn set_deployed(&self, deployed: bool) {
        self.lock().deployed = deployed;
    }

    /// While unreachable every call fails with `Connection`.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    pub fn set_vote_cost(&self, cost: Wei) {
        self.lock().vote_cost = cost;
    }

    pub fn set_finalize_outcome(&self, yes_wins: bool) {
        self.lock().finalize_yes_wins = yes_wins;
    }

    /// Run `hook` during the next single-proposal read, before it answers.
    pub fn on_next_proposal_read(&self, hook: impl FnOnce() + Send + 'static) {
        *self.read_hook.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    /// The next write is refused at submission.
    pub fn reject_next(&self) {
        self.lock().next_failure = Some(Failure::Reject);
    }

    /// The next write is mined with a failed status and has no effect.
    pub fn revert_next(&self) {
        self.lock().next_failure = Some(Failure::Revert);
    }

    /// Queue an event for every installed filter, as if another client acted.
    pub fn emit(&self, kind: ContractEventKind) {
        self.lock().events.push(ContractEvent::new(kind));
    }

    /// Writes received so far, in order.
    pub fn sent(&self) -> Vec<SentCall> {
        self.lock().sent.clone()
    }

    pub fn chain_proposals(&self) -> Vec<ChainProposal> {
        self.lock().proposals.clone()
    }

    pub fn installed_filters(&self) -> usize {
        self.lock().filters.len()
    }

    fn guard(state: &ChainState) -> Result<(), ChainError> {
        if state.reachable {
            Ok(())
        } else {
            Err(ChainError::Connection("node unreachable".into()))
        }
    }

    /// Record `call`; apply it and emit `kind` unless a failure is scripted.
    fn submit(
        &self,
        call: SentCall,
        kind: ContractEventKind,
        apply: impl FnOnce(&mut ChainState, Timestamp) -> Result<(), ChainError>,
    ) -> Result<PendingTransaction, ChainError> {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::guard(&state)?;
        state.sent.push(call);

        let failure = state.next_failure.take();
        if failure == Some(Failure::Reject) {
            return Err(ChainError::TransactionRejected("user rejected".into()));
        }

        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&state.next_tx.to_be_bytes());
        state.next_tx += 1;
        let hash = TxHash::new(bytes);

        let success = failure.is_none() && apply(&mut *state, now).is_ok();
        if success {
            let block_number = Some(state.next_tx);
            state.events.push(ContractEvent {
                kind,
                block_number,
                tx_hash: Some(hash),
            });
        }
        state.receipts.insert(hash, success);
        Ok(PendingTransaction::new(hash))
    }
}

fn find(state: &mut ChainState, id: ProposalId) -> Result<&mut ChainProposal, ChainError> {
    state
        .proposals
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| ChainError::NotFound(format!("proposal {id}")))
}

#[async_trait]
impl ChainClient for NullChain {
    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        let state = self.lock();
        Self::guard(&state)?;
        Ok(state.chain_id)
    }

    async fn has_contract(&self) -> Result<bool, ChainError> {
        let state = self.lock();
        Self::guard(&state)?;
        Ok(state.deployed)
    }

    async fn proposal_count(&self) -> Result<u64, ChainError> {
        let state = self.lock();
        Self::guard(&state)?;
        Ok(state.proposals.len() as u64)
    }

    async fn proposal(&self, id: ProposalId) -> Result<ChainProposal, ChainError> {
        let hook = self
            .read_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }
        let mut state = self.lock();
        Self::guard(&state)?;
        if state.unreadable.contains(&id) {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }
        find(&mut *state, id).map(|p| p.clone())
    }

    async fn vote_cost(&self) -> Result<Wei, ChainError> {
        let state = self.lock();
        Self::guard(&state)?;
        Ok(state.vote_cost)
    }

    async fn create_proposal(
        &self,
        title: &str,
        details: &str,
        duration_secs: u64,
    ) -> Result<PendingTransaction, ChainError> {
        let call = SentCall::CreateProposal {
            title: title.to_string(),
            details: details.to_string(),
            duration_secs,
        };
        let (title, details) = (title.to_string(), details.to_string());
        self.submit(call, ContractEventKind::ProposalCreated, move |state, now| {
            let id = ProposalId(state.proposals.len() as u64 + 1);
            state.proposals.push(ChainProposal {
                id,
                title,
                details,
                expires_at: now.saturating_add_secs(duration_secs),
                finalized: false,
                yes_wins: false,
            });
            Ok(())
        })
    }

    async fn create_opinion(
        &self,
        proposal: ProposalId,
        stance: Stance,
        text: &str,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError> {
        let call = SentCall::CreateOpinion {
            proposal,
            stance,
            text: text.to_string(),
            value,
        };
        self.submit(call, ContractEventKind::OpinionCreated, move |state, _| {
            find(state, proposal)?;
            *state.opinion_counts.entry(proposal).or_default() += 1;
            Ok(())
        })
    }

    async fn vote_for_opinion(
        &self,
        proposal: ProposalId,
        opinion: OpinionId,
        value: Wei,
    ) -> Result<PendingTransaction, ChainError> {
        let call = SentCall::VoteForOpinion {
            proposal,
            opinion,
            value,
        };
        self.submit(call, ContractEventKind::VoteCast, move |state, _| {
            find(state, proposal)?;
            let opinions = state.opinion_counts.get(&proposal).copied().unwrap_or(0);
            if opinion.0 == 0 || opinion.0 > opinions {
                return Err(ChainError::NotFound(format!("opinion {opinion}")));
            }
            Ok(())
        })
    }

    async fn finalize_proposal(
        &self,
        proposal: ProposalId,
    ) -> Result<PendingTransaction, ChainError> {
        self.submit(
            SentCall::FinalizeProposal(proposal),
            ContractEventKind::ProposalFinalized,
            move |state, _| {
                let yes_wins = state.finalize_yes_wins;
                let p = find(state, proposal)?;
                p.finalized = true;
                p.yes_wins = yes_wins;
                Ok(())
            },
        )
    }

    async fn claim_reward(&self, proposal: ProposalId) -> Result<PendingTransaction, ChainError> {
        self.submit(
            SentCall::ClaimReward(proposal),
            ContractEventKind::RewardClaimed,
            move |state, _| {
                if find(state, proposal)?.finalized {
                    Ok(())
                } else {
                    Err(ChainError::NotFound(format!("finalized proposal {proposal}")))
                }
            },
        )
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, ChainError> {
        let state = self.lock();
        Self::guard(&state)?;
        let success = *state
            .receipts
            .get(&hash)
            .ok_or_else(|| ChainError::NotFound(format!("transaction {hash}")))?;
        Ok(Receipt {
            hash,
            block_number: Some(state.next_tx),
            success,
        })
    }

    async fn install_event_filter(&self) -> Result<FilterId, ChainError> {
        let mut state = self.lock();
        Self::guard(&state)?;
        let id = FilterId(format!("0x{:x}", state.next_filter));
        state.next_filter += 1;
        let cursor = state.events.len();
        state.filters.insert(id.clone(), cursor);
        Ok(id)
    }

    async fn poll_events(&self, filter: &FilterId) -> Result<Vec<ContractEvent>, ChainError> {
        let mut state = self.lock();
        Self::guard(&state)?;
        let total = state.events.len();
        let cursor = state
            .filters
            .get_mut(filter)
            .ok_or_else(|| ChainError::Rpc {
                code: -32000,
                message: "filter not found".into(),
            })?;
        let from = std::mem::replace(cursor, total);
        Ok(state.events[from..].to_vec())
    }

    async fn uninstall_event_filter(&self, filter: &FilterId) -> Result<(), ChainError> {
        let mut state = self.lock();
        Self::guard(&state)?;
        state.filters.remove(filter);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> NullChain {
        NullChain::new(ChainId::SONIC_BLAZE, Arc::new(NullClock::new(1_000)))
    }

    #[tokio::test]
    async fn confirmed_create_is_readable() {
        let chain = chain();
        let tx = chain.create_proposal("t", "d", 86_400).await.unwrap();
        let receipt = tx.confirm(&chain).await.unwrap();
        assert!(receipt.success);
        assert_eq!(chain.proposal_count().await.unwrap(), 1);
        let p = chain.proposal(ProposalId(1)).await.unwrap();
        assert_eq!(p.expires_at, Timestamp::new(87_400));
    }

    #[tokio::test]
    async fn read_hook_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let chain = chain();
        let id = chain.add_proposal("t", "d", Timestamp::new(2_000));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        chain.on_next_proposal_read(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        chain.proposal(id).await.unwrap();
        chain.proposal(id).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let chain = chain();
        chain.reject_next();
        assert!(matches!(
            chain.create_proposal("t", "d", 1).await,
            Err(ChainError::TransactionRejected(_))
        ));

        chain.revert_next();
        let tx = chain.create_proposal("t", "d", 1).await.unwrap();
        assert!(matches!(
            tx.confirm(&chain).await,
            Err(ChainError::TransactionReverted { .. })
        ));
        assert_eq!(chain.proposal_count().await.unwrap(), 0);
        assert_eq!(chain.sent().len(), 2);
    }

    #[tokio::test]
    async fn filters_see_only_later_events() {
        let chain = chain();
        chain.emit(ContractEventKind::VoteCast);
        let filter = chain.install_event_filter().await.unwrap();
        assert!(chain.poll_events(&filter).await.unwrap().is_empty());

        chain.emit(ContractEventKind::RewardClaimed);
        let events = chain.poll_events(&filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ContractEventKind::RewardClaimed);
        assert!(chain.poll_events(&filter).await.unwrap().is_empty());

        chain.uninstall_event_filter(&filter).await.unwrap();
        assert_eq!(chain.installed_filters(), 0);
    }

    #[tokio::test]
    async fn vote_on_unknown_opinion_reverts() {
        let chain = chain();
        let id = chain.add_proposal("t", "d", Timestamp::new(5_000));
        let tx = chain.vote_for_opinion(id, OpinionId(1), VOTE_COST).await.unwrap();
        assert!(tx.confirm(&chain).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_node_is_a_connection_error() {
        let chain = chain();
        chain.set_reachable(false);
        assert!(matches!(
            chain.chain_id().await,
            Err(ChainError::Connection(_))
        ));
    }
}
