//! The session's single store instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use symposium_types::{Clock, Proposal, ProposalId};

use crate::action::{Action, Mutation, Settlement, WriteId};
use crate::reducer::reduce;
use crate::state::State;

/// Owned, shareable store. Every transition goes through [`reduce`] under one
/// lock, so actions apply atomically and in dispatch order. Subscribers are
/// notified with the new version after each version-bumping action.
pub struct Store {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    version_tx: watch::Sender<u64>,
    next_write: AtomicU64,
}

impl Store {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_state(clock, State::default())
    }

    pub fn with_proposals(clock: Arc<dyn Clock>, proposals: Vec<Proposal>) -> Self {
        Self::with_state(clock, State::with_proposals(proposals))
    }

    fn with_state(clock: Arc<dyn Clock>, state: State) -> Self {
        let (version_tx, _) = watch::channel(state.version);
        Self {
            state: Mutex::new(state),
            clock,
            version_tx,
            next_write: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Reduction never panics halfway through a write; the state is whole.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `action`; returns the resulting version.
    pub fn dispatch(&self, action: Action) -> u64 {
        self.dispatch_with(|_| action)
    }

    /// Build the action from the state it will be applied to, under the
    /// same lock. Nothing can land between reading `state` and the reduce.
    pub fn dispatch_with(&self, build: impl FnOnce(&State) -> Action) -> u64 {
        let now = self.clock.now();
        let version = {
            let mut state = self.lock();
            let action = build(&state);
            let next = reduce(&state, action, now);
            *state = next;
            state.version
        };
        self.version_tx.send_if_modified(|v| {
            if *v == version {
                false
            } else {
                *v = version;
                true
            }
        });
        version
    }

    /// Record `mutation` as a pending speculative write.
    pub fn speculate(&self, mutation: Mutation) -> WriteId {
        let write = WriteId(self.next_write.fetch_add(1, Ordering::Relaxed));
        self.dispatch(Action::Speculate { write, mutation });
        write
    }

    pub fn settle(&self, write: WriteId, outcome: Settlement) -> u64 {
        self.dispatch(Action::Settle { write, outcome })
    }

    pub fn snapshot(&self) -> State {
        self.lock().clone()
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        self.lock().proposals.clone()
    }

    pub fn proposal(&self, id: ProposalId) -> Option<Proposal> {
        self.lock().proposal(id).cloned()
    }

    /// Confirmed collection, without pending writes.
    pub fn base(&self) -> Vec<Proposal> {
        self.lock().base().to_vec()
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Watch the version counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symposium_types::{DurationOption, ProposalDraft, SystemClock};

    fn store() -> Store {
        Store::new(Arc::new(SystemClock))
    }

    fn draft() -> ProposalDraft {
        ProposalDraft {
            title: "t".into(),
            description: "d".into(),
            proposed_by: "@alice".into(),
            duration: DurationOption::ThreeDays,
        }
    }

    #[test]
    fn dispatch_returns_new_version() {
        let store = store();
        assert_eq!(store.dispatch(Action::create_proposal(draft())), 1);
        assert_eq!(store.dispatch(Action::SetLoading(true)), 1);
        assert!(store.is_loading());
        assert_eq!(store.version(), 1);
        assert_eq!(store.proposal(ProposalId(1)).map(|p| p.title), Some("t".into()));
    }

    #[test]
    fn subscribers_see_version_bumps_only() {
        let store = store();
        let mut rx = store.subscribe();
        assert_eq!(*rx.borrow_and_update(), 0);

        store.dispatch(Action::SetError(Some("x".into())));
        assert!(!rx.has_changed().unwrap());

        store.dispatch(Action::Touch);
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);
    }

    #[test]
    fn dispatch_with_sees_the_latest_base() {
        let store = store();
        let write = store.speculate(Mutation::CreateProposal(draft()));
        store.settle(write, Settlement::Confirmed);

        let version = store.dispatch_with(|state| Action::ReplaceAll(state.base().to_vec()));
        assert_eq!(version, store.version());
        assert_eq!(store.proposals().len(), 1);
    }

    #[test]
    fn write_ids_are_unique_and_settle_rolls_back() {
        let store = store();
        let a = store.speculate(Mutation::CreateProposal(draft()));
        let b = store.speculate(Mutation::CreateProposal(draft()));
        assert_ne!(a, b);
        assert_eq!(store.proposals().len(), 2);
        assert!(store.base().is_empty());

        store.settle(a, Settlement::Failed);
        store.settle(b, Settlement::Confirmed);
        let proposals = store.proposals();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].id, ProposalId(2));
        assert_eq!(store.base(), proposals);
        assert!(store.snapshot().pending().is_empty());
    }
}
