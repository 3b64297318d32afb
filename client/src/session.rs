//! One connected (or offline) client session.
//!
//! A [`Session`] owns the store for its lifetime and every background task
//! it starts. Construct with [`Session::init`] or [`Session::offline`],
//! tear down with [`Session::dispose`].

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use symposium_chain::{ChainClient, ChainError, PendingTransaction};
use symposium_store::simulate::sample_proposals;
use symposium_store::{Action, Mutation, Settlement, Store};
use symposium_types::{
    Clock, OpinionDraft, OpinionId, Proposal, ProposalDraft, ProposalId, ProposalPatch, TxHash,
};

use crate::bridge::EventBridge;
use crate::config::ClientConfig;
use crate::loader::Refresher;
use crate::shutdown::ShutdownController;
use crate::simulator::Simulator;
use crate::writes::WriteTracker;
use crate::ClientError;

pub struct Session {
    config: ClientConfig,
    store: Arc<Store>,
    chain: Option<Arc<dyn ChainClient>>,
    shutdown: ShutdownController,
    bridge: Mutex<Option<EventBridge>>,
    simulator: Mutex<Option<Simulator>>,
}

impl Session {
    /// Connect to `chain`, check the network and the deployment, and load
    /// the proposals.
    pub async fn init(
        config: ClientConfig,
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let connected = chain.chain_id().await?;
        config.guard().check(connected)?;
        if !chain.has_contract().await? {
            return Err(ChainError::ContractUnavailable {
                chain_id: connected,
            }
            .into());
        }

        let session = Self {
            store: Arc::new(Store::new(clock)),
            chain: Some(chain),
            shutdown: ShutdownController::new(),
            bridge: Mutex::new(None),
            simulator: Mutex::new(None),
            config,
        };
        session.refresh().await?;
        info!(
            chain = %connected,
            proposals = session.store.proposals().len(),
            "session ready"
        );
        Ok(session)
    }

    /// A session over sample data with no chain behind it.
    pub fn offline(config: ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let proposals = sample_proposals(clock.now());
        info!(proposals = proposals.len(), "offline session ready");
        Self {
            store: Arc::new(Store::with_proposals(clock, proposals)),
            chain: None,
            shutdown: ShutdownController::new(),
            bridge: Mutex::new(None),
            simulator: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    pub fn is_offline(&self) -> bool {
        self.chain.is_none()
    }

    fn chain(&self) -> Result<&Arc<dyn ChainClient>, ClientError> {
        self.chain.as_ref().ok_or(ClientError::Offline)
    }

    fn require(&self, id: ProposalId) -> Result<Proposal, ClientError> {
        self.store
            .proposal(id)
            .ok_or(ClientError::ProposalNotFound(id))
    }

    /// Full re-read from the chain. Returns the resulting store version.
    pub async fn refresh(&self) -> Result<u64, ClientError> {
        let chain = self.chain()?;
        Ok(Refresher::new(chain.clone(), self.store.clone())
            .refresh()
            .await?)
    }

    /// Subscribe to contract events. A no-op if already running.
    pub async fn start_event_bridge(&self) -> Result<(), ClientError> {
        let chain = self.chain()?;
        let mut bridge = self.bridge.lock().await;
        if bridge.is_none() {
            *bridge = Some(
                EventBridge::start(chain.clone(), self.store.clone(), &self.config, &self.shutdown)
                    .await?,
            );
        }
        Ok(())
    }

    pub async fn stop_event_bridge(&self) {
        if let Some(bridge) = self.bridge.lock().await.take() {
            bridge.stop().await;
        }
    }

    /// Start periodic drift. A no-op if already running.
    pub async fn start_simulation(&self) {
        let mut simulator = self.simulator.lock().await;
        if simulator.is_none() {
            *simulator = Some(Simulator::start(
                self.store.clone(),
                self.config.tick_interval(),
                &self.shutdown,
            ));
        }
    }

    /// Stop every background task.
    pub async fn dispose(self) {
        self.shutdown.shutdown();
        if let Some(bridge) = self.bridge.lock().await.take() {
            bridge.stop().await;
        }
        if let Some(simulator) = self.simulator.lock().await.take() {
            simulator.stop().await;
        }
        info!("session disposed");
    }

    // ── Writes ─────────────────────────────────────────────────────────

    pub async fn create_proposal(
        &self,
        draft: ProposalDraft,
        tracker: &WriteTracker,
    ) -> Result<TxHash, ClientError> {
        let chain = self.chain()?;
        let submit = chain.create_proposal(&draft.title, &draft.description, draft.duration.secs());
        let hash = self
            .run_write(
                chain.as_ref(),
                tracker,
                Some(Mutation::CreateProposal(draft.clone())),
                submit,
            )
            .await?;
        // The chain assigns the real id; pick it up.
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after create failed");
        }
        Ok(hash)
    }

    pub async fn add_opinion(
        &self,
        proposal: ProposalId,
        draft: OpinionDraft,
        tracker: &WriteTracker,
    ) -> Result<TxHash, ClientError> {
        let chain = self.chain()?;
        self.require(proposal)?;
        let cost = chain.vote_cost().await?;
        let submit = chain.create_opinion(proposal, draft.stance, &draft.content, cost);
        let mutation = Mutation::AddOpinion {
            proposal,
            draft: draft.clone(),
            stake: cost,
        };
        self.run_write(chain.as_ref(), tracker, Some(mutation), submit)
            .await
    }

    pub async fn vote_for_opinion(
        &self,
        proposal: ProposalId,
        opinion: OpinionId,
        tracker: &WriteTracker,
    ) -> Result<TxHash, ClientError> {
        let chain = self.chain()?;
        self.require(proposal)?;
        let cost = chain.vote_cost().await?;
        let submit = chain.vote_for_opinion(proposal, opinion, cost);
        self.run_write(
            chain.as_ref(),
            tracker,
            Some(Mutation::vote(proposal, opinion, cost)),
            submit,
        )
        .await
    }

    /// Finalize, then re-read the proposal for the winning side.
    pub async fn finalize_proposal(
        &self,
        proposal: ProposalId,
        tracker: &WriteTracker,
    ) -> Result<TxHash, ClientError> {
        let chain = self.chain()?;
        self.require(proposal)?;
        let speculative = Mutation::UpdateProposal(ProposalPatch::new(proposal).finalized(true));
        let submit = chain.finalize_proposal(proposal);
        let hash = self
            .run_write(chain.as_ref(), tracker, Some(speculative), submit)
            .await?;

        match chain.proposal(proposal).await {
            Ok(read) => {
                let patch = ProposalPatch::new(proposal)
                    .finalized(read.finalized)
                    .winning_side_is_yes(read.yes_wins)
                    .claimable(read.finalized);
                self.store.dispatch(Action::update_proposal(patch));
            }
            Err(e) => warn!(proposal = %proposal, error = %e, "failed to read finalized proposal"),
        }
        Ok(hash)
    }

    /// Claim is not applied speculatively; claimability clears on success.
    pub async fn claim_reward(
        &self,
        proposal: ProposalId,
        tracker: &WriteTracker,
    ) -> Result<TxHash, ClientError> {
        let chain = self.chain()?;
        self.require(proposal)?;
        let submit = chain.claim_reward(proposal);
        let hash = self.run_write(chain.as_ref(), tracker, None, submit).await?;
        self.store.dispatch(Action::update_proposal(
            ProposalPatch::new(proposal).claimable(false),
        ));
        Ok(hash)
    }

    /// Drive `tracker` through one write. `speculative` is applied before
    /// `submit` is polled and settled by the outcome.
    async fn run_write(
        &self,
        chain: &dyn ChainClient,
        tracker: &WriteTracker,
        speculative: Option<Mutation>,
        submit: impl Future<Output = Result<PendingTransaction, ChainError>>,
    ) -> Result<TxHash, ClientError> {
        tracker.begin()?;
        let kind = speculative.as_ref().map_or("claim_reward", Mutation::kind);
        let write = speculative.map(|m| self.store.speculate(m));

        let outcome = async {
            let tx = submit.await?;
            tracker.confirming(tx.hash);
            tx.confirm(chain).await?;
            Ok::<_, ChainError>(tx.hash)
        }
        .await;

        match outcome {
            Ok(hash) => {
                if let Some(write) = write {
                    self.store.settle(write, Settlement::Confirmed);
                }
                tracker.succeed(hash);
                info!(kind, tx = %hash, "write confirmed");
                Ok(hash)
            }
            Err(e) => {
                if let Some(write) = write {
                    self.store.settle(write, Settlement::Failed);
                }
                self.store.dispatch(Action::SetError(Some(e.to_string())));
                tracker.fail(e.to_string());
                warn!(kind, error = %e, "write failed");
                Err(e.into())
            }
        }
    }
}
