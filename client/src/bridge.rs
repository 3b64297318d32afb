//! Contract events to store refreshes.
//!
//! A poll task drains the contract's log filter. Any event bumps the store
//! version (`Touch`) and raises a refresh signal; a second task coalesces
//! signals that arrive within the debounce window into one full re-read.
//! Event payloads are not used.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use symposium_chain::{ChainClient, ChainError, FilterId};
use symposium_store::{Action, Store};

use crate::config::ClientConfig;
use crate::loader::Refresher;
use crate::shutdown::ShutdownController;

/// Running event subscription. Dropping it without [`stop`](Self::stop)
/// leaves the tasks running until the session shuts down.
pub struct EventBridge {
    chain: Arc<dyn ChainClient>,
    filter: FilterId,
    stop: ShutdownController,
    poll_handle: JoinHandle<()>,
    refresh_handle: JoinHandle<()>,
}

impl EventBridge {
    /// Install the log filter and spawn the poll and refresh tasks.
    pub async fn start(
        chain: Arc<dyn ChainClient>,
        store: Arc<Store>,
        config: &ClientConfig,
        shutdown: &ShutdownController,
    ) -> Result<Self, ChainError> {
        let filter = chain.install_event_filter().await?;
        info!(filter = %filter.0, "event filter installed");

        let stop = ShutdownController::new();
        let (signal_tx, signal_rx) = mpsc::channel::<()>(1);
        let refresher = Refresher::new(chain.clone(), store.clone());

        let poll_handle = spawn_poll(
            chain.clone(),
            filter.clone(),
            store,
            signal_tx,
            config.poll_interval(),
            shutdown,
            &stop,
        );
        let refresh_handle =
            spawn_refresh(refresher, signal_rx, config.debounce(), shutdown, &stop);

        Ok(Self {
            chain,
            filter,
            stop,
            poll_handle,
            refresh_handle,
        })
    }

    /// Stop both tasks and uninstall the filter.
    pub async fn stop(self) {
        self.stop.shutdown();
        let _ = self.poll_handle.await;
        let _ = self.refresh_handle.await;
        if let Err(e) = self.chain.uninstall_event_filter(&self.filter).await {
            warn!(error = %e, "failed to uninstall event filter");
        }
        info!("event bridge stopped");
    }
}

fn spawn_poll(
    chain: Arc<dyn ChainClient>,
    filter: FilterId,
    store: Arc<Store>,
    signal_tx: mpsc::Sender<()>,
    interval: Duration,
    shutdown: &ShutdownController,
    stop: &ShutdownController,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();
    let mut stop_rx = stop.subscribe();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = stop_rx.recv() => break,
                _ = ticker.tick() => {
                    match chain.poll_events(&filter).await {
                        Ok(events) if events.is_empty() => {}
                        Ok(events) => {
                            for event in &events {
                                debug!(kind = %event.kind, block = event.block_number, "contract event");
                            }
                            store.dispatch(Action::Touch);
                            // Full channel means a refresh is already queued.
                            let _ = signal_tx.try_send(());
                        }
                        Err(e) => warn!(error = %e, "event poll failed"),
                    }
                }
            }
        }
        debug!("event poll task shutting down");
    })
}

fn spawn_refresh(
    refresher: Refresher,
    mut signal_rx: mpsc::Receiver<()>,
    debounce: Duration,
    shutdown: &ShutdownController,
    stop: &ShutdownController,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();
    let mut stop_rx = stop.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = stop_rx.recv() => break,
                signal = signal_rx.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.recv() => break,
                        _ = stop_rx.recv() => break,
                        _ = tokio::time::sleep(debounce) => {}
                    }
                    while signal_rx.try_recv().is_ok() {}
                    if let Err(e) = refresher.refresh().await {
                        warn!(error = %e, "event-driven refresh failed");
                    }
                }
            }
        }
        debug!("refresh task shutting down");
    })
}
