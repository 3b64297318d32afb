//! Offline drift: periodic `Tick` actions over the session store.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tracing::debug;

use symposium_store::simulate::perturb;
use symposium_store::{Action, Store};

use crate::shutdown::ShutdownController;

pub struct Simulator {
    stop: ShutdownController,
    handle: JoinHandle<()>,
}

impl Simulator {
    pub fn start(store: Arc<Store>, interval: Duration, shutdown: &ShutdownController) -> Self {
        let stop = ShutdownController::new();
        let mut shutdown_rx = shutdown.subscribe();
        let mut stop_rx = stop.subscribe();
        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => {
                        let drift = perturb(&store.proposals(), &mut rng);
                        let version = store.dispatch(Action::Tick(drift));
                        debug!(version, "simulation tick");
                    }
                }
            }
            debug!("simulator shutting down");
        });
        Self { stop, handle }
    }

    pub async fn stop(self) {
        self.stop.shutdown();
        let _ = self.handle.await;
    }
}
