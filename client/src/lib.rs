//! Symposium client session.
//!
//! Ties the store to a chain: configuration, full loads, tracked optimistic
//! writes, event-driven refresh and the offline simulator.

pub mod bridge;
pub mod config;
pub mod error;
pub mod loader;
pub mod session;
pub mod shutdown;
pub mod simulator;
pub mod writes;

pub use bridge::EventBridge;
pub use config::ClientConfig;
pub use error::ClientError;
pub use loader::{load_proposals, merge_all, read_proposals, Refresher};
pub use session::Session;
pub use shutdown::ShutdownController;
pub use simulator::Simulator;
pub use writes::{TxStatus, WriteTracker};
