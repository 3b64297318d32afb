//! Nullable infrastructure for deterministic testing.
//!
//! The client reaches the outside world through two seams: the [`Clock`]
//! trait and the [`ChainClient`] trait. This crate provides test-friendly
//! implementations of both that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! [`Clock`]: symposium_types::Clock
//! [`ChainClient`]: symposium_chain::ChainClient

pub mod chain;
pub mod clock;

pub use chain::{NullChain, SentCall};
pub use clock::NullClock;
