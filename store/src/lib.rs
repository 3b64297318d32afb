//! Optimistic proposal/opinion store.
//!
//! [`reduce`] is the pure transition function; [`Store`] owns one [`State`]
//! per session and publishes its version. Speculative writes live in a
//! pending ledger next to the confirmed base, so a failed transaction is
//! subtracted exactly instead of lingering in the read model.

pub mod action;
pub mod pending;
pub mod reducer;
pub mod shares;
pub mod simulate;
pub mod state;
pub mod store;
pub mod views;

pub use action::{Action, Mutation, Settlement, WriteId};
pub use pending::{Change, PendingWrite};
pub use reducer::reduce;
pub use simulate::{OpinionPerturbation, Perturbation};
pub use state::State;
pub use store::Store;
