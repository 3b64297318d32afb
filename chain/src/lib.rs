//! Chain boundary for the Symposium client.
//!
//! Everything loosely typed stays in here: JSON-RPC values, ABI words and
//! raw logs are validated and turned into [`ChainProposal`]s and
//! [`ContractEvent`]s before the rest of the workspace sees them.

pub mod abi;
pub mod client;
pub mod contract;
pub mod error;
pub mod events;
pub mod registry;
pub mod rpc;

pub use client::{ChainClient, ChainProposal, FilterId, PendingTransaction, Receipt};
pub use contract::SymposiumContract;
pub use error::ChainError;
pub use events::{ContractEvent, ContractEventKind};
pub use registry::{contract_address, ChainGuard};
pub use rpc::JsonRpcClient;
