//! Fundamental types for the Symposium client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! proposals and opinions, native-currency amounts, timestamps, chain ids,
//! addresses, transaction hashes and the contract's fixed constants.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod proposal;
pub mod time;

pub use address::Address;
pub use amount::Wei;
pub use error::TypesError;
pub use hash::TxHash;
pub use network::ChainId;
pub use params::{DurationOption, JUST_NOW, VOTE_COST};
pub use proposal::{
    Opinion, OpinionDraft, OpinionId, Proposal, ProposalDraft, ProposalId, ProposalPatch, Stance,
};
pub use time::{Clock, SystemClock, Timestamp};

/// Decode a `0x`-prefixed hex string. An empty body (`"0x"`) decodes to no bytes.
pub fn decode_hex_prefixed(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(hex::FromHexError::InvalidStringLength)?;
    hex::decode(body)
}
