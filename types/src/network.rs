//! Chain identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EIP-155 chain id of the network the client talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Sonic Blaze testnet, where the Symposium contract is deployed.
    pub const SONIC_BLAZE: Self = Self(57_054);

    /// Human-readable name for known chains.
    pub fn name(&self) -> &'static str {
        match self.0 {
            57_054 => "Sonic Blaze Testnet",
            11_155_111 => "Sepolia",
            1 => "Ethereum",
            _ => "unknown",
        }
    }

    /// Ticker of the chain's native currency.
    pub fn currency_symbol(&self) -> &'static str {
        match self.0 {
            57_054 => "S",
            _ => "ETH",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
