//! Known Symposium deployments and the wrong-network check.

use symposium_types::{Address, ChainId};

use crate::error::ChainError;

const DEPLOYMENTS: &[(ChainId, &str)] = &[(
    ChainId::SONIC_BLAZE,
    "0x27B23C2Fc9B9a5f7e9E4dA455B7e85A000F807D0",
)];

/// Contract address deployed on `chain_id`, if any.
pub fn contract_address(chain_id: ChainId) -> Option<Address> {
    DEPLOYMENTS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .and_then(|(_, addr)| addr.parse().ok())
}

/// Guards every chain interaction against running on the wrong network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainGuard {
    pub required: ChainId,
}

impl ChainGuard {
    pub fn new(required: ChainId) -> Self {
        Self { required }
    }

    pub fn check(&self, connected: ChainId) -> Result<(), ChainError> {
        if connected == self.required {
            Ok(())
        } else {
            Err(ChainError::NetworkMismatch {
                expected: self.required,
                actual: connected,
            })
        }
    }

    /// The contract address for the required chain, or `ContractUnavailable`.
    pub fn contract(&self) -> Result<Address, ChainError> {
        contract_address(self.required).ok_or(ChainError::ContractUnavailable {
            chain_id: self.required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonic_blaze_has_a_deployment() {
        let addr = contract_address(ChainId::SONIC_BLAZE).unwrap();
        assert_eq!(
            addr.to_string(),
            "0x27b23c2fc9b9a5f7e9e4da455b7e85a000f807d0"
        );
        assert!(contract_address(ChainId(1)).is_none());
    }

    #[test]
    fn guard_flags_wrong_network() {
        let guard = ChainGuard::new(ChainId::SONIC_BLAZE);
        assert!(guard.check(ChainId::SONIC_BLAZE).is_ok());
        assert!(matches!(
            guard.check(ChainId(1)),
            Err(ChainError::NetworkMismatch { expected, actual })
                if expected == ChainId::SONIC_BLAZE && actual == ChainId(1)
        ));
    }

    #[test]
    fn guard_without_deployment_is_unavailable() {
        let guard = ChainGuard::new(ChainId(11_155_111));
        assert!(matches!(
            guard.contract(),
            Err(ChainError::ContractUnavailable { .. })
        ));
    }
}
