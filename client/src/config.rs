//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use symposium_chain::{ChainError, ChainGuard, JsonRpcClient, SymposiumContract};
use symposium_types::{Address, ChainId, TxHash};
use symposium_utils::LogFormat;

use crate::ClientError;

/// Configuration for a Symposium client session.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Ethereum JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain the session must be connected to.
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,

    /// Contract address; the registry entry for `chain_id` when unset.
    #[serde(default)]
    pub contract_address: Option<Address>,

    /// Node-managed account transactions are sent from. Reads work without it.
    #[serde(default)]
    pub sender: Option<Address>,

    /// Block explorer base URL for transaction links.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// Event filter poll interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Window in which refresh signals are coalesced into one chain read.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run offline against sample data with simulated drift.
    #[serde(default)]
    pub simulate: bool,

    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "https://rpc.blaze.soniclabs.com".to_string()
}

fn default_chain_id() -> ChainId {
    ChainId::SONIC_BLAZE
}

fn default_explorer_url() -> String {
    "https://testnet.sonicscan.org".to_string()
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_secs() -> u64 {
    5
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, ClientError> {
        self.log_format.parse().map_err(ClientError::Config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn guard(&self) -> ChainGuard {
        ChainGuard::new(self.chain_id)
    }

    /// Configured contract address, else the known deployment on `chain_id`.
    pub fn contract(&self) -> Result<Address, ChainError> {
        match self.contract_address {
            Some(addr) => Ok(addr),
            None => self.guard().contract(),
        }
    }

    /// Build the JSON-RPC contract adapter this configuration describes.
    pub fn connect(&self) -> Result<SymposiumContract, ClientError> {
        let rpc = JsonRpcClient::new(self.rpc_url.clone(), self.request_timeout())?;
        Ok(SymposiumContract::new(rpc, self.contract()?, self.sender)
            .with_receipt_poll_interval(self.receipt_poll_interval()))
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{hash}", self.explorer_url.trim_end_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
            contract_address: None,
            sender: None,
            explorer_url: default_explorer_url(),
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            simulate: false,
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ClientConfig {
            sender: Some(Address::new([7; 20])),
            ..ClientConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_url, config.rpc_url);
        assert_eq!(parsed.chain_id, config.chain_id);
        assert_eq!(parsed.sender, config.sender);
        assert_eq!(parsed.contract_address, None);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.chain_id, ChainId::SONIC_BLAZE);
        assert_eq!(config.poll_interval(), Duration::from_secs(4));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
        assert!(!config.simulate);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            chain_id = 1
            contract_address = "0x00000000000000000000000000000000000000aa"
            debounce_ms = 50
            log_format = "json"
        "#;
        let config = ClientConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.chain_id, ChainId(1));
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.contract().unwrap().as_bytes()[19], 0xaa);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn contract_falls_back_to_registry() {
        let config = ClientConfig::default();
        assert!(config.contract().is_ok());

        let elsewhere = ClientConfig {
            chain_id: ChainId(1),
            ..ClientConfig::default()
        };
        assert!(matches!(
            elsewhere.contract(),
            Err(ChainError::ContractUnavailable { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_url = \"http://127.0.0.1:8545\"").unwrap();
        writeln!(file, "simulate = true").unwrap();
        let config = ClientConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert!(config.simulate);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ClientConfig::from_toml_file("/nonexistent/symposium.toml");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn tx_links_point_at_the_explorer() {
        let config = ClientConfig::default();
        let url = config.tx_url(&TxHash::ZERO);
        assert!(url.starts_with("https://testnet.sonicscan.org/tx/0x0000"));
    }
}
