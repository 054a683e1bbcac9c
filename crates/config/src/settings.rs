//! Deployment-wide bootstrap settings.
//!
//! Everything here is fixed for a deployment (chain id, gas price, discovery
//! endpoints) and handed to the reconciler and launcher as one immutable
//! value. An optional TOML file can override the defaults.

use crate::error::{ConfigError, ConfigResult};
use nodeboot_rpc_client::TRUST_SAFETY_MARGIN;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Chain id of the ICS provider testnet.
pub const DEFAULT_CHAIN_ID: &str = "provider";
/// Minimum gas price written to app.toml.
pub const DEFAULT_MIN_GAS_PRICES: &str = "0.005stake";
/// Trusting period written alongside a trust anchor (7 days).
pub const DEFAULT_TRUST_PERIOD: &str = "168h";

/// Provider testnet seed nodes.
pub const DEFAULT_SEEDS: &[&str] = &[
    "08ec17e86dac67b9da70deb20177655495a55407@provider-seed-01.ics-testnet.polypore.xyz:26656",
    "4ea6e56300a2f37b90e58de5ee27d1c9065cf871@provider-seed-02.ics-testnet.polypore.xyz:26656",
];

/// Provider testnet RPC servers that serve state-sync snapshots.
pub const DEFAULT_STATE_SYNC_RPC_SERVERS: &[&str] = &[
    "https://rpc.provider-state-sync-01.ics-testnet.polypore.xyz:443",
    "https://rpc.provider-state-sync-02.ics-testnet.polypore.xyz:443",
];

/// Immutable settings shared by every step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapSettings {
    /// Chain id passed to `init` and `gentx`.
    pub chain_id: String,
    /// `minimum-gas-prices` in app.toml.
    pub minimum_gas_prices: String,
    /// `p2p.seeds` entries.
    pub seeds: Vec<String>,
    /// Default state-sync RPC servers.
    pub state_sync_rpc_servers: Vec<String>,
    /// `statesync.trust_period`.
    pub trust_period: String,
    /// Per-request timeout for status queries and genesis download.
    pub request_timeout_secs: u64,
    /// Pause after stopping running nodes before wiping the home.
    pub clean_grace_secs: u64,
    /// Material for the local single-validator genesis.
    pub genesis: GenesisSettings,
    #[serde(skip)]
    trust_safety_margin: u64,
}

/// Local genesis account and self-delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenesisSettings {
    /// Key name created in the keyring.
    pub key_name: String,
    /// Keyring backend flag value.
    pub keyring_backend: String,
    /// Coins credited to the genesis account.
    pub account_coins: String,
    /// Coins self-delegated in the gentx.
    pub self_delegation: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            minimum_gas_prices: DEFAULT_MIN_GAS_PRICES.to_string(),
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            state_sync_rpc_servers: DEFAULT_STATE_SYNC_RPC_SERVERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trust_period: DEFAULT_TRUST_PERIOD.to_string(),
            request_timeout_secs: 10,
            clean_grace_secs: 3,
            genesis: GenesisSettings::default(),
            trust_safety_margin: TRUST_SAFETY_MARGIN,
        }
    }
}

impl Default for GenesisSettings {
    fn default() -> Self {
        Self {
            key_name: "validator".to_string(),
            keyring_backend: "test".to_string(),
            account_coins: "1000000000stake".to_string(),
            self_delegation: "100000000stake".to_string(),
        }
    }
}

impl BootstrapSettings {
    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
        let settings: Self = toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            source: err,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Blocks between the chain tip and the trust height.
    pub fn trust_safety_margin(&self) -> u64 {
        self.trust_safety_margin
    }

    /// Timeout for outbound HTTP requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pause between stopping nodes and wiping the home.
    pub fn clean_grace(&self) -> Duration {
        Duration::from_secs(self.clean_grace_secs)
    }

    /// Checks fields that would otherwise produce a broken node config.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chain_id.trim().is_empty() {
            return Err(ConfigError::invalid_settings("chain_id cannot be empty"));
        }
        if self.trust_period.trim().is_empty() {
            return Err(ConfigError::invalid_settings("trust_period cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_settings(
                "request_timeout_secs must be positive",
            ));
        }
        if self.seeds.iter().any(|seed| seed.contains(',')) {
            return Err(ConfigError::invalid_settings(
                "seeds must be listed one per entry",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_provider_testnet() {
        let settings = BootstrapSettings::default();
        assert_eq!(settings.chain_id, "provider");
        assert_eq!(settings.minimum_gas_prices, "0.005stake");
        assert_eq!(settings.trust_period, "168h");
        assert_eq!(settings.trust_safety_margin(), 2000);
        assert_eq!(settings.seeds.len(), 2);
        assert_eq!(settings.state_sync_rpc_servers.len(), 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(
            BootstrapSettings::load(None).unwrap(),
            BootstrapSettings::default()
        );
    }

    #[test]
    fn file_overrides_selected_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "chain_id = \"localnet\"\nseeds = []\n\n[genesis]\naccount_coins = \"5stake\""
        )
        .unwrap();

        let settings = BootstrapSettings::load(Some(file.path())).expect("settings");
        assert_eq!(settings.chain_id, "localnet");
        assert!(settings.seeds.is_empty());
        assert_eq!(settings.genesis.account_coins, "5stake");
        assert_eq!(settings.genesis.key_name, "validator");
        assert_eq!(settings.minimum_gas_prices, "0.005stake");
        assert_eq!(settings.trust_safety_margin(), 2000);
    }

    #[test]
    fn safety_margin_is_not_configurable() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "trust_safety_margin = 10").unwrap();

        let err = BootstrapSettings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_empty_chain_id() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "chain_id = \"  \"").unwrap();

        let err = BootstrapSettings::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("chain_id"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = BootstrapSettings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
