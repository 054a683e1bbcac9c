//! Reconciliation of a node home's config.toml and app.toml.
//!
//! Two paths exist. The full path runs right after `init` and rewrites
//! peers, backend, listen addresses, state sync and gas price, in that order.
//! The backend-only path runs against an already initialized home and only
//! touches `db_backend`, so reruns are cheap and leave everything else alone.

use crate::backend::Backend;
use crate::document::{ConfigDocument, NodeConfigFiles};
use crate::error::{ConfigError, ConfigResult};
use crate::home::NodeHome;
use crate::port::shift_port;
use crate::settings::BootstrapSettings;
use nodeboot_rpc_client::{StatusClient, TrustAnchor, TrustAnchorResolver};
use tracing::{debug, info, warn};

/// Listen addresses in config.toml moved by the port offset.
pub const CONFIG_LISTEN_ADDRESSES: [&str; 3] = ["rpc.laddr", "rpc.pprof_laddr", "p2p.laddr"];

/// Listen addresses in app.toml with the values the SDK writes by default.
pub const APP_LISTEN_ADDRESSES: [(&str, &str); 3] = [
    ("api.address", "tcp://0.0.0.0:1317"),
    ("grpc.address", "0.0.0.0:9090"),
    ("grpc-web.address", "0.0.0.0:9091"),
];

/// Operator's state-sync choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSyncRequest {
    /// Sync from genesis.
    Disabled,
    /// Bootstrap from a trust anchor found on one of `rpc_servers`.
    Enabled {
        /// Candidate endpoints, tried in order.
        rpc_servers: Vec<String>,
    },
}

/// Inputs of the full reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    /// Storage backend to record.
    pub backend: Backend,
    /// Added to every listen port when positive.
    pub port_offset: i64,
    /// State-sync choice.
    pub state_sync: StateSyncRequest,
}

/// State-sync configuration that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSyncOutcome {
    /// Not requested; disabled.
    Disabled,
    /// Enabled with this anchor.
    Enabled(TrustAnchor),
    /// Requested, but no endpoint produced an anchor; disabled.
    AnchorNotFound,
}

impl StateSyncOutcome {
    /// Whether the written config has `statesync.enable = true`.
    pub fn is_enabled(&self) -> bool {
        matches!(self, StateSyncOutcome::Enabled(_))
    }
}

/// One listen address moved by the port offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedAddress {
    /// Dotted key.
    pub key: String,
    /// Value before shifting.
    pub from: String,
    /// Value written.
    pub to: String,
}

/// Summary of a full reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// State-sync outcome.
    pub state_sync: StateSyncOutcome,
    /// Addresses that were shifted, config.toml first.
    pub shifted: Vec<ShiftedAddress>,
}

/// Owns the read-modify-write of a home's configuration for one run.
pub struct ConfigReconciler<'a, C> {
    settings: &'a BootstrapSettings,
    resolver: &'a TrustAnchorResolver<C>,
}

impl<'a, C: StatusClient> ConfigReconciler<'a, C> {
    /// Creates a reconciler.
    pub fn new(settings: &'a BootstrapSettings, resolver: &'a TrustAnchorResolver<C>) -> Self {
        Self { settings, resolver }
    }

    /// Full reconciliation of a freshly initialized home.
    pub async fn reconcile_full(
        &self,
        home: &NodeHome,
        request: &ReconcileRequest,
    ) -> ConfigResult<ReconcileReport> {
        info!(target: "nodeboot", path = %home.config_file().display(), "configuring config.toml");
        let mut files = NodeConfigFiles::load(home)?;

        self.apply_peers(&mut files.config)?;
        files.config.set("db_backend", request.backend.as_str())?;

        let shifted = if request.port_offset > 0 {
            info!(target: "nodeboot", offset = request.port_offset, "applying port offset");
            apply_port_offset(&mut files, request.port_offset)?
        } else {
            Vec::new()
        };

        let state_sync = self
            .apply_state_sync(&mut files.config, &request.state_sync)
            .await?;

        info!(
            target: "nodeboot",
            minimum_gas_prices = %self.settings.minimum_gas_prices,
            "configuring app.toml"
        );
        files
            .app
            .set("minimum-gas-prices", self.settings.minimum_gas_prices.as_str())?;

        files.save()?;
        info!(target: "nodeboot", "configuration complete");

        Ok(ReconcileReport {
            state_sync,
            shifted,
        })
    }

    /// Records `backend` in an existing config.toml. Returns whether the file
    /// was rewritten.
    pub fn reconcile_backend(&self, home: &NodeHome, backend: Backend) -> ConfigResult<bool> {
        let mut config = ConfigDocument::load(home.config_file())?;
        if config.get_str("db_backend")? == Some(backend.as_str()) {
            debug!(target: "nodeboot", backend = %backend, "config.toml already uses requested backend");
            return Ok(false);
        }

        config.set("db_backend", backend.as_str())?;
        config.save()?;
        info!(target: "nodeboot", backend = %backend, "updated config.toml to use backend");
        Ok(true)
    }

    fn apply_peers(&self, config: &mut ConfigDocument) -> ConfigResult<()> {
        let seeds = self.settings.seeds.join(",");
        config.set("p2p.seeds", seeds.as_str())?;
        // seeds and persistent peers are alternative discovery modes
        if !seeds.is_empty() {
            config.set("p2p.persistent_peers", "")?;
        }
        Ok(())
    }

    async fn apply_state_sync(
        &self,
        config: &mut ConfigDocument,
        request: &StateSyncRequest,
    ) -> ConfigResult<StateSyncOutcome> {
        let rpc_servers = match request {
            StateSyncRequest::Disabled => {
                config.set("statesync.enable", false)?;
                config.set("statesync.rpc_servers", "")?;
                return Ok(StateSyncOutcome::Disabled);
            }
            StateSyncRequest::Enabled { rpc_servers } => rpc_servers,
        };

        info!(target: "nodeboot", "fetching trust height and hash for state sync");
        let Some(anchor) = self.resolver.resolve(rpc_servers).await else {
            warn!(target: "nodeboot", "could not enable state sync due to missing trust settings");
            config.set("statesync.enable", false)?;
            return Ok(StateSyncOutcome::AnchorNotFound);
        };

        let trust_height =
            i64::try_from(anchor.height()).map_err(|err| ConfigError::InvalidValue {
                key: "statesync.trust_height".to_string(),
                message: err.to_string(),
            })?;

        config.set("statesync.enable", true)?;
        config.set("statesync.rpc_servers", rpc_servers.join(","))?;
        config.set("statesync.trust_height", trust_height)?;
        config.set("statesync.trust_hash", anchor.hash())?;
        config.set("statesync.trust_period", self.settings.trust_period.as_str())?;
        info!(
            target: "nodeboot",
            trust_height = anchor.height(),
            trust_hash = anchor.hash(),
            "state sync enabled"
        );

        Ok(StateSyncOutcome::Enabled(anchor))
    }
}

fn apply_port_offset(files: &mut NodeConfigFiles, offset: i64) -> ConfigResult<Vec<ShiftedAddress>> {
    let mut shifted = Vec::new();

    for key in CONFIG_LISTEN_ADDRESSES {
        match shift_key(&mut files.config, key, offset, None)? {
            Some(address) => shifted.push(address),
            None => warn!(target: "nodeboot", key, "listen address missing from config.toml"),
        }
    }

    for (key, default) in APP_LISTEN_ADDRESSES {
        let section = key.split('.').next().unwrap_or(key);
        if !files.app.has_section(section) {
            debug!(target: "nodeboot", section, "app.toml section absent; not shifting");
            continue;
        }
        shifted.extend(shift_key(&mut files.app, key, offset, Some(default))?);
    }

    Ok(shifted)
}

fn shift_key(
    document: &mut ConfigDocument,
    key: &str,
    offset: i64,
    fallback: Option<&str>,
) -> ConfigResult<Option<ShiftedAddress>> {
    let Some(from) = document.get_str(key)?.or(fallback).map(str::to_string) else {
        return Ok(None);
    };
    let to = shift_port(&from, offset);
    document.set(key, to.as_str())?;
    debug!(target: "nodeboot", key, from = %from, to = %to, "shifted listen address");
    Ok(Some(ShiftedAddress {
        key: key.to_string(),
        from,
        to,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nodeboot_rpc_client::{RpcError, RpcResult};
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::TempDir;
    use toml::Value;

    const CONFIG_TOML: &str = include_str!("../tests/fixtures/config.toml");
    const APP_TOML: &str = include_str!("../tests/fixtures/app.toml");
    const HASH: &str = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";

    #[derive(Default)]
    struct FixedTips {
        tips: HashMap<String, u64>,
    }

    impl FixedTips {
        fn with(mut self, endpoint: &str, height: u64) -> Self {
            self.tips.insert(endpoint.to_string(), height);
            self
        }
    }

    #[async_trait]
    impl StatusClient for FixedTips {
        async fn latest_height(&self, endpoint: &str) -> RpcResult<u64> {
            self.tips
                .get(endpoint)
                .copied()
                .ok_or_else(|| RpcError::request_failed("unreachable"))
        }

        async fn block_hash(&self, _endpoint: &str, _height: u64) -> RpcResult<String> {
            Ok(HASH.to_string())
        }
    }

    fn initialized_home(tmp: &TempDir) -> NodeHome {
        let home = NodeHome::new(tmp.path().join("node"));
        std::fs::create_dir_all(home.config_dir()).unwrap();
        std::fs::write(home.config_file(), CONFIG_TOML).unwrap();
        std::fs::write(home.app_file(), APP_TOML).unwrap();
        home
    }

    fn resolver(tips: FixedTips) -> TrustAnchorResolver<FixedTips> {
        TrustAnchorResolver::new(tips, BootstrapSettings::default().trust_safety_margin())
    }

    fn request(backend: Backend, port_offset: i64, state_sync: StateSyncRequest) -> ReconcileRequest {
        ReconcileRequest {
            backend,
            port_offset,
            state_sync,
        }
    }

    fn value(path: &Path, key: &str) -> Option<Value> {
        ConfigDocument::load(path).unwrap().get(key).cloned()
    }

    fn string(path: &Path, key: &str) -> String {
        value(path, key)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn full_path_applies_every_step() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        let report = reconciler
            .reconcile_full(
                &home,
                &request(Backend::MemDb, 1000, StateSyncRequest::Disabled),
            )
            .await
            .expect("reconcile");

        let config = home.config_file();
        let app = home.app_file();
        assert_eq!(string(&config, "p2p.seeds"), settings.seeds.join(","));
        assert_eq!(string(&config, "p2p.persistent_peers"), "");
        assert_eq!(string(&config, "db_backend"), "memdb");
        assert_eq!(string(&config, "rpc.laddr"), "tcp://127.0.0.1:27657");
        assert_eq!(string(&config, "rpc.pprof_laddr"), "localhost:7060");
        assert_eq!(string(&config, "p2p.laddr"), "tcp://0.0.0.0:27656");
        assert_eq!(value(&config, "statesync.enable"), Some(Value::Boolean(false)));
        assert_eq!(string(&config, "statesync.rpc_servers"), "");
        assert_eq!(string(&app, "api.address"), "tcp://0.0.0.0:2317");
        assert_eq!(string(&app, "grpc.address"), "0.0.0.0:10090");
        assert_eq!(string(&app, "grpc-web.address"), "0.0.0.0:10091");
        assert_eq!(string(&app, "minimum-gas-prices"), "0.005stake");

        assert_eq!(report.state_sync, StateSyncOutcome::Disabled);
        assert_eq!(report.shifted.len(), 6);
        assert_eq!(string(&config, "proxy_app"), "tcp://127.0.0.1:26658");
    }

    #[tokio::test]
    async fn zero_offset_leaves_addresses() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        let report = reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, 0, StateSyncRequest::Disabled),
            )
            .await
            .unwrap();

        assert!(report.shifted.is_empty());
        assert_eq!(string(&home.config_file(), "p2p.laddr"), "tcp://0.0.0.0:26656");
        assert_eq!(string(&home.app_file(), "grpc.address"), "0.0.0.0:9090");
    }

    #[tokio::test]
    async fn negative_offset_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, -5, StateSyncRequest::Disabled),
            )
            .await
            .unwrap();

        assert_eq!(string(&home.config_file(), "rpc.laddr"), "tcp://127.0.0.1:26657");
    }

    #[tokio::test]
    async fn state_sync_written_from_resolved_anchor() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default().with("https://b", 50_000));
        let reconciler = ConfigReconciler::new(&settings, &resolver);
        let servers = vec!["https://a".to_string(), "https://b".to_string()];

        let report = reconciler
            .reconcile_full(
                &home,
                &request(
                    Backend::PebbleDb,
                    0,
                    StateSyncRequest::Enabled {
                        rpc_servers: servers,
                    },
                ),
            )
            .await
            .unwrap();

        let config = home.config_file();
        assert!(report.state_sync.is_enabled());
        assert_eq!(value(&config, "statesync.enable"), Some(Value::Boolean(true)));
        assert_eq!(value(&config, "statesync.trust_height"), Some(Value::Integer(48_000)));
        assert_eq!(string(&config, "statesync.trust_hash"), HASH);
        assert_eq!(string(&config, "statesync.trust_period"), "168h");
        assert_eq!(string(&config, "statesync.rpc_servers"), "https://a,https://b");
    }

    #[tokio::test]
    async fn missing_anchor_disables_state_sync() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let mut doc = ConfigDocument::load(home.config_file()).unwrap();
        doc.set("statesync.enable", true).unwrap();
        doc.save().unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default().with("https://young", 1_500));
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        let report = reconciler
            .reconcile_full(
                &home,
                &request(
                    Backend::GoLevelDb,
                    0,
                    StateSyncRequest::Enabled {
                        rpc_servers: vec!["https://young".to_string()],
                    },
                ),
            )
            .await
            .unwrap();

        assert_eq!(report.state_sync, StateSyncOutcome::AnchorNotFound);
        assert!(!report.state_sync.is_enabled());
        assert_eq!(
            value(&home.config_file(), "statesync.enable"),
            Some(Value::Boolean(false))
        );
    }

    #[tokio::test]
    async fn empty_seed_list_keeps_persistent_peers() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let mut settings = BootstrapSettings::default();
        settings.seeds.clear();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, 0, StateSyncRequest::Disabled),
            )
            .await
            .unwrap();

        let config = home.config_file();
        assert_eq!(string(&config, "p2p.seeds"), "");
        assert!(string(&config, "p2p.persistent_peers").ends_with("@10.0.0.5:26656"));
    }

    #[tokio::test]
    async fn app_sections_are_optional_and_keys_default() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        std::fs::write(
            home.app_file(),
            "minimum-gas-prices = \"\"\n\n[api]\nenable = true\n",
        )
        .unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, 1000, StateSyncRequest::Disabled),
            )
            .await
            .unwrap();

        let app = home.app_file();
        assert_eq!(string(&app, "api.address"), "tcp://0.0.0.0:2317");
        assert!(value(&app, "grpc").is_none());
        assert!(value(&app, "grpc-web").is_none());
    }

    #[tokio::test]
    async fn unreadable_config_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        std::fs::write(home.config_file(), "[p2p\n").unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        let err = reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, 0, StateSyncRequest::Disabled),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        std::fs::remove_file(home.app_file()).unwrap();
        std::fs::write(home.config_file(), CONFIG_TOML).unwrap();
        let err = reconciler
            .reconcile_full(
                &home,
                &request(Backend::GoLevelDb, 0, StateSyncRequest::Disabled),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[tokio::test]
    async fn failed_app_write_keeps_config_unchanged() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        std::fs::create_dir(home.config_dir().join("app.toml.tmp")).unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        let err = reconciler
            .reconcile_full(
                &home,
                &request(Backend::MemDb, 1000, StateSyncRequest::Disabled),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(
            std::fs::read_to_string(home.config_file()).unwrap(),
            CONFIG_TOML
        );
        assert_eq!(std::fs::read_to_string(home.app_file()).unwrap(), APP_TOML);
    }

    #[test]
    fn backend_only_path_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        assert!(reconciler.reconcile_backend(&home, Backend::PebbleDb).unwrap());
        let after_first = std::fs::read(home.config_file()).unwrap();

        assert!(!reconciler.reconcile_backend(&home, Backend::PebbleDb).unwrap());
        let after_second = std::fs::read(home.config_file()).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn backend_only_path_touches_only_db_backend() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        let before = ConfigDocument::load(home.config_file()).unwrap();
        let app_before = std::fs::read(home.app_file()).unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);
        reconciler.reconcile_backend(&home, Backend::MemDb).unwrap();

        let after = ConfigDocument::load(home.config_file()).unwrap();
        for (key, old) in before.table() {
            if key == "db_backend" {
                continue;
            }
            assert_eq!(after.table().get(key), Some(old), "key {key} changed");
        }
        assert_eq!(after.get_str("db_backend").unwrap(), Some("memdb"));
        assert_eq!(std::fs::read(home.app_file()).unwrap(), app_before);
    }

    #[test]
    fn backend_only_path_adds_missing_key() {
        let tmp = TempDir::new().unwrap();
        let home = initialized_home(&tmp);
        std::fs::write(home.config_file(), "[p2p]\nseeds = \"\"\n").unwrap();

        let settings = BootstrapSettings::default();
        let resolver = resolver(FixedTips::default());
        let reconciler = ConfigReconciler::new(&settings, &resolver);

        assert!(reconciler.reconcile_backend(&home, Backend::GoMap).unwrap());
        assert_eq!(string(&home.config_file(), "db_backend"), "gomap");
    }
}
