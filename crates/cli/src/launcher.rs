//! Orchestration of one launcher run.
//!
//! The run is strictly sequential: probe backend support, bring the home to
//! the requested state, reconcile configuration, reset data when state sync
//! needs it, then hand over to the node. Every step before the launch is
//! fatal on failure except the capability probe and stopping old processes,
//! which only warn.

use crate::plan::LaunchPlan;
use crate::process::{LaunchOutcome, NodeProcess};
use anyhow::{Context, Result};
use nodeboot_config::{
    Backend, BackendSupport, BootstrapSettings, ConfigReconciler, HomeTransition, NodeHome,
    ReconcileRequest, StateSyncRequest,
};
use nodeboot_rpc_client::{fetch_genesis, StatusClient, TrustAnchorResolver};
use tracing::{info, warn};
use url::Url;

/// Where genesis.json comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisSource {
    /// A single-validator genesis built with the binary's genesis commands.
    Local,
    /// Downloaded after `init`, replacing the generated file.
    Remote(Url),
}

/// Operator choices for one run.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub home: NodeHome,
    pub backend: Backend,
    pub moniker: String,
    pub genesis: GenesisSource,
    pub clean: bool,
    pub state_sync: StateSyncRequest,
    pub port_offset: i64,
    pub disable_fastnode: bool,
    pub halt_height: u64,
}

impl LaunchOptions {
    fn reconcile_request(&self) -> ReconcileRequest {
        ReconcileRequest {
            backend: self.backend,
            port_offset: self.port_offset,
            state_sync: self.state_sync.clone(),
        }
    }

    fn state_sync_requested(&self) -> bool {
        matches!(self.state_sync, StateSyncRequest::Enabled { .. })
    }
}

pub struct NodeLauncher<'a, P, C> {
    process: &'a P,
    settings: &'a BootstrapSettings,
    resolver: &'a TrustAnchorResolver<C>,
    http_client: reqwest::Client,
}

impl<'a, P, C> NodeLauncher<'a, P, C>
where
    P: NodeProcess,
    C: StatusClient,
{
    pub fn new(
        process: &'a P,
        settings: &'a BootstrapSettings,
        resolver: &'a TrustAnchorResolver<C>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            process,
            settings,
            resolver,
            http_client,
        }
    }

    /// Prepares the home and runs the node until it exits or is interrupted.
    pub async fn run(&self, options: &LaunchOptions) -> Result<LaunchOutcome> {
        let plan = self.prepare(options).await?;
        let outcome = self
            .process
            .launch(&plan)
            .await
            .context("node process failed")?;
        Ok(outcome)
    }

    /// Everything up to, but not including, the final `start`.
    pub async fn prepare(&self, options: &LaunchOptions) -> Result<LaunchPlan> {
        let home = &options.home;
        self.check_backend(options.backend).await;

        let transition = home.state().transition(options.clean);
        info!(
            target: "nodeboot",
            home = %home.root().display(),
            transition = ?transition,
            "home state resolved"
        );

        let reconciler = ConfigReconciler::new(self.settings, self.resolver);
        match transition {
            HomeTransition::Initialize | HomeTransition::WipeAndInitialize => {
                if transition.wipes() {
                    self.wipe(home).await?;
                }
                self.initialize(options).await?;
                let report = reconciler
                    .reconcile_full(home, &options.reconcile_request())
                    .await
                    .context("failed to configure node")?;
                info!(
                    target: "nodeboot",
                    shifted = report.shifted.len(),
                    state_sync = report.state_sync.is_enabled(),
                    "node configured"
                );
            }
            HomeTransition::ReconcileBackend => {
                info!(target: "nodeboot", "node already initialized; keeping existing configuration");
                reconciler
                    .reconcile_backend(home, options.backend)
                    .context("failed to update db_backend")?;
            }
        }

        if options.state_sync_requested() && !home.validator_state_file().exists() {
            info!(target: "nodeboot", "resetting node data for state sync");
            self.process
                .run(&[
                    "tendermint".to_string(),
                    "unsafe-reset-all".to_string(),
                    "--home".to_string(),
                    home_arg(home),
                ])
                .await
                .context("failed to reset node data")?;
        }

        if options.halt_height > 0 {
            info!(target: "nodeboot", halt_height = options.halt_height, "node will halt at height");
        }
        if options.disable_fastnode {
            info!(target: "nodeboot", "IAVL fast node disabled");
        }

        Ok(LaunchPlan::new(
            home,
            options.backend,
            options.halt_height,
            options.disable_fastnode,
        ))
    }

    async fn check_backend(&self, backend: Backend) {
        match self.process.backend_support(backend).await {
            BackendSupport::Supported => {
                info!(target: "nodeboot", backend = %backend, "binary supports backend");
            }
            BackendSupport::Unsupported => {
                warn!(
                    target: "nodeboot",
                    backend = %backend,
                    "binary does not list backend in start --help; continuing"
                );
            }
            BackendSupport::Unknown => {
                warn!(
                    target: "nodeboot",
                    backend = %backend,
                    "could not verify backend support; continuing"
                );
            }
        }
    }

    async fn wipe(&self, home: &NodeHome) -> Result<()> {
        if let Err(err) = self.process.stop_running().await {
            warn!(target: "nodeboot", error = %err, "failed to stop running node processes");
        }
        tokio::time::sleep(self.settings.clean_grace()).await;
        home.wipe().context("failed to clean home directory")?;
        Ok(())
    }

    async fn initialize(&self, options: &LaunchOptions) -> Result<()> {
        let home = home_arg(&options.home);
        info!(target: "nodeboot", moniker = %options.moniker, "initializing node");
        self.run_step(&[
            "init",
            &options.moniker,
            "--chain-id",
            &self.settings.chain_id,
            "--home",
            &home,
        ])
        .await?;

        match &options.genesis {
            GenesisSource::Local => self.create_local_genesis(&home).await,
            GenesisSource::Remote(url) => self.download_genesis(&options.home, url).await,
        }
    }

    async fn create_local_genesis(&self, home: &str) -> Result<()> {
        let genesis = &self.settings.genesis;
        let keyring = genesis.keyring_backend.as_str();
        info!(target: "nodeboot", key = %genesis.key_name, "creating local genesis");

        self.run_step(&[
            "keys",
            "add",
            &genesis.key_name,
            "--home",
            home,
            "--keyring-backend",
            keyring,
            "--output",
            "json",
        ])
        .await?;
        self.run_step(&[
            "genesis",
            "add-genesis-account",
            &genesis.key_name,
            &genesis.account_coins,
            "--home",
            home,
            "--keyring-backend",
            keyring,
        ])
        .await?;
        self.run_step(&[
            "genesis",
            "gentx",
            &genesis.key_name,
            &genesis.self_delegation,
            "--chain-id",
            &self.settings.chain_id,
            "--home",
            home,
            "--keyring-backend",
            keyring,
        ])
        .await?;
        self.run_step(&["genesis", "collect-gentxs", "--home", home])
            .await
    }

    async fn download_genesis(&self, home: &NodeHome, url: &Url) -> Result<()> {
        info!(target: "nodeboot", url = %url, "downloading genesis");
        let document = fetch_genesis(&self.http_client, url.as_str())
            .await
            .with_context(|| format!("failed to download genesis from {url}"))?;

        let path = home.genesis_file();
        std::fs::write(&path, document)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(target: "nodeboot", path = %path.display(), "genesis written");
        Ok(())
    }

    async fn run_step(&self, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.process
            .run(&args)
            .await
            .with_context(|| format!("initialization step `{}` failed", args.join(" ")))
    }
}

fn home_arg(home: &NodeHome) -> String {
    home.root().display().to_string()
}
