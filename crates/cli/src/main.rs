//! nodeboot - prepares a node home for a storage backend and starts the node
//!
//! Usage:
//!   nodeboot --backend pebbledb --home ~/.gaiad-testnet --state-sync-enable
//!
//! The launcher will:
//! - Initialize the home (or wipe it first with --clean)
//! - Rewrite config.toml and app.toml for the chosen backend and ports
//! - Optionally configure state sync from a recent trusted block
//! - Run the node until it exits or Ctrl+C is received

use anyhow::{Context, Result};
use clap::Parser;
use nodeboot_cli::logging::init_tracing;
use nodeboot_cli::{CliArgs, LaunchOutcome, NodeBinary, NodeLauncher, VERSION};
use nodeboot_config::BootstrapSettings;
use nodeboot_rpc_client::{HttpStatusClient, TrustAnchorResolver};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    let logging = init_tracing(cli.log_level, cli.log_format, cli.log_path.as_deref())?;
    let _log_guard = logging.guard;

    info!(
        target: "nodeboot",
        version = VERSION,
        backend = %cli.backend,
        "nodeboot starting"
    );

    let settings = BootstrapSettings::load(cli.settings.as_deref())
        .context("failed to load bootstrap settings")?;

    let binary = match NodeBinary::new(&cli.binary) {
        Ok(binary) => binary,
        Err(err) => {
            error!(target: "nodeboot", error = %err, "node binary is missing; build it first (make build)");
            return Err(err).context("cannot launch without the node binary");
        }
    };

    let http_client = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .context("failed to build HTTP client")?;
    let resolver = TrustAnchorResolver::new(
        HttpStatusClient::with_client(http_client.clone()),
        settings.trust_safety_margin(),
    );

    let launcher = NodeLauncher::new(&binary, &settings, &resolver, http_client);
    let options = cli.launch_options(&settings);

    match launcher.run(&options).await? {
        LaunchOutcome::Interrupted => info!(target: "nodeboot", "shutdown complete"),
        LaunchOutcome::Exited => info!(target: "nodeboot", "node exited; shutdown complete"),
    }
    Ok(())
}
