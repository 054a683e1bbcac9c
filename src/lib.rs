//! # nodeboot
//!
//! Bootstraps a Cosmos SDK node home for a selectable storage backend and
//! launches the node binary.
//!
//! The workspace is split the same way the run is:
//! - [`rpc_client`]: chain-tip and block-hash queries, trust anchors, genesis download
//! - [`config`]: node home state, config.toml/app.toml reconciliation, port shifting
//! - [`cli`]: argument parsing, logging, process control and the launcher itself
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nodeboot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = BootstrapSettings::default();
//!     let binary = NodeBinary::new("./build/gaiad")?;
//!     let resolver = TrustAnchorResolver::new(
//!         HttpStatusClient::new(settings.request_timeout())?,
//!         settings.trust_safety_margin(),
//!     );
//!     let launcher = NodeLauncher::new(&binary, &settings, &resolver, reqwest::Client::new());
//!     // build LaunchOptions from CliArgs and call launcher.run(&options)
//!     # let _ = launcher;
//!     Ok(())
//! }
//! ```

pub use nodeboot_cli as cli;
pub use nodeboot_config as config;
pub use nodeboot_rpc_client as rpc_client;

/// Commonly used types.
pub mod prelude {
    pub use nodeboot_cli::{
        CliArgs, GenesisSource, LaunchOptions, LaunchOutcome, LaunchPlan, NodeBinary,
        NodeLauncher, NodeProcess,
    };
    pub use nodeboot_config::{
        Backend, BackendSupport, BootstrapSettings, ConfigReconciler, HomeState, HomeTransition,
        NodeHome, ReconcileRequest, StateSyncRequest,
    };
    pub use nodeboot_rpc_client::{
        HttpStatusClient, StatusClient, TrustAnchor, TrustAnchorResolver,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
