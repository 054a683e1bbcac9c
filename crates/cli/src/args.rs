use crate::launcher::{GenesisSource, LaunchOptions};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, ValueEnum};
use nodeboot_config::{Backend, BootstrapSettings, NodeHome, StateSyncRequest};
use std::path::PathBuf;
use url::Url;

/// Default location of the node binary, relative to the working directory.
pub const DEFAULT_BINARY: &str = "./build/gaiad";
/// Default node home.
pub const DEFAULT_HOME: &str = "~/.gaiad-testnet";

/// Command-line arguments for nodeboot
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeboot",
    version = env!("CARGO_PKG_VERSION"),
    about = "Prepares a Cosmos SDK node home for a storage backend and starts the node",
    long_about = "Initializes (or reuses) a node home, rewrites config.toml and app.toml for the \
                  requested database backend, optionally configures state sync from a trusted \
                  block, and runs the node binary until it exits or Ctrl+C is pressed."
)]
pub struct CliArgs {
    /// Database backend to use
    #[arg(
        long,
        env = "NODEBOOT_BACKEND",
        value_name = "BACKEND",
        value_parser = PossibleValuesParser::new(Backend::NAMES).try_map(|name| name.parse::<Backend>())
    )]
    pub backend: Backend,

    /// Path to the node binary
    #[arg(long, default_value = DEFAULT_BINARY, env = "NODEBOOT_BINARY", value_name = "PATH")]
    pub binary: PathBuf,

    /// Node home directory (a leading `~` is expanded)
    #[arg(long, default_value = DEFAULT_HOME, env = "NODEBOOT_HOME", value_name = "DIR")]
    pub home: String,

    /// Download genesis from this URL instead of building a local one
    #[arg(long, env = "NODEBOOT_GENESIS_URL", value_name = "URL")]
    pub genesis_url: Option<Url>,

    /// Stop running nodes and remove the home before initializing
    #[arg(long, env = "NODEBOOT_CLEAN")]
    pub clean: bool,

    /// Moniker passed to `init`
    #[arg(long, default_value = "test-node", env = "NODEBOOT_MONIKER")]
    pub moniker: String,

    /// Bootstrap from a recent trusted block instead of syncing from genesis
    #[arg(long, env = "NODEBOOT_STATE_SYNC")]
    pub state_sync_enable: bool,

    /// State-sync RPC servers (comma separated); defaults to the settings list
    #[arg(
        long,
        env = "NODEBOOT_STATE_SYNC_RPC_SERVERS",
        value_name = "URL",
        value_delimiter = ','
    )]
    pub state_sync_rpc_servers: Vec<String>,

    /// Added to every listen port; zero or negative leaves ports alone
    #[arg(
        long,
        default_value_t = 1000,
        env = "NODEBOOT_PORT_OFFSET",
        allow_hyphen_values = true
    )]
    pub port_offset: i64,

    /// Start the node with `--iavl-disable-fastnode`
    #[arg(long, env = "NODEBOOT_DISABLE_FASTNODE")]
    pub disable_fastnode: bool,

    /// Stop the node at this height (0 disables)
    #[arg(long, default_value_t = 0, env = "NODEBOOT_HALT_HEIGHT", value_name = "HEIGHT")]
    pub halt_height: u64,

    /// Bootstrap settings file (TOML)
    #[arg(long, env = "NODEBOOT_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Log verbosity
    #[arg(long, value_enum, default_value = "info", env = "NODEBOOT_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "NODEBOOT_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Also write logs to this file or directory
    #[arg(long, env = "NODEBOOT_LOG_PATH", value_name = "PATH")]
    pub log_path: Option<PathBuf>,
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
    Pretty,
}

impl CliArgs {
    /// Home directory with `~` expanded.
    pub fn home_dir(&self) -> PathBuf {
        expand_home(&self.home)
    }

    /// State-sync choice; falls back to the settings' servers when none were given.
    pub fn state_sync_request(&self, settings: &BootstrapSettings) -> StateSyncRequest {
        if !self.state_sync_enable {
            return StateSyncRequest::Disabled;
        }

        let rpc_servers: Vec<String> = self
            .state_sync_rpc_servers
            .iter()
            .map(|server| server.trim().to_string())
            .filter(|server| !server.is_empty())
            .collect();

        StateSyncRequest::Enabled {
            rpc_servers: if rpc_servers.is_empty() {
                settings.state_sync_rpc_servers.clone()
            } else {
                rpc_servers
            },
        }
    }

    pub fn genesis_source(&self) -> GenesisSource {
        match &self.genesis_url {
            Some(url) => GenesisSource::Remote(url.clone()),
            None => GenesisSource::Local,
        }
    }

    /// Everything the launcher needs for one run.
    pub fn launch_options(&self, settings: &BootstrapSettings) -> LaunchOptions {
        LaunchOptions {
            home: NodeHome::new(self.home_dir()),
            backend: self.backend,
            moniker: self.moniker.clone(),
            genesis: self.genesis_source(),
            clean: self.clean,
            state_sync: self.state_sync_request(settings),
            port_offset: self.port_offset,
            disable_fastnode: self.disable_fastnode,
            halt_height: self.halt_height,
        }
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
