//! Node home directory and its initialization state machine.

use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the directory holding config.toml, app.toml and genesis.json.
pub const CONFIG_DIR: &str = "config";
/// Name of the node's data directory.
pub const DATA_DIR: &str = "data";

/// A node home directory (`--home`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHome {
    root: PathBuf,
}

impl NodeHome {
    /// Wraps `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `config/`.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// `config/config.toml`, the network/peer configuration.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// `config/app.toml`, the application/API configuration.
    pub fn app_file(&self) -> PathBuf {
        self.config_dir().join("app.toml")
    }

    /// `config/genesis.json`.
    pub fn genesis_file(&self) -> PathBuf {
        self.config_dir().join("genesis.json")
    }

    /// `data/priv_validator_state.json`; present once the node has signed state.
    pub fn validator_state_file(&self) -> PathBuf {
        self.root.join(DATA_DIR).join("priv_validator_state.json")
    }

    /// Current state, read from the filesystem.
    pub fn state(&self) -> HomeState {
        if self.config_dir().is_dir() {
            HomeState::Initialized
        } else {
            HomeState::Uninitialized
        }
    }

    /// Removes the whole home directory. Returns whether anything was removed.
    pub fn wipe(&self) -> ConfigResult<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        info!(target: "nodeboot", home = %self.root.display(), "cleaning home directory");
        std::fs::remove_dir_all(&self.root).map_err(|err| ConfigError::io(&self.root, err))?;
        Ok(true)
    }
}

/// Whether the home has been through `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeState {
    /// No config directory.
    Uninitialized,
    /// Config directory present.
    Initialized,
}

/// What a run does to the home before launching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeTransition {
    /// Run `init` and the full reconciliation on a fresh home.
    Initialize,
    /// Stop running nodes, remove the home, then initialize.
    WipeAndInitialize,
    /// Keep everything except the storage backend identifier.
    ReconcileBackend,
}

impl HomeState {
    /// Transition for a run with or without a clean request.
    pub fn transition(self, clean: bool) -> HomeTransition {
        match (self, clean) {
            (_, true) => HomeTransition::WipeAndInitialize,
            (HomeState::Uninitialized, false) => HomeTransition::Initialize,
            (HomeState::Initialized, false) => HomeTransition::ReconcileBackend,
        }
    }
}

impl HomeTransition {
    /// Whether the home is removed first.
    pub fn wipes(&self) -> bool {
        matches!(self, HomeTransition::WipeAndInitialize)
    }

    /// Whether `init` and the full reconciliation run.
    pub fn initializes(&self) -> bool {
        matches!(
            self,
            HomeTransition::Initialize | HomeTransition::WipeAndInitialize
        )
    }
}
