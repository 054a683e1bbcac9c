//! Nodeboot Configuration Module
//!
//! This module owns everything the launcher knows about a node home: the
//! home state machine, the two TOML configuration files, storage backend
//! selection, port shifting and the reconciliation that ties them together.

pub mod backend;
pub mod document;
pub mod error;
pub mod home;
pub mod port;
pub mod reconciler;
pub mod settings;

pub use backend::{Backend, BackendSupport};
pub use document::{ConfigDocument, NodeConfigFiles};
pub use error::{ConfigError, ConfigResult};
pub use home::{HomeState, HomeTransition, NodeHome};
pub use port::shift_port;
pub use reconciler::{
    ConfigReconciler, ReconcileReport, ReconcileRequest, ShiftedAddress, StateSyncOutcome,
    StateSyncRequest,
};
pub use settings::{BootstrapSettings, GenesisSettings};
