//! nodeboot command-line launcher
//!
//! Brings a Cosmos SDK node home to a launchable state for a chosen storage
//! backend and starts the node binary.

pub mod args;
pub mod launcher;
pub mod logging;
pub mod plan;
pub mod process;

pub use args::{CliArgs, LogFormat, LogLevel};
pub use launcher::{GenesisSource, LaunchOptions, NodeLauncher};
pub use plan::LaunchPlan;
pub use process::{LaunchOutcome, NodeBinary, NodeProcess, ProcessError, ProcessResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
