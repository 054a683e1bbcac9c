//! Storage backend selection and capability classification.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Storage engines the launcher knows how to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Gemini tree store.
    Gemini,
    /// Gemini with an in-process cache.
    GeminiCached,
    /// TreeDB.
    TreeDb,
    /// Go map (in-memory, unsynchronized).
    GoMap,
    /// LevelDB (Go port).
    GoLevelDb,
    /// PebbleDB.
    PebbleDb,
    /// In-memory database.
    MemDb,
}

impl Backend {
    /// Every supported backend, in help-text order.
    pub const ALL: [Backend; 7] = [
        Backend::Gemini,
        Backend::GeminiCached,
        Backend::TreeDb,
        Backend::GoMap,
        Backend::GoLevelDb,
        Backend::PebbleDb,
        Backend::MemDb,
    ];

    /// Identifiers accepted by `--db_backend`.
    pub const NAMES: [&'static str; 7] = [
        "gemini",
        "geminicached",
        "treedb",
        "gomap",
        "goleveldb",
        "pebbledb",
        "memdb",
    ];

    /// Identifier passed to the node binary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::GeminiCached => "geminicached",
            Backend::TreeDb => "treedb",
            Backend::GoMap => "gomap",
            Backend::GoLevelDb => "goleveldb",
            Backend::PebbleDb => "pebbledb",
            Backend::MemDb => "memdb",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Backend::ALL
            .into_iter()
            .find(|backend| backend.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownBackend {
                name: s.to_string(),
            })
    }
}

/// Whether a node binary declares support for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSupport {
    /// Listed among the binary's `--db_backend` values.
    Supported,
    /// The binary lists backends but not this one.
    Unsupported,
    /// Support could not be determined.
    Unknown,
}

impl BackendSupport {
    /// Classifies `start --help` output.
    ///
    /// Matches whole identifier tokens so `gemini` is not confirmed by
    /// `geminicached`. Output that never mentions `db_backend` is `Unknown`.
    pub fn from_help_text(help: &str, backend: Backend) -> Self {
        if !help.contains("db_backend") {
            return BackendSupport::Unknown;
        }

        let listed = help
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|token| token == backend.as_str());

        if listed {
            BackendSupport::Supported
        } else {
            BackendSupport::Unsupported
        }
    }

    /// `Unsupported` and `Unknown` both let the run proceed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BackendSupport::Supported)
    }
}
