//! Whole-file TOML documents with dotted-key access.

use crate::error::{ConfigError, ConfigResult};
use crate::home::NodeHome;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// A TOML file parsed fully into memory.
///
/// Mutations only touch the in-memory table; [`ConfigDocument::save`]
/// rewrites the whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    path: PathBuf,
    table: Table,
}

impl ConfigDocument {
    /// Reads and parses `path`.
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|err| ConfigError::io(&path, err))?;
        let table = content.parse::<Table>().map_err(|err| ConfigError::Parse {
            path: path.clone(),
            source: err,
        })?;
        Ok(Self { path, table })
    }

    /// Writes the document to a sibling temp file and renames it into place.
    pub fn save(&self) -> ConfigResult<()> {
        let staging = self.stage()?;
        self.commit(&staging)
    }

    /// Serializes into `<path>.tmp` and returns the staging path.
    fn stage(&self) -> ConfigResult<PathBuf> {
        let content = toml::to_string(&self.table).map_err(|err| ConfigError::Serialize {
            path: self.path.clone(),
            source: err,
        })?;

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, content).map_err(|err| ConfigError::io(&staging, err))?;
        Ok(staging)
    }

    fn commit(&self, staging: &Path) -> ConfigResult<()> {
        std::fs::rename(staging, &self.path).map_err(|err| ConfigError::io(&self.path, err))
    }

    /// File backing this document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed contents.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Whether a top-level table named `section` exists.
    pub fn has_section(&self, section: &str) -> bool {
        matches!(self.table.get(section), Some(Value::Table(_)))
    }

    /// Value at a dotted key such as `p2p.laddr`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.table.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// String at a dotted key; `Ok(None)` when absent.
    pub fn get_str(&self, key: &str) -> ConfigResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(self.unexpected_type(key, "string")),
        }
    }

    /// Sets a dotted key. Every parent section must already exist.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<()> {
        let (sections, leaf) = match key.rsplit_once('.') {
            Some((sections, leaf)) => (Some(sections), leaf),
            None => (None, key),
        };

        let mut target = &mut self.table;
        if let Some(sections) = sections {
            for section in sections.split('.') {
                target = match target.get_mut(section) {
                    Some(Value::Table(table)) => table,
                    Some(_) => {
                        return Err(ConfigError::UnexpectedType {
                            path: self.path.clone(),
                            key: section.to_string(),
                            expected: "table",
                        })
                    }
                    None => {
                        return Err(ConfigError::MissingSection {
                            path: self.path.clone(),
                            section: section.to_string(),
                        })
                    }
                };
            }
        }

        target.insert(leaf.to_string(), value.into());
        Ok(())
    }

    fn unexpected_type(&self, key: &str, expected: &'static str) -> ConfigError {
        ConfigError::UnexpectedType {
            path: self.path.clone(),
            key: key.to_string(),
            expected,
        }
    }
}

/// The two configuration files of a node home, held together for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfigFiles {
    /// `config.toml`: peers, listen addresses, backend, state sync.
    pub config: ConfigDocument,
    /// `app.toml`: gas price and API listen addresses.
    pub app: ConfigDocument,
}

impl NodeConfigFiles {
    /// Loads both files; either one missing or malformed is an error.
    pub fn load(home: &NodeHome) -> ConfigResult<Self> {
        Ok(Self {
            config: ConfigDocument::load(home.config_file())?,
            app: ConfigDocument::load(home.app_file())?,
        })
    }

    /// Writes both files back. Nothing is renamed into place until both
    /// staging files are written.
    pub fn save(&self) -> ConfigResult<()> {
        let config_staging = self.config.stage()?;
        let app_staging = match self.app.stage() {
            Ok(staging) => staging,
            Err(err) => {
                // best effort; the original config.toml is still intact
                let _ = std::fs::remove_file(&config_staging);
                return Err(err);
            }
        };

        self.config.commit(&config_staging)?;
        self.app.commit(&app_staging)
    }
}
