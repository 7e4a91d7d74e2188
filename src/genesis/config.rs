//! TOML configuration loading/saving for the engine.
//!
//! The TOML format mirrors [`EngineConfig`]:
//!
//! ```toml
//! atomicity = "target"
//! nested_events = "discard"
//!
//! [[genesis]]
//! name = "bitcoin"
//! template = "bitcoin"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DEFAULT_GENESIS;
use crate::contracts::state::{Atomicity, ExecutionPolicy, NestedEvents};
use crate::contracts::ContractError;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A genesis entry could not be registered
    #[error("genesis contract '{name}': {source}")]
    Genesis {
        /// Entry name
        name: String,
        /// Registration failure
        #[source]
        source: ContractError,
    },
}

/// One contract registered at startup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisContract {
    /// Registry name
    pub name: String,
    /// Loader template
    pub template: String,
}

impl GenesisContract {
    /// Entry registering `template` under its own name
    #[must_use]
    pub fn named(template: &str) -> Self {
        Self {
            name: template.to_string(),
            template: template.to_string(),
        }
    }
}

/// TOML-serializable engine config
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rollback scope of a failed inscription (default: target)
    #[serde(default)]
    pub atomicity: Atomicity,
    /// Handling of events raised by nested calls (default: discard)
    #[serde(default)]
    pub nested_events: NestedEvents,
    /// Contracts registered at startup (default: the native genesis set)
    #[serde(default = "default_genesis")]
    pub genesis: Vec<GenesisContract>,
}

fn default_genesis() -> Vec<GenesisContract> {
    DEFAULT_GENESIS
        .iter()
        .map(|template| GenesisContract::named(template))
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            atomicity: Atomicity::default(),
            nested_events: NestedEvents::default(),
            genesis: default_genesis(),
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML string
    ///
    /// # Errors
    /// Returns `ParseError` on invalid TOML or unknown enum values
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save to a TOML file
    ///
    /// # Errors
    /// Returns error if serialization or the write fails
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Runtime switches selected by this config
    #[must_use]
    pub fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            atomicity: self.atomicity,
            nested_events: self.nested_events,
        }
    }
}
