//! Configuration for the mapper and the cell store.
//!
//! A configuration file is TOML with two optional tables:
//!
//! ```toml
//! [mapper]
//! naming_policy = "lower-case-with-underscores"
//! max_versions = 3
//!
//! [store]
//! cache_size_bytes = 67108864
//! block_size = 4096
//! ```
//!
//! Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::naming::NamingPolicy;
use crate::rocksdb::StoreConfig;

/// Mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Attribute name to stored family/qualifier name.
    pub naming_policy: NamingPolicy,
    /// Versions per column requested by typed reads.
    pub max_versions: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            naming_policy: NamingPolicy::Identity,
            max_versions: 1,
        }
    }
}

impl MapperConfig {
    pub fn with_naming_policy(mut self, naming_policy: NamingPolicy) -> Self {
        self.naming_policy = naming_policy;
        self
    }

    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellmapConfig {
    pub mapper: MapperConfig,
    pub store: StoreConfig,
}

impl CellmapConfig {
    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = text.parse().map_err(|e: toml::de::Error| Error::Config(e.to_string()))?;
        // Surface a bad policy name as its own error rather than a generic
        // deserialization message.
        if let Some(policy) = table
            .get("mapper")
            .and_then(|m| m.get("naming_policy"))
            .and_then(|p| p.as_str())
        {
            policy.parse::<NamingPolicy>()?;
        }
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}
