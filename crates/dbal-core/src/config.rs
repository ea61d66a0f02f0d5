//! Connection configuration.
//!
//! ```json
//! {
//!     "connections": [
//!         {
//!             "name": "main",
//!             "driver": "mysql",
//!             "url": "mysql://root@localhost/app",
//!             "options": { "charset": "utf8mb4" }
//!         }
//!     ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DbalError, Result};

/// Top-level configuration: the named connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbalConfig {
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

/// Parameters of one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection name. Required by the connection manager.
    #[serde(default)]
    pub name: Option<String>,
    /// Name of the driver that opens the connection.
    pub driver: String,
    /// Driver-specific connection URL.
    #[serde(default)]
    pub url: String,
    /// Extra driver options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Creates a named connection configuration.
    #[must_use]
    pub fn new(name: impl Into<String>, driver: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            driver: driver.into(),
            url: url.into(),
            options: BTreeMap::new(),
        }
    }

    /// Adds a driver option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl DbalConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DbalError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
