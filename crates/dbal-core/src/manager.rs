//! Named database connections.
//!
//! The [`ConnectionManager`] owns the configured connections and the drivers
//! able to open them. Connections are opened on first use and then reused.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ConnectionConfig, DbalConfig};
use crate::connection::DatabaseConnection;
use crate::error::{DbalError, Result};

/// A connection shared between its users.
pub type SharedConnection = Arc<dyn DatabaseConnection + Send + Sync>;

/// Opens connections for one kind of database.
pub trait Driver {
    /// Name used by [`ConnectionConfig::driver`] to select this driver.
    fn name(&self) -> &str;

    /// Opens a connection.
    fn connect(&self, config: &ConnectionConfig) -> Result<SharedConnection>;
}

/// Registry of named connections.
pub struct ConnectionManager {
    configs: Vec<(String, ConnectionConfig)>,
    drivers: HashMap<String, Box<dyn Driver>>,
    connections: HashMap<String, SharedConnection>,
}

impl ConnectionManager {
    /// Creates a manager. Every configured connection must be named, and
    /// names must be unique.
    pub fn new(config: DbalConfig, drivers: Vec<Box<dyn Driver>>) -> Result<Self> {
        let mut configs: Vec<(String, ConnectionConfig)> = Vec::with_capacity(config.connections.len());

        for connection in config.connections {
            let name = connection
                .name
                .clone()
                .ok_or(DbalError::MissingConnectionName)?;
            if configs.iter().any(|(existing, _)| *existing == name) {
                return Err(DbalError::DuplicateConnection(name));
            }
            configs.push((name, connection));
        }

        let drivers = drivers
            .into_iter()
            .map(|driver| (driver.name().to_string(), driver))
            .collect();

        Ok(Self {
            configs,
            drivers,
            connections: HashMap::new(),
        })
    }

    /// Returns the configured connection names, in configuration order.
    pub fn connection_names(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the connection with the given name, opening it on first use.
    pub fn connection(&mut self, name: &str) -> Result<SharedConnection> {
        if let Some(connection) = self.connections.get(name) {
            return Ok(Arc::clone(connection));
        }

        let config = self
            .configs
            .iter()
            .find(|(configured, _)| configured == name)
            .map(|(_, config)| config)
            .ok_or_else(|| DbalError::UnknownConnection(name.to_string()))?;

        let driver = self
            .drivers
            .get(&config.driver)
            .ok_or_else(|| DbalError::UnknownDriver(config.driver.clone()))?;

        debug!(connection = name, driver = %config.driver, "Opening connection");
        let connection = driver.connect(config)?;
        info!(connection = name, "Connection opened");

        self.connections
            .insert(name.to_string(), Arc::clone(&connection));
        Ok(connection)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.configs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ResultRow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullConnection;

    impl DatabaseConnection for NullConnection {
        fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
            Ok(queries.iter().map(|_| Vec::new()).collect())
        }
    }

    struct CountingDriver {
        opened: Arc<AtomicUsize>,
    }

    impl Driver for CountingDriver {
        fn name(&self) -> &str {
            "null"
        }

        fn connect(&self, _config: &ConnectionConfig) -> Result<SharedConnection> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullConnection))
        }
    }

    fn manager(config: DbalConfig) -> (Result<ConnectionManager>, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let driver = CountingDriver {
            opened: Arc::clone(&opened),
        };
        (ConnectionManager::new(config, vec![Box::new(driver)]), opened)
    }

    #[test]
    fn test_missing_connection_name() {
        let config = DbalConfig {
            connections: vec![ConnectionConfig {
                driver: "null".to_string(),
                ..ConnectionConfig::default()
            }],
        };
        let err = manager(config).0.unwrap_err();
        assert_eq!(err.to_string(), "Missing name for connection.");
    }

    #[test]
    fn test_duplicate_connection_name() {
        let config = DbalConfig {
            connections: vec![
                ConnectionConfig::new("main", "null", ""),
                ConnectionConfig::new("main", "null", ""),
            ],
        };
        assert!(matches!(
            manager(config).0,
            Err(DbalError::DuplicateConnection(name)) if name == "main"
        ));
    }

    #[test]
    fn test_connections_are_cached() {
        let config = DbalConfig {
            connections: vec![ConnectionConfig::new("main", "null", "")],
        };
        let (manager, opened) = manager(config);
        let mut manager = manager.unwrap();

        let first = manager.connection("main").unwrap();
        let second = manager.connection("main").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(first.execute_multiple_queries(&["SELECT 1"]).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_connection() {
        let (manager, _) = manager(DbalConfig::default());
        let Err(err) = manager.unwrap().connection("missing") else {
            panic!("an unconfigured connection was opened");
        };
        assert_eq!(
            err.to_string(),
            "Found no database connection with name \"missing\"."
        );
    }

    #[test]
    fn test_unknown_driver() {
        let config = DbalConfig {
            connections: vec![ConnectionConfig::new("main", "postgres", "")],
        };
        let (manager, opened) = manager(config);
        let Err(err) = manager.unwrap().connection("main") else {
            panic!("a connection was opened without its driver");
        };

        assert_eq!(err.to_string(), "Found no driver with name \"postgres\".");
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }
}
