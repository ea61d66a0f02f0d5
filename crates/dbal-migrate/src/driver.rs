//! MySQL driver backed by sqlx.
//!
//! The engine works synchronously, so each connection owns a current-thread
//! tokio runtime and blocks on every batch.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use sqlx::mysql::{MySqlConnectOptions, MySqlRow, MySqlSslMode};
use sqlx::{Column as _, Connection as _, Row as _, ValueRef as _};
use tokio::runtime::Runtime;
use tracing::debug;

use dbal_core::config::ConnectionConfig;
use dbal_core::connection::{DatabaseConnection, ResultRow, Value};
use dbal_core::error::{DbalError, Result};
use dbal_core::manager::{Driver, SharedConnection};

/// Driver name used in connection configurations.
pub const MYSQL_DRIVER: &str = "mysql";

/// Opens [`MySqlConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

impl Driver for MySqlDriver {
    fn name(&self) -> &str {
        MYSQL_DRIVER
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<SharedConnection> {
        Ok(Arc::new(MySqlConnection::connect_with(connect_options(config)?)?))
    }
}

/// Builds sqlx options from the URL, then applies the configured options
/// (`charset`, `collation`, `ssl_mode`, `timezone`,
/// `statement_cache_capacity`) over it.
pub fn connect_options(config: &ConnectionConfig) -> Result<MySqlConnectOptions> {
    let mut options = MySqlConnectOptions::from_str(&config.url).map_err(database_error)?;

    for (key, value) in &config.options {
        options = match key.as_str() {
            "charset" => options.charset(value),
            "collation" => options.collation(value),
            "ssl_mode" => options.ssl_mode(MySqlSslMode::from_str(value).map_err(database_error)?),
            "timezone" => options.timezone(Some(value.clone())),
            "statement_cache_capacity" => {
                options.statement_cache_capacity(value.parse().map_err(database_error)?)
            }
            _ => {
                return Err(DbalError::UnknownOption {
                    driver: MYSQL_DRIVER.to_string(),
                    option: key.clone(),
                });
            }
        };
    }

    Ok(options)
}

/// A single MySQL connection.
pub struct MySqlConnection {
    runtime: Runtime,
    connection: Mutex<sqlx::MySqlConnection>,
}

impl MySqlConnection {
    /// Connects with options built by [`connect_options`].
    pub fn connect_with(options: MySqlConnectOptions) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(database_error)?;

        let connection = runtime
            .block_on(sqlx::MySqlConnection::connect_with(&options))
            .map_err(database_error)?;

        Ok(Self {
            runtime,
            connection: Mutex::new(connection),
        })
    }
}

impl DatabaseConnection for MySqlConnection {
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| DbalError::Connection("connection lock poisoned".into()))?;

        self.runtime.block_on(async {
            let mut result_sets = Vec::with_capacity(queries.len());
            for query in queries {
                debug!(sql = %query, "Executing query");
                let rows = sqlx::raw_sql(query)
                    .fetch_all(&mut *connection)
                    .await
                    .map_err(database_error)?;
                result_sets.push(rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?);
            }
            Ok::<_, DbalError>(result_sets)
        })
    }
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection").finish_non_exhaustive()
    }
}

fn decode_row(row: &MySqlRow) -> Result<ResultRow> {
    let mut result = ResultRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        result.insert(column.name(), decode_cell(row, i)?);
    }
    Ok(result)
}

// Catalog columns mix signed, unsigned, text and binary-collated types.
fn decode_cell(row: &MySqlRow, i: usize) -> Result<Value> {
    if row.try_get_raw(i).map_err(database_error)?.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(n) = row.try_get::<i64, _>(i) {
        return Ok(Value::Int(n));
    }
    if let Ok(n) = row.try_get::<u64, _>(i) {
        return Ok(Value::UInt(n));
    }
    if let Ok(b) = row.try_get::<bool, _>(i) {
        return Ok(Value::Int(i64::from(b)));
    }
    if let Ok(s) = row.try_get::<String, _>(i) {
        return Ok(Value::Text(s));
    }
    row.try_get::<Vec<u8>, _>(i)
        .map(|bytes| Value::Text(String::from_utf8_lossy(&bytes).into_owned()))
        .map_err(database_error)
}

fn database_error(err: impl std::error::Error + Send + Sync + 'static) -> DbalError {
    DbalError::Connection(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("main", MYSQL_DRIVER, "mysql://root@localhost:3306/app")
    }

    #[test]
    fn test_options_are_applied() {
        let config = config()
            .option("charset", "latin1")
            .option("collation", "latin1_swedish_ci")
            .option("ssl_mode", "disabled")
            .option("statement_cache_capacity", "16");

        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_charset(), "latin1");
        assert_eq!(options.get_collation(), Some("latin1_swedish_ci"));
        assert_eq!(options.get_database(), Some("app"));
    }

    #[test]
    fn test_unknown_option() {
        let err = connect_options(&config().option("pool_size", "4")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown option \"pool_size\" for driver \"mysql\"."
        );
    }

    #[test]
    fn test_invalid_option_value() {
        let err = connect_options(&config().option("statement_cache_capacity", "many")).unwrap_err();
        assert!(matches!(err, DbalError::Connection(_)));
    }
}
