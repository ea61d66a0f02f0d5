//! Migration executor.
//!
//! Reads the live schema through a connection, plans the changes towards a
//! desired schema and runs the resulting statements.

use tracing::{debug, info, warn};

use dbal_core::connection::DatabaseConnection;
use dbal_core::dialect::MigrationDialect;
use dbal_core::error::Result;
use dbal_core::introspect::SchemaBuilder;
use dbal_core::migration::MigrationBuilder;
use dbal_core::schema::Schema;

/// Applies schema migrations through a database connection.
pub struct MigrationExecutor<C: DatabaseConnection, D: MigrationDialect> {
    connection: C,
    builder: MigrationBuilder<D>,
    dry_run: bool,
}

impl<C: DatabaseConnection, D: MigrationDialect> MigrationExecutor<C, D> {
    /// Creates a new migration executor.
    pub fn new(connection: C, dialect: D) -> Self {
        Self {
            connection,
            builder: MigrationBuilder::new(dialect),
            dry_run: false,
        }
    }

    /// Enables dry-run mode (SQL is printed but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &D {
        self.builder.dialect()
    }

    /// Reads the current schema from the database.
    pub fn inspect(&self) -> Result<Schema> {
        SchemaBuilder::from_connection(&self.connection)
    }

    /// Returns the framed statements that would bring the database to
    /// `desired`. Empty when nothing changes.
    pub fn plan(&self, desired: &Schema) -> Result<Vec<String>> {
        let current = self.inspect()?;
        self.builder.build(&current, desired)
    }

    /// Runs statements in order, or prints them in dry-run mode.
    pub fn apply(&self, statements: &[String]) -> Result<()> {
        if statements.is_empty() {
            info!("Nothing to apply");
            return Ok(());
        }

        for sql in statements {
            debug!(sql = %sql, "Executing SQL");
            if self.dry_run {
                println!("{};", sql);
            }
        }

        if self.dry_run {
            return Ok(());
        }

        let queries: Vec<&str> = statements.iter().map(String::as_str).collect();
        if let Err(err) = self.connection.execute_multiple_queries(&queries) {
            warn!(error = %err, "Migration failed; DDL statements already run are not rolled back");
            return Err(err);
        }

        info!(statements = statements.len(), "Migration applied successfully");
        Ok(())
    }

    /// Plans and applies the migration to `desired`, returning the plan.
    pub fn migrate(&self, desired: &Schema) -> Result<Vec<String>> {
        let plan = self.plan(desired)?;
        self.apply(&plan)?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use dbal_core::connection::ResultRow;
    use dbal_core::dialect::MySqlDialect;
    use dbal_core::error::DbalError;
    use dbal_core::introspect::CATALOG_QUERIES;
    use dbal_core::schema::{Column, ColumnType, Table};

    /// Answers catalog batches with an empty database and records the rest.
    #[derive(Default)]
    struct RecordingConnection {
        executed: Mutex<Vec<String>>,
        fail: bool,
    }

    impl DatabaseConnection for RecordingConnection {
        fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
            if queries == CATALOG_QUERIES {
                return Ok(vec![Vec::new(); 4]);
            }
            if self.fail {
                return Err(DbalError::Connection("table already exists".into()));
            }
            self.executed
                .lock()
                .unwrap()
                .extend(queries.iter().map(ToString::to_string));
            Ok(queries.iter().map(|_| Vec::new()).collect())
        }
    }

    fn desired() -> Schema {
        let mut table = Table::new("tags");
        table
            .add_column(Column::new("label", ColumnType::Varchar).length(32).not_null())
            .unwrap();
        let mut schema = Schema::new();
        schema.add_table(table).unwrap();
        schema
    }

    #[test]
    fn test_migrate() {
        let executor = MigrationExecutor::new(RecordingConnection::default(), MySqlDialect::new());

        let plan = executor.migrate(&desired()).unwrap();

        assert_eq!(
            plan,
            vec![
                "START TRANSACTION",
                "CREATE TABLE `tags` (`label` VARCHAR(32) NOT NULL)",
                "COMMIT",
            ]
        );
        assert_eq!(*executor.connection.executed.lock().unwrap(), plan);
    }

    #[test]
    fn test_dry_run() {
        let executor =
            MigrationExecutor::new(RecordingConnection::default(), MySqlDialect::new()).dry_run(true);

        let plan = executor.migrate(&desired()).unwrap();

        assert_eq!(plan.len(), 3);
        assert!(executor.connection.executed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nothing_to_do() {
        let executor = MigrationExecutor::new(RecordingConnection::default(), MySqlDialect::new());

        let plan = executor.migrate(&Schema::new()).unwrap();

        assert!(plan.is_empty());
        assert!(executor.connection.executed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_is_reported() {
        let connection = RecordingConnection {
            fail: true,
            ..RecordingConnection::default()
        };
        let executor = MigrationExecutor::new(connection, MySqlDialect::new());

        let err = executor.migrate(&desired()).unwrap_err();
        assert_eq!(err.to_string(), "Database error: table already exists");
    }
}
