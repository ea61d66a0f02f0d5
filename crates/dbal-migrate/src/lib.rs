//! MySQL driver and migration tooling for `dbal-core`.
//!
//! - **Driver** - sqlx-backed [`MySqlDriver`](driver::MySqlDriver) for the connection manager
//! - **Executor** - Plans and applies migrations towards a desired schema
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the live schema as JSON
//! dbal-migrate --database mysql://root@localhost/app inspect
//!
//! # Show the statements needed to reach a desired schema
//! dbal-migrate --database mysql://root@localhost/app diff --desired schema.json
//!
//! # Apply them
//! dbal-migrate --config dbal.json --connection main migrate --desired schema.json
//! ```

pub mod driver;
pub mod executor;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::driver::{MySqlConnection, MySqlDriver, MYSQL_DRIVER};
    pub use crate::executor::MigrationExecutor;
}
