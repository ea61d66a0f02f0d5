//! Schema modeling, introspection and migration planning for MySQL.
//!
//! `dbal-core` keeps the engine free of any database driver:
//!
//! - **Schema** - Tables, columns, keys, indexes and views as a plain graph
//! - **Dialect** - DDL generation behind the [`MigrationDialect`](dialect::MigrationDialect) trait
//! - **Introspection** - Reads a live catalog into a schema through a [`DatabaseConnection`](connection::DatabaseConnection)
//! - **Migration** - Diffs two schemas into ordered DDL statements
//! - **Manager** - Named connections opened through registered drivers
//!
//! # Example
//!
//! ```rust
//! use dbal_core::prelude::*;
//!
//! let mut users = Table::new("users");
//! users
//!     .add_column(Column::new("id", ColumnType::Int).not_null().length(11).auto_increment())?
//!     .add_column(Column::new("email", ColumnType::Varchar).length(255))?
//!     .set_primary_key(PrimaryKey::new(["id"]))?;
//!
//! let mut desired = Schema::new();
//! desired.add_table(users)?;
//!
//! let builder = MigrationBuilder::new(MySqlDialect::new());
//! let plan = builder.build(&Schema::new(), &desired)?;
//!
//! assert_eq!(plan.first().map(String::as_str), Some("START TRANSACTION"));
//! # Ok::<(), dbal_core::error::DbalError>(())
//! ```

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod introspect;
pub mod manager;
pub mod migration;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, DbalConfig};
    pub use crate::connection::{DatabaseConnection, ResultRow, Value};
    pub use crate::dialect::{MigrationDialect, MySqlDialect};
    pub use crate::error::{DbalError, Result};
    pub use crate::introspect::SchemaBuilder;
    pub use crate::manager::{ConnectionManager, Driver, SharedConnection};
    pub use crate::migration::MigrationBuilder;
    pub use crate::schema::{
        Column, ColumnParameters, ColumnRecord, ColumnType, ForeignKey, ForeignKeyRecord, Index,
        IndexKind, PrimaryKey, ReferentialAction, Schema, Table, View,
    };
}
