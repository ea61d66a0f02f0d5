//! Database dialect implementations.
//!
//! Each dialect knows how to render schema graph elements as DDL statements
//! for one database family. The migration builder only talks to the
//! [`MigrationDialect`] trait.

mod mysql;

pub use mysql::MySqlDialect;

use crate::error::Result;
use crate::schema::{Column, ForeignKey, Index, PrimaryKey, Table, View};

/// Trait for database-specific DDL generation.
pub trait MigrationDialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Quotes an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name)
    }

    /// Quotes each identifier, preserving order.
    fn quote_identifiers(&self, names: &[String]) -> Vec<String> {
        names.iter().map(|n| self.quote_identifier(n)).collect()
    }

    /// Quotes a string literal.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quotes each string literal, preserving order.
    fn quote_strings(&self, values: &[String]) -> Vec<String> {
        values.iter().map(|v| self.quote_string(v)).collect()
    }

    /// Wraps a fragment in parentheses.
    fn between_parentheses(&self, fragment: &str) -> String {
        format!("({})", fragment)
    }

    /// Joins fragments with `", "`.
    fn sql_collection(&self, items: &[String]) -> String {
        items.join(", ")
    }

    /// Joins fragments with `", "` and wraps the result in parentheses.
    fn sql_collection_between_parentheses(&self, items: &[String]) -> String {
        self.between_parentheses(&self.sql_collection(items))
    }

    /// Statement opening a transaction.
    fn start_transaction_sql(&self) -> &'static str;

    /// Statement committing a transaction.
    fn commit_sql(&self) -> &'static str;

    /// Renders a column definition. The column must belong to a table.
    fn column_sql(&self, column: &Column) -> Result<String>;

    /// Generates CREATE TABLE for the table's columns and primary key.
    ///
    /// Columns are rendered without auto-increment, which is set afterwards
    /// with [`set_auto_increment_sql`](Self::set_auto_increment_sql).
    fn create_table_sql(&self, table: &Table) -> Result<String>;

    /// Generates DROP TABLE.
    fn drop_table_sql(&self, table: &str) -> String;

    /// Generates SQL adding a column to its table.
    fn add_column_sql(&self, column: &Column) -> Result<String>;

    /// Generates SQL redefining an existing column of the same name.
    fn change_column_sql(&self, column: &Column) -> Result<String>;

    /// Generates SQL dropping a column.
    fn drop_column_sql(&self, table: &str, column: &str) -> String;

    /// Generates SQL adding an index to its table.
    fn add_index_sql(&self, index: &Index) -> Result<String>;

    /// Generates SQL dropping an index.
    fn drop_index_sql(&self, table: &str, index: &str) -> String;

    /// Generates SQL adding a primary key.
    fn add_primary_key_sql(&self, table: &str, primary_key: &PrimaryKey) -> String;

    /// Generates SQL dropping a table's primary key.
    fn drop_primary_key_sql(&self, table: &str) -> String;

    /// Returns the deterministic constraint name of a foreign key.
    fn foreign_key_name(&self, foreign_key: &ForeignKey) -> Result<String>;

    /// Generates SQL adding a foreign key under its deterministic name.
    fn add_foreign_key_sql(&self, foreign_key: &ForeignKey) -> Result<String>;

    /// Generates SQL dropping a foreign key constraint.
    fn drop_foreign_key_sql(&self, table: &str, name: &str) -> String;

    /// Generates SQL turning auto-increment on for a column.
    fn set_auto_increment_sql(&self, column: &Column, table: &Table) -> Result<String>;

    /// Generates SQL turning auto-increment off for a column.
    fn unset_auto_increment_sql(&self, column: &Column, table: &Table) -> Result<String>;

    /// Generates CREATE VIEW.
    fn create_view_sql(&self, view: &View) -> String;

    /// Generates DROP VIEW.
    fn drop_view_sql(&self, view: &str) -> String;

    /// Compares two columns on everything but the auto-increment flag.
    fn columns_are_same_ignore_auto_increment(&self, a: &Column, b: &Column) -> bool {
        a.name == b.name
            && a.column_type == b.column_type
            && a.nullable == b.nullable
            && a.parameters == b.parameters
            && a.table() == b.table()
    }

    /// Compares two indexes as the database would store them.
    fn indexes_are_same(&self, a: &Index, b: &Index) -> bool {
        a.name == b.name && a.columns == b.columns && a.kind == b.kind
    }

    /// Compares the referential actions of two foreign keys.
    fn foreign_key_actions_are_same(&self, a: &ForeignKey, b: &ForeignKey) -> bool {
        a.on_delete == b.on_delete && a.on_update == b.on_update
    }
}
