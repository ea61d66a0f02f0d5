//! MySQL dialect.
//!
//! Identifiers are backquoted and auto-increment can only be toggled through
//! `ALTER TABLE ... CHANGE`, so the migration builder emits those toggles as
//! separate statements.

use sha1::{Digest, Sha1};

use crate::error::{DbalError, Result};
use crate::schema::{
    Column, ForeignKey, ForeignKeyRecord, Index, IndexKind, PrimaryKey, ReferentialAction, Table,
    View,
};

use super::MigrationDialect;

/// MySQL migration dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders the columns of a CREATE TABLE body: `(<col>, <col>)`.
    pub fn create_table_columns_sql(&self, columns: &[Column]) -> Result<String> {
        let definitions = columns
            .iter()
            .map(|c| self.column_sql(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.sql_collection_between_parentheses(&definitions))
    }

    /// Returns `fk_<sha1>` for a foreign key.
    ///
    /// Identical to [`foreign_key_unique_name_from_record`](Self::foreign_key_unique_name_from_record)
    /// applied to [`ForeignKey::to_record`].
    pub fn foreign_key_unique_name(&self, foreign_key: &ForeignKey) -> Result<String> {
        Ok(self.foreign_key_unique_name_from_record(&foreign_key.to_record()?))
    }

    /// Returns `fk_<sha1>` for a foreign key record.
    ///
    /// The digest covers the owning table, its columns, the referenced table
    /// and the referenced columns, in that order, joined by `_`. Referential
    /// actions are not part of the name.
    #[must_use]
    pub fn foreign_key_unique_name_from_record(&self, record: &ForeignKeyRecord) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(
            2 + record.columns.len() + record.referenced_columns.len(),
        );
        parts.push(&record.table);
        parts.extend(record.columns.iter().map(String::as_str));
        parts.push(&record.referenced_table);
        parts.extend(record.referenced_columns.iter().map(String::as_str));

        let digest = Sha1::digest(parts.join("_").as_bytes());
        format!("fk_{:x}", digest)
    }

    /// Renders a column definition for the given table, skipping the
    /// owning-table check.
    fn render_column(&self, column: &Column, table: &str, auto_increment: bool) -> Result<String> {
        if column.name.is_empty() {
            return Err(DbalError::ColumnNameRequired {
                table: table.to_string(),
            });
        }

        let column_type = column
            .column_type
            .ok_or_else(|| DbalError::ColumnTypeRequired {
                table: table.to_string(),
                column: column.name.clone(),
            })?;

        let nullable = column
            .nullable
            .ok_or_else(|| DbalError::ColumnNullableRequired {
                table: table.to_string(),
                column: column.name.clone(),
            })?;

        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            column_type.as_str()
        );

        if column_type.has_allowed_values() {
            let values = column.parameters.allowed_values.as_ref().ok_or_else(|| {
                DbalError::ColumnParameterRequired {
                    parameter: "allowedValues",
                    table: table.to_string(),
                    column: column.name.clone(),
                }
            })?;
            sql.push_str(&self.sql_collection_between_parentheses(&self.quote_strings(values)));
        } else if let Some(length) = column.parameters.length.filter(|_| column_type.requires_length()) {
            sql.push_str(&self.between_parentheses(&length.to_string()));
        }

        if column.parameters.unsigned {
            sql.push_str(" UNSIGNED");
        }

        sql.push_str(if nullable { " DEFAULT NULL" } else { " NOT NULL" });

        if auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }

        Ok(sql)
    }

    fn change_column_with(&self, column: &Column, table: &str, auto_increment: bool) -> Result<String> {
        // The rendered definition starts with the new name.
        Ok(format!(
            "ALTER TABLE {} CHANGE {} {}",
            self.quote_identifier(table),
            self.quote_identifier(&column.name),
            self.render_column(column, table, auto_increment)?
        ))
    }
}

impl MigrationDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name)
    }

    fn start_transaction_sql(&self) -> &'static str {
        "START TRANSACTION"
    }

    fn commit_sql(&self) -> &'static str {
        "COMMIT"
    }

    fn column_sql(&self, column: &Column) -> Result<String> {
        let table = column.table().ok_or(DbalError::ColumnTableRequired)?;
        self.render_column(column, table, column.auto_increment)
    }

    fn create_table_sql(&self, table: &Table) -> Result<String> {
        let mut definitions = table
            .columns()
            .iter()
            .map(|c| self.render_column(c, table.name(), false))
            .collect::<Result<Vec<_>>>()?;

        if let Some(pk) = table.primary_key() {
            definitions.push(format!(
                "PRIMARY KEY {}",
                self.sql_collection_between_parentheses(&self.quote_identifiers(&pk.columns))
            ));
        }

        Ok(format!(
            "CREATE TABLE {} {}",
            self.quote_identifier(table.name()),
            self.sql_collection_between_parentheses(&definitions)
        ))
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(table))
    }

    fn add_column_sql(&self, column: &Column) -> Result<String> {
        let column_sql = self.column_sql(column)?;
        let table = column.table().unwrap_or_default();
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            column_sql
        ))
    }

    fn change_column_sql(&self, column: &Column) -> Result<String> {
        let table = column.table().ok_or(DbalError::ColumnTableRequired)?;
        self.change_column_with(column, table, column.auto_increment)
    }

    fn drop_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    fn add_index_sql(&self, index: &Index) -> Result<String> {
        let table = index.table().ok_or(DbalError::IndexTableRequired)?;

        if index.name.is_empty() {
            return Err(DbalError::IndexNameRequired {
                table: table.to_string(),
            });
        }

        if index.columns.is_empty() {
            return Err(DbalError::IndexColumnsRequired {
                table: table.to_string(),
                index: index.name.clone(),
            });
        }

        let table = self.quote_identifier(table);
        let name = self.quote_identifier(&index.name);
        let columns = self.sql_collection_between_parentheses(&self.quote_identifiers(&index.columns));

        let sql = match index.kind {
            Some(IndexKind::Unique) => {
                format!("ALTER TABLE {} ADD UNIQUE INDEX {} {}", table, name, columns)
            }
            Some(kind @ (IndexKind::Fulltext | IndexKind::Spatial)) => {
                format!("ALTER TABLE {} ADD INDEX {} {} {}", table, kind, name, columns)
            }
            Some(kind @ (IndexKind::Btree | IndexKind::Hash)) => {
                format!("ALTER TABLE {} ADD INDEX {} {} USING {}", table, name, columns, kind)
            }
            None => format!("ALTER TABLE {} ADD INDEX {} {}", table, name, columns),
        };

        Ok(sql)
    }

    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        format!(
            "ALTER TABLE {} DROP INDEX {}",
            self.quote_identifier(table),
            self.quote_identifier(index)
        )
    }

    fn add_primary_key_sql(&self, table: &str, primary_key: &PrimaryKey) -> String {
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY {}",
            self.quote_identifier(table),
            self.sql_collection_between_parentheses(&self.quote_identifiers(&primary_key.columns))
        )
    }

    fn drop_primary_key_sql(&self, table: &str) -> String {
        format!("ALTER TABLE {} DROP PRIMARY KEY", self.quote_identifier(table))
    }

    fn foreign_key_name(&self, foreign_key: &ForeignKey) -> Result<String> {
        self.foreign_key_unique_name(foreign_key)
    }

    fn add_foreign_key_sql(&self, foreign_key: &ForeignKey) -> Result<String> {
        let record = foreign_key.to_record()?;

        if record.columns.len() != record.referenced_columns.len() {
            return Err(DbalError::ForeignKeyArity {
                table: record.table,
                columns: record.columns.len(),
                referenced: record.referenced_columns.len(),
            });
        }

        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY {} REFERENCES {} {}",
            self.quote_identifier(&record.table),
            self.quote_identifier(&self.foreign_key_unique_name_from_record(&record)),
            self.sql_collection_between_parentheses(&self.quote_identifiers(&record.columns)),
            self.quote_identifier(&record.referenced_table),
            self.sql_collection_between_parentheses(
                &self.quote_identifiers(&record.referenced_columns)
            ),
        );

        if let Some(action) = record.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_str());
        }
        if let Some(action) = record.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_str());
        }

        Ok(sql)
    }

    fn drop_foreign_key_sql(&self, table: &str, name: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(name)
        )
    }

    fn set_auto_increment_sql(&self, column: &Column, table: &Table) -> Result<String> {
        self.change_column_with(column, table.name(), true)
    }

    fn unset_auto_increment_sql(&self, column: &Column, table: &Table) -> Result<String> {
        self.change_column_with(column, table.name(), false)
    }

    fn create_view_sql(&self, view: &View) -> String {
        format!(
            "CREATE VIEW {} AS {}",
            self.quote_identifier(&view.name),
            view.definition
        )
    }

    fn drop_view_sql(&self, view: &str) -> String {
        format!("DROP VIEW {}", self.quote_identifier(view))
    }

    // The catalog reports plain indexes as BTREE.
    fn indexes_are_same(&self, a: &Index, b: &Index) -> bool {
        let kind = |index: &Index| index.kind.unwrap_or(IndexKind::Btree);
        a.name == b.name && a.columns == b.columns && kind(a) == kind(b)
    }

    // InnoDB treats NO ACTION as RESTRICT, which is also the default.
    fn foreign_key_actions_are_same(&self, a: &ForeignKey, b: &ForeignKey) -> bool {
        let action = |action: Option<ReferentialAction>| match action {
            None | Some(ReferentialAction::NoAction) => ReferentialAction::Restrict,
            Some(other) => other,
        };
        action(a.on_delete) == action(b.on_delete) && action(a.on_update) == action(b.on_update)
    }
}
