//! Migration planning.
//!
//! [`MigrationBuilder`] compares the schema read from a database with the
//! desired schema and produces the DDL statements turning one into the other.
//!
//! Tables, columns, indexes and views are matched by name. Foreign keys are
//! matched by their deterministic structural name, so constraint names found
//! in the catalog do not matter.
//!
//! Statements are emitted in dependency order:
//!
//! 1. drop foreign keys that disappear, change, or depend on a dropped or
//!    changed column, key or table
//! 2. drop views that disappear or change
//! 3. unset AUTO_INCREMENT on retained columns that lose it or whose key moves
//! 4. drop indexes, then primary keys, that disappear or change
//! 5. drop tables
//! 6. drop columns
//! 7. create tables
//! 8. add columns
//! 9. change columns
//! 10. add primary keys, then indexes
//! 11. set AUTO_INCREMENT
//! 12. add foreign keys
//! 13. create views
//!
//! Columns are always created and changed without AUTO_INCREMENT; the flag is
//! toggled separately once the keys are in place.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::dialect::MigrationDialect;
use crate::error::Result;
use crate::schema::{Column, ForeignKey, Schema, Table};

/// Builds migration plans for one dialect.
#[derive(Debug, Clone, Default)]
pub struct MigrationBuilder<D: MigrationDialect> {
    dialect: D,
}

/// A table present in both schemas.
struct RetainedTable<'a> {
    current: &'a Table,
    desired: &'a Table,
    dropped_columns: HashSet<&'a str>,
    changed_columns: HashSet<&'a str>,
    dropped_indexes: HashSet<&'a str>,
    primary_key_changed: bool,
}

impl RetainedTable<'_> {
    fn touches(&self, columns: &[String]) -> bool {
        columns.iter().any(|c| {
            self.dropped_columns.contains(c.as_str()) || self.changed_columns.contains(c.as_str())
        })
    }

    /// Whether a key whose leading columns are `columns` is dropped.
    fn drops_key_for(&self, columns: &[String]) -> bool {
        let primary_key = self.primary_key_changed
            && self
                .current
                .primary_key()
                .is_some_and(|pk| pk.columns.starts_with(columns));

        primary_key
            || self.current.indexes().iter().any(|index| {
                self.dropped_indexes.contains(index.name.as_str())
                    && index.columns.starts_with(columns)
            })
    }

    /// Whether `column` belongs to a key that is dropped.
    fn drops_key_containing(&self, column: &str) -> bool {
        let in_primary_key = self
            .current
            .primary_key()
            .is_some_and(|pk| pk.columns.iter().any(|c| c == column));

        (self.primary_key_changed && in_primary_key)
            || self.current.indexes().iter().any(|index| {
                self.dropped_indexes.contains(index.name.as_str())
                    && index.columns.iter().any(|c| c == column)
            })
    }
}

impl<D: MigrationDialect> MigrationBuilder<D> {
    /// Creates a builder for the given dialect.
    #[must_use]
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns the plan framed by transaction statements, or nothing when the
    /// schemas already match.
    pub fn build(&self, current: &Schema, desired: &Schema) -> Result<Vec<String>> {
        let statements = self.diff(current, desired)?;
        if statements.is_empty() {
            info!("Schema is up to date");
            return Ok(statements);
        }

        info!(statements = statements.len(), "Built migration plan");

        let mut framed = Vec::with_capacity(statements.len() + 2);
        framed.push(self.dialect.start_transaction_sql().to_string());
        framed.extend(statements);
        framed.push(self.dialect.commit_sql().to_string());
        Ok(framed)
    }

    /// Returns the ordered statements turning `current` into `desired`.
    pub fn diff(&self, current: &Schema, desired: &Schema) -> Result<Vec<String>> {
        desired.validate()?;

        let d = &self.dialect;
        let mut sql = Vec::new();

        // Foreign keys, keyed by (table, structural name). MySQL backs each
        // constraint with an index of the same name, which is never dropped
        // while a foreign key of that name is wanted.
        let mut desired_fks: HashMap<(&str, String), &ForeignKey> = HashMap::new();
        let mut fk_index_names: HashSet<(&str, String)> = HashSet::new();
        for table in desired.tables() {
            for fk in table.foreign_keys() {
                let key = d.foreign_key_name(fk)?;
                fk_index_names.insert((table.name(), key.clone()));
                desired_fks.insert((table.name(), key), fk);
            }
        }

        let mut retained = self.retained_tables(current, desired);
        for r in &mut retained {
            r.dropped_indexes = self.dropped_indexes(r.current, r.desired, &fk_index_names);
        }
        let retained_by_name: HashMap<&str, &RetainedTable<'_>> =
            retained.iter().map(|r| (r.current.name(), r)).collect();
        let dropped_tables: Vec<&Table> = current
            .tables()
            .iter()
            .filter(|t| desired.table(t.name()).is_none())
            .collect();
        let new_tables: Vec<&Table> = desired
            .tables()
            .iter()
            .filter(|t| current.table(t.name()).is_none())
            .collect();

        let mut retained_fks: HashSet<(&str, String)> = HashSet::new();

        // 1. Drop foreign keys
        for table in current.tables() {
            for fk in table.foreign_keys() {
                let key = d.foreign_key_name(fk)?;
                let keep = match (
                    retained_by_name.get(table.name()),
                    desired_fks.get(&(table.name(), key.clone())),
                ) {
                    (Some(owner), Some(wanted)) => {
                        d.foreign_key_actions_are_same(fk, wanted)
                            && !owner.touches(&fk.columns)
                            && !owner.drops_key_for(&fk.columns)
                            && retained_by_name
                                .get(fk.referenced_table.as_str())
                                .is_some_and(|r| {
                                    !r.touches(&fk.referenced_columns)
                                        && !r.drops_key_for(&fk.referenced_columns)
                                })
                    }
                    _ => false,
                };

                if keep {
                    if let Some(name) = &fk.name {
                        fk_index_names.insert((table.name(), name.clone()));
                    }
                    retained_fks.insert((table.name(), key));
                } else {
                    let name = fk.name.clone().unwrap_or(key);
                    debug!(table = table.name(), foreign_key = %name, "Dropping foreign key");
                    sql.push(d.drop_foreign_key_sql(table.name(), &name));
                }
            }
        }

        // 2. Drop views
        for view in current.views() {
            if desired.view(&view.name) != Some(view) {
                sql.push(d.drop_view_sql(&view.name));
            }
        }

        // 3. Unset auto-increment
        let mut unset_auto_increment: HashSet<(&str, &str)> = HashSet::new();
        for r in &retained {
            for column in r.current.columns().iter().filter(|c| c.auto_increment) {
                // MySQL refuses to drop the key of an AUTO_INCREMENT column.
                let unset = match r.desired.column(&column.name) {
                    Some(wanted) => {
                        !wanted.auto_increment
                            || r.changed_columns.contains(column.name.as_str())
                            || r.primary_key_changed
                            || r.drops_key_containing(&column.name)
                    }
                    None => r.drops_key_containing(&column.name),
                };
                if unset {
                    sql.push(d.unset_auto_increment_sql(column, r.current)?);
                    unset_auto_increment.insert((r.current.name(), column.name.as_str()));
                }
            }
        }

        // 4. Drop indexes, then primary keys
        for r in &retained {
            for index in r.current.indexes() {
                match r.desired.index(&index.name) {
                    Some(wanted) if d.indexes_are_same(index, wanted) => {}
                    None if fk_index_names.contains(&(r.current.name(), index.name.clone())) => {}
                    _ => sql.push(d.drop_index_sql(r.current.name(), &index.name)),
                }
            }
        }
        for r in &retained {
            if r.primary_key_changed && r.current.primary_key().is_some() {
                sql.push(d.drop_primary_key_sql(r.current.name()));
            }
        }

        // 5. Drop tables
        for table in &dropped_tables {
            debug!(table = table.name(), "Dropping table");
            sql.push(d.drop_table_sql(table.name()));
        }

        // 6. Drop columns
        for r in &retained {
            for column in r.current.columns() {
                if r.dropped_columns.contains(column.name.as_str()) {
                    sql.push(d.drop_column_sql(r.current.name(), &column.name));
                }
            }
        }

        // 7. Create tables
        for table in &new_tables {
            debug!(table = table.name(), "Creating table");
            sql.push(d.create_table_sql(table)?);
        }

        // 8. Add columns
        for r in &retained {
            for column in r.desired.columns() {
                if r.current.column(&column.name).is_none() {
                    debug!(table = r.desired.name(), column = %column.name, "Adding column");
                    sql.push(d.add_column_sql(&without_auto_increment(column))?);
                }
            }
        }

        // 9. Change columns
        for r in &retained {
            for column in r.desired.columns() {
                if r.changed_columns.contains(column.name.as_str()) {
                    debug!(table = r.desired.name(), column = %column.name, "Changing column");
                    sql.push(d.change_column_sql(&without_auto_increment(column))?);
                }
            }
        }

        // 10. Add primary keys, then indexes
        for r in &retained {
            if r.primary_key_changed {
                if let Some(pk) = r.desired.primary_key() {
                    sql.push(d.add_primary_key_sql(r.desired.name(), pk));
                }
            }
        }
        for table in desired.tables() {
            let current_table = retained_by_name.get(table.name()).map(|r| r.current);
            for index in table.indexes() {
                let existing = current_table.and_then(|t| t.index(&index.name));
                if !existing.is_some_and(|e| d.indexes_are_same(e, index)) {
                    sql.push(d.add_index_sql(index)?);
                }
            }
        }

        // 11. Set auto-increment
        for table in desired.tables() {
            let current_table = retained_by_name.get(table.name()).map(|r| r.current);
            for column in table.columns().iter().filter(|c| c.auto_increment) {
                let had_it = current_table
                    .and_then(|t| t.column(&column.name))
                    .is_some_and(|c| c.auto_increment);
                if !had_it || unset_auto_increment.contains(&(table.name(), column.name.as_str())) {
                    sql.push(d.set_auto_increment_sql(column, table)?);
                }
            }
        }

        // 12. Add foreign keys
        for table in desired.tables() {
            for fk in table.foreign_keys() {
                let key = d.foreign_key_name(fk)?;
                if !retained_fks.contains(&(table.name(), key)) {
                    sql.push(d.add_foreign_key_sql(fk)?);
                }
            }
        }

        // 13. Create views
        for view in desired.views() {
            if current.view(&view.name) != Some(view) {
                sql.push(d.create_view_sql(view));
            }
        }

        debug!(
            dialect = d.name(),
            dropped_tables = dropped_tables.len(),
            new_tables = new_tables.len(),
            statements = sql.len(),
            "Computed schema diff"
        );

        Ok(sql)
    }

    fn retained_tables<'a>(&self, current: &'a Schema, desired: &'a Schema) -> Vec<RetainedTable<'a>> {
        current
            .tables()
            .iter()
            .filter_map(|current| {
                let desired = desired.table(current.name())?;

                let dropped_columns = current
                    .columns()
                    .iter()
                    .filter(|c| desired.column(&c.name).is_none())
                    .map(|c| c.name.as_str())
                    .collect();

                let changed_columns = current
                    .columns()
                    .iter()
                    .filter_map(|c| {
                        let wanted = desired.column(&c.name)?;
                        (!self.dialect.columns_are_same_ignore_auto_increment(c, wanted))
                            .then_some(c.name.as_str())
                    })
                    .collect();

                Some(RetainedTable {
                    current,
                    desired,
                    dropped_columns,
                    changed_columns,
                    dropped_indexes: HashSet::new(),
                    primary_key_changed: current.primary_key() != desired.primary_key(),
                })
            })
            .collect()
    }

    /// Indexes of `current` that are dropped on the way to `desired`. An index
    /// missing from `desired` but named like a foreign key of the table is
    /// MySQL's implicit constraint index and stays.
    fn dropped_indexes<'a>(
        &self,
        current: &'a Table,
        desired: &Table,
        fk_index_names: &HashSet<(&str, String)>,
    ) -> HashSet<&'a str> {
        current
            .indexes()
            .iter()
            .filter(|index| match desired.index(&index.name) {
                Some(wanted) => !self.dialect.indexes_are_same(index, wanted),
                None => {
                    !fk_index_names.contains(&(current.name(), index.name.clone()))
                        && !current
                            .foreign_keys()
                            .iter()
                            .any(|fk| fk.name.as_deref() == Some(index.name.as_str()))
                }
            })
            .map(|index| index.name.as_str())
            .collect()
    }
}

fn without_auto_increment(column: &Column) -> Column {
    let mut column = column.clone();
    column.auto_increment = false;
    column
}
