#![allow(dead_code)]

use std::cell::RefCell;

use dbal_core::prelude::*;

/// In-memory connection answering every batch with canned result sets.
pub struct FakeConnection {
    result_sets: Vec<Vec<ResultRow>>,
    pub batches: RefCell<Vec<Vec<String>>>,
}

impl FakeConnection {
    pub fn new(result_sets: Vec<Vec<ResultRow>>) -> Self {
        Self {
            result_sets,
            batches: RefCell::new(Vec::new()),
        }
    }

    /// A connection whose catalog describes `schema`.
    pub fn with_catalog_of(schema: &Schema) -> Self {
        Self::new(catalog_rows(schema))
    }
}

impl DatabaseConnection for FakeConnection {
    fn execute_multiple_queries(&self, queries: &[&str]) -> Result<Vec<Vec<ResultRow>>> {
        self.batches
            .borrow_mut()
            .push(queries.iter().map(ToString::to_string).collect());
        Ok(self.result_sets.clone())
    }
}

pub fn load_schema(json: &str) -> Schema {
    Schema::from_json_str(json).unwrap_or_else(|e| panic!("Invalid schema fixture: {e}"))
}

/// Renders `schema` the way the MySQL catalog reports it once created:
/// plain indexes as BTREE, default referential actions as RESTRICT, and an
/// implicit index for each foreign key not covered by another index.
pub fn catalog_rows(schema: &Schema) -> Vec<Vec<ResultRow>> {
    let dialect = MySqlDialect::new();

    let views = schema
        .views()
        .iter()
        .map(|v| {
            ResultRow::new()
                .with("viewName", v.name.as_str())
                .with("viewDefinition", v.definition.as_str())
        })
        .collect();

    let mut columns = Vec::new();
    let mut stats = Vec::new();
    let mut foreign_keys = Vec::new();

    for table in schema.tables() {
        for (i, column) in table.columns().iter().enumerate() {
            columns.push(column_row(table, i as u64 + 1, column));
        }

        if let Some(pk) = table.primary_key() {
            for (i, column) in pk.columns.iter().enumerate() {
                stats.push(stat_row(table, "PRIMARY", column, i as u64 + 1, false, "BTREE"));
            }
        }

        for index in table.indexes() {
            let (unique, kind) = match index.kind {
                Some(IndexKind::Unique) => (true, "BTREE"),
                Some(kind) => (false, kind.as_str()),
                None => (false, "BTREE"),
            };
            for (i, column) in index.columns.iter().enumerate() {
                stats.push(stat_row(table, &index.name, column, i as u64 + 1, unique, kind));
            }
        }

        for fk in table.foreign_keys() {
            let name = dialect.foreign_key_name(fk).unwrap();
            let covered = table
                .primary_key()
                .map(|pk| &pk.columns)
                .into_iter()
                .chain(table.indexes().iter().map(|i| &i.columns))
                .any(|cols| cols.starts_with(&fk.columns));
            if !covered {
                for (i, column) in fk.columns.iter().enumerate() {
                    stats.push(stat_row(table, &name, column, i as u64 + 1, false, "BTREE"));
                }
            }

            let rule = |action: Option<ReferentialAction>| {
                action.unwrap_or(ReferentialAction::Restrict).as_str()
            };
            for (i, (column, referenced)) in fk.columns.iter().zip(&fk.referenced_columns).enumerate() {
                foreign_keys.push(
                    ResultRow::new()
                        .with("constraintName", name.as_str())
                        .with("tableName", table.name())
                        .with("columnName", column.as_str())
                        .with("columnOrdinalPosition", i as u64 + 1)
                        .with("referencedTableName", fk.referenced_table.as_str())
                        .with("referencedColumnName", referenced.as_str())
                        .with("updateRule", rule(fk.on_update))
                        .with("deleteRule", rule(fk.on_delete)),
                );
            }
        }
    }

    vec![views, columns, stats, foreign_keys]
}

fn column_row(table: &Table, ordinal: u64, column: &Column) -> ResultRow {
    let column_type = column.column_type.unwrap();
    let length = column.parameters.length.map(u64::from);

    let mut raw = column_type.as_str().to_ascii_lowercase();
    if let Some(values) = &column.parameters.allowed_values {
        let quoted: Vec<String> = values
            .iter()
            .map(|v| format!("'{}'", v.replace('\'', "''")))
            .collect();
        raw.push_str(&format!("({})", quoted.join(",")));
    } else if let Some(length) = length {
        raw.push_str(&format!("({length})"));
    }
    if column.parameters.unsigned {
        raw.push_str(" unsigned");
    }

    let (char_length, precision) = if column_type.is_integer() {
        (None, length.map(|l| l - 1))
    } else if column_type == ColumnType::Bit {
        (None, length)
    } else {
        (length, None)
    };

    ResultRow::new()
        .with("tableName", table.name())
        .with("tableType", "BASE TABLE")
        .with("columnName", column.name.as_str())
        .with("columnOrdinalPosition", ordinal)
        .with("columnExtra", if column.auto_increment { "auto_increment" } else { "" })
        .with("columnDataType", column_type.as_str())
        .with("columnType", raw)
        .with("columnCharacterMaximumLength", char_length)
        .with("columnNumericPrecision", precision)
        .with(
            "columnNullable",
            if column.nullable == Some(true) { "YES" } else { "NO" },
        )
}

fn stat_row(table: &Table, index: &str, column: &str, seq: u64, unique: bool, kind: &str) -> ResultRow {
    ResultRow::new()
        .with("tableName", table.name())
        .with("tableType", "BASE TABLE")
        .with("statNonUnique", u64::from(!unique))
        .with("statIndexName", index)
        .with("statColumnName", column)
        .with("statSeqInIndex", seq)
        .with("statIndexType", kind)
}
