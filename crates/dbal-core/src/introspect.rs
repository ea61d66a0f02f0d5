//! Schema introspection from the MySQL metadata catalog.
//!
//! [`SchemaBuilder`] sends one batch of four `information_schema` queries
//! through a [`DatabaseConnection`] and assembles the rows into a [`Schema`].

use indexmap::IndexMap;
use tracing::debug;

use crate::connection::{DatabaseConnection, ResultRow};
use crate::error::{DbalError, Result};
use crate::schema::{
    Column, ColumnType, ForeignKey, Index, IndexKind, PrimaryKey, ReferentialAction, Schema, Table,
    View,
};

/// Views of the current database.
pub const VIEWS_QUERY: &str = "\
SELECT
    TABLE_NAME AS viewName,
    VIEW_DEFINITION AS viewDefinition
FROM `information_schema`.`VIEWS`
WHERE TABLE_SCHEMA = DATABASE()
ORDER BY viewName ASC";

/// Columns of every table of the current database, in ordinal order.
pub const COLUMNS_QUERY: &str = "\
SELECT
    Tables.TABLE_NAME AS tableName,
    Tables.TABLE_TYPE AS tableType,
    Columns.COLUMN_NAME AS columnName,
    Columns.ORDINAL_POSITION AS columnOrdinalPosition,
    Columns.EXTRA AS columnExtra,
    UPPER(Columns.DATA_TYPE) AS columnDataType,
    Columns.COLUMN_TYPE AS columnType,
    Columns.CHARACTER_MAXIMUM_LENGTH AS columnCharacterMaximumLength,
    Columns.NUMERIC_PRECISION AS columnNumericPrecision,
    Columns.IS_NULLABLE AS columnNullable
FROM `information_schema`.`TABLES` AS Tables
INNER JOIN `information_schema`.`COLUMNS` AS Columns
    ON Columns.TABLE_SCHEMA = Tables.TABLE_SCHEMA
        AND Columns.TABLE_NAME = Tables.TABLE_NAME
WHERE Tables.TABLE_SCHEMA = DATABASE()
ORDER BY tableName ASC, Columns.ORDINAL_POSITION ASC";

/// Index statistics of every table of the current database.
pub const INDEXES_QUERY: &str = "\
SELECT
    Tables.TABLE_NAME AS tableName,
    Tables.TABLE_TYPE AS tableType,
    Statistics.NON_UNIQUE AS statNonUnique,
    Statistics.INDEX_NAME AS statIndexName,
    Statistics.COLUMN_NAME AS statColumnName,
    Statistics.SEQ_IN_INDEX AS statSeqInIndex,
    Statistics.INDEX_TYPE AS statIndexType
FROM `information_schema`.`TABLES` AS Tables
INNER JOIN `information_schema`.`STATISTICS` AS Statistics
    ON Statistics.TABLE_SCHEMA = Tables.TABLE_SCHEMA
        AND Statistics.TABLE_NAME = Tables.TABLE_NAME
WHERE Tables.TABLE_SCHEMA = DATABASE()
ORDER BY tableName ASC, Statistics.INDEX_NAME ASC, Statistics.SEQ_IN_INDEX ASC";

/// Foreign key columns joined with their referential rules.
pub const FOREIGN_KEYS_QUERY: &str = "\
SELECT
    kcu.CONSTRAINT_NAME AS constraintName,
    kcu.TABLE_NAME AS tableName,
    kcu.COLUMN_NAME AS columnName,
    kcu.ORDINAL_POSITION AS columnOrdinalPosition,
    kcu.REFERENCED_TABLE_NAME AS referencedTableName,
    kcu.REFERENCED_COLUMN_NAME AS referencedColumnName,
    rc.UPDATE_RULE AS updateRule,
    rc.DELETE_RULE AS deleteRule
FROM `information_schema`.`KEY_COLUMN_USAGE` AS kcu
INNER JOIN `information_schema`.`REFERENTIAL_CONSTRAINTS` AS rc
    ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA
        AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
WHERE kcu.CONSTRAINT_SCHEMA = DATABASE()
    AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
ORDER BY kcu.TABLE_NAME, kcu.CONSTRAINT_NAME, kcu.REFERENCED_TABLE_NAME";

/// The catalog batch, in result-set order.
pub const CATALOG_QUERIES: [&str; 4] = [
    VIEWS_QUERY,
    COLUMNS_QUERY,
    INDEXES_QUERY,
    FOREIGN_KEYS_QUERY,
];

const BASE_TABLE: &str = "BASE TABLE";
const PRIMARY_INDEX: &str = "PRIMARY";

/// Builds a [`Schema`] from the catalog of a live database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaBuilder;

#[derive(Default)]
struct IndexGroup {
    unique: bool,
    kind: String,
    columns: Vec<(u64, String)>,
}

struct ForeignKeyGroup {
    referenced_table: String,
    columns: Vec<(u64, String, String)>,
    on_delete: ReferentialAction,
    on_update: ReferentialAction,
}

impl SchemaBuilder {
    /// Introspects the database behind `connection`.
    pub fn from_connection<C: DatabaseConnection + ?Sized>(connection: &C) -> Result<Schema> {
        let result_sets = connection.execute_multiple_queries(&CATALOG_QUERIES)?;
        Self::from_result_sets(&result_sets)
    }

    /// Assembles a schema from the result sets of [`CATALOG_QUERIES`].
    pub fn from_result_sets(result_sets: &[Vec<ResultRow>]) -> Result<Schema> {
        let [views, columns, indexes, foreign_keys] = result_sets else {
            return Err(DbalError::ResultSetCount {
                expected: CATALOG_QUERIES.len(),
                actual: result_sets.len(),
            });
        };

        let mut tables = Self::collect_columns(columns)?;
        Self::attach_indexes(&mut tables, indexes)?;
        Self::attach_foreign_keys(&mut tables, foreign_keys)?;

        let mut schema = Schema::new();
        for table in tables.into_values() {
            schema.add_table(table)?;
        }
        for row in views {
            schema.add_view(View::new(
                row.get_str("viewName")?,
                row.get_opt_str("viewDefinition")?.unwrap_or_default(),
            ))?;
        }

        debug!(
            tables = schema.tables().len(),
            views = schema.views().len(),
            "Introspected schema"
        );

        Ok(schema)
    }

    fn collect_columns(rows: &[ResultRow]) -> Result<IndexMap<String, Table>> {
        let mut columns_by_table: IndexMap<String, Vec<(u64, Column)>> = IndexMap::new();

        for row in rows {
            if row.get_str("tableType")? != BASE_TABLE {
                continue;
            }

            let table_name = row.get_str("tableName")?;
            let ordinal = row.get_u64("columnOrdinalPosition")?;
            let column = Self::column_from_row(row)?;

            columns_by_table
                .entry(table_name.to_string())
                .or_default()
                .push((ordinal, column));
        }

        let mut tables = IndexMap::with_capacity(columns_by_table.len());
        for (name, mut columns) in columns_by_table {
            columns.sort_by_key(|(ordinal, _)| *ordinal);

            let mut table = Table::new(name.clone());
            for (_, column) in columns {
                table.add_column(column)?;
            }
            tables.insert(name, table);
        }

        Ok(tables)
    }

    fn column_from_row(row: &ResultRow) -> Result<Column> {
        let name = row.get_str("columnName")?;
        let data_type = row.get_str("columnDataType")?;
        let raw_type = row.get_str("columnType")?;
        let column_type: ColumnType = data_type.parse()?;

        let mut column = Column::new(name, column_type);
        column.nullable = Some(row.get_str("columnNullable")? == "YES");
        column.auto_increment = row
            .get_opt_str("columnExtra")?
            .is_some_and(|extra| extra.to_ascii_lowercase().contains("auto_increment"));
        column.parameters.unsigned = raw_type.to_ascii_lowercase().contains("unsigned");

        if column_type.has_allowed_values() {
            column.parameters.allowed_values = Some(parse_allowed_values(raw_type));
        } else if column_type.requires_length() {
            let length = if column_type.is_integer() {
                row.get_opt_u64("columnNumericPrecision")?.map(|p| p + 1)
            } else if column_type == ColumnType::Bit {
                row.get_opt_u64("columnNumericPrecision")?
            } else {
                row.get_opt_u64("columnCharacterMaximumLength")?
            };

            column.parameters.length = length
                .map(|l| {
                    u32::try_from(l).map_err(|_| DbalError::UnexpectedValue {
                        alias: "columnCharacterMaximumLength".to_string(),
                        expected: "a 32-bit length",
                    })
                })
                .transpose()?;
        }

        Ok(column)
    }

    fn attach_indexes(tables: &mut IndexMap<String, Table>, rows: &[ResultRow]) -> Result<()> {
        let mut primary_keys: IndexMap<String, Vec<(u64, String)>> = IndexMap::new();
        let mut indexes: IndexMap<String, IndexMap<String, IndexGroup>> = IndexMap::new();

        for row in rows {
            if row.get_str("tableType")? != BASE_TABLE {
                continue;
            }

            let table_name = row.get_str("tableName")?.to_string();
            let index_name = row.get_str("statIndexName")?;
            let column_name = row.get_str("statColumnName")?.to_string();
            let seq = row.get_u64("statSeqInIndex")?;

            if index_name == PRIMARY_INDEX {
                primary_keys
                    .entry(table_name)
                    .or_default()
                    .push((seq, column_name));
                continue;
            }

            let group = indexes
                .entry(table_name)
                .or_default()
                .entry(index_name.to_string())
                .or_default();
            group.unique = row.get_u64("statNonUnique")? == 0;
            group.kind = row.get_str("statIndexType")?.to_string();
            group.columns.push((seq, column_name));
        }

        for (table_name, mut columns) in primary_keys {
            columns.sort_by_key(|(seq, _)| *seq);
            table_mut(tables, &table_name)?
                .set_primary_key(PrimaryKey::new(columns.into_iter().map(|(_, c)| c)))?;
        }

        for (table_name, groups) in indexes {
            let table = table_mut(tables, &table_name)?;
            for (index_name, mut group) in groups {
                group.columns.sort_by_key(|(seq, _)| *seq);

                let kind = if group.unique {
                    IndexKind::Unique
                } else {
                    group.kind.parse()?
                };

                let mut index = Index::new(index_name).kind(kind);
                index.columns = group.columns.into_iter().map(|(_, c)| c).collect();
                table.add_index(index)?;
            }
        }

        Ok(())
    }

    fn attach_foreign_keys(tables: &mut IndexMap<String, Table>, rows: &[ResultRow]) -> Result<()> {
        let mut foreign_keys: IndexMap<String, IndexMap<String, ForeignKeyGroup>> = IndexMap::new();

        for row in rows {
            let table_name = row.get_str("tableName")?.to_string();
            let constraint_name = row.get_str("constraintName")?.to_string();
            let position = row.get_u64("columnOrdinalPosition")?;
            let column = row.get_str("columnName")?.to_string();
            let referenced_column = row.get_str("referencedColumnName")?.to_string();

            let groups = foreign_keys.entry(table_name).or_default();
            if let Some(group) = groups.get_mut(&constraint_name) {
                group.columns.push((position, column, referenced_column));
                continue;
            }

            groups.insert(
                constraint_name,
                ForeignKeyGroup {
                    referenced_table: row.get_str("referencedTableName")?.to_string(),
                    columns: vec![(position, column, referenced_column)],
                    on_delete: row.get_str("deleteRule")?.parse()?,
                    on_update: row.get_str("updateRule")?.parse()?,
                },
            );
        }

        for (table_name, groups) in foreign_keys {
            if !tables.contains_key(&table_name) {
                return Err(DbalError::UnknownTable(table_name));
            }

            for (constraint_name, mut group) in groups {
                group.columns.sort_by_key(|(position, _, _)| *position);

                let referenced = tables
                    .get(&group.referenced_table)
                    .ok_or_else(|| DbalError::UnknownTable(group.referenced_table.clone()))?;

                let mut foreign_key = ForeignKey::new(group.referenced_table.clone())
                    .named(constraint_name)
                    .on_delete(group.on_delete)
                    .on_update(group.on_update);

                for (_, column, referenced_column) in group.columns {
                    if referenced.column(&referenced_column).is_none() {
                        return Err(DbalError::UnknownColumn {
                            table: group.referenced_table,
                            column: referenced_column,
                        });
                    }
                    foreign_key = foreign_key.column(column, referenced_column);
                }

                table_mut(tables, &table_name)?.add_foreign_key(foreign_key)?;
            }
        }

        Ok(())
    }
}

fn table_mut<'a>(tables: &'a mut IndexMap<String, Table>, name: &str) -> Result<&'a mut Table> {
    tables
        .get_mut(name)
        .ok_or_else(|| DbalError::UnknownTable(name.to_string()))
}

/// Parses the value list of a raw `enum('a','b')` or `set('a','b')` type.
///
/// Values are split on `','`, so a value that itself contains a quote, a
/// comma and a quote (stored as `'',''`) comes back as two values.
fn parse_allowed_values(raw_type: &str) -> Vec<String> {
    let inner = match (raw_type.find('('), raw_type.rfind(')')) {
        (Some(open), Some(close)) if open < close => &raw_type[open + 1..close],
        _ => return Vec::new(),
    };

    let inner = inner.strip_prefix('\'').unwrap_or(inner);
    let inner = inner.strip_suffix('\'').unwrap_or(inner);

    inner
        .split("','")
        .map(|value| value.replace("''", "'"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Value;

    fn column_row(table: &str, ordinal: u64, name: &str, data_type: &str, raw: &str) -> ResultRow {
        ResultRow::new()
            .with("tableName", table)
            .with("tableType", BASE_TABLE)
            .with("columnName", name)
            .with("columnOrdinalPosition", ordinal)
            .with("columnExtra", "")
            .with("columnDataType", data_type)
            .with("columnType", raw)
            .with("columnCharacterMaximumLength", Value::Null)
            .with("columnNumericPrecision", Value::Null)
            .with("columnNullable", "NO")
    }

    fn stat_row(table: &str, index: &str, column: &str, seq: u64, non_unique: u64) -> ResultRow {
        ResultRow::new()
            .with("tableName", table)
            .with("tableType", BASE_TABLE)
            .with("statNonUnique", non_unique)
            .with("statIndexName", index)
            .with("statColumnName", column)
            .with("statSeqInIndex", seq)
            .with("statIndexType", "BTREE")
    }

    #[test]
    fn test_parse_allowed_values() {
        assert_eq!(parse_allowed_values("enum('a','b')"), vec!["a", "b"]);
        assert_eq!(parse_allowed_values("set('x')"), vec!["x"]);
        assert_eq!(parse_allowed_values("enum('it''s','a,b')"), vec!["it's", "a,b"]);
        // The value `a','b` cannot be told apart from two values.
        assert_eq!(parse_allowed_values("enum('a'',''b')"), vec!["a'", "'b"]);
    }

    #[test]
    fn test_wrong_result_set_count() {
        let err = SchemaBuilder::from_result_sets(&[Vec::new(), Vec::new()]).unwrap_err();
        assert_eq!(err.to_string(), "Expected 4 result sets, got 2.");
    }

    #[test]
    fn test_column_lengths() {
        let columns = vec![
            column_row("t", 1, "id", "INT", "int unsigned")
                .with("columnNumericPrecision", 10_u64)
                .with("columnExtra", "auto_increment"),
            column_row("t", 2, "name", "VARCHAR", "varchar(64)")
                .with("columnCharacterMaximumLength", 64_u64)
                .with("columnNullable", "YES"),
            column_row("t", 3, "state", "ENUM", "enum('on','off')")
                .with("columnCharacterMaximumLength", 3_u64),
            column_row("t", 4, "body", "TEXT", "text")
                .with("columnCharacterMaximumLength", 65535_u64),
        ];

        let schema =
            SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), Vec::new()]).unwrap();
        let table = schema.table("t").unwrap();

        let id = table.column("id").unwrap();
        assert_eq!(id.parameters.length, Some(11));
        assert!(id.parameters.unsigned);
        assert!(id.auto_increment);
        assert_eq!(id.nullable, Some(false));

        let name = table.column("name").unwrap();
        assert_eq!(name.parameters.length, Some(64));
        assert_eq!(name.nullable, Some(true));

        let state = table.column("state").unwrap();
        assert_eq!(state.parameters.length, None);
        assert_eq!(
            state.parameters.allowed_values,
            Some(vec!["on".to_string(), "off".to_string()])
        );

        assert_eq!(table.column("body").unwrap().parameters.length, None);
    }

    #[test]
    fn test_columns_follow_ordinal_position() {
        let columns = vec![
            column_row("t", 2, "b", "DATE", "date"),
            column_row("t", 1, "a", "DATE", "date"),
        ];

        let schema =
            SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), Vec::new()]).unwrap();
        let names: Vec<_> = schema.tables()[0].columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_views_are_not_tables() {
        let columns = vec![
            column_row("t", 1, "a", "DATE", "date"),
            column_row("v", 1, "a", "DATE", "date").with("tableType", "VIEW"),
        ];
        let views = vec![ResultRow::new()
            .with("viewName", "v")
            .with("viewDefinition", "select `a` from `t`")];

        let schema = SchemaBuilder::from_result_sets(&[views, columns, Vec::new(), Vec::new()]).unwrap();
        assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["t"]);
        assert_eq!(schema.view("v").unwrap().definition, "select `a` from `t`");
    }

    #[test]
    fn test_indexes_and_primary_key() {
        let columns = vec![
            column_row("t", 1, "a", "DATE", "date"),
            column_row("t", 2, "b", "DATE", "date"),
        ];
        let stats = vec![
            stat_row("t", "PRIMARY", "b", 2, 0),
            stat_row("t", "PRIMARY", "a", 1, 0),
            stat_row("t", "uniq_b", "b", 1, 0),
            stat_row("t", "idx_ab", "a", 1, 1),
            stat_row("t", "idx_ab", "b", 2, 1),
            stat_row("t", "ft_b", "b", 1, 1).with("statIndexType", "FULLTEXT"),
        ];

        let schema = SchemaBuilder::from_result_sets(&[Vec::new(), columns, stats, Vec::new()]).unwrap();
        let table = schema.table("t").unwrap();

        assert_eq!(table.primary_key().unwrap().columns, vec!["a", "b"]);
        assert_eq!(table.index("uniq_b").unwrap().kind, Some(IndexKind::Unique));
        assert_eq!(table.index("idx_ab").unwrap().kind, Some(IndexKind::Btree));
        assert_eq!(table.index("idx_ab").unwrap().columns, vec!["a", "b"]);
        assert_eq!(table.index("ft_b").unwrap().kind, Some(IndexKind::Fulltext));
    }

    #[test]
    fn test_foreign_keys() {
        let columns = vec![
            column_row("posts", 1, "id", "INT", "int"),
            column_row("posts", 2, "author_id", "INT", "int"),
            column_row("users", 1, "id", "INT", "int"),
        ];
        let fks = vec![ResultRow::new()
            .with("constraintName", "posts_author")
            .with("tableName", "posts")
            .with("columnName", "author_id")
            .with("columnOrdinalPosition", 1_u64)
            .with("referencedTableName", "users")
            .with("referencedColumnName", "id")
            .with("updateRule", "NO ACTION")
            .with("deleteRule", "CASCADE")];

        let schema = SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), fks]).unwrap();
        let fk = &schema.table("posts").unwrap().foreign_keys()[0];

        assert_eq!(fk.name.as_deref(), Some("posts_author"));
        assert_eq!(fk.table(), Some("posts"));
        assert_eq!(fk.columns, vec!["author_id"]);
        assert_eq!(fk.referenced_table, "users");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert_eq!(fk.on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(fk.on_update, Some(ReferentialAction::NoAction));
    }

    #[test]
    fn test_foreign_key_to_missing_table() {
        let columns = vec![column_row("posts", 1, "author_id", "INT", "int")];
        let fks = vec![ResultRow::new()
            .with("constraintName", "posts_author")
            .with("tableName", "posts")
            .with("columnName", "author_id")
            .with("columnOrdinalPosition", 1_u64)
            .with("referencedTableName", "users")
            .with("referencedColumnName", "id")
            .with("updateRule", "RESTRICT")
            .with("deleteRule", "RESTRICT")];

        let err = SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), fks]).unwrap_err();
        assert_eq!(err.to_string(), "Found no table with name \"users\".");
    }

    #[test]
    fn test_foreign_key_of_unknown_owner() {
        let columns = vec![column_row("users", 1, "id", "INT", "int")];
        let fks = vec![ResultRow::new()
            .with("constraintName", "ghost_user")
            .with("tableName", "ghost")
            .with("columnName", "user_id")
            .with("columnOrdinalPosition", 1_u64)
            .with("referencedTableName", "users")
            .with("referencedColumnName", "id")
            .with("updateRule", "RESTRICT")
            .with("deleteRule", "RESTRICT")];

        let err = SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), fks]).unwrap_err();
        assert_eq!(err.to_string(), "Found no table with name \"ghost\".");
    }

    #[test]
    fn test_missing_alias_is_reported() {
        let columns = vec![ResultRow::new().with("tableName", "t")];
        let err =
            SchemaBuilder::from_result_sets(&[Vec::new(), columns, Vec::new(), Vec::new()]).unwrap_err();
        assert_eq!(err.to_string(), "Found no column alias \"tableType\" in result row.");
    }
}
