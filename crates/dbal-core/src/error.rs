//! Error types for schema modeling, introspection and SQL generation.

use std::path::PathBuf;

/// Errors that can occur while building, introspecting or rendering a schema.
#[derive(Debug, thiserror::Error)]
pub enum DbalError {
    /// Column SQL was requested for a column that belongs to no table.
    #[error("A table is required to generate column SQL.")]
    ColumnTableRequired,

    /// Column SQL was requested for a column without a name.
    #[error("A column name is required for column from table \"{table}\".")]
    ColumnNameRequired {
        /// Owning table.
        table: String,
    },

    /// Column SQL was requested for a column without a type.
    #[error("A column type is required for column \"{column}\" from table \"{table}\".")]
    ColumnTypeRequired {
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// Column SQL was requested before nullability was set.
    #[error("Nullable is required for column \"{column}\" from table \"{table}\".")]
    ColumnNullableRequired {
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// A type-specific column parameter is missing.
    #[error("Parameter {parameter} is required for column \"{column}\" from table \"{table}\".")]
    ColumnParameterRequired {
        /// Parameter name (e.g. `allowedValues`).
        parameter: &'static str,
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// A column carries a parameter its type has no slot for.
    #[error("Parameter {parameter} is not allowed for column \"{column}\" from table \"{table}\".")]
    ColumnParameterNotAllowed {
        /// Parameter name.
        parameter: &'static str,
        /// Owning table.
        table: String,
        /// Offending column.
        column: String,
    },

    /// Serialization of a column that belongs to no table.
    #[error("Missing table for column \"{0}\".")]
    MissingTableForColumn(String),

    /// Index SQL was requested for an index that belongs to no table.
    #[error("A table is required to generate index SQL.")]
    IndexTableRequired,

    /// Index SQL was requested for an index without a name.
    #[error("An index name is required for index from table \"{table}\".")]
    IndexNameRequired {
        /// Owning table.
        table: String,
    },

    /// Index SQL was requested for an index without columns.
    #[error("Index \"{index}\" from table \"{table}\" requires at least one column.")]
    IndexColumnsRequired {
        /// Owning table.
        table: String,
        /// Offending index.
        index: String,
    },

    /// Foreign key serialized or rendered without an owning table.
    #[error("A table is required for foreign key.")]
    ForeignKeyTableRequired,

    /// Foreign key serialized or rendered without a referenced table.
    #[error("A referenced table is required for foreign key from table \"{table}\".")]
    ForeignKeyReferencedTableRequired {
        /// Owning table.
        table: String,
    },

    /// Foreign key column lists have different lengths.
    #[error(
        "Foreign key from table \"{table}\" has {columns} column(s) but {referenced} referenced column(s)."
    )]
    ForeignKeyArity {
        /// Owning table.
        table: String,
        /// Number of owning columns.
        columns: usize,
        /// Number of referenced columns.
        referenced: usize,
    },

    /// Foreign key without any column.
    #[error("Foreign key from table \"{table}\" requires at least one column.")]
    ForeignKeyColumnsRequired {
        /// Owning table.
        table: String,
    },

    /// A table was added to a schema without a name.
    #[error("A table name is required.")]
    TableNameRequired,

    /// A table with the same name already exists in the schema.
    #[error("Table \"{0}\" already exists.")]
    DuplicateTable(String),

    /// A view with the same name already exists in the schema.
    #[error("View \"{0}\" already exists.")]
    DuplicateView(String),

    /// A column with the same name already exists in the table.
    #[error("Column \"{column}\" already exists in table \"{table}\".")]
    DuplicateColumn {
        /// Owning table.
        table: String,
        /// Duplicated column.
        column: String,
    },

    /// An index with the same name already exists in the table.
    #[error("Index \"{index}\" already exists in table \"{table}\".")]
    DuplicateIndex {
        /// Owning table.
        table: String,
        /// Duplicated index.
        index: String,
    },

    /// A table name was looked up and not found.
    #[error("Found no table with name \"{0}\".")]
    UnknownTable(String),

    /// A column name was looked up and not found.
    #[error("Found no column with name \"{column}\" in table \"{table}\".")]
    UnknownColumn {
        /// Table searched.
        table: String,
        /// Missing column.
        column: String,
    },

    /// A result row has no cell with the requested alias.
    #[error("Found no column alias \"{0}\" in result row.")]
    UnknownColumnAlias(String),

    /// A result row cell has an unexpected type.
    #[error("Unexpected value for column alias \"{alias}\": expected {expected}.")]
    UnexpectedValue {
        /// Column alias.
        alias: String,
        /// Expected kind of value.
        expected: &'static str,
    },

    /// The connection returned the wrong number of result sets.
    #[error("Expected {expected} result sets, got {actual}.")]
    ResultSetCount {
        /// Number of statements sent.
        expected: usize,
        /// Number of result sets received.
        actual: usize,
    },

    /// A catalog column type token is not modeled.
    #[error("Unsupported column type \"{0}\".")]
    UnsupportedColumnType(String),

    /// A catalog index type token is not modeled.
    #[error("Unsupported index kind \"{0}\".")]
    UnsupportedIndexKind(String),

    /// A catalog referential action is not modeled.
    #[error("Unsupported referential action \"{0}\".")]
    UnsupportedReferentialAction(String),

    /// A configured connection has no name.
    #[error("Missing name for connection.")]
    MissingConnectionName,

    /// Two configured connections share a name.
    #[error("Duplicate database connection name \"{0}\".")]
    DuplicateConnection(String),

    /// No connection is configured under the requested name.
    #[error("Found no database connection with name \"{0}\".")]
    UnknownConnection(String),

    /// No driver is registered under the requested name.
    #[error("Found no driver with name \"{0}\".")]
    UnknownDriver(String),

    /// A connection option the driver does not understand.
    #[error("Unknown option \"{option}\" for driver \"{driver}\".")]
    UnknownOption {
        /// Driver name.
        driver: String,
        /// Offending option.
        option: String,
    },

    /// Failed to read a configuration or schema file.
    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error reported by the database connection.
    #[error("Database error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for dbal operations.
pub type Result<T> = std::result::Result<T, DbalError>;
