//! Schema graph types.
//!
//! These types describe tables, columns, keys and views. They are used both
//! for the schema read back from a live database and for the desired schema a
//! migration should produce. The graph is dialect-neutral; SQL rendering lives
//! in [`crate::dialect`].
//!
//! Ownership flows from [`Schema`] to [`Table`] to its columns, keys and
//! indexes. Children refer back to their table by name only.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DbalError, Result};

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,
    Bit,
    Char,
    Varchar,
    Binary,
    VarBinary,
    TinyText,
    Text,
    MediumText,
    LongText,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Enum,
    Set,
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,
    Json,
    Geometry,
    Point,
    LineString,
    Polygon,
}

impl ColumnType {
    /// Returns the SQL keyword for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::MediumInt => "MEDIUMINT",
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::Decimal => "DECIMAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Bit => "BIT",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::TinyText => "TINYTEXT",
            Self::Text => "TEXT",
            Self::MediumText => "MEDIUMTEXT",
            Self::LongText => "LONGTEXT",
            Self::TinyBlob => "TINYBLOB",
            Self::Blob => "BLOB",
            Self::MediumBlob => "MEDIUMBLOB",
            Self::LongBlob => "LONGBLOB",
            Self::Enum => "ENUM",
            Self::Set => "SET",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Time => "TIME",
            Self::Year => "YEAR",
            Self::Json => "JSON",
            Self::Geometry => "GEOMETRY",
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
        }
    }

    /// Returns whether this is one of the integer types.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::MediumInt | Self::Int | Self::BigInt
        )
    }

    /// Returns whether the type takes a value list instead of a numeric length.
    #[must_use]
    pub fn has_allowed_values(&self) -> bool {
        matches!(self, Self::Enum | Self::Set)
    }

    /// Returns whether the type has a length slot in its SQL rendering.
    #[must_use]
    pub fn requires_length(&self) -> bool {
        self.is_integer()
            || self.has_allowed_values()
            || matches!(
                self,
                Self::Bit | Self::Char | Self::Varchar | Self::Binary | Self::VarBinary
            )
    }

    /// Returns whether the type takes a numeric `length` parameter. ENUM and
    /// SET fill their length slot with the allowed values instead.
    #[must_use]
    pub fn accepts_length(&self) -> bool {
        self.requires_length() && !self.has_allowed_values()
    }

    /// Returns whether the `UNSIGNED` attribute applies to this type.
    #[must_use]
    pub fn supports_unsigned(&self) -> bool {
        self.is_integer() || matches!(self, Self::Decimal | Self::Float | Self::Double)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = DbalError;

    fn from_str(s: &str) -> Result<Self> {
        let column_type = match s.to_ascii_uppercase().as_str() {
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "MEDIUMINT" => Self::MediumInt,
            "INT" | "INTEGER" => Self::Int,
            "BIGINT" => Self::BigInt,
            "DECIMAL" | "NUMERIC" => Self::Decimal,
            "FLOAT" => Self::Float,
            "DOUBLE" | "REAL" => Self::Double,
            "BIT" => Self::Bit,
            "CHAR" => Self::Char,
            "VARCHAR" => Self::Varchar,
            "BINARY" => Self::Binary,
            "VARBINARY" => Self::VarBinary,
            "TINYTEXT" => Self::TinyText,
            "TEXT" => Self::Text,
            "MEDIUMTEXT" => Self::MediumText,
            "LONGTEXT" => Self::LongText,
            "TINYBLOB" => Self::TinyBlob,
            "BLOB" => Self::Blob,
            "MEDIUMBLOB" => Self::MediumBlob,
            "LONGBLOB" => Self::LongBlob,
            "ENUM" => Self::Enum,
            "SET" => Self::Set,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "YEAR" => Self::Year,
            "JSON" => Self::Json,
            "GEOMETRY" => Self::Geometry,
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            _ => return Err(DbalError::UnsupportedColumnType(s.to_string())),
        };
        Ok(column_type)
    }
}

/// Type-dependent column parameters.
///
/// `length` fills the length slot of length-bearing types, `allowed_values`
/// the value list of ENUM and SET columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub unsigned: bool,
}

/// A table column.
///
/// Every attribute may be missing while the column is being built; SQL
/// generation checks them in a fixed order and reports the first one missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name. Empty means unset.
    #[serde(default)]
    pub name: String,
    /// Data type.
    #[serde(rename = "type", default)]
    pub column_type: Option<ColumnType>,
    /// Whether the column allows NULL values.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Whether this column auto-increments.
    #[serde(default)]
    pub auto_increment: bool,
    /// Type-dependent parameters.
    #[serde(default)]
    pub parameters: ColumnParameters,
    #[serde(skip)]
    table: Option<String>,
}

impl Column {
    /// Creates a nullable column of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type: Some(column_type),
            nullable: Some(true),
            ..Self::default()
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    /// Sets the column as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the length parameter.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.parameters.length = Some(length);
        self
    }

    /// Sets the UNSIGNED attribute.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.parameters.unsigned = true;
        self
    }

    /// Sets the values allowed in an ENUM or SET column.
    #[must_use]
    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the name of the owning table, if attached.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Points the column at its owning table.
    ///
    /// [`Table::add_column`] maintains this for columns it owns.
    pub fn set_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Returns the canonical record of this column.
    pub fn to_record(&self) -> Result<ColumnRecord> {
        let table = self
            .table
            .clone()
            .ok_or_else(|| DbalError::MissingTableForColumn(self.name.clone()))?;

        Ok(ColumnRecord {
            name: self.name.clone(),
            column_type: self.column_type,
            nullable: self.nullable,
            parameters: self.parameters.clone(),
            auto_increment: self.auto_increment,
            table,
        })
    }
}

/// Canonical, order-preserving record of a [`Column`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
    pub nullable: Option<bool>,
    pub parameters: ColumnParameters,
    pub auto_increment: bool,
    pub table: String,
}

/// Index kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Btree,
    Hash,
    Fulltext,
    Spatial,
    Unique,
}

impl IndexKind {
    /// Returns the SQL keyword for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btree => "BTREE",
            Self::Hash => "HASH",
            Self::Fulltext => "FULLTEXT",
            Self::Spatial => "SPATIAL",
            Self::Unique => "UNIQUE",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = DbalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BTREE" => Ok(Self::Btree),
            "HASH" => Ok(Self::Hash),
            "FULLTEXT" => Ok(Self::Fulltext),
            "SPATIAL" => Ok(Self::Spatial),
            "UNIQUE" => Ok(Self::Unique),
            _ => Err(DbalError::UnsupportedIndexKind(s.to_string())),
        }
    }
}

/// A secondary index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name. Empty means unset.
    #[serde(default)]
    pub name: String,
    /// Indexed column names, in index order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Index kind. `None` is a plain index.
    #[serde(default)]
    pub kind: Option<IndexKind>,
    #[serde(skip)]
    table: Option<String>,
}

impl Index {
    /// Creates a plain index without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn kind(mut self, kind: IndexKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns the name of the owning table, if attached.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Points the index at its owning table.
    pub fn set_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }
}

/// A table's primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    /// Key column names, in key order.
    pub columns: Vec<String>,
}

impl PrimaryKey {
    /// Creates a primary key over the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferentialAction {
    type Err = DbalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "RESTRICT" => Ok(Self::Restrict),
            "NO ACTION" => Ok(Self::NoAction),
            "SET DEFAULT" => Ok(Self::SetDefault),
            _ => Err(DbalError::UnsupportedReferentialAction(s.to_string())),
        }
    }
}

/// A foreign key constraint.
///
/// `columns[i]` references `referenced_columns[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name as found in the catalog. Generated names are derived
    /// from the structure instead, see
    /// [`MySqlDialect::foreign_key_unique_name`](crate::dialect::MySqlDialect::foreign_key_unique_name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Referencing column names of the owning table.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Referenced table name. Empty means unset.
    #[serde(default)]
    pub referenced_table: String,
    /// Referenced column names.
    #[serde(default)]
    pub referenced_columns: Vec<String>,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,
    /// Action on update.
    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
    #[serde(skip)]
    table: Option<String>,
}

impl ForeignKey {
    /// Creates a foreign key referencing the given table.
    #[must_use]
    pub fn new(referenced_table: impl Into<String>) -> Self {
        Self {
            referenced_table: referenced_table.into(),
            ..Self::default()
        }
    }

    /// Appends a referencing/referenced column pair.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self.referenced_columns.push(referenced.into());
        self
    }

    /// Sets the action on delete.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the action on update.
    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Sets the catalog constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the name of the owning table, if attached.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Points the foreign key at its owning table.
    pub fn set_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Returns the canonical record of this foreign key.
    pub fn to_record(&self) -> Result<ForeignKeyRecord> {
        let table = self
            .table
            .clone()
            .ok_or(DbalError::ForeignKeyTableRequired)?;

        if self.referenced_table.is_empty() {
            return Err(DbalError::ForeignKeyReferencedTableRequired { table });
        }

        Ok(ForeignKeyRecord {
            table,
            columns: self.columns.clone(),
            referenced_table: self.referenced_table.clone(),
            referenced_columns: self.referenced_columns.clone(),
            on_delete: self.on_delete,
            on_update: self.on_update,
        })
    }
}

/// Canonical, order-preserving record of a [`ForeignKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRecord {
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// A view. The definition is opaque dialect SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub definition: String,
}

impl View {
    /// Creates a view.
    #[must_use]
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }
}

/// A table with its columns, keys and indexes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_key: Option<PrimaryKey>,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the table, re-pointing every owned element at the new name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self.relink();
        self
    }

    /// Returns the columns in table order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Gets a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary key, if any.
    #[must_use]
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Returns the secondary indexes.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Gets an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the foreign keys.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Appends a column. A `length` is only accepted for types with a
    /// numeric length slot.
    pub fn add_column(&mut self, mut column: Column) -> Result<&mut Self> {
        if !column.name.is_empty() && self.column(&column.name).is_some() {
            return Err(DbalError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        self.check_parameters(&column)?;
        column.set_table(self.name.clone());
        self.columns.push(column);
        Ok(self)
    }

    /// Sets the primary key. Every key column must belong to the table.
    pub fn set_primary_key(&mut self, primary_key: PrimaryKey) -> Result<&mut Self> {
        self.check_columns(&primary_key.columns)?;
        self.primary_key = Some(primary_key);
        Ok(self)
    }

    /// Adds a secondary index. Every indexed column must belong to the table.
    pub fn add_index(&mut self, mut index: Index) -> Result<&mut Self> {
        if !index.name.is_empty() && self.index(&index.name).is_some() {
            return Err(DbalError::DuplicateIndex {
                table: self.name.clone(),
                index: index.name,
            });
        }
        self.check_columns(&index.columns)?;
        index.set_table(self.name.clone());
        self.indexes.push(index);
        Ok(self)
    }

    /// Adds a foreign key. Referencing columns must belong to the table and
    /// pair up with the referenced columns.
    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKey) -> Result<&mut Self> {
        self.check_foreign_key(&foreign_key)?;
        foreign_key.set_table(self.name.clone());
        self.foreign_keys.push(foreign_key);
        Ok(self)
    }

    /// Checks the table-local invariants.
    pub fn validate(&self) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DbalError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
            self.check_parameters(column)?;
        }

        if let Some(pk) = &self.primary_key {
            self.check_columns(&pk.columns)?;
        }

        for (i, index) in self.indexes.iter().enumerate() {
            if self.indexes[..i].iter().any(|idx| idx.name == index.name) {
                return Err(DbalError::DuplicateIndex {
                    table: self.name.clone(),
                    index: index.name.clone(),
                });
            }
            self.check_columns(&index.columns)?;
        }

        for fk in &self.foreign_keys {
            self.check_foreign_key(fk)?;
        }

        Ok(())
    }

    fn check_parameters(&self, column: &Column) -> Result<()> {
        let untyped_length = column
            .column_type
            .is_some_and(|column_type| !column_type.accepts_length());
        if column.parameters.length.is_some() && untyped_length {
            return Err(DbalError::ColumnParameterNotAllowed {
                parameter: "length",
                table: self.name.clone(),
                column: column.name.clone(),
            });
        }
        Ok(())
    }

    fn check_columns(&self, names: &[String]) -> Result<()> {
        match names.iter().find(|name| self.column(name).is_none()) {
            Some(missing) => Err(DbalError::UnknownColumn {
                table: self.name.clone(),
                column: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_foreign_key(&self, foreign_key: &ForeignKey) -> Result<()> {
        if foreign_key.columns.is_empty() {
            return Err(DbalError::ForeignKeyColumnsRequired {
                table: self.name.clone(),
            });
        }
        if foreign_key.columns.len() != foreign_key.referenced_columns.len() {
            return Err(DbalError::ForeignKeyArity {
                table: self.name.clone(),
                columns: foreign_key.columns.len(),
                referenced: foreign_key.referenced_columns.len(),
            });
        }
        if foreign_key.referenced_table.is_empty() {
            return Err(DbalError::ForeignKeyReferencedTableRequired {
                table: self.name.clone(),
            });
        }
        self.check_columns(&foreign_key.columns)
    }

    fn relink(&mut self) {
        let name = self.name.clone();
        for column in &mut self.columns {
            column.set_table(name.clone());
        }
        for index in &mut self.indexes {
            index.set_table(name.clone());
        }
        for fk in &mut self.foreign_keys {
            fk.set_table(name.clone());
        }
    }
}

/// The complete database schema: tables and views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    views: Vec<View>,
}

impl Schema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a schema from its JSON representation and checks its invariants.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut schema: Self = serde_json::from_str(json)?;
        for table in &mut schema.tables {
            table.relink();
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Loads a schema from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DbalError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Returns the tables in schema order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Gets a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Returns the views in schema order.
    #[must_use]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Gets a view by name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    /// Adds a table. Its name must be set and unique.
    pub fn add_table(&mut self, table: Table) -> Result<&mut Self> {
        if table.name.is_empty() {
            return Err(DbalError::TableNameRequired);
        }
        if self.table(&table.name).is_some() {
            return Err(DbalError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(self)
    }

    /// Adds a view. Its name must be unique.
    pub fn add_view(&mut self, view: View) -> Result<&mut Self> {
        if self.view(&view.name).is_some() {
            return Err(DbalError::DuplicateView(view.name));
        }
        self.views.push(view);
        Ok(self)
    }

    /// Checks every invariant of the graph, including foreign key targets.
    pub fn validate(&self) -> Result<()> {
        for (i, table) in self.tables.iter().enumerate() {
            if table.name.is_empty() {
                return Err(DbalError::TableNameRequired);
            }
            if self.tables[..i].iter().any(|t| t.name == table.name) {
                return Err(DbalError::DuplicateTable(table.name.clone()));
            }
            table.validate()?;
        }

        for (i, view) in self.views.iter().enumerate() {
            if self.views[..i].iter().any(|v| v.name == view.name) {
                return Err(DbalError::DuplicateView(view.name.clone()));
            }
        }

        for table in &self.tables {
            for fk in &table.foreign_keys {
                let referenced = self
                    .table(&fk.referenced_table)
                    .ok_or_else(|| DbalError::UnknownTable(fk.referenced_table.clone()))?;
                referenced.check_columns(&fk.referenced_columns)?;
            }
        }

        Ok(())
    }
}
