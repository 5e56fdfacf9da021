// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module defines the types used to represent database schema metadata:
//! tables, their attributes, and the pseudo-attributes a rowset or a session
//! exposes alongside the real columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL data types (unified across dialects)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataType {
    // Numeric types
    Integer,
    BigInt,
    SmallInt,
    TinyInt,
    Decimal,
    Float,
    Double,

    // String types
    Varchar(Option<usize>),
    Char(Option<usize>),
    Text,

    // Binary types
    Binary,
    VarBinary(Option<usize>),
    Blob,

    // Date/Time types
    Date,
    Time,
    DateTime,
    Timestamp,

    // Boolean
    Boolean,

    // JSON
    Json,

    // Special types
    Uuid,
    Enum(Vec<String>),
    Array(Box<DataType>),

    /// Placeholder type used when no real metadata is available; compatible
    /// with every other type.
    Any,

    // Unknown/Other (with original type name)
    Other(String),
}

/// Coarse classification of [`DataType`]s used for type compatibility checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Numeric,
    String,
    Binary,
    Temporal,
    Boolean,
    Document,
    Array,
    Any,
    Other,
}

impl DataType {
    /// Returns the kind this type belongs to
    pub fn kind(&self) -> DataKind {
        match self {
            DataType::Integer
            | DataType::BigInt
            | DataType::SmallInt
            | DataType::TinyInt
            | DataType::Decimal
            | DataType::Float
            | DataType::Double => DataKind::Numeric,
            DataType::Varchar(_) | DataType::Char(_) | DataType::Text | DataType::Enum(_) => {
                DataKind::String
            }
            DataType::Binary | DataType::VarBinary(_) | DataType::Blob => DataKind::Binary,
            DataType::Date | DataType::Time | DataType::DateTime | DataType::Timestamp => {
                DataKind::Temporal
            }
            DataType::Boolean => DataKind::Boolean,
            DataType::Json => DataKind::Document,
            DataType::Array(_) => DataKind::Array,
            DataType::Any => DataKind::Any,
            DataType::Uuid | DataType::Other(_) => DataKind::Other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::TinyInt => write!(f, "TINYINT"),
            DataType::Decimal => write!(f, "DECIMAL"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Varchar(Some(n)) => write!(f, "VARCHAR({})", n),
            DataType::Varchar(None) => write!(f, "VARCHAR"),
            DataType::Char(Some(n)) => write!(f, "CHAR({})", n),
            DataType::Char(None) => write!(f, "CHAR"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Binary => write!(f, "BINARY"),
            DataType::VarBinary(Some(n)) => write!(f, "VARBINARY({})", n),
            DataType::VarBinary(None) => write!(f, "VARBINARY"),
            DataType::Blob => write!(f, "BLOB"),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::DateTime => write!(f, "DATETIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Json => write!(f, "JSON"),
            DataType::Uuid => write!(f, "UUID"),
            DataType::Enum(values) => write!(f, "ENUM({})", values.join(", ")),
            DataType::Array(inner) => write!(f, "{}[]", inner),
            DataType::Any => write!(f, "ANY"),
            DataType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Metadata for a database column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Hidden (system) attribute, not part of `SELECT *`
    #[serde(default)]
    pub hidden: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            hidden: false,
        }
    }

    /// Builder method: mark as hidden
    pub fn with_hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Metadata for a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name
    pub name: String,
    /// Schema/database name
    pub schema: String,
    /// Column definitions, in catalog order
    pub columns: Vec<ColumnMetadata>,
    /// Pseudo-attributes every row of this table exposes (e.g. `ROWID`)
    #[serde(default)]
    pub pseudo_attributes: Vec<PseudoAttribute>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
            pseudo_attributes: Vec::new(),
        }
    }

    /// Builder method: add columns
    pub fn with_columns(mut self, columns: Vec<ColumnMetadata>) -> Self {
        self.columns = columns;
        self
    }

    /// Builder method: add a rowset pseudo-attribute
    pub fn with_pseudo_attribute(mut self, attribute: PseudoAttribute) -> Self {
        self.pseudo_attributes.push(attribute);
        self
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns visible to `SELECT *`, in catalog order
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    /// `schema.name`, or just `name` for schema-less tables
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

/// How far a pseudo-attribute travels through a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropagationPolicy {
    /// Visible only directly on the table reference (e.g. Oracle `ROWID`)
    TableLocal,
    /// Visible on the rowset and carried through projections
    TableNormal,
    /// Session/global value, visible everywhere
    GlobalVariable,
}

impl PropagationPolicy {
    /// Whether a pseudo-column with this policy is still visible after a
    /// projection has reshaped the rowset
    pub fn survives_projection(self) -> bool {
        !matches!(self, PropagationPolicy::TableLocal)
    }

    /// Whether the pseudo-column is tied to a rowset rather than the session
    pub fn is_rowset_bound(self) -> bool {
        !matches!(self, PropagationPolicy::GlobalVariable)
    }
}

/// A synthetic attribute that is not a real table column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PseudoAttribute {
    pub name: String,
    pub data_type: DataType,
    pub policy: PropagationPolicy,
    pub description: Option<String>,
}

impl PseudoAttribute {
    pub fn new(name: impl Into<String>, data_type: DataType, policy: PropagationPolicy) -> Self {
        Self {
            name: name.into(),
            data_type,
            policy,
            description: None,
        }
    }

    /// Builder method: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
