// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Error types for semantic analysis
//!
//! Every variant except [`SemanticError::Cancelled`] describes a recoverable
//! problem: it is recorded as a diagnostic and resolution carries on. Only
//! cancellation travels up through `?`.

use std::fmt;

use sqlmodel_catalog::CatalogError;
use thiserror::Error;

/// Result type alias for semantic operations
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Side of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinSide {
    Left,
    Right,
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
        }
    }
}

/// Errors that can occur during semantic analysis
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// Neither the catalog nor the enclosing scope knows the table
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in any visible source
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Qualifier of `alias.column` or `alias.*` does not name a visible source
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Join column missing on one side
    #[error("Column '{column}' not found to the {side} of join")]
    JoinColumnNotFound { column: String, side: JoinSide },

    /// Set operation operands do not have matching column tuples
    #[error("UNION/EXCEPT/INTERSECT require subset column tuples to match")]
    NonMatchingColumnSets,

    /// Same alias registered twice in one scope
    #[error("Duplicate table alias: {0}")]
    DuplicateAlias(String),

    /// More column names declared than the subquery returns
    #[error("'{source_name}' declares {declared} columns but its query returns {returned}")]
    ColumnCountMismatch {
        source_name: String,
        declared: usize,
        returned: usize,
    },

    /// VALUES rows of different width
    #[error("VALUES lists must all be the same length (expected {expected}, found {found})")]
    ValuesArityMismatch { expected: usize, found: usize },

    /// Member access on a value whose type has no such member
    #[error("Member '{member}' not found in type {ty}")]
    MemberNotFound { member: String, ty: String },

    /// A WITH-clause subquery without a name
    #[error("Common table expression has no name")]
    UnnamedCte,

    /// Catalog lookup failed; the affected types are unknown
    #[error("Failed to read metadata of '{subject}': {source}")]
    Catalog {
        subject: String,
        #[source]
        source: CatalogError,
    },

    /// The caller cancelled the resolution pass
    #[error("Semantic analysis was cancelled")]
    Cancelled,
}

impl SemanticError {
    /// Underlying catalog failure, if any
    pub fn catalog_cause(&self) -> Option<&CatalogError> {
        match self {
            SemanticError::Catalog { source, .. } => Some(source),
            _ => None,
        }
    }
}
