// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Model - Shared Vocabulary
//!
//! Leaf crate with the types every other crate of the workspace speaks:
//! - Syntax node handles produced by a parser ([`SyntaxNode`], [`TextRange`])
//! - Catalog metadata ([`TableMetadata`], [`ColumnMetadata`], [`DataType`],
//!   [`PseudoAttribute`])
//! - Dialect rules ([`Dialect`], [`DialectProvider`], [`DialectSettings`])

pub mod dialect;
pub mod metadata;
pub mod syntax;

// Re-export commonly used types
pub use dialect::{
    ClauseKind, Dialect, DialectFamily, DialectProvider, DialectSettings, IdentifierCase,
};
pub use metadata::{
    ColumnMetadata, DataKind, DataType, PropagationPolicy, PseudoAttribute, TableMetadata,
};
pub use syntax::{SyntaxKind, SyntaxNode, TextRange};
