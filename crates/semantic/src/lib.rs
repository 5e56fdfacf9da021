// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQL Semantic Model
//!
//! This crate resolves a tree of SQL rows sources (tables, VALUES, SELECT,
//! joins, set operations, WITH, aliased subqueries) into a semantic model:
//! every node learns which names are visible to it and which columns it
//! produces, every identifier occurrence is classified, and every value gets
//! an inferred type.
//!
//! ## Overview
//!
//! - [`model`]: the rows-source node kinds, in unresolved and resolved form
//! - [`DataContext`]: the immutable scope passed down and produced up the tree
//! - [`Symbol`] / [`SymbolEntry`]: shared identifier classification
//! - [`ExprType`]: the inferred type lattice
//! - [`RecognitionContext`]: capabilities and diagnostics of one pass
//! - [`SemanticAnalyzer`]: the entry point that ties them together
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sqlmodel_catalog::StaticCatalog;
//! use sqlmodel_ir::{Dialect, SyntaxKind, SyntaxNode, TextRange};
//! use sqlmodel_semantic::model::{QualifiedName, TableData};
//! use sqlmodel_semantic::{CancellationToken, SemanticAnalyzer, SymbolEntry};
//!
//! // SELECT * FROM orders
//! let range = TextRange::new(14, 20);
//! let table = TableData::new(
//!     SyntaxNode::new(SyntaxKind::TableReference, range).into_arc(),
//!     QualifiedName::new(SymbolEntry::new("orders", range)),
//! );
//!
//! let analyzer = SemanticAnalyzer::new(
//!     Arc::new(StaticCatalog::playground()),
//!     Dialect::PostgreSQL.settings(),
//! );
//! let result = analyzer.analyze(table, &CancellationToken::new());
//!
//! assert!(result.diagnostics.is_empty());
//! let model = result.model.unwrap();
//! assert_eq!(
//!     model.result_context().column_names(),
//!     vec!["id", "user_id", "total", "status"]
//! );
//! ```

pub mod analyzer;
pub mod config;
pub mod data_context;
pub mod error;
pub mod expression;
pub mod lookup;
pub mod model;
pub mod printer;
pub mod recognition;
pub mod selection;
pub mod symbol;
pub mod types;
pub mod visitor;

// Re-export commonly used types
pub use analyzer::{AnalysisResult, SemanticAnalyzer};
pub use config::AnalyzerConfig;
pub use data_context::{DataContext, PseudoColumn, ResultColumn, SourceBinding};
pub use error::{JoinSide, SemanticError, SemanticResult};
pub use expression::{ConstantKind, ResolvedValue, ResolvedValueKind, ValueExpression};
pub use lookup::ScopeLookup;
pub use model::{ResolvedRowsKind, ResolvedRowsSource, RowsSource};
pub use printer::ModelPrinter;
pub use recognition::{
    CancellationToken, Diagnostic, NodeId, RecognitionContext, ResolutionOptions, Severity,
};
pub use selection::{ResolvedSelection, SelectItem, SelectionResultModel};
pub use symbol::{Symbol, SymbolClass, SymbolDefinition, SymbolEntry};
pub use types::ExprType;
pub use visitor::ModelVisitor;
