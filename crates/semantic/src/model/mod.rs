// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Rows-source model
//!
//! Every node that produces a table-shaped result (table reference, VALUES,
//! SELECT, joins, set operations, WITH, aliased subquery) exists in two
//! states:
//!
//! - [`RowsSource`]: built by the recognizer, carries syntax and sub-nodes,
//!   and offers exactly one operation, [`RowsSource::propagate`].
//! - [`ResolvedRowsSource`]: what `propagate` returns. It carries the context
//!   the node was given and the context it produced, and is read-only.
//!
//! `propagate` consumes the node, so a node cannot be resolved twice and an
//! unresolved node has no context to read:
//!
//! ```compile_fail
//! use sqlmodel_ir::{SyntaxKind, SyntaxNode, TextRange};
//! use sqlmodel_semantic::model::{QualifiedName, RowsSource, TableData};
//! use sqlmodel_semantic::SymbolEntry;
//!
//! let syntax = SyntaxNode::new(SyntaxKind::TableReference, TextRange::new(0, 1)).into_arc();
//! let name = QualifiedName::new(SymbolEntry::new("t", TextRange::new(0, 1)));
//! let source = RowsSource::from(TableData::new(syntax, name));
//! let _ = source.result_context();
//! ```

pub mod correlated;
pub mod cte;
pub mod identifiers;
pub mod join;
pub mod projection;
pub mod set_op;
pub mod table;

use std::fmt;
use std::sync::Arc;

use sqlmodel_catalog::TableMetadata;
use sqlmodel_ir::{SyntaxNode, TextRange};

use crate::data_context::{DataContext, SourceBinding};
use crate::error::SemanticResult;
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{SymbolClass, SymbolDefinition, SymbolEntry};
use crate::visitor::ModelVisitor;

pub use correlated::{CorrelatedSource, ResolvedCorrelated};
pub use cte::{Cte, CteSubquery, ResolvedCte, ResolvedCteSubquery};
pub use identifiers::KnownIdentifiers;
pub use join::{CrossJoin, NaturalJoin, ResolvedCrossJoin, ResolvedNaturalJoin};
pub use projection::{Projection, ResolvedProjection};
pub use set_op::{ResolvedSetCorrespondence, SetCorrespondence, SetOperationKind};
pub use table::{ResolvedTableData, ResolvedTableValue, TableData, TableValue};

/// Shared handle to the syntax a model node was built from
pub type SyntaxRef = Arc<SyntaxNode>;

/// A possibly qualified name: `[catalog.][schema.]name`
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    qualifier: Vec<SymbolEntry>,
    name: SymbolEntry,
}

impl QualifiedName {
    pub fn new(name: SymbolEntry) -> Self {
        Self {
            qualifier: Vec::new(),
            name,
        }
    }

    /// Builder method: set the leading parts
    pub fn with_qualifier(mut self, qualifier: Vec<SymbolEntry>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Split dotted parts into qualifier and name; `None` for no parts
    pub fn from_parts(mut parts: Vec<SymbolEntry>) -> Option<Self> {
        let name = parts.pop()?;
        Some(Self {
            qualifier: parts,
            name,
        })
    }

    /// The last part
    pub fn name(&self) -> &SymbolEntry {
        &self.name
    }

    pub fn qualifier(&self) -> &[SymbolEntry] {
        &self.qualifier
    }

    /// All parts, qualifier first
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.qualifier.iter().chain(std::iter::once(&self.name))
    }

    pub fn to_parts(&self) -> Vec<String> {
        self.entries().map(|e| e.raw_name().to_string()).collect()
    }

    pub fn range(&self) -> TextRange {
        self.qualifier
            .first()
            .map_or(self.name.range(), |first| first.range().cover(self.name.range()))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_parts().join("."))
    }
}

/// Unresolved rows-source node
#[derive(Debug)]
pub enum RowsSource {
    TableData(TableData),
    TableValue(TableValue),
    Projection(Box<Projection>),
    CrossJoin(Box<CrossJoin>),
    NaturalJoin(Box<NaturalJoin>),
    SetCorrespondence(Box<SetCorrespondence>),
    Cte(Box<Cte>),
    Correlated(Box<CorrelatedSource>),
}

impl RowsSource {
    pub fn syntax(&self) -> &SyntaxRef {
        match self {
            RowsSource::TableData(node) => &node.syntax,
            RowsSource::TableValue(node) => &node.syntax,
            RowsSource::Projection(node) => &node.syntax,
            RowsSource::CrossJoin(node) => &node.syntax,
            RowsSource::NaturalJoin(node) => &node.syntax,
            RowsSource::SetCorrespondence(node) => &node.syntax,
            RowsSource::Cte(node) => &node.syntax,
            RowsSource::Correlated(node) => &node.syntax,
        }
    }

    /// Resolve this node and its subtree against `context`
    ///
    /// Stores `context` as the node's given context, computes the result
    /// context and returns the resolved node. Problems in the query become
    /// diagnostics in `rc`; the only error returned is
    /// [`SemanticError::Cancelled`](crate::SemanticError::Cancelled).
    pub fn propagate(
        self,
        context: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        rc.check_cancelled()?;
        let id = rc.next_node_id();
        match self {
            RowsSource::TableData(node) => node.propagate(id, context, rc),
            RowsSource::TableValue(node) => node.propagate(id, context, rc),
            RowsSource::Projection(node) => node.propagate(id, context, rc),
            RowsSource::CrossJoin(node) => node.propagate(id, context, rc),
            RowsSource::NaturalJoin(node) => node.propagate(id, context, rc),
            RowsSource::SetCorrespondence(node) => node.propagate(id, context, rc),
            RowsSource::Cte(node) => node.propagate(id, context, rc),
            RowsSource::Correlated(node) => node.propagate(id, context, rc),
        }
    }

    /// [`propagate`](Self::propagate), except that a set operation hands its
    /// right operand the context `anchor` derives from the left result
    ///
    /// Nested set operations anchor on their own left operand first.
    pub(crate) fn propagate_anchored(
        self,
        context: DataContext,
        rc: &mut RecognitionContext<'_>,
        anchor: &dyn Fn(&DataContext, &DataContext) -> DataContext,
    ) -> SemanticResult<ResolvedRowsSource> {
        match self {
            RowsSource::SetCorrespondence(node) => {
                rc.check_cancelled()?;
                let id = rc.next_node_id();
                node.propagate_anchored(id, context, rc, anchor)
            }
            other => other.propagate(context, rc),
        }
    }
}

macro_rules! impl_from_node {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for RowsSource {
                fn from(node: $node) -> Self {
                    RowsSource::$variant(node.into())
                }
            }
        )*
    };
}

impl_from_node! {
    TableData => TableData,
    TableValue => TableValue,
    Projection => Projection,
    CrossJoin => CrossJoin,
    NaturalJoin => NaturalJoin,
    SetCorrespondence => SetCorrespondence,
    Cte => Cte,
    CorrelatedSource => Correlated,
}

/// Variant-specific part of a resolved node
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRowsKind {
    TableData(ResolvedTableData),
    TableValue(ResolvedTableValue),
    Projection(Box<ResolvedProjection>),
    CrossJoin(Box<ResolvedCrossJoin>),
    NaturalJoin(Box<ResolvedNaturalJoin>),
    SetCorrespondence(Box<ResolvedSetCorrespondence>),
    Cte(Box<ResolvedCte>),
    Correlated(Box<ResolvedCorrelated>),
}

/// A rows-source node after its single resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRowsSource {
    id: NodeId,
    syntax: SyntaxRef,
    given_context: DataContext,
    result_context: DataContext,
    kind: ResolvedRowsKind,
}

impl ResolvedRowsSource {
    pub(crate) fn new(
        id: NodeId,
        syntax: SyntaxRef,
        given_context: DataContext,
        result_context: DataContext,
        kind: ResolvedRowsKind,
    ) -> Self {
        Self {
            id,
            syntax,
            given_context,
            result_context,
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn syntax(&self) -> &SyntaxRef {
        &self.syntax
    }

    pub fn range(&self) -> TextRange {
        self.syntax.range()
    }

    /// Context the node was resolved against
    pub fn given_context(&self) -> &DataContext {
        &self.given_context
    }

    /// Context the node produced
    pub fn result_context(&self) -> &DataContext {
        &self.result_context
    }

    pub fn kind(&self) -> &ResolvedRowsKind {
        &self.kind
    }

    /// Real table behind a plain or aliased table reference
    pub fn real_table(&self) -> Option<&Arc<TableMetadata>> {
        match &self.kind {
            ResolvedRowsKind::TableData(data) => data.table.as_ref(),
            ResolvedRowsKind::Correlated(correlated) => correlated.source.real_table(),
            _ => None,
        }
    }

    /// Double dispatch into `visitor`
    pub fn accept<V: ModelVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match &self.kind {
            ResolvedRowsKind::TableData(data) => visitor.visit_table_data(self, data),
            ResolvedRowsKind::TableValue(values) => visitor.visit_table_value(self, values),
            ResolvedRowsKind::Projection(projection) => visitor.visit_projection(self, projection),
            ResolvedRowsKind::CrossJoin(join) => visitor.visit_cross_join(self, join),
            ResolvedRowsKind::NaturalJoin(join) => visitor.visit_natural_join(self, join),
            ResolvedRowsKind::SetCorrespondence(set) => {
                visitor.visit_set_correspondence(self, set)
            }
            ResolvedRowsKind::Cte(cte) => visitor.visit_cte(self, cte),
            ResolvedRowsKind::Correlated(correlated) => visitor.visit_correlated(self, correlated),
        }
    }

    /// Direct rows-source children, including subqueries nested in values
    pub fn children(&self) -> Vec<&ResolvedRowsSource> {
        let mut children = Vec::new();
        match &self.kind {
            ResolvedRowsKind::TableData(_) => {}
            ResolvedRowsKind::TableValue(values) => {
                for value in values.rows.iter().flatten() {
                    value.collect_subqueries(&mut children);
                }
            }
            ResolvedRowsKind::Projection(projection) => {
                children.extend(projection.from.as_ref());
                for value in projection.values() {
                    value.collect_subqueries(&mut children);
                }
            }
            ResolvedRowsKind::CrossJoin(join) => {
                children.push(&join.left);
                children.push(&join.right);
            }
            ResolvedRowsKind::NaturalJoin(join) => {
                children.push(&join.left);
                children.push(&join.right);
                if let Some(condition) = &join.condition {
                    condition.collect_subqueries(&mut children);
                }
            }
            ResolvedRowsKind::SetCorrespondence(set) => {
                children.push(&set.left);
                children.push(&set.right);
            }
            ResolvedRowsKind::Cte(cte) => {
                children.extend(cte.subqueries.iter().map(|s| &s.body));
                children.push(&cte.main);
            }
            ResolvedRowsKind::Correlated(correlated) => children.push(&correlated.source),
        }
        children
    }

    /// Innermost node whose syntax covers `offset`
    pub fn find_node_containing(&self, offset: usize) -> Option<&ResolvedRowsSource> {
        if !self.range().contains(offset) {
            return None;
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_node_containing(offset))
            .or(Some(self))
    }

    /// Every node of the subtree, breadth first
    pub fn descendants(&self) -> Vec<&ResolvedRowsSource> {
        let mut nodes = vec![self];
        let mut i = 0;
        while i < nodes.len() {
            let children = nodes[i].children();
            nodes.extend(children);
            i += 1;
        }
        nodes
    }
}

/// Classify a reference to a registered source (`FROM cte`, `t.col`, `t.*`)
pub(crate) fn classify_source_reference(entry: &SymbolEntry, binding: &SourceBinding) {
    match &binding.table {
        Some(table) if binding.symbol.class() == SymbolClass::Table => {
            entry.classify_as(
                SymbolClass::Table,
                Some(SymbolDefinition::Table(Arc::clone(table))),
            );
        }
        _ => {
            let definition = binding
                .symbol
                .definition()
                .cloned()
                .unwrap_or(SymbolDefinition::Source(binding.source));
            entry.classify_as(SymbolClass::TableAlias, Some(definition));
        }
    }
}
