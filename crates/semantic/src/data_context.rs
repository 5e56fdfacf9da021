// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Data context
//!
//! A [`DataContext`] is the scope visible at one point of the query tree:
//!
//! - the ordered result columns the current node produces,
//! - the pseudo-columns still in reach,
//! - the sources (tables, aliases, CTE names) that qualified names resolve to.
//!
//! Contexts are immutable values. Every derivation (`combine`,
//! `hide_sources`, `extend_with_*`, `override_result_tuple`) returns a new
//! context and leaves its input untouched.
//!
//! Sources are kept in registration order. Lookups walk them from the most
//! recent registration backwards, so inner scopes shadow outer ones.

use std::sync::Arc;

use sqlmodel_catalog::{
    CatalogProvider, CatalogResult, ColumnMetadata, PropagationPolicy, PseudoAttribute,
    TableMetadata,
};
use sqlmodel_ir::DialectProvider;

use crate::recognition::NodeId;
use crate::symbol::{Symbol, SymbolClass, SymbolDefinition};
use crate::types::ExprType;

/// One column of a context's result tuple
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Position in the owning context, dense from 0
    pub index: usize,
    pub symbol: Symbol,
    /// Rows-source node that produced the column
    pub source: NodeId,
    pub real_table: Option<Arc<TableMetadata>>,
    pub real_attribute: Option<ColumnMetadata>,
    pub ty: ExprType,
}

impl ResultColumn {
    pub fn new(symbol: Symbol, source: NodeId, ty: ExprType) -> Self {
        Self {
            index: 0,
            symbol,
            source,
            real_table: None,
            real_attribute: None,
            ty,
        }
    }

    /// Builder method: attach the catalog attribute behind the column
    pub fn with_real_attribute(
        mut self,
        table: Arc<TableMetadata>,
        column: ColumnMetadata,
    ) -> Self {
        self.real_table = Some(table);
        self.real_attribute = Some(column);
        self
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }

    /// Same column, now produced by `source`
    pub fn reowned(&self, source: NodeId) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }
}

/// A synthetic column with its own propagation rule
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoColumn {
    pub symbol: Symbol,
    /// Node that introduced it; `None` for session-wide values
    pub source: Option<NodeId>,
    pub real_table: Option<Arc<TableMetadata>>,
    pub ty: ExprType,
    pub policy: PropagationPolicy,
    pub description: Option<String>,
}

impl PseudoColumn {
    /// Pseudo-column for a catalog pseudo-attribute, introduced by `source`
    pub fn from_attribute(
        attribute: PseudoAttribute,
        source: Option<NodeId>,
        real_table: Option<Arc<TableMetadata>>,
    ) -> Self {
        let ty = ExprType::from_data_type(&attribute.data_type);
        let policy = attribute.policy;
        let description = attribute.description.clone();
        let symbol = Symbol::classified(
            attribute.name.clone(),
            SymbolClass::Column,
            Some(SymbolDefinition::PseudoAttribute(attribute)),
        );
        Self {
            symbol,
            source,
            real_table,
            ty,
            policy,
            description,
        }
    }

    pub fn name(&self) -> &str {
        self.symbol.name()
    }
}

/// A named source registered in a context
///
/// Answers `resolve_source`: the real table behind the name (if any), the
/// node that produced it and the alias symbol it was registered under.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBinding {
    /// Name parts the source is reachable by; matched by suffix, so a table
    /// bound as `app.users` is reachable as `users` too
    pub parts: Vec<String>,
    /// Symbol of the name that registered the source
    pub symbol: Symbol,
    pub source: NodeId,
    pub table: Option<Arc<TableMetadata>>,
    pub columns: Vec<ResultColumn>,
    /// Column list is known to be incomplete
    pub partial: bool,
}

impl SourceBinding {
    /// Whether this binding is a synthetic alias (CTE, derived table) rather
    /// than a direct table reference
    pub fn is_alias(&self) -> bool {
        self.table.is_none()
    }

    fn matches(&self, dialect: &dyn DialectProvider, parts: &[String]) -> bool {
        !parts.is_empty()
            && parts.len() <= self.parts.len()
            && self
                .parts
                .iter()
                .rev()
                .zip(parts.iter().rev())
                .all(|(bound, wanted)| dialect.identifiers_match(bound, wanted))
    }

    pub fn find_column(&self, dialect: &dyn DialectProvider, name: &str) -> Option<&ResultColumn> {
        self.columns
            .iter()
            .find(|c| dialect.identifiers_match(c.name(), name))
    }
}

/// Scope snapshot at one node of the query tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataContext {
    columns: Vec<ResultColumn>,
    pseudo_columns: Vec<PseudoColumn>,
    sources: Vec<SourceBinding>,
    /// Sources before this index belong to enclosing scopes
    scope_start: usize,
    has_unresolved_source: bool,
    /// The result tuple itself may be missing columns
    partial_tuple: bool,
}

impl DataContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Root context seeded with session-wide pseudo-columns
    pub fn with_pseudo_columns(pseudo_columns: Vec<PseudoColumn>) -> Self {
        Self {
            pseudo_columns,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn pseudo_columns(&self) -> &[PseudoColumn] {
        &self.pseudo_columns
    }

    pub fn sources(&self) -> &[SourceBinding] {
        &self.sources
    }

    /// Sources registered in the current scope only
    pub fn scope_sources(&self) -> &[SourceBinding] {
        &self.sources[self.scope_start.min(self.sources.len())..]
    }

    /// Whether some source in reach failed to resolve, making column lists
    /// best-effort rather than complete
    pub fn has_unresolved_source(&self) -> bool {
        self.has_unresolved_source
    }

    /// Whether the result tuple may be missing columns
    ///
    /// Narrower than [`has_unresolved_source`](Self::has_unresolved_source):
    /// an explicit select list over an unresolved FROM still has a known
    /// width, while `*` over it does not.
    pub fn is_tuple_partial(&self) -> bool {
        self.partial_tuple
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ResultColumn::name).collect()
    }

    /// Concatenate result tuples (left first) and union the sources
    ///
    /// Bindings both sides inherited from a common ancestor appear once.
    pub fn combine(&self, other: &DataContext) -> DataContext {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());

        let mut pseudo_columns = self.pseudo_columns.clone();
        for pseudo in &other.pseudo_columns {
            if !pseudo_columns.contains(pseudo) {
                pseudo_columns.push(pseudo.clone());
            }
        }

        let mut sources = self.sources.clone();
        for binding in &other.sources {
            if !sources
                .iter()
                .any(|b| b.source == binding.source && b.parts == binding.parts)
            {
                sources.push(binding.clone());
            }
        }

        DataContext {
            columns: reindex(columns),
            pseudo_columns,
            sources,
            scope_start: self.scope_start.min(other.scope_start),
            has_unresolved_source: self.has_unresolved_source || other.has_unresolved_source,
            partial_tuple: self.partial_tuple || other.partial_tuple,
        }
    }

    /// Keep the tuple, forget every named source
    pub fn hide_sources(&self) -> DataContext {
        DataContext {
            columns: self.columns.clone(),
            pseudo_columns: self.pseudo_columns.clone(),
            sources: Vec::new(),
            scope_start: 0,
            has_unresolved_source: self.has_unresolved_source,
            partial_tuple: self.partial_tuple,
        }
    }

    /// Start a nested scope: existing sources stay visible but count as outer
    pub fn enter_scope(&self) -> DataContext {
        DataContext {
            scope_start: self.sources.len(),
            ..self.clone()
        }
    }

    /// Register `alias` as a name for the rows produced by `source`
    ///
    /// Registration never fails; callers check
    /// [`is_alias_registered`](Self::is_alias_registered) first and report
    /// duplicates themselves.
    pub fn extend_with_table_alias(
        &self,
        alias: Symbol,
        source: NodeId,
        table: Option<Arc<TableMetadata>>,
        columns: Vec<ResultColumn>,
    ) -> DataContext {
        let binding = SourceBinding {
            parts: vec![alias.name().to_string()],
            symbol: alias,
            source,
            table,
            columns,
            partial: false,
        };
        self.with_binding(binding)
    }

    /// Register a catalog table under its own (possibly qualified) name
    pub fn extend_with_real_table(
        &self,
        table: Arc<TableMetadata>,
        name: Symbol,
        source: NodeId,
        columns: Vec<ResultColumn>,
    ) -> DataContext {
        let mut parts = Vec::with_capacity(2);
        if !table.schema.is_empty() {
            parts.push(table.schema.clone());
        }
        parts.push(table.name.clone());

        let binding = SourceBinding {
            parts,
            symbol: name,
            source,
            table: Some(table),
            columns,
            partial: false,
        };
        self.with_binding(binding)
    }

    fn with_binding(&self, binding: SourceBinding) -> DataContext {
        let mut next = self.clone();
        next.sources.push(binding);
        next
    }

    /// Replace the column list of the binding registered by `source`
    pub fn rebind_source(
        &self,
        source: NodeId,
        columns: Vec<ResultColumn>,
        partial: bool,
    ) -> DataContext {
        let mut next = self.clone();
        for binding in next.sources.iter_mut().filter(|b| b.source == source) {
            binding.columns = columns.clone();
            binding.partial = partial;
        }
        next
    }

    /// Flag the binding registered by `source` as having an incomplete
    /// column list
    pub fn mark_partial_source(&self, source: NodeId) -> DataContext {
        let mut next = self.clone();
        for binding in next.sources.iter_mut().filter(|b| b.source == source) {
            binding.partial = true;
        }
        next
    }

    /// Replace the result tuple, keeping registered sources
    ///
    /// The new tuple counts as complete until
    /// [`mark_partial_tuple`](Self::mark_partial_tuple) says otherwise.
    pub fn override_result_tuple(
        &self,
        columns: Vec<ResultColumn>,
        pseudo_columns: Vec<PseudoColumn>,
    ) -> DataContext {
        DataContext {
            columns: reindex(columns),
            pseudo_columns,
            sources: self.sources.clone(),
            scope_start: self.scope_start,
            has_unresolved_source: self.has_unresolved_source,
            partial_tuple: false,
        }
    }

    /// Same context, flagged as containing an unresolved source
    pub fn mark_unresolved_source(&self) -> DataContext {
        DataContext {
            has_unresolved_source: true,
            ..self.clone()
        }
    }

    /// Same context, with a result tuple that may be missing columns
    pub fn mark_partial_tuple(&self) -> DataContext {
        DataContext {
            partial_tuple: true,
            ..self.clone()
        }
    }

    /// Find a column of the result tuple only
    pub fn find_own_column(
        &self,
        dialect: &dyn DialectProvider,
        name: &str,
    ) -> Option<&ResultColumn> {
        self.columns
            .iter()
            .find(|c| dialect.identifiers_match(c.name(), name))
    }

    /// Resolve an unqualified column name
    ///
    /// The result tuple is searched first, then the registered sources from
    /// innermost to outermost.
    pub fn resolve_column(
        &self,
        dialect: &dyn DialectProvider,
        name: &str,
    ) -> Option<&ResultColumn> {
        self.find_own_column(dialect, name).or_else(|| {
            self.sources
                .iter()
                .rev()
                .find_map(|b| b.find_column(dialect, name))
        })
    }

    pub fn resolve_pseudo_column(
        &self,
        dialect: &dyn DialectProvider,
        name: &str,
    ) -> Option<&PseudoColumn> {
        self.pseudo_columns
            .iter()
            .find(|p| dialect.identifiers_match(p.name(), name))
    }

    /// Pseudo-columns introduced by the node that registered `binding`
    pub fn pseudo_columns_of<'s>(
        &'s self,
        binding: &'s SourceBinding,
    ) -> impl Iterator<Item = &'s PseudoColumn> + 's {
        self.pseudo_columns
            .iter()
            .filter(move |p| p.source == Some(binding.source))
    }

    /// Resolve a dotted name to a registered source
    pub fn resolve_source(
        &self,
        dialect: &dyn DialectProvider,
        parts: &[String],
    ) -> Option<&SourceBinding> {
        self.sources
            .iter()
            .rev()
            .find(|b| b.matches(dialect, parts))
    }

    /// Whether `name` is already registered in the current scope
    pub fn is_alias_registered(&self, dialect: &dyn DialectProvider, name: &str) -> bool {
        let parts = [name.to_string()];
        self.scope_sources().iter().any(|b| b.matches(dialect, &parts))
    }

    /// Bindings of `other`'s scope that clash with a different binding of
    /// this context's scope
    pub fn conflicting_sources<'o>(
        &self,
        other: &'o DataContext,
        dialect: &dyn DialectProvider,
    ) -> Vec<&'o SourceBinding> {
        let mine = self.scope_sources();
        other
            .scope_sources()
            .iter()
            .filter(|theirs| {
                mine.iter().any(|b| {
                    b.source != theirs.source
                        && b.parts.last().zip(theirs.parts.last()).is_some_and(
                            |(left, right)| dialect.identifiers_match(left, right),
                        )
                })
            })
            .collect()
    }

    /// Ask the catalog for a real table, canonicalizing the name first
    pub fn find_real_table(
        &self,
        catalog: &dyn CatalogProvider,
        dialect: &dyn DialectProvider,
        parts: &[String],
    ) -> CatalogResult<Option<Arc<TableMetadata>>> {
        let canonical: Vec<String> = parts
            .iter()
            .map(|p| dialect.canonicalize_identifier(p))
            .collect();
        catalog.find_table(&canonical)
    }
}

fn reindex(mut columns: Vec<ResultColumn>) -> Vec<ResultColumn> {
    for (index, column) in columns.iter_mut().enumerate() {
        column.index = index;
    }
    columns
}
