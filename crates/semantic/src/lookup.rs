// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Position lookups
//!
//! Read-only queries over a resolved tree for editor features: the scope
//! visible at an offset (completion) and the symbol under an offset (hover,
//! go-to-definition).

use crate::data_context::DataContext;
use crate::model::{
    ResolvedCorrelated, ResolvedCrossJoin, ResolvedCte, ResolvedCteSubquery, ResolvedNaturalJoin,
    ResolvedProjection, ResolvedRowsKind, ResolvedRowsSource, ResolvedSetCorrespondence,
    ResolvedTableData, ResolvedTableValue,
};
use crate::symbol::SymbolEntry;
use crate::visitor::ModelVisitor;

pub struct ScopeLookup<'a> {
    root: &'a ResolvedRowsSource,
}

impl<'a> ScopeLookup<'a> {
    pub fn new(root: &'a ResolvedRowsSource) -> Self {
        Self { root }
    }

    /// Context names at `offset` resolve against
    ///
    /// Inside a SELECT this is the context of the clause holding `offset`
    /// (select-list aliases included where the dialect allows them), or of
    /// its FROM clause elsewhere in the statement. Outside a SELECT it is the
    /// context the innermost node was given.
    pub fn scope_at(&self, offset: usize) -> Option<&'a DataContext> {
        let node = self.root.find_node_containing(offset)?;
        match node.kind() {
            ResolvedRowsKind::Projection(projection) => Some(match projection.clause_at(offset) {
                Some(clause) => projection.clause_context(clause),
                None => &projection.from_context,
            }),
            _ => Some(node.given_context()),
        }
    }

    /// Every symbol entry of the tree, in tree order
    pub fn entries(&self) -> Vec<SymbolEntry> {
        let mut collector = EntryCollector::default();
        self.root.accept(&mut collector);
        collector.entries
    }

    /// Narrowest symbol entry covering `offset`
    pub fn symbol_at(&self, offset: usize) -> Option<SymbolEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.range().contains(offset))
            .min_by_key(|e| e.range().len())
    }
}

#[derive(Default)]
struct EntryCollector {
    entries: Vec<SymbolEntry>,
}

impl EntryCollector {
    fn push_all<'e>(&mut self, entries: impl IntoIterator<Item = &'e SymbolEntry>) {
        self.entries.extend(entries.into_iter().cloned());
    }

    fn children(&mut self, node: &ResolvedRowsSource) {
        for child in node.children() {
            child.accept(self);
        }
    }
}

impl ModelVisitor for EntryCollector {
    type Output = ();

    fn visit_table_data(&mut self, _node: &ResolvedRowsSource, data: &ResolvedTableData) {
        self.push_all(data.name.entries());
    }

    fn visit_table_value(&mut self, node: &ResolvedRowsSource, values: &ResolvedTableValue) {
        let mut entries = Vec::new();
        for value in values.rows.iter().flatten() {
            value.collect_entries(&mut entries);
        }
        self.push_all(entries);
        self.children(node);
    }

    fn visit_projection(&mut self, node: &ResolvedRowsSource, projection: &ResolvedProjection) {
        let mut entries = Vec::new();
        projection.selection.collect_entries(&mut entries);
        let clauses = projection
            .where_clause
            .iter()
            .chain(&projection.group_by)
            .chain(projection.having.iter())
            .chain(&projection.order_by);
        for value in clauses {
            value.collect_entries(&mut entries);
        }
        self.push_all(entries);
        self.children(node);
    }

    fn visit_cross_join(&mut self, node: &ResolvedRowsSource, _join: &ResolvedCrossJoin) {
        self.children(node);
    }

    fn visit_natural_join(&mut self, node: &ResolvedRowsSource, join: &ResolvedNaturalJoin) {
        self.push_all(&join.columns);
        if let Some(condition) = &join.condition {
            let mut entries = Vec::new();
            condition.collect_entries(&mut entries);
            self.push_all(entries);
        }
        self.children(node);
    }

    fn visit_set_correspondence(
        &mut self,
        node: &ResolvedRowsSource,
        set: &ResolvedSetCorrespondence,
    ) {
        self.push_all(set.corresponding.iter().flatten());
        self.children(node);
    }

    fn visit_cte(&mut self, _node: &ResolvedRowsSource, cte: &ResolvedCte) {
        for subquery in &cte.subqueries {
            self.visit_cte_subquery(subquery);
        }
        cte.main.accept(self);
    }

    fn visit_cte_subquery(&mut self, subquery: &ResolvedCteSubquery) {
        self.push_all(subquery.name.iter().chain(&subquery.columns));
        subquery.body.accept(self);
    }

    fn visit_correlated(&mut self, node: &ResolvedRowsSource, correlated: &ResolvedCorrelated) {
        self.push_all(std::iter::once(&correlated.alias).chain(&correlated.columns));
        self.children(node);
    }
}
