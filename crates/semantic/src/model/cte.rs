// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! WITH [RECURSIVE]
//!
//! Without `RECURSIVE`, each subquery sees only the ones declared before it.
//! With it, every name is bound first (with its declared columns, types
//! unknown) so each body can reference itself and any sibling; the bodies
//! are resolved afterwards and the bindings finalized. A name declared
//! without columns takes them from the non-recursive left branch of its
//! body before the recursive branch is resolved.
//!
//! The names stay visible to the main query only; the result handed upward
//! has its sources hidden.

use tracing::debug;

use super::correlated::correlate_columns;
use super::{ResolvedRowsKind, ResolvedRowsSource, RowsSource, SyntaxRef};
use crate::data_context::{DataContext, ResultColumn};
use crate::error::{SemanticError, SemanticResult};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{Symbol, SymbolClass, SymbolEntry};
use crate::types::ExprType;

/// One `name [(columns)] AS (body)` entry of a WITH clause
#[derive(Debug)]
pub struct CteSubquery {
    syntax: SyntaxRef,
    pub(super) name: Option<SymbolEntry>,
    pub(super) columns: Vec<SymbolEntry>,
    pub(super) body: RowsSource,
}

impl CteSubquery {
    pub fn new(syntax: SyntaxRef, name: SymbolEntry, body: impl Into<RowsSource>) -> Self {
        Self {
            syntax,
            name: Some(name),
            columns: Vec::new(),
            body: body.into(),
        }
    }

    /// Entry whose name the recognizer could not recover
    pub fn unnamed(syntax: SyntaxRef, body: impl Into<RowsSource>) -> Self {
        Self {
            syntax,
            name: None,
            columns: Vec::new(),
            body: body.into(),
        }
    }

    /// Builder method: set the declared column names
    pub fn with_columns(mut self, columns: Vec<SymbolEntry>) -> Self {
        self.columns = columns;
        self
    }

    fn name_text(&self) -> &str {
        self.name.as_ref().map_or("", SymbolEntry::raw_name)
    }

    /// Resolve the body against `context` and rename its columns
    fn resolve(
        self,
        id: NodeId,
        context: DataContext,
        recursive: bool,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedCteSubquery> {
        let name = self.name_text().to_string();
        let body = if recursive && self.columns.is_empty() {
            let seed = |given: &DataContext, anchor: &DataContext| seed_binding(given, id, anchor);
            self.body.propagate_anchored(context, rc, &seed)?
        } else {
            self.body.propagate(context, rc)?
        };
        let result = body.result_context();
        let output = correlate_columns(
            id,
            &name,
            result.columns(),
            &self.columns,
            !result.is_tuple_partial(),
            rc,
        );
        debug!("CTE {} ({}): columns={}", name, id, output.len());
        Ok(ResolvedCteSubquery {
            id,
            syntax: self.syntax,
            name: self.name,
            columns: self.columns,
            body,
            output,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCteSubquery {
    pub id: NodeId,
    pub syntax: SyntaxRef,
    pub name: Option<SymbolEntry>,
    /// Declared column names
    pub columns: Vec<SymbolEntry>,
    pub body: ResolvedRowsSource,
    /// Columns the name exposes, after renaming
    pub output: Vec<ResultColumn>,
}

impl ResolvedCteSubquery {
    /// Whether the exposed columns may be incomplete
    ///
    /// Only the body's own tuple counts; a body that merely reads an
    /// unresolved source through an explicit select list is complete.
    pub fn is_partial(&self) -> bool {
        self.body.result_context().is_tuple_partial()
    }
}

#[derive(Debug)]
pub struct Cte {
    pub(super) syntax: SyntaxRef,
    recursive: bool,
    pub(super) subqueries: Vec<CteSubquery>,
    pub(super) main: RowsSource,
}

impl Cte {
    pub fn new(
        syntax: SyntaxRef,
        subqueries: Vec<CteSubquery>,
        main: impl Into<RowsSource>,
    ) -> Self {
        Self {
            syntax,
            recursive: false,
            subqueries,
            main: main.into(),
        }
    }

    /// Builder method: `WITH RECURSIVE`
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let ids: Vec<NodeId> = self.subqueries.iter().map(|_| rc.next_node_id()).collect();
        declare_names(&self.subqueries, rc);

        let (subqueries, aggregate) = if self.recursive {
            resolve_recursive(self.subqueries, &ids, &given, rc)?
        } else {
            resolve_sequential(self.subqueries, &ids, &given, rc)?
        };

        let main = self.main.propagate(aggregate, rc)?;
        let result = main.result_context().hide_sources();
        let kind = ResolvedRowsKind::Cte(Box::new(ResolvedCte {
            recursive: self.recursive,
            subqueries,
            main,
        }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, result, kind))
    }
}

/// Classify the declared names and report unnamed or repeated entries
fn declare_names(subqueries: &[CteSubquery], rc: &mut RecognitionContext<'_>) {
    let dialect = rc.dialect();
    for (i, subquery) in subqueries.iter().enumerate() {
        let Some(name) = &subquery.name else {
            rc.append_error(subquery.syntax.range(), SemanticError::UnnamedCte);
            continue;
        };
        let repeated = subqueries[..i]
            .iter()
            .filter_map(|s| s.name.as_ref())
            .any(|earlier| dialect.identifiers_match(earlier.raw_name(), name.raw_name()));
        if repeated {
            rc.append_error(
                name.range(),
                SemanticError::DuplicateAlias(name.raw_name().to_string()),
            );
        }
        name.classify_as(SymbolClass::TableAlias, Some(name.occurrence()));
    }
}

/// Register a finalized subquery in `context`
fn bind(context: DataContext, subquery: &ResolvedCteSubquery) -> DataContext {
    match &subquery.name {
        Some(name) => {
            let next = context.extend_with_table_alias(
                name.symbol().clone(),
                subquery.id,
                None,
                subquery.output.clone(),
            );
            if subquery.is_partial() {
                next.mark_partial_source(subquery.id)
            } else {
                next
            }
        }
        None => context.mark_unresolved_source(),
    }
}

fn resolve_sequential(
    subqueries: Vec<CteSubquery>,
    ids: &[NodeId],
    given: &DataContext,
    rc: &mut RecognitionContext<'_>,
) -> SemanticResult<(Vec<ResolvedCteSubquery>, DataContext)> {
    let mut aggregate = given.clone();
    let mut resolved = Vec::with_capacity(subqueries.len());
    for (subquery, &id) in subqueries.into_iter().zip(ids) {
        let subquery = subquery.resolve(id, aggregate.clone(), false, rc)?;
        aggregate = bind(aggregate, &subquery);
        resolved.push(subquery);
    }
    Ok((resolved, aggregate))
}

fn resolve_recursive(
    subqueries: Vec<CteSubquery>,
    ids: &[NodeId],
    given: &DataContext,
    rc: &mut RecognitionContext<'_>,
) -> SemanticResult<(Vec<ResolvedCteSubquery>, DataContext)> {
    // Bind every name up front with its declared columns
    let mut provisional = given.clone();
    for (subquery, &id) in subqueries.iter().zip(ids) {
        let Some(name) = &subquery.name else {
            provisional = provisional.mark_unresolved_source();
            continue;
        };
        let columns = subquery
            .columns
            .iter()
            .map(|c| {
                let symbol = Symbol::classified(
                    c.raw_name(),
                    SymbolClass::ColumnDerived,
                    Some(c.occurrence()),
                );
                ResultColumn::new(symbol, id, ExprType::Unknown)
            })
            .collect();
        provisional =
            provisional.extend_with_table_alias(name.symbol().clone(), id, None, columns);
        if subquery.columns.is_empty() {
            provisional = provisional.mark_partial_source(id);
        }
    }

    let mut aggregate = given.clone();
    let mut resolved = Vec::with_capacity(subqueries.len());
    for (subquery, &id) in subqueries.into_iter().zip(ids) {
        let subquery = subquery.resolve(id, provisional.clone(), true, rc)?;
        provisional =
            provisional.rebind_source(id, subquery.output.clone(), subquery.is_partial());
        aggregate = bind(aggregate, &subquery);
        resolved.push(subquery);
    }
    Ok((resolved, aggregate))
}

/// Bind the recursive name `id` to the columns of its non-recursive branch
fn seed_binding(given: &DataContext, id: NodeId, anchor: &DataContext) -> DataContext {
    let columns = anchor.columns().iter().map(|c| c.reowned(id)).collect();
    given.rebind_source(id, columns, anchor.is_tuple_partial())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCte {
    pub recursive: bool,
    pub subqueries: Vec<ResolvedCteSubquery>,
    pub main: ResolvedRowsSource,
}
