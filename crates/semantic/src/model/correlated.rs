// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Aliased sources: `table AS t`, `(subquery) AS t(c1, c2)`

use super::{ResolvedRowsKind, ResolvedRowsSource, RowsSource, SyntaxRef};
use crate::data_context::{DataContext, PseudoColumn, ResultColumn};
use crate::error::{SemanticError, SemanticResult};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{SymbolClass, SymbolDefinition, SymbolEntry};
use crate::types::ExprType;

#[derive(Debug)]
pub struct CorrelatedSource {
    pub(super) syntax: SyntaxRef,
    pub(super) source: RowsSource,
    alias: SymbolEntry,
    pub(super) columns: Vec<SymbolEntry>,
}

impl CorrelatedSource {
    pub fn new(syntax: SyntaxRef, source: impl Into<RowsSource>, alias: SymbolEntry) -> Self {
        Self {
            syntax,
            source: source.into(),
            alias,
            columns: Vec::new(),
        }
    }

    /// Builder method: set the declared column names
    pub fn with_columns(mut self, columns: Vec<SymbolEntry>) -> Self {
        self.columns = columns;
        self
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let source = self.source.propagate(given.clone(), rc)?;
        let alias = self.alias;

        if given.is_alias_registered(rc.dialect(), alias.raw_name()) {
            rc.append_error(
                alias.range(),
                SemanticError::DuplicateAlias(alias.raw_name().to_string()),
            );
        }
        alias.classify_as(SymbolClass::TableAlias, Some(alias.occurrence()));

        let inner = source.result_context();
        let columns = correlate_columns(
            id,
            alias.raw_name(),
            inner.columns(),
            &self.columns,
            !inner.is_tuple_partial(),
            rc,
        );
        let pseudo_columns: Vec<PseudoColumn> = inner
            .pseudo_columns()
            .iter()
            .map(|p| match p.source {
                Some(_) => PseudoColumn {
                    source: Some(id),
                    ..p.clone()
                },
                None => p.clone(),
            })
            .collect();

        let mut result = given
            .extend_with_table_alias(
                alias.symbol().clone(),
                id,
                source.real_table().cloned(),
                columns.clone(),
            )
            .override_result_tuple(columns, pseudo_columns);
        if inner.has_unresolved_source() {
            result = result.mark_unresolved_source();
        }
        if inner.is_tuple_partial() {
            result = result.mark_partial_source(id).mark_partial_tuple();
        }

        let kind = ResolvedRowsKind::Correlated(Box::new(ResolvedCorrelated {
            source,
            alias,
            columns: self.columns,
        }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, result, kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCorrelated {
    pub source: ResolvedRowsSource,
    pub alias: SymbolEntry,
    /// Declared column names
    pub columns: Vec<SymbolEntry>,
}

/// Rename `columns` positionally to the `declared` names
///
/// The first `min(declared, columns)` columns take the declared symbols,
/// classified `ColumnDerived` with the renamed column's definition as the
/// original. Excess columns keep their names. Excess declared names are an
/// error when `complete` is set; otherwise the column list is known to be
/// partial and they become columns of unknown type.
pub(crate) fn correlate_columns(
    id: NodeId,
    source_name: &str,
    columns: &[ResultColumn],
    declared: &[SymbolEntry],
    complete: bool,
    rc: &mut RecognitionContext<'_>,
) -> Vec<ResultColumn> {
    let mut correlated: Vec<ResultColumn> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| match declared.get(i) {
            Some(entry) => {
                entry.classify_as(SymbolClass::ColumnDerived, Some(derived(entry, column)));
                ResultColumn {
                    symbol: entry.symbol().clone(),
                    ..column.reowned(id)
                }
            }
            None => column.reowned(id),
        })
        .collect();

    let extra = declared.get(columns.len()..).unwrap_or_default();
    if let (Some(first), Some(last)) = (extra.first(), extra.last()) {
        if complete {
            rc.append_error(
                first.range().cover(last.range()),
                SemanticError::ColumnCountMismatch {
                    source_name: source_name.to_string(),
                    declared: declared.len(),
                    returned: columns.len(),
                },
            );
            for entry in extra {
                entry.symbol().classify(SymbolClass::Error);
            }
        } else {
            for entry in extra {
                entry.classify_as(SymbolClass::ColumnDerived, Some(entry.occurrence()));
                correlated.push(ResultColumn::new(entry.symbol().clone(), id, ExprType::Unknown));
            }
        }
    }
    correlated
}

fn derived(entry: &SymbolEntry, column: &ResultColumn) -> SymbolDefinition {
    SymbolDefinition::Derived {
        name: entry.raw_name().to_string(),
        range: entry.range(),
        original: column.symbol.definition().cloned().map(Box::new),
    }
}
