// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Table references and VALUES lists

use std::sync::Arc;

use sqlmodel_catalog::TableMetadata;
use sqlmodel_ir::TextRange;
use tracing::{debug, warn};

use super::{
    QualifiedName, ResolvedRowsKind, ResolvedRowsSource, SyntaxRef, classify_source_reference,
};
use crate::data_context::{DataContext, PseudoColumn, ResultColumn};
use crate::error::{SemanticError, SemanticResult};
use crate::expression::{ResolvedValue, ValueExpression};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{Symbol, SymbolClass, SymbolDefinition};
use crate::types::ExprType;

/// `FROM [schema.]name`: a catalog table or a CTE reference
#[derive(Debug)]
pub struct TableData {
    pub(super) syntax: SyntaxRef,
    pub(super) name: QualifiedName,
}

impl TableData {
    pub fn new(syntax: SyntaxRef, name: QualifiedName) -> Self {
        Self { syntax, name }
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let TableData { syntax, name } = self;
        let parts = name.to_parts();
        let entry = name.name();

        let (result, table, cte) = match given.find_real_table(rc.catalog(), rc.dialect(), &parts)
        {
            Ok(Some(table)) => {
                let (columns, complete) = table_columns(id, &table, name.range(), rc)?;
                let mut pseudo_columns = given.pseudo_columns().to_vec();
                pseudo_columns.extend(rc.catalog().pseudo_attributes(&table).into_iter().map(
                    |p| PseudoColumn::from_attribute(p, Some(id), Some(Arc::clone(&table))),
                ));
                entry.classify_as(
                    SymbolClass::Table,
                    Some(SymbolDefinition::Table(Arc::clone(&table))),
                );
                debug!(
                    "Resolved table: name={}, columns={}",
                    table.qualified_name(),
                    columns.len()
                );

                let mut result = given
                    .extend_with_real_table(
                        Arc::clone(&table),
                        entry.symbol().clone(),
                        id,
                        columns.clone(),
                    )
                    .override_result_tuple(columns, pseudo_columns);
                if !complete {
                    result = incomplete(&result, id);
                }
                (result, Some(table), None)
            }
            Ok(None) => match given
                .resolve_source(rc.dialect(), &parts)
                .filter(|binding| binding.is_alias())
            {
                Some(binding) => {
                    classify_source_reference(entry, binding);
                    let columns: Vec<ResultColumn> =
                        binding.columns.iter().map(|c| c.reowned(id)).collect();
                    let cte = binding.source;
                    let partial = binding.partial;
                    let mut result = given
                        .extend_with_table_alias(entry.symbol().clone(), id, None, columns.clone())
                        .override_result_tuple(columns, given.pseudo_columns().to_vec());
                    if partial {
                        result = incomplete(&result, id);
                    }
                    (result, None, Some(cte))
                }
                None => {
                    entry.symbol().classify(SymbolClass::Error);
                    rc.append_error(name.range(), SemanticError::TableNotFound(name.to_string()));
                    (unresolved_result(&given), None, None)
                }
            },
            Err(source) => {
                warn!("Table lookup failed: name={}, error={}", name, source);
                entry.symbol().classify(SymbolClass::Error);
                rc.append_error(
                    name.range(),
                    SemanticError::Catalog {
                        subject: name.to_string(),
                        source,
                    },
                );
                (unresolved_result(&given), None, None)
            }
        };

        let kind = ResolvedRowsKind::TableData(ResolvedTableData { name, table, cte });
        Ok(ResolvedRowsSource::new(id, syntax, given, result, kind))
    }
}

/// Empty tuple over `given`, flagged so later lookups stay quiet
fn unresolved_result(given: &DataContext) -> DataContext {
    given
        .override_result_tuple(Vec::new(), given.pseudo_columns().to_vec())
        .mark_unresolved_source()
        .mark_partial_tuple()
}

/// Flag a result whose columns came back incomplete, binding included
fn incomplete(result: &DataContext, id: NodeId) -> DataContext {
    result
        .mark_partial_source(id)
        .mark_partial_tuple()
        .mark_unresolved_source()
}

/// Result columns of a catalog table, and whether the list is complete
fn table_columns(
    id: NodeId,
    table: &Arc<TableMetadata>,
    range: TextRange,
    rc: &mut RecognitionContext<'_>,
) -> SemanticResult<(Vec<ResultColumn>, bool)> {
    let attributes = match rc.catalog().attributes(table) {
        Ok(attributes) => attributes,
        Err(source) => {
            warn!(
                "Failed to read attributes: table={}, error={}",
                table.qualified_name(),
                source
            );
            rc.append_error(
                range,
                SemanticError::Catalog {
                    subject: table.qualified_name(),
                    source,
                },
            );
            return Ok((Vec::new(), false));
        }
    };

    let include_hidden = rc.options().include_hidden_attributes;
    let mut columns = Vec::with_capacity(attributes.len());
    for attribute in attributes
        .into_iter()
        .filter(|a| include_hidden || !a.hidden)
    {
        rc.check_cancelled()?;
        let ty = match rc.catalog().attribute_type(table, &attribute) {
            Ok(data_type) => ExprType::from_data_type(&data_type),
            Err(source) => {
                rc.append_error(
                    range,
                    SemanticError::Catalog {
                        subject: format!("{}.{}", table.qualified_name(), attribute.name),
                        source,
                    },
                );
                ExprType::Unknown
            }
        };
        let symbol = Symbol::classified(
            attribute.name.clone(),
            SymbolClass::Column,
            Some(SymbolDefinition::Attribute {
                table: Arc::clone(table),
                column: attribute.clone(),
            }),
        );
        let column = ResultColumn::new(symbol, id, ty);
        columns.push(column.with_real_attribute(Arc::clone(table), attribute));
    }
    Ok((columns, true))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTableData {
    pub name: QualifiedName,
    /// Catalog table, when the name resolved to one
    pub table: Option<Arc<TableMetadata>>,
    /// CTE node, when the name resolved to a WITH entry
    pub cte: Option<NodeId>,
}

/// `VALUES (..), (..)`
#[derive(Debug)]
pub struct TableValue {
    pub(super) syntax: SyntaxRef,
    pub(super) rows: Vec<Vec<ValueExpression>>,
}

impl TableValue {
    pub fn new(syntax: SyntaxRef, rows: Vec<Vec<ValueExpression>>) -> Self {
        Self { syntax, rows }
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let TableValue { syntax, rows } = self;
        let width = rows.first().map_or(0, Vec::len);

        let mut resolved_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let values = row
                .into_iter()
                .map(|v| v.propagate(&given, rc))
                .collect::<SemanticResult<Vec<_>>>()?;
            if values.len() != width {
                let range = row_range(&values).unwrap_or(syntax.range());
                rc.append_error(
                    range,
                    SemanticError::ValuesArityMismatch {
                        expected: width,
                        found: values.len(),
                    },
                );
            }
            resolved_rows.push(values);
        }

        let columns = (0..width)
            .map(|i| {
                let ty = resolved_rows
                    .iter()
                    .filter_map(|row| row.get(i).map(ResolvedValue::ty))
                    .cloned()
                    .reduce(|a, b| ExprType::combine_or_unknown(&a, &b))
                    .unwrap_or(ExprType::Unknown);
                let name = format!("column{}", i + 1);
                let symbol = Symbol::classified(
                    name.clone(),
                    SymbolClass::ColumnDerived,
                    Some(SymbolDefinition::Derived {
                        name,
                        range: syntax.range(),
                        original: None,
                    }),
                );
                ResultColumn::new(symbol, id, ty)
            })
            .collect();

        let pseudo_columns = given
            .pseudo_columns()
            .iter()
            .filter(|p| !p.policy.is_rowset_bound())
            .cloned()
            .collect();
        let result = given.override_result_tuple(columns, pseudo_columns);
        let kind = ResolvedRowsKind::TableValue(ResolvedTableValue {
            rows: resolved_rows,
        });
        Ok(ResolvedRowsSource::new(id, syntax, given, result, kind))
    }
}

fn row_range(values: &[ResolvedValue]) -> Option<TextRange> {
    let first = values.first()?.range();
    let last = values.last()?.range();
    Some(first.cover(last))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTableValue {
    pub rows: Vec<Vec<ResolvedValue>>,
}
