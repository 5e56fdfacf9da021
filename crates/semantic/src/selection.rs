// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Select list expansion
//!
//! A [`SelectionResultModel`] is the ordered list of items of a SELECT list.
//! Expansion turns it into the projection's result columns:
//!
//! - `expr [AS alias]` yields one column,
//! - `alias.*` yields every column of the named source,
//! - `*` yields every column of the FROM clause.
//!
//! Columns come out in declaration order and are reindexed from 0 by the
//! projection.

use std::sync::Arc;

use sqlmodel_ir::TextRange;

use crate::data_context::{DataContext, ResultColumn};
use crate::error::SemanticResult;
use crate::expression::{ResolvedValue, ValueExpression, report_missing_source};
use crate::model::{QualifiedName, SyntaxRef, classify_source_reference};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{Symbol, SymbolClass, SymbolDefinition, SymbolEntry};

/// Name PostgreSQL gives to unnamed computed columns
pub const ANONYMOUS_COLUMN_NAME: &str = "?column?";

/// One item of a SELECT list
#[derive(Debug)]
pub enum SelectItem {
    /// `expr [AS alias]`
    Column {
        syntax: SyntaxRef,
        expr: ValueExpression,
        alias: Option<SymbolEntry>,
    },
    /// `qualifier.*`
    Tuple {
        syntax: SyntaxRef,
        qualifier: QualifiedName,
    },
    /// `*`
    CompleteTuple { syntax: SyntaxRef },
}

/// Unresolved SELECT list
#[derive(Debug, Default)]
pub struct SelectionResultModel {
    items: Vec<SelectItem>,
}

impl SelectionResultModel {
    pub fn new(items: Vec<SelectItem>) -> Self {
        Self { items }
    }

    /// Builder method: append an item
    pub fn with_item(mut self, item: SelectItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Expand the list against the FROM context
    ///
    /// Returns the resolved items and the projected columns, owned by the
    /// projection node `id`.
    pub fn expand(
        self,
        id: NodeId,
        from: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<(ResolvedSelection, Vec<ResultColumn>)> {
        let mut items = Vec::with_capacity(self.items.len());
        let mut columns = Vec::new();
        let mut partial = false;

        for item in self.items {
            let resolved = match item {
                SelectItem::Column {
                    syntax,
                    expr,
                    alias,
                } => {
                    let value = expr.propagate(from, rc)?;
                    columns.push(value_column(id, &value, alias.as_ref()));
                    ResolvedSelectItem::Column {
                        syntax,
                        value,
                        alias,
                    }
                }
                SelectItem::Tuple { syntax, qualifier } => {
                    let source = match from.resolve_source(rc.dialect(), &qualifier.to_parts()) {
                        Some(binding) => {
                            classify_source_reference(qualifier.name(), binding);
                            columns.extend(binding.columns.iter().map(|c| c.reowned(id)));
                            partial |= binding.partial;
                            Some(binding.source)
                        }
                        None => {
                            report_missing_source(&qualifier, from, rc);
                            partial = true;
                            None
                        }
                    };
                    ResolvedSelectItem::Tuple {
                        syntax,
                        qualifier,
                        source,
                    }
                }
                SelectItem::CompleteTuple { syntax } => {
                    columns.extend(from.columns().iter().map(|c| c.reowned(id)));
                    partial |= from.is_tuple_partial();
                    ResolvedSelectItem::CompleteTuple { syntax }
                }
            };
            items.push(resolved);
        }

        Ok((ResolvedSelection { items, partial }, columns))
    }
}

/// Result column for `expr [AS alias]`
fn value_column(id: NodeId, value: &ResolvedValue, alias: Option<&SymbolEntry>) -> ResultColumn {
    let target = value.column();
    let column = match (alias, value.reference_entry()) {
        (Some(alias), _) => {
            let original = value
                .reference_entry()
                .and_then(|entry| entry.symbol().definition())
                .cloned()
                .map(Box::new);
            alias.classify_as(
                SymbolClass::ColumnDerived,
                Some(SymbolDefinition::Derived {
                    name: alias.raw_name().to_string(),
                    range: alias.range(),
                    original,
                }),
            );
            ResultColumn::new(alias.symbol().clone(), id, value.ty().clone())
        }
        (None, Some(entry)) => ResultColumn::new(entry.symbol().clone(), id, value.ty().clone()),
        (None, None) => {
            let symbol = Symbol::classified(
                ANONYMOUS_COLUMN_NAME,
                SymbolClass::ColumnDerived,
                Some(SymbolDefinition::Derived {
                    name: ANONYMOUS_COLUMN_NAME.to_string(),
                    range: value.range(),
                    original: None,
                }),
            );
            ResultColumn::new(symbol, id, value.ty().clone())
        }
    };

    match target.and_then(|t| t.real_table.as_ref().zip(t.real_attribute.as_ref())) {
        Some((table, attribute)) => {
            column.with_real_attribute(Arc::clone(table), attribute.clone())
        }
        None => column,
    }
}

/// One resolved SELECT list item
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSelectItem {
    Column {
        syntax: SyntaxRef,
        value: ResolvedValue,
        alias: Option<SymbolEntry>,
    },
    Tuple {
        syntax: SyntaxRef,
        qualifier: QualifiedName,
        /// Node the qualifier resolved to
        source: Option<NodeId>,
    },
    CompleteTuple { syntax: SyntaxRef },
}

impl ResolvedSelectItem {
    pub fn range(&self) -> TextRange {
        match self {
            ResolvedSelectItem::Column { syntax, .. }
            | ResolvedSelectItem::Tuple { syntax, .. }
            | ResolvedSelectItem::CompleteTuple { syntax } => syntax.range(),
        }
    }
}

/// Resolved SELECT list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedSelection {
    items: Vec<ResolvedSelectItem>,
    partial: bool,
}

impl ResolvedSelection {
    pub fn items(&self) -> &[ResolvedSelectItem] {
        &self.items
    }

    /// Whether a `*` or `alias.*` item expanded over an incomplete column list
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Values of the `expr [AS alias]` items
    pub fn values(&self) -> impl Iterator<Item = &ResolvedValue> {
        self.items.iter().filter_map(|item| match item {
            ResolvedSelectItem::Column { value, .. } => Some(value),
            _ => None,
        })
    }

    /// Symbol entries introduced or referenced by the list
    pub fn collect_entries<'a>(&'a self, out: &mut Vec<&'a SymbolEntry>) {
        for item in &self.items {
            match item {
                ResolvedSelectItem::Column { value, alias, .. } => {
                    value.collect_entries(out);
                    out.extend(alias.as_ref());
                }
                ResolvedSelectItem::Tuple { qualifier, .. } => out.extend(qualifier.entries()),
                ResolvedSelectItem::CompleteTuple { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ConstantKind;
    use crate::recognition::CancellationToken;
    use crate::types::ExprType;
    use sqlmodel_catalog::{DataType, StaticCatalog};
    use sqlmodel_ir::{DialectSettings, SyntaxKind, SyntaxNode};

    fn syntax(start: usize, end: usize) -> SyntaxRef {
        SyntaxNode::new(SyntaxKind::DerivedColumn, TextRange::new(start, end)).into_arc()
    }

    fn from_context() -> DataContext {
        let column = |name: &str| {
            ResultColumn::new(
                Symbol::classified(name, SymbolClass::Column, None),
                NodeId::new(1),
                ExprType::Simple(DataType::Integer),
            )
        };
        let columns = vec![column("a"), column("b")];
        DataContext::new()
            .extend_with_table_alias(
                Symbol::classified("t", SymbolClass::TableAlias, None),
                NodeId::new(1),
                None,
                columns.clone(),
            )
            .override_result_tuple(columns, vec![])
    }

    #[test]
    fn test_expand_in_declaration_order() {
        let catalog = StaticCatalog::new();
        let dialect = DialectSettings::standard();
        let mut rc = RecognitionContext::new(&catalog, &dialect, CancellationToken::new());

        let selection = SelectionResultModel::default()
            .with_item(SelectItem::Column {
                syntax: syntax(0, 1),
                expr: ValueExpression::Constant {
                    syntax: syntax(0, 1),
                    kind: ConstantKind::Numeric,
                },
                alias: None,
            })
            .with_item(SelectItem::CompleteTuple { syntax: syntax(3, 4) })
            .with_item(SelectItem::Tuple {
                syntax: syntax(6, 9),
                qualifier: QualifiedName::new(SymbolEntry::new("t", TextRange::new(6, 7))),
            });

        let (resolved, columns) = selection
            .expand(NodeId::new(9), &from_context(), &mut rc)
            .unwrap();
        let names: Vec<_> = columns.iter().map(ResultColumn::name).collect();
        assert_eq!(names, vec![ANONYMOUS_COLUMN_NAME, "a", "b", "a", "b"]);
        assert!(columns.iter().all(|c| c.source == NodeId::new(9)));
        assert_eq!(resolved.items().len(), 3);
        assert!(!resolved.is_partial());
        assert!(rc.diagnostics().is_empty());
    }

    #[test]
    fn test_alias_is_derived_from_target() {
        let catalog = StaticCatalog::new();
        let dialect = DialectSettings::standard();
        let mut rc = RecognitionContext::new(&catalog, &dialect, CancellationToken::new());

        let alias = SymbolEntry::new("y", TextRange::new(12, 13));
        let selection = SelectionResultModel::new(vec![SelectItem::Column {
            syntax: syntax(7, 13),
            expr: ValueExpression::ColumnReference {
                syntax: syntax(7, 8),
                qualifier: None,
                name: SymbolEntry::new("a", TextRange::new(7, 8)),
            },
            alias: Some(alias.clone()),
        }]);

        let (_, columns) = selection
            .expand(NodeId::new(2), &from_context(), &mut rc)
            .unwrap();
        assert_eq!(columns[0].name(), "y");
        assert_eq!(alias.symbol().class(), SymbolClass::ColumnDerived);
        assert_eq!(columns[0].ty, ExprType::Simple(DataType::Integer));
    }

    #[test]
    fn test_unknown_qualifier_reports_source() {
        let catalog = StaticCatalog::new();
        let dialect = DialectSettings::standard();
        let mut rc = RecognitionContext::new(&catalog, &dialect, CancellationToken::new());

        let selection = SelectionResultModel::new(vec![SelectItem::Tuple {
            syntax: syntax(0, 3),
            qualifier: QualifiedName::new(SymbolEntry::new("q", TextRange::new(0, 1))),
        }]);
        let (resolved, columns) = selection
            .expand(NodeId::new(2), &from_context(), &mut rc)
            .unwrap();
        assert!(columns.is_empty());
        assert!(resolved.is_partial());
        assert_eq!(rc.diagnostics().len(), 1);
    }

    #[test]
    fn test_star_over_partial_tuple_is_partial() {
        let catalog = StaticCatalog::new();
        let dialect = DialectSettings::standard();
        let mut rc = RecognitionContext::new(&catalog, &dialect, CancellationToken::new());
        let from = from_context().mark_partial_tuple();

        let star = SelectionResultModel::new(vec![SelectItem::CompleteTuple {
            syntax: syntax(0, 1),
        }]);
        let (resolved, _) = star.expand(NodeId::new(2), &from, &mut rc).unwrap();
        assert!(resolved.is_partial());

        let explicit = SelectionResultModel::new(vec![SelectItem::Column {
            syntax: syntax(0, 1),
            expr: ValueExpression::Constant {
                syntax: syntax(0, 1),
                kind: ConstantKind::Numeric,
            },
            alias: None,
        }]);
        let (resolved, _) = explicit.expand(NodeId::new(3), &from, &mut rc).unwrap();
        assert!(!resolved.is_partial());
    }
}
