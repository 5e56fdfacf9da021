// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! UNION / INTERSECT / EXCEPT
//!
//! Columns are matched by position, or by name when a `CORRESPONDING`
//! clause is present. A mismatch never aborts resolution: the merged tuple
//! is built from whatever columns exist and one diagnostic is reported for
//! the whole operation.

use std::fmt;
use std::sync::Arc;

use super::{ResolvedRowsKind, ResolvedRowsSource, RowsSource, SyntaxRef};
use crate::data_context::{DataContext, ResultColumn};
use crate::error::{SemanticError, SemanticResult};
use crate::expression::classify_column_reference;
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{SymbolClass, SymbolEntry};
use crate::types::ExprType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperationKind {
    Union,
    Intersect,
    Except,
}

impl fmt::Display for SetOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperationKind::Union => write!(f, "UNION"),
            SetOperationKind::Intersect => write!(f, "INTERSECT"),
            SetOperationKind::Except => write!(f, "EXCEPT"),
        }
    }
}

/// `left UNION|INTERSECT|EXCEPT [CORRESPONDING [BY (..)]] right`
#[derive(Debug)]
pub struct SetCorrespondence {
    pub(super) syntax: SyntaxRef,
    kind: SetOperationKind,
    pub(super) left: RowsSource,
    pub(super) right: RowsSource,
    pub(super) corresponding: Option<Vec<SymbolEntry>>,
}

impl SetCorrespondence {
    pub fn new(
        syntax: SyntaxRef,
        kind: SetOperationKind,
        left: impl Into<RowsSource>,
        right: impl Into<RowsSource>,
    ) -> Self {
        Self {
            syntax,
            kind,
            left: left.into(),
            right: right.into(),
            corresponding: None,
        }
    }

    /// Builder method: match columns by name
    ///
    /// An empty list means bare `CORRESPONDING`: every name both sides share.
    pub fn with_corresponding(mut self, columns: Vec<SymbolEntry>) -> Self {
        self.corresponding = Some(columns);
        self
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        self.propagate_anchored(id, given, rc, &|given, _| given.clone())
    }

    /// Resolve the left operand first and derive the right operand's context
    /// from it with `anchor(given, left_result)`
    pub(super) fn propagate_anchored(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
        anchor: &dyn Fn(&DataContext, &DataContext) -> DataContext,
    ) -> SemanticResult<ResolvedRowsSource> {
        let left = self.left.propagate_anchored(given.clone(), rc, anchor)?;
        let right_given = anchor(&given, left.result_context());
        let right = self.right.propagate(right_given, rc)?;
        let left_context = left.result_context();
        let right_context = right.result_context();

        let partial = left_context.is_tuple_partial() || right_context.is_tuple_partial();
        let (columns, non_matching) = match &self.corresponding {
            None => merge_by_position(id, left_context.columns(), right_context.columns()),
            Some(names) if names.is_empty() => {
                merge_common_names(id, left_context, right_context, rc)
            }
            Some(names) => merge_by_name(id, names, left_context, right_context, !partial, rc),
        };

        if non_matching && !partial {
            rc.append_error(self.syntax.range(), SemanticError::NonMatchingColumnSets);
        }

        let pseudo_columns = given.pseudo_columns().to_vec();
        let mut result = given.override_result_tuple(columns, pseudo_columns);
        if left_context.has_unresolved_source() || right_context.has_unresolved_source() {
            result = result.mark_unresolved_source();
        }
        if partial {
            result = result.mark_partial_tuple();
        }

        let kind = ResolvedRowsKind::SetCorrespondence(Box::new(ResolvedSetCorrespondence {
            kind: self.kind,
            left,
            right,
            corresponding: self.corresponding,
        }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, result, kind))
    }
}

fn merge_by_position(
    id: NodeId,
    left: &[ResultColumn],
    right: &[ResultColumn],
) -> (Vec<ResultColumn>, bool) {
    let width = left.len().max(right.len());
    let mut non_matching = false;
    let mut columns = Vec::with_capacity(width);
    for i in 0..width {
        match (left.get(i), right.get(i)) {
            (Some(l), Some(r)) => columns.push(merge_columns(id, l, r)),
            (Some(only), None) | (None, Some(only)) => {
                non_matching = true;
                columns.push(only.reowned(id));
            }
            (None, None) => {}
        }
    }
    (columns, non_matching)
}

fn merge_by_name(
    id: NodeId,
    names: &[SymbolEntry],
    left: &DataContext,
    right: &DataContext,
    complete: bool,
    rc: &RecognitionContext<'_>,
) -> (Vec<ResultColumn>, bool) {
    let dialect = rc.dialect();
    let mut non_matching = false;
    let mut columns = Vec::with_capacity(names.len());
    for entry in names {
        let name = entry.raw_name();
        match (left.find_own_column(dialect, name), right.find_own_column(dialect, name)) {
            (Some(l), Some(r)) => {
                classify_column_reference(entry, l);
                columns.push(merge_columns(id, l, r));
            }
            (Some(only), None) | (None, Some(only)) => {
                non_matching = true;
                classify_column_reference(entry, only);
                columns.push(only.reowned(id));
            }
            (None, None) => {
                non_matching = true;
                let class = if complete {
                    SymbolClass::Error
                } else {
                    SymbolClass::Unknown
                };
                entry.symbol().classify(class);
            }
        }
    }
    (columns, non_matching)
}

fn merge_common_names(
    id: NodeId,
    left: &DataContext,
    right: &DataContext,
    rc: &RecognitionContext<'_>,
) -> (Vec<ResultColumn>, bool) {
    let dialect = rc.dialect();
    let columns: Vec<ResultColumn> = left
        .columns()
        .iter()
        .filter_map(|l| {
            right
                .find_own_column(dialect, l.name())
                .map(|r| merge_columns(id, l, r))
        })
        .collect();
    let both_empty = left.columns().is_empty() && right.columns().is_empty();
    let non_matching = columns.is_empty() && !both_empty;
    (columns, non_matching)
}

/// One output column from a left/right pair
fn merge_columns(id: NodeId, left: &ResultColumn, right: &ResultColumn) -> ResultColumn {
    let same_attribute = match (&left.real_table, &right.real_table) {
        (Some(l), Some(r)) => Arc::ptr_eq(l, r) && left.real_attribute == right.real_attribute,
        _ => false,
    };
    let ty = ExprType::combine_or_unknown(&left.ty, &right.ty);
    let column = ResultColumn::new(left.symbol.merge(&right.symbol), id, ty);
    match (&left.real_table, &left.real_attribute) {
        (Some(table), Some(attribute)) if same_attribute => {
            column.with_real_attribute(Arc::clone(table), attribute.clone())
        }
        _ => column,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSetCorrespondence {
    pub kind: SetOperationKind,
    pub left: ResolvedRowsSource,
    pub right: ResolvedRowsSource,
    pub corresponding: Option<Vec<SymbolEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use sqlmodel_catalog::{DataKind, DataType};

    fn column(name: &str, source: u32, ty: ExprType) -> ResultColumn {
        ResultColumn::new(
            Symbol::classified(name, SymbolClass::Column, None),
            NodeId::new(source),
            ty,
        )
    }

    #[test]
    fn test_positional_merge_pads_shorter_side() {
        let int = ExprType::Simple(DataType::Integer);
        let left = vec![column("a", 1, int.clone())];
        let right = vec![column("a", 2, int.clone()), column("b", 2, int.clone())];

        let (columns, non_matching) = merge_by_position(NodeId::new(3), &left, &right);
        assert!(non_matching);
        let names: Vec<_> = columns.iter().map(ResultColumn::name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(columns.iter().all(|c| c.source == NodeId::new(3)));
    }

    #[test]
    fn test_positional_merge_combines_types() {
        let left = vec![
            column("a", 1, ExprType::Predefined(DataKind::Numeric)),
            column("b", 1, ExprType::Simple(DataType::Text)),
        ];
        let right = vec![
            column("x", 2, ExprType::Simple(DataType::BigInt)),
            column("y", 2, ExprType::Simple(DataType::Integer)),
        ];

        let (columns, non_matching) = merge_by_position(NodeId::new(3), &left, &right);
        assert!(!non_matching);
        assert_eq!(columns[0].name(), "a");
        assert_eq!(columns[0].ty, ExprType::Predefined(DataKind::Numeric));
        assert_eq!(columns[1].ty, ExprType::Unknown);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(SetOperationKind::Intersect.to_string(), "INTERSECT");
    }
}
