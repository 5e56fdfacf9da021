// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Joins
//!
//! Both join kinds resolve their sides against the same given context and
//! concatenate the side tuples, left first. A natural join (`USING`,
//! `NATURAL`, `ON`) additionally checks its column list against each side
//! and resolves its condition against the combined context.

use super::{ResolvedRowsKind, ResolvedRowsSource, RowsSource, SyntaxRef};
use crate::data_context::DataContext;
use crate::error::{JoinSide, SemanticError, SemanticResult};
use crate::expression::{ResolvedValue, ValueExpression, classify_column_reference};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{SymbolClass, SymbolEntry};

/// `left CROSS JOIN right`, or `left, right`
#[derive(Debug)]
pub struct CrossJoin {
    pub(super) syntax: SyntaxRef,
    pub(super) left: RowsSource,
    pub(super) right: RowsSource,
}

impl CrossJoin {
    pub fn new(
        syntax: SyntaxRef,
        left: impl Into<RowsSource>,
        right: impl Into<RowsSource>,
    ) -> Self {
        Self {
            syntax,
            left: left.into(),
            right: right.into(),
        }
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let left = self.left.propagate(given.clone(), rc)?;
        let right = self.right.propagate(given.clone(), rc)?;
        report_conflicting_sources(&left, &right, &self.syntax, rc);

        let result = left.result_context().combine(right.result_context());
        let kind = ResolvedRowsKind::CrossJoin(Box::new(ResolvedCrossJoin { left, right }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, result, kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCrossJoin {
    pub left: ResolvedRowsSource,
    pub right: ResolvedRowsSource,
}

/// `left [NATURAL] JOIN right [USING (..)] [ON ..]`
#[derive(Debug)]
pub struct NaturalJoin {
    pub(super) syntax: SyntaxRef,
    pub(super) left: RowsSource,
    pub(super) right: RowsSource,
    pub(super) columns: Vec<SymbolEntry>,
    pub(super) condition: Option<ValueExpression>,
}

impl NaturalJoin {
    pub fn new(
        syntax: SyntaxRef,
        left: impl Into<RowsSource>,
        right: impl Into<RowsSource>,
    ) -> Self {
        Self {
            syntax,
            left: left.into(),
            right: right.into(),
            columns: Vec::new(),
            condition: None,
        }
    }

    /// Builder method: set the `USING` column list
    pub fn with_columns(mut self, columns: Vec<SymbolEntry>) -> Self {
        self.columns = columns;
        self
    }

    /// Builder method: set the `ON` condition
    pub fn with_condition(mut self, condition: ValueExpression) -> Self {
        self.condition = Some(condition);
        self
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let left = self.left.propagate(given.clone(), rc)?;
        let right = self.right.propagate(given.clone(), rc)?;
        report_conflicting_sources(&left, &right, &self.syntax, rc);

        let dialect = rc.dialect();
        for entry in &self.columns {
            let name = entry.raw_name();
            let in_left = left.result_context().find_own_column(dialect, name);
            let in_right = right.result_context().find_own_column(dialect, name);

            match (in_left, in_right) {
                (Some(column), Some(_)) => classify_column_reference(entry, column),
                (in_left, in_right) => {
                    let sides = [
                        (JoinSide::Left, in_left.is_none(), left.result_context()),
                        (JoinSide::Right, in_right.is_none(), right.result_context()),
                    ];
                    let mut certain = false;
                    for (side, missing, context) in sides {
                        if missing && !context.is_tuple_partial() {
                            certain = true;
                            rc.append_error(
                                entry.range(),
                                SemanticError::JoinColumnNotFound {
                                    column: name.to_string(),
                                    side,
                                },
                            );
                        }
                    }
                    let class = if certain {
                        SymbolClass::Error
                    } else {
                        SymbolClass::Unknown
                    };
                    entry.symbol().classify(class);
                }
            }
        }

        let result = left.result_context().combine(right.result_context());
        let condition = match self.condition {
            Some(condition) => Some(condition.propagate(&result, rc)?),
            None => None,
        };

        let kind = ResolvedRowsKind::NaturalJoin(Box::new(ResolvedNaturalJoin {
            left,
            right,
            columns: self.columns,
            condition,
        }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, result, kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNaturalJoin {
    pub left: ResolvedRowsSource,
    pub right: ResolvedRowsSource,
    /// `USING` columns
    pub columns: Vec<SymbolEntry>,
    pub condition: Option<ResolvedValue>,
}

/// Report names bound on both sides of a join
fn report_conflicting_sources(
    left: &ResolvedRowsSource,
    right: &ResolvedRowsSource,
    syntax: &SyntaxRef,
    rc: &mut RecognitionContext<'_>,
) {
    let conflicts = left
        .result_context()
        .conflicting_sources(right.result_context(), rc.dialect());
    for binding in conflicts {
        let range = binding
            .symbol
            .entries()
            .first()
            .copied()
            .unwrap_or(syntax.range());
        rc.append_error(
            range,
            SemanticError::DuplicateAlias(binding.symbol.name().to_string()),
        );
    }
}
