// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SELECT

use sqlmodel_ir::ClauseKind;
use tracing::debug;

use super::{ResolvedRowsKind, ResolvedRowsSource, RowsSource, SyntaxRef};
use crate::data_context::DataContext;
use crate::error::SemanticResult;
use crate::expression::{ResolvedValue, ValueExpression};
use crate::recognition::{NodeId, RecognitionContext};
use crate::selection::{ResolvedSelection, SelectionResultModel};

const CLAUSES: [ClauseKind; 4] = [
    ClauseKind::Where,
    ClauseKind::GroupBy,
    ClauseKind::Having,
    ClauseKind::OrderBy,
];

/// `SELECT .. [FROM ..] [WHERE ..] [GROUP BY ..] [HAVING ..] [ORDER BY ..]`
#[derive(Debug)]
pub struct Projection {
    pub(super) syntax: SyntaxRef,
    pub(super) from: Option<RowsSource>,
    pub(super) selection: SelectionResultModel,
    pub(super) where_clause: Option<ValueExpression>,
    pub(super) group_by: Vec<ValueExpression>,
    pub(super) having: Option<ValueExpression>,
    pub(super) order_by: Vec<ValueExpression>,
}

impl Projection {
    pub fn new(syntax: SyntaxRef, selection: SelectionResultModel) -> Self {
        Self {
            syntax,
            from: None,
            selection,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
        }
    }

    pub fn with_from(mut self, from: impl Into<RowsSource>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_where(mut self, condition: ValueExpression) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_group_by(mut self, keys: Vec<ValueExpression>) -> Self {
        self.group_by = keys;
        self
    }

    pub fn with_having(mut self, condition: ValueExpression) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn with_order_by(mut self, keys: Vec<ValueExpression>) -> Self {
        self.order_by = keys;
        self
    }

    pub(super) fn propagate(
        self,
        id: NodeId,
        given: DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedRowsSource> {
        let scope = given.enter_scope();
        let (from, from_context) = match self.from {
            Some(source) => {
                let resolved = source.propagate(scope, rc)?;
                let context = resolved.result_context().clone();
                (Some(resolved), context)
            }
            None => {
                let pseudo_columns = scope.pseudo_columns().to_vec();
                let context = scope.override_result_tuple(Vec::new(), pseudo_columns);
                (None, context)
            }
        };

        let (selection, columns) = self.selection.expand(id, &from_context, rc)?;
        let pseudo_columns = from_context
            .pseudo_columns()
            .iter()
            .filter(|p| p.policy.survives_projection())
            .cloned()
            .collect();
        let mut projected = from_context.override_result_tuple(columns, pseudo_columns);
        if selection.is_partial() {
            projected = projected.mark_partial_tuple();
        }
        debug!("Projection {}: columns={:?}", id, projected.column_names());

        let dialect = rc.dialect();
        let alias_scope: Vec<ClauseKind> = CLAUSES
            .into_iter()
            .filter(|clause| dialect.is_alias_visible_in(*clause))
            .collect();
        let alias_context = projected.combine(&from_context);
        let clause_context = |clause: ClauseKind| {
            if alias_scope.contains(&clause) {
                &alias_context
            } else {
                &from_context
            }
        };

        let where_clause = match self.where_clause {
            Some(condition) => Some(condition.propagate(clause_context(ClauseKind::Where), rc)?),
            None => None,
        };
        let group_by = self
            .group_by
            .into_iter()
            .map(|key| key.propagate(clause_context(ClauseKind::GroupBy), rc))
            .collect::<SemanticResult<Vec<_>>>()?;
        let having = match self.having {
            Some(condition) => Some(condition.propagate(clause_context(ClauseKind::Having), rc)?),
            None => None,
        };
        let order_by = self
            .order_by
            .into_iter()
            .map(|key| key.propagate(clause_context(ClauseKind::OrderBy), rc))
            .collect::<SemanticResult<Vec<_>>>()?;

        let kind = ResolvedRowsKind::Projection(Box::new(ResolvedProjection {
            from,
            from_context,
            alias_context,
            alias_scope,
            selection,
            where_clause,
            group_by,
            having,
            order_by,
        }));
        Ok(ResolvedRowsSource::new(id, self.syntax, given, projected, kind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProjection {
    pub from: Option<ResolvedRowsSource>,
    /// Context the select list was expanded against
    pub from_context: DataContext,
    /// Select-list columns ahead of `from_context`, for clauses that see aliases
    pub alias_context: DataContext,
    /// Clauses resolved against `alias_context`
    pub alias_scope: Vec<ClauseKind>,
    pub selection: ResolvedSelection,
    pub where_clause: Option<ResolvedValue>,
    pub group_by: Vec<ResolvedValue>,
    pub having: Option<ResolvedValue>,
    pub order_by: Vec<ResolvedValue>,
}

impl ResolvedProjection {
    /// Context the expressions of `clause` resolved against
    pub fn clause_context(&self, clause: ClauseKind) -> &DataContext {
        if self.alias_scope.contains(&clause) {
            &self.alias_context
        } else {
            &self.from_context
        }
    }

    /// Clause whose expressions cover `offset`
    pub fn clause_at(&self, offset: usize) -> Option<ClauseKind> {
        let covers = |value: &ResolvedValue| value.range().contains(offset);
        if self.where_clause.as_ref().is_some_and(covers) {
            Some(ClauseKind::Where)
        } else if self.group_by.iter().any(covers) {
            Some(ClauseKind::GroupBy)
        } else if self.having.as_ref().is_some_and(covers) {
            Some(ClauseKind::Having)
        } else if self.order_by.iter().any(covers) {
            Some(ClauseKind::OrderBy)
        } else {
            None
        }
    }

    /// Every top-level value: select list, then clauses in SQL order
    pub fn values(&self) -> impl Iterator<Item = &ResolvedValue> {
        self.selection
            .values()
            .chain(self.where_clause.as_ref())
            .chain(&self.group_by)
            .chain(self.having.as_ref())
            .chain(&self.order_by)
    }
}
