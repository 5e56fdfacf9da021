// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Identifiers of an unresolved tree, for analysis without catalog metadata

use std::collections::BTreeSet;

use sqlmodel_ir::DialectProvider;

use super::RowsSource;
use crate::expression::ValueExpression;
use crate::selection::SelectItem;

/// Table and column names a query mentions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KnownIdentifiers {
    tables: BTreeSet<String>,
    columns: BTreeSet<String>,
    ctes: BTreeSet<String>,
}

impl KnownIdentifiers {
    /// Walk `root` and collect the names it mentions
    ///
    /// Table names are canonicalized with `dialect`; column names are kept as
    /// written since lookups canonicalize both sides.
    pub fn collect(root: &RowsSource, dialect: &dyn DialectProvider) -> Self {
        let mut known = KnownIdentifiers::default();
        known.visit_source(root, dialect);
        known
    }

    /// Table names that do not name a CTE
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|t| !self.ctes.contains(*t))
            .map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    fn visit_source(&mut self, source: &RowsSource, dialect: &dyn DialectProvider) {
        match source {
            RowsSource::TableData(data) => {
                self.tables
                    .insert(dialect.canonicalize_identifier(data.name.name().raw_name()));
            }
            RowsSource::TableValue(values) => {
                for value in values.rows.iter().flatten() {
                    self.visit_value(value, dialect);
                }
            }
            RowsSource::Projection(projection) => {
                if let Some(from) = &projection.from {
                    self.visit_source(from, dialect);
                }
                for item in projection.selection.items() {
                    if let SelectItem::Column { expr, .. } = item {
                        self.visit_value(expr, dialect);
                    }
                }
                let clauses = projection
                    .where_clause
                    .iter()
                    .chain(&projection.group_by)
                    .chain(projection.having.iter())
                    .chain(&projection.order_by);
                for value in clauses {
                    self.visit_value(value, dialect);
                }
            }
            RowsSource::CrossJoin(join) => {
                self.visit_source(&join.left, dialect);
                self.visit_source(&join.right, dialect);
            }
            RowsSource::NaturalJoin(join) => {
                self.visit_source(&join.left, dialect);
                self.visit_source(&join.right, dialect);
                self.columns
                    .extend(join.columns.iter().map(|c| c.raw_name().to_string()));
                if let Some(condition) = &join.condition {
                    self.visit_value(condition, dialect);
                }
            }
            RowsSource::SetCorrespondence(set) => {
                self.visit_source(&set.left, dialect);
                self.visit_source(&set.right, dialect);
                self.columns.extend(
                    set.corresponding
                        .iter()
                        .flatten()
                        .map(|c| c.raw_name().to_string()),
                );
            }
            RowsSource::Cte(cte) => {
                for subquery in &cte.subqueries {
                    if let Some(name) = &subquery.name {
                        self.ctes
                            .insert(dialect.canonicalize_identifier(name.raw_name()));
                    }
                    self.visit_source(&subquery.body, dialect);
                }
                self.visit_source(&cte.main, dialect);
            }
            RowsSource::Correlated(correlated) => self.visit_source(&correlated.source, dialect),
        }
    }

    fn visit_value(&mut self, value: &ValueExpression, dialect: &dyn DialectProvider) {
        match value {
            ValueExpression::ColumnReference { name, .. } => {
                self.columns.insert(name.raw_name().to_string());
            }
            ValueExpression::MemberAccess { owner, .. } => self.visit_value(owner, dialect),
            ValueExpression::IndexAccess {
                owner, subscripts, ..
            } => {
                self.visit_value(owner, dialect);
                for subscript in subscripts {
                    self.visit_value(subscript, dialect);
                }
            }
            ValueExpression::TypeCast { value, .. } => self.visit_value(value, dialect),
            ValueExpression::Subquery { source, .. } => self.visit_source(source, dialect),
            ValueExpression::Flattened { operands, .. } => {
                for operand in operands {
                    self.visit_value(operand, dialect);
                }
            }
            ValueExpression::TupleReference { .. }
            | ValueExpression::Constant { .. }
            | ValueExpression::Variable { .. } => {}
        }
    }
}
