// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Value expressions
//!
//! The parts of an expression that matter for name resolution: column and
//! tuple references, member and index access, casts, constants, variables
//! and scalar subqueries. Everything else (operators, function calls) is a
//! [`ValueExpression::Flattened`] node whose operands are resolved in turn.

use std::sync::Arc;

use sqlmodel_catalog::DataKind;
use sqlmodel_ir::TextRange;

use crate::data_context::{DataContext, PseudoColumn, ResultColumn};
use crate::error::{SemanticError, SemanticResult};
use crate::model::{
    QualifiedName, ResolvedRowsSource, RowsSource, SyntaxRef, classify_source_reference,
};
use crate::recognition::{NodeId, RecognitionContext};
use crate::symbol::{SymbolClass, SymbolDefinition, SymbolEntry};
use crate::types::ExprType;

/// Kind of a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantKind {
    Numeric,
    String,
    Boolean,
    Temporal,
    Null,
}

impl ConstantKind {
    fn ty(self) -> ExprType {
        match self {
            ConstantKind::Numeric => ExprType::Predefined(DataKind::Numeric),
            ConstantKind::String => ExprType::Predefined(DataKind::String),
            ConstantKind::Boolean => ExprType::Predefined(DataKind::Boolean),
            ConstantKind::Temporal => ExprType::Predefined(DataKind::Temporal),
            ConstantKind::Null => ExprType::Any,
        }
    }
}

/// Unresolved value expression
#[derive(Debug)]
pub enum ValueExpression {
    /// `[qualifier.]name`
    ColumnReference {
        syntax: SyntaxRef,
        qualifier: Option<QualifiedName>,
        name: SymbolEntry,
    },
    /// `qualifier.*` used as a value
    TupleReference {
        syntax: SyntaxRef,
        qualifier: QualifiedName,
    },
    /// `(owner).member`
    MemberAccess {
        syntax: SyntaxRef,
        owner: Box<ValueExpression>,
        member: SymbolEntry,
    },
    /// `owner[i][j]...`
    IndexAccess {
        syntax: SyntaxRef,
        owner: Box<ValueExpression>,
        subscripts: Vec<ValueExpression>,
    },
    /// `CAST(value AS type_name)`
    TypeCast {
        syntax: SyntaxRef,
        value: Box<ValueExpression>,
        type_name: String,
    },
    Constant {
        syntax: SyntaxRef,
        kind: ConstantKind,
    },
    /// Session variable or bind parameter
    Variable { syntax: SyntaxRef, name: SymbolEntry },
    /// Scalar subquery
    Subquery {
        syntax: SyntaxRef,
        source: Box<RowsSource>,
    },
    /// Any other expression, reduced to its operands
    Flattened {
        syntax: SyntaxRef,
        operands: Vec<ValueExpression>,
    },
}

/// What a column reference resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTarget {
    Column(ResultColumn),
    Pseudo(PseudoColumn),
}

impl ColumnTarget {
    pub fn ty(&self) -> &ExprType {
        match self {
            ColumnTarget::Column(column) => &column.ty,
            ColumnTarget::Pseudo(pseudo) => &pseudo.ty,
        }
    }
}

/// Variant-specific part of a resolved value
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValueKind {
    ColumnReference {
        qualifier: Option<QualifiedName>,
        name: SymbolEntry,
        target: Option<ColumnTarget>,
    },
    TupleReference {
        qualifier: QualifiedName,
        source: Option<NodeId>,
    },
    MemberAccess {
        owner: Box<ResolvedValue>,
        member: SymbolEntry,
    },
    IndexAccess {
        owner: Box<ResolvedValue>,
        subscripts: Vec<ResolvedValue>,
    },
    TypeCast {
        value: Box<ResolvedValue>,
        type_name: String,
    },
    Constant(ConstantKind),
    Variable {
        name: SymbolEntry,
        target: Option<PseudoColumn>,
    },
    Subquery(Box<ResolvedRowsSource>),
    Flattened(Vec<ResolvedValue>),
}

/// A value expression after resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    syntax: SyntaxRef,
    ty: ExprType,
    kind: ResolvedValueKind,
}

impl ResolvedValue {
    pub fn syntax(&self) -> &SyntaxRef {
        &self.syntax
    }

    pub fn range(&self) -> TextRange {
        self.syntax.range()
    }

    pub fn ty(&self) -> &ExprType {
        &self.ty
    }

    pub fn kind(&self) -> &ResolvedValueKind {
        &self.kind
    }

    /// Result column a plain column reference resolved to
    pub fn column(&self) -> Option<&ResultColumn> {
        match &self.kind {
            ResolvedValueKind::ColumnReference {
                target: Some(ColumnTarget::Column(column)),
                ..
            } => Some(column),
            _ => None,
        }
    }

    /// Entry of a plain column reference
    pub fn reference_entry(&self) -> Option<&SymbolEntry> {
        match &self.kind {
            ResolvedValueKind::ColumnReference { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Direct sub-values
    pub fn operands(&self) -> Vec<&ResolvedValue> {
        match &self.kind {
            ResolvedValueKind::MemberAccess { owner, .. } => vec![owner.as_ref()],
            ResolvedValueKind::IndexAccess { owner, subscripts } => {
                std::iter::once(owner.as_ref()).chain(subscripts).collect()
            }
            ResolvedValueKind::TypeCast { value, .. } => vec![value.as_ref()],
            ResolvedValueKind::Flattened(operands) => operands.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Subqueries reachable without entering another subquery
    pub fn collect_subqueries<'a>(&'a self, out: &mut Vec<&'a ResolvedRowsSource>) {
        if let ResolvedValueKind::Subquery(source) = &self.kind {
            out.push(source);
            return;
        }
        for operand in self.operands() {
            operand.collect_subqueries(out);
        }
    }

    /// Symbol entries of this expression, subqueries excluded
    pub fn collect_entries<'a>(&'a self, out: &mut Vec<&'a SymbolEntry>) {
        match &self.kind {
            ResolvedValueKind::ColumnReference {
                qualifier, name, ..
            } => {
                if let Some(qualifier) = qualifier {
                    out.extend(qualifier.entries());
                }
                out.push(name);
            }
            ResolvedValueKind::TupleReference { qualifier, .. } => out.extend(qualifier.entries()),
            ResolvedValueKind::MemberAccess { member, .. } => out.push(member),
            ResolvedValueKind::Variable { name, .. } => out.push(name),
            _ => {}
        }
        for operand in self.operands() {
            operand.collect_entries(out);
        }
    }
}

impl ValueExpression {
    pub fn syntax(&self) -> &SyntaxRef {
        match self {
            ValueExpression::ColumnReference { syntax, .. }
            | ValueExpression::TupleReference { syntax, .. }
            | ValueExpression::MemberAccess { syntax, .. }
            | ValueExpression::IndexAccess { syntax, .. }
            | ValueExpression::TypeCast { syntax, .. }
            | ValueExpression::Constant { syntax, .. }
            | ValueExpression::Variable { syntax, .. }
            | ValueExpression::Subquery { syntax, .. }
            | ValueExpression::Flattened { syntax, .. } => syntax,
        }
    }

    /// Resolve names and compute the type against `context`
    pub fn propagate(
        self,
        context: &DataContext,
        rc: &mut RecognitionContext<'_>,
    ) -> SemanticResult<ResolvedValue> {
        rc.check_cancelled()?;
        let (syntax, ty, kind) = match self {
            ValueExpression::ColumnReference {
                syntax,
                qualifier,
                name,
            } => {
                let target = match &qualifier {
                    Some(qualifier) => resolve_qualified_column(context, qualifier, &name, rc),
                    None => resolve_unqualified_column(context, &name, rc),
                };
                let ty = target
                    .as_ref()
                    .map_or(ExprType::Unknown, |t| t.ty().clone());
                let kind = ResolvedValueKind::ColumnReference {
                    qualifier,
                    name,
                    target,
                };
                (syntax, ty, kind)
            }
            ValueExpression::TupleReference { syntax, qualifier } => {
                let binding = context.resolve_source(rc.dialect(), &qualifier.to_parts());
                let (ty, source) = match binding {
                    Some(binding) => {
                        classify_source_reference(qualifier.name(), binding);
                        let members = binding
                            .columns
                            .iter()
                            .map(|c| (c.name().to_string(), c.ty.clone()))
                            .collect();
                        (ExprType::Row { members }, Some(binding.source))
                    }
                    None => {
                        report_missing_source(&qualifier, context, rc);
                        (ExprType::Unknown, None)
                    }
                };
                (syntax, ty, ResolvedValueKind::TupleReference { qualifier, source })
            }
            ValueExpression::MemberAccess {
                syntax,
                owner,
                member,
            } => {
                let owner = owner.propagate(context, rc)?;
                let ty = match owner.ty().find_named_member_type(member.raw_name()) {
                    Some(ty) => {
                        member.classify_as(SymbolClass::CompositeField, Some(member.occurrence()));
                        ty
                    }
                    None if owner.ty().is_unknown() => {
                        member.symbol().classify(SymbolClass::Unknown);
                        ExprType::Unknown
                    }
                    None => {
                        member.symbol().classify(SymbolClass::Error);
                        rc.append_error(
                            member.range(),
                            SemanticError::MemberNotFound {
                                member: member.raw_name().to_string(),
                                ty: owner.ty().to_string(),
                            },
                        );
                        ExprType::Unknown
                    }
                };
                let kind = ResolvedValueKind::MemberAccess {
                    owner: Box::new(owner),
                    member,
                };
                (syntax, ty, kind)
            }
            ValueExpression::IndexAccess {
                syntax,
                owner,
                subscripts,
            } => {
                let owner = owner.propagate(context, rc)?;
                let subscripts = subscripts
                    .into_iter()
                    .map(|s| s.propagate(context, rc))
                    .collect::<SemanticResult<Vec<_>>>()?;
                let ty = owner
                    .ty()
                    .find_indexed_item_type(subscripts.len())
                    .unwrap_or(ExprType::Unknown);
                let kind = ResolvedValueKind::IndexAccess {
                    owner: Box::new(owner),
                    subscripts,
                };
                (syntax, ty, kind)
            }
            ValueExpression::TypeCast {
                syntax,
                value,
                type_name,
            } => {
                let value = value.propagate(context, rc)?;
                let ty = ExprType::for_type_name(&type_name);
                let kind = ResolvedValueKind::TypeCast {
                    value: Box::new(value),
                    type_name,
                };
                (syntax, ty, kind)
            }
            ValueExpression::Constant { syntax, kind } => {
                (syntax, kind.ty(), ResolvedValueKind::Constant(kind))
            }
            ValueExpression::Variable { syntax, name } => {
                let target = context
                    .resolve_pseudo_column(rc.dialect(), name.raw_name())
                    .cloned();
                let ty = match &target {
                    Some(pseudo) => {
                        classify_pseudo_reference(&name, pseudo);
                        pseudo.ty.clone()
                    }
                    None => {
                        name.symbol().classify(SymbolClass::Unknown);
                        ExprType::Unknown
                    }
                };
                (syntax, ty, ResolvedValueKind::Variable { name, target })
            }
            ValueExpression::Subquery { syntax, source } => {
                let resolved = source.propagate(context.enter_scope(), rc)?;
                let ty = ExprType::for_scalar_subquery(resolved.result_context());
                (syntax, ty, ResolvedValueKind::Subquery(Box::new(resolved)))
            }
            ValueExpression::Flattened { syntax, operands } => {
                let operands = operands
                    .into_iter()
                    .map(|o| o.propagate(context, rc))
                    .collect::<SemanticResult<Vec<_>>>()?;
                (syntax, ExprType::Unknown, ResolvedValueKind::Flattened(operands))
            }
        };
        Ok(ResolvedValue { syntax, ty, kind })
    }
}

fn resolve_unqualified_column(
    context: &DataContext,
    name: &SymbolEntry,
    rc: &mut RecognitionContext<'_>,
) -> Option<ColumnTarget> {
    let dialect = rc.dialect();
    if let Some(column) = context.resolve_column(dialect, name.raw_name()) {
        classify_column_reference(name, column);
        return Some(ColumnTarget::Column(column.clone()));
    }
    if let Some(pseudo) = context.resolve_pseudo_column(dialect, name.raw_name()) {
        classify_pseudo_reference(name, pseudo);
        return Some(ColumnTarget::Pseudo(pseudo.clone()));
    }
    report_missing_column(name, context, rc);
    None
}

fn resolve_qualified_column(
    context: &DataContext,
    qualifier: &QualifiedName,
    name: &SymbolEntry,
    rc: &mut RecognitionContext<'_>,
) -> Option<ColumnTarget> {
    let dialect = rc.dialect();
    let Some(binding) = context.resolve_source(dialect, &qualifier.to_parts()) else {
        report_missing_source(qualifier, context, rc);
        name.symbol().classify(SymbolClass::Unknown);
        return None;
    };
    classify_source_reference(qualifier.name(), binding);

    if let Some(column) = binding.find_column(dialect, name.raw_name()) {
        classify_column_reference(name, column);
        return Some(ColumnTarget::Column(column.clone()));
    }
    if let Some(pseudo) = context
        .pseudo_columns_of(binding)
        .find(|p| dialect.identifiers_match(p.name(), name.raw_name()))
    {
        classify_pseudo_reference(name, pseudo);
        return Some(ColumnTarget::Pseudo(pseudo.clone()));
    }
    report_missing_column(name, context, rc);
    None
}

/// A reference takes over the class and definition of the column it names
pub(crate) fn classify_column_reference(name: &SymbolEntry, column: &ResultColumn) {
    let class = match column.symbol.class() {
        SymbolClass::ColumnDerived => SymbolClass::ColumnDerived,
        _ => SymbolClass::Column,
    };
    let definition = column.symbol.definition().cloned().or_else(|| {
        column
            .real_table
            .as_ref()
            .zip(column.real_attribute.as_ref())
            .map(|(table, attribute)| SymbolDefinition::Attribute {
                table: Arc::clone(table),
                column: attribute.clone(),
            })
    });
    name.classify_as(class, definition);
}

fn classify_pseudo_reference(name: &SymbolEntry, pseudo: &PseudoColumn) {
    name.classify_as(SymbolClass::Column, pseudo.symbol.definition().cloned());
}

fn report_missing_column(
    name: &SymbolEntry,
    context: &DataContext,
    rc: &mut RecognitionContext<'_>,
) {
    if context.has_unresolved_source() {
        // The column may well live in the source we could not resolve
        name.symbol().classify(SymbolClass::Unknown);
    } else {
        name.symbol().classify(SymbolClass::Error);
        rc.append_error(
            name.range(),
            SemanticError::ColumnNotFound(name.raw_name().to_string()),
        );
    }
}

pub(crate) fn report_missing_source(
    qualifier: &QualifiedName,
    context: &DataContext,
    rc: &mut RecognitionContext<'_>,
) {
    if context.has_unresolved_source() {
        qualifier.name().symbol().classify(SymbolClass::Unknown);
    } else {
        qualifier.name().symbol().classify(SymbolClass::Error);
        rc.append_error(
            qualifier.range(),
            SemanticError::SourceNotFound(qualifier.to_string()),
        );
    }
}
