// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Tree-building helpers shared by the integration tests
//!
//! Each test writes the SQL it models and builds the rows-source tree by
//! hand; [`Query`] places every node and symbol over the matching tokens.

#![allow(dead_code)]

use std::sync::Arc;

use sqlmodel_catalog::{CatalogProvider, ColumnMetadata, DataType, TableMetadata};
use sqlmodel_ir::{Dialect, SyntaxKind, SyntaxNode, TextRange};
use sqlmodel_semantic::model::{
    CorrelatedSource, Projection, QualifiedName, SyntaxRef, TableData, TableValue,
};
use sqlmodel_semantic::{
    AnalysisResult, CancellationToken, ConstantKind, RowsSource, SelectItem, SelectionResultModel,
    SemanticAnalyzer, SemanticError, SymbolEntry, ValueExpression,
};
use sqlmodel_test_utils::{MockCatalog, MockCatalogBuilder, SqlText};

/// A query text with builders for the model nodes over it
pub struct Query {
    pub sql: SqlText,
}

impl Query {
    pub fn new(text: &str) -> Self {
        Self {
            sql: SqlText::new(text),
        }
    }

    pub fn range(&self, token: &str, n: usize) -> TextRange {
        self.sql.range_nth(token, n)
    }

    /// Range from the `n`th `first` to the `m`th `last`
    pub fn between(&self, first: &str, n: usize, last: &str, m: usize) -> TextRange {
        self.range(first, n).cover(self.range(last, m))
    }

    pub fn syntax(&self, kind: SyntaxKind, range: TextRange) -> SyntaxRef {
        SyntaxNode::new(kind, range).into_arc()
    }

    pub fn whole(&self, kind: SyntaxKind) -> SyntaxRef {
        self.sql.root(kind)
    }

    pub fn entry(&self, token: &str, n: usize) -> SymbolEntry {
        SymbolEntry::new(token, self.range(token, n))
    }

    pub fn entries(&self, tokens: &[(&str, usize)]) -> Vec<SymbolEntry> {
        tokens.iter().map(|(t, n)| self.entry(t, *n)).collect()
    }

    /// `FROM name`, using the `n`th occurrence of `name`
    pub fn table(&self, name: &str, n: usize) -> TableData {
        let range = self.range(name, n);
        TableData::new(
            self.syntax(SyntaxKind::TableReference, range),
            QualifiedName::new(self.entry(name, n)),
        )
    }

    /// `FROM name alias`
    pub fn aliased_table(&self, name: &str, n: usize, alias: &str, m: usize) -> CorrelatedSource {
        let range = self.range(name, n).cover(self.range(alias, m));
        CorrelatedSource::new(
            self.syntax(SyntaxKind::CorrelationSpec, range),
            self.table(name, n),
            self.entry(alias, m),
        )
    }

    /// `(subquery) alias`, the subquery spanning `range`
    pub fn derived(
        &self,
        source: impl Into<RowsSource>,
        range: TextRange,
        alias: &str,
        m: usize,
    ) -> CorrelatedSource {
        let range = range.cover(self.range(alias, m));
        CorrelatedSource::new(
            self.syntax(SyntaxKind::CorrelationSpec, range),
            source,
            self.entry(alias, m),
        )
    }

    pub fn column(&self, name: &str, n: usize) -> ValueExpression {
        let range = self.range(name, n);
        ValueExpression::ColumnReference {
            syntax: self.syntax(SyntaxKind::Expression, range),
            qualifier: None,
            name: self.entry(name, n),
        }
    }

    /// `qualifier.name`, both at their `n`th occurrence
    pub fn qualified(&self, qualifier: &str, name: &str, n: usize) -> ValueExpression {
        let qualifier_range = self.range(&format!("{}.{}", qualifier, name), n);
        let qualifier_end = qualifier_range.start + qualifier.len();
        let name_start = qualifier_end + 1;
        ValueExpression::ColumnReference {
            syntax: self.syntax(SyntaxKind::Expression, qualifier_range),
            qualifier: Some(QualifiedName::new(SymbolEntry::new(
                qualifier,
                TextRange::new(qualifier_range.start, qualifier_end),
            ))),
            name: SymbolEntry::new(name, TextRange::new(name_start, qualifier_range.end)),
        }
    }

    pub fn constant(&self, token: &str, n: usize, kind: ConstantKind) -> ValueExpression {
        ValueExpression::Constant {
            syntax: self.syntax(SyntaxKind::Literal, self.range(token, n)),
            kind,
        }
    }

    pub fn number(&self, token: &str, n: usize) -> ValueExpression {
        self.constant(token, n, ConstantKind::Numeric)
    }

    /// Operator or function call over `operands`
    pub fn expr(&self, range: TextRange, operands: Vec<ValueExpression>) -> ValueExpression {
        ValueExpression::Flattened {
            syntax: self.syntax(SyntaxKind::Expression, range),
            operands,
        }
    }

    pub fn scalar(&self, source: impl Into<RowsSource>, range: TextRange) -> ValueExpression {
        ValueExpression::Subquery {
            syntax: self.syntax(SyntaxKind::Subquery, range),
            source: Box::new(source.into()),
        }
    }

    pub fn item(&self, expr: ValueExpression) -> SelectItem {
        SelectItem::Column {
            syntax: Arc::clone(expr.syntax()),
            expr,
            alias: None,
        }
    }

    pub fn item_as(&self, expr: ValueExpression, alias: &str, n: usize) -> SelectItem {
        let range = expr.syntax().range().cover(self.range(alias, n));
        SelectItem::Column {
            syntax: self.syntax(SyntaxKind::DerivedColumn, range),
            expr,
            alias: Some(self.entry(alias, n)),
        }
    }

    pub fn star(&self, n: usize) -> SelectItem {
        SelectItem::CompleteTuple {
            syntax: self.syntax(SyntaxKind::Asterisk, self.range("*", n)),
        }
    }

    /// `qualifier.*`
    pub fn tuple(&self, qualifier: &str, n: usize) -> SelectItem {
        let range = self.range(&format!("{}.*", qualifier), n);
        SelectItem::Tuple {
            syntax: self.syntax(SyntaxKind::Asterisk, range),
            qualifier: QualifiedName::new(SymbolEntry::new(
                qualifier,
                TextRange::new(range.start, range.start + qualifier.len()),
            )),
        }
    }

    /// SELECT spanning `range`
    pub fn select(&self, range: TextRange, items: Vec<SelectItem>) -> Projection {
        Projection::new(
            self.syntax(SyntaxKind::SelectStatement, range),
            SelectionResultModel::new(items),
        )
    }

    /// SELECT spanning the whole text
    pub fn select_all(&self, items: Vec<SelectItem>) -> Projection {
        self.select(self.sql.full_range(), items)
    }

    pub fn values(&self, range: TextRange, rows: Vec<Vec<ValueExpression>>) -> TableValue {
        TableValue::new(self.syntax(SyntaxKind::ValuesClause, range), rows)
    }
}

/// Standard schema: users, orders, products
pub fn catalog() -> Arc<MockCatalog> {
    Arc::new(MockCatalogBuilder::new().with_standard_schema().build())
}

/// Two tables sharing column `x`: `a(x, y)` and `b(x, z)`
pub fn join_catalog() -> Arc<MockCatalog> {
    let table = |name: &str, columns: &[(&str, DataType)]| {
        TableMetadata::new(name, "app").with_columns(
            columns
                .iter()
                .map(|(c, t)| ColumnMetadata::new(*c, t.clone()))
                .collect(),
        )
    };
    Arc::new(
        MockCatalogBuilder::new()
            .with_table(table("a", &[("x", DataType::Integer), ("y", DataType::Text)]))
            .with_table(table("b", &[("x", DataType::BigInt), ("z", DataType::Date)]))
            .build(),
    )
}

pub fn analyzer(catalog: Arc<dyn CatalogProvider>, dialect: Dialect) -> SemanticAnalyzer {
    SemanticAnalyzer::new(catalog, dialect.settings())
}

/// Analyze with the standard schema and the PostgreSQL rules
pub fn analyze(root: impl Into<RowsSource>) -> AnalysisResult {
    sqlmodel_test_utils::init_test_logging();
    analyzer(catalog(), Dialect::PostgreSQL).analyze(root, &CancellationToken::new())
}

pub fn errors(result: &AnalysisResult) -> Vec<&SemanticError> {
    result.diagnostics.iter().map(|d| &d.error).collect()
}
