// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Analyzer behaviour: catalog failures, cancellation, configuration,
//! determinism and sharing across threads

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Query, analyze, analyzer, errors};
use sqlmodel_catalog::{
    CatalogError, CatalogProvider, CatalogResult, ColumnMetadata, DataType, TableMetadata,
};
use sqlmodel_ir::{Dialect, SyntaxKind};
use sqlmodel_semantic::model::{CrossJoin, Projection};
use sqlmodel_semantic::{
    AnalyzerConfig, CancellationToken, ExprType, ModelPrinter, SemanticAnalyzer, SemanticError,
    SymbolClass,
};
use sqlmodel_test_utils::{MockCatalog, MockCatalogBuilder};

fn select_star(q: &Query, table: &str) -> Projection {
    q.select_all(vec![q.star(0)]).with_from(q.table(table, 0))
}

#[test]
fn test_failed_lookup_is_reported_with_cause() {
    let catalog = MockCatalogBuilder::new()
        .with_standard_schema()
        .with_failing_lookup("users")
        .build();
    let q = Query::new("SELECT * FROM users");

    let result = analyzer(Arc::new(catalog), Dialect::PostgreSQL)
        .analyze(select_star(&q, "users"), &CancellationToken::new());

    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert!(matches!(
        &diagnostic.error,
        SemanticError::Catalog { subject, .. } if subject == "users"
    ));
    assert!(matches!(
        diagnostic.cause(),
        Some(CatalogError::ConnectionFailed(_))
    ));
    assert_eq!(diagnostic.range, q.range("users", 0));

    // Unresolved, not empty: no follow-up errors
    let model = result.model.unwrap();
    assert!(model.result_context().has_unresolved_source());
    assert!(model.result_context().columns().is_empty());
}

#[test]
fn test_failed_attributes_name_the_table() {
    let catalog = MockCatalogBuilder::new()
        .with_standard_schema()
        .with_failing_attributes("orders")
        .build();
    let q = Query::new("SELECT status FROM orders");
    let root = q
        .select_all(vec![q.item(q.column("status", 0))])
        .with_from(q.table("orders", 0));

    let result = analyzer(Arc::new(catalog), Dialect::PostgreSQL)
        .analyze(root, &CancellationToken::new());

    assert_eq!(result.diagnostics.len(), 1);
    assert!(matches!(
        &result.diagnostics[0].error,
        SemanticError::Catalog { subject, source: CatalogError::AttributeIntrospection { .. } }
            if subject == "myapp.orders"
    ));

    // The table itself was found
    let model = result.model.unwrap();
    let lookup = sqlmodel_semantic::ScopeLookup::new(&model);
    let table = lookup.symbol_at(q.range("orders", 0).start).unwrap();
    assert_eq!(table.symbol().class(), SymbolClass::Table);
    let status = lookup.symbol_at(q.range("status", 0).start).unwrap();
    assert_eq!(status.symbol().class(), SymbolClass::Unknown);
}

#[test]
fn test_cancelled_before_start() {
    let q = Query::new("SELECT * FROM users");
    let token = CancellationToken::new();
    token.cancel();

    let result =
        analyzer(common::catalog(), Dialect::PostgreSQL).analyze(select_star(&q, "users"), &token);

    assert!(result.cancelled);
    assert!(result.model.is_none());
    assert!(result.diagnostics.is_empty());
    assert!(!result.is_clean());
}

/// Cancels the pass from inside the first table lookup
struct CancellingCatalog {
    inner: MockCatalog,
    token: CancellationToken,
}

impl CatalogProvider for CancellingCatalog {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        self.token.cancel();
        self.inner.find_table(name_parts)
    }
}

#[test]
fn test_cancelled_mid_pass_keeps_diagnostics() {
    let token = CancellationToken::new();
    let catalog = CancellingCatalog {
        inner: MockCatalogBuilder::new().with_standard_schema().build(),
        token: token.clone(),
    };
    let q = Query::new("SELECT * FROM missing CROSS JOIN users");
    let from = CrossJoin::new(
        q.syntax(SyntaxKind::CrossJoin, q.between("missing", 0, "users", 0)),
        q.table("missing", 0),
        q.table("users", 0),
    );
    let root = q.select_all(vec![q.star(0)]).with_from(from);

    let result = analyzer(Arc::new(catalog), Dialect::PostgreSQL).analyze(root, &token);

    assert!(result.cancelled);
    assert!(result.model.is_none());
    assert_eq!(
        errors(&result),
        vec![&SemanticError::TableNotFound("missing".to_string())]
    );
}

/// Counts attribute type reads and cancels the pass on the first one
struct SlowAttributeCatalog {
    inner: MockCatalog,
    token: CancellationToken,
    reads: AtomicUsize,
}

impl CatalogProvider for SlowAttributeCatalog {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        self.inner.find_table(name_parts)
    }

    fn attribute_type(
        &self,
        _table: &TableMetadata,
        column: &ColumnMetadata,
    ) -> CatalogResult<DataType> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
        Ok(column.data_type.clone())
    }
}

#[test]
fn test_cancelled_between_attribute_reads() {
    let token = CancellationToken::new();
    let catalog = Arc::new(SlowAttributeCatalog {
        inner: MockCatalogBuilder::new().with_standard_schema().build(),
        token: token.clone(),
        reads: AtomicUsize::new(0),
    });
    let q = Query::new("SELECT * FROM users");

    let result = analyzer(catalog.clone(), Dialect::PostgreSQL)
        .analyze(select_star(&q, "users"), &token);

    assert!(result.cancelled);
    assert!(result.model.is_none());
    // users has four attributes; only the first one is read
    assert_eq!(catalog.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_analysis_is_deterministic() {
    let build = || {
        let q = Query::new("SELECT u.id, o.total FROM users u, orders o WHERE nope = 1");
        let from = CrossJoin::new(
            q.syntax(SyntaxKind::CrossJoin, q.between("users", 0, "o", 1)),
            q.aliased_table("users", 0, "u", 1),
            q.aliased_table("orders", 0, "o", 1),
        );
        q.select_all(vec![
            q.item(q.qualified("u", "id", 0)),
            q.item(q.qualified("o", "total", 0)),
        ])
        .with_from(from)
        .with_where(q.expr(
            q.between("nope", 0, "1", 0),
            vec![q.column("nope", 0), q.number("1", 0)],
        ))
    };

    let first = analyze(build());
    let second = analyze(build());

    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(
        errors(&first),
        vec![&SemanticError::ColumnNotFound("nope".to_string())]
    );
    let (first, second) = (first.model.unwrap(), second.model.unwrap());
    assert_eq!(ModelPrinter::print(&first), ModelPrinter::print(&second));
    assert_eq!(first, second);
}

#[test]
fn test_analyzer_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SemanticAnalyzer>();

    let shared = analyzer(common::catalog(), Dialect::MySQL);
    let tables = ["users", "orders", "products"];

    let widths: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = tables
            .iter()
            .map(|table| {
                let shared = &shared;
                scope.spawn(move || {
                    let q = Query::new(&format!("SELECT * FROM {}", table));
                    let result = shared.analyze(select_star(&q, table), &CancellationToken::new());
                    result.model.unwrap().result_context().columns().len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(widths, vec![4, 5, 4]);
}

#[test]
fn test_identifiers_stand_in_for_metadata() {
    let q = Query::new("SELECT a, b FROM t WHERE c = 1");
    let root = q
        .select_all(vec![q.item(q.column("a", 0)), q.item(q.column("b", 0))])
        .with_from(q.table("t", 0))
        .with_where(q.expr(
            q.between("c", 0, "1", 0),
            vec![q.column("c", 0), q.number("1", 0)],
        ));
    let config = AnalyzerConfig {
        use_real_metadata: false,
        ..Default::default()
    };

    let result = SemanticAnalyzer::from_config(Arc::new(MockCatalog::new()), config)
        .analyze(root, &CancellationToken::new());

    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let model = result.model.unwrap();
    assert_eq!(model.result_context().column_names(), vec!["a", "b"]);
    assert!(model
        .result_context()
        .columns()
        .iter()
        .all(|c| c.ty == ExprType::Any));
}

#[test]
fn test_config_from_json_drives_dialect() {
    let json = r#"{ "dialect": "MySQL", "max_diagnostics": 10 }"#;
    let config = AnalyzerConfig::from_json(json).unwrap();
    let analyzer = SemanticAnalyzer::from_config(common::catalog(), config);

    assert_eq!(analyzer.dialect().name(), "MySQL");
    assert_eq!(analyzer.config().max_diagnostics, Some(10));
}

#[tokio::test]
async fn test_load_from_async_catalog() {
    sqlmodel_test_utils::init_test_logging();
    let catalog = MockCatalogBuilder::new().with_standard_schema().build();
    let config = AnalyzerConfig {
        dialect: Some(Dialect::PostgreSQL),
        ..Default::default()
    };

    let analyzer = SemanticAnalyzer::load(&catalog, config).await.unwrap();

    let q = Query::new("SELECT current_user FROM orders");
    let root = q
        .select_all(vec![q.item(q.column("current_user", 0))])
        .with_from(q.table("orders", 0));
    let result = analyzer.analyze(root, &CancellationToken::new());
    assert!(result.is_clean(), "{:?}", result.diagnostics);

    let q = Query::new("SELECT * FROM orders");
    let result = analyzer.analyze(select_star(&q, "orders"), &CancellationToken::new());
    assert_eq!(
        result.model.unwrap().result_context().column_names(),
        vec!["id", "user_id", "total", "status", "created_at"]
    );
}
