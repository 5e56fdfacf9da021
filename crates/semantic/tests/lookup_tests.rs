// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Position lookups, visitors and the text printer over resolved trees

mod common;

use common::{Query, analyze, analyzer, catalog};
use sqlmodel_ir::{Dialect, SyntaxKind};
use sqlmodel_semantic::model::{
    CrossJoin, Cte, CteSubquery, ResolvedCorrelated, ResolvedCrossJoin, ResolvedCte,
    ResolvedCteSubquery, ResolvedNaturalJoin, ResolvedProjection, ResolvedRowsSource,
    ResolvedSetCorrespondence, ResolvedTableData, ResolvedTableValue,
};
use sqlmodel_semantic::{
    CancellationToken, ModelPrinter, ModelVisitor, ScopeLookup, SymbolClass,
};

fn correlated_query() -> (Query, ResolvedRowsSource) {
    let q = Query::new(
        "SELECT id FROM users WHERE id IN (SELECT user_id FROM orders WHERE orders.user_id = users.id)",
    );
    let inner = q
        .select(
            q.between("SELECT", 1, "users.id", 0),
            vec![q.item(q.column("user_id", 0))],
        )
        .with_from(q.table("orders", 0))
        .with_where(q.expr(
            q.between("orders.user_id", 0, "users.id", 0),
            vec![
                q.qualified("orders", "user_id", 0),
                q.qualified("users", "id", 0),
            ],
        ));
    let root = q
        .select_all(vec![q.item(q.column("id", 0))])
        .with_from(q.table("users", 0))
        .with_where(q.expr(
            q.between("id", 1, ")", 0),
            vec![q.column("id", 1), q.scalar(inner, q.between("(", 0, ")", 0))],
        ));

    let result = analyze(root);
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    (q, result.model.unwrap())
}

fn source_names(lookup: &ScopeLookup<'_>, offset: usize) -> Vec<String> {
    lookup
        .scope_at(offset)
        .unwrap()
        .sources()
        .iter()
        .filter_map(|b| b.parts.last().cloned())
        .collect()
}

#[test]
fn test_scope_inside_subquery_includes_outer_sources() {
    let (q, model) = correlated_query();
    let lookup = ScopeLookup::new(&model);

    let inside = source_names(&lookup, q.range("orders.user_id", 0).start);
    assert_eq!(inside, vec!["users", "orders"]);

    let outside = source_names(&lookup, q.range("id", 0).start);
    assert_eq!(outside, vec!["users"]);

    let inner_scope = lookup.scope_at(q.range("orders.user_id", 0).start).unwrap();
    let own: Vec<_> = inner_scope
        .scope_sources()
        .iter()
        .filter_map(|b| b.parts.last().map(String::as_str))
        .collect();
    assert_eq!(own, vec!["orders"]);
}

fn column_names(lookup: &ScopeLookup<'_>, offset: usize) -> Vec<String> {
    lookup
        .scope_at(offset)
        .unwrap()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_scope_in_having_follows_alias_visibility() {
    let q = Query::new("SELECT id AS k FROM users GROUP BY id HAVING k > 1");
    let build = || {
        q.select_all(vec![q.item_as(q.column("id", 0), "k", 0)])
            .with_from(q.table("users", 0))
            .with_group_by(vec![q.column("id", 1)])
            .with_having(q.expr(
                q.between("k", 1, "1", 0),
                vec![q.column("k", 1), q.number("1", 0)],
            ))
    };
    let having = q.range("k", 1).start;
    let select_list = q.range("id", 0).start;

    let mysql = analyzer(catalog(), Dialect::MySQL).analyze(build(), &CancellationToken::new());
    assert!(mysql.is_clean(), "{:?}", mysql.diagnostics);
    let model = mysql.model.unwrap();
    let lookup = ScopeLookup::new(&model);
    assert!(column_names(&lookup, having).contains(&"k".to_string()));
    assert!(!column_names(&lookup, select_list).contains(&"k".to_string()));

    let postgres = analyze(build());
    let model = postgres.model.unwrap();
    let lookup = ScopeLookup::new(&model);
    assert!(!column_names(&lookup, having).contains(&"k".to_string()));
    assert!(column_names(&lookup, having).contains(&"id".to_string()));
}

#[test]
fn test_scope_in_order_by_sees_aliases() {
    let q = Query::new("SELECT id AS k FROM users WHERE id > 1 ORDER BY k");
    let root = q
        .select_all(vec![q.item_as(q.column("id", 0), "k", 0)])
        .with_from(q.table("users", 0))
        .with_where(q.expr(
            q.between("id", 1, "1", 0),
            vec![q.column("id", 1), q.number("1", 0)],
        ))
        .with_order_by(vec![q.column("k", 1)]);

    let result = analyze(root);
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let model = result.model.unwrap();
    let lookup = ScopeLookup::new(&model);

    assert!(column_names(&lookup, q.range("k", 1).start).contains(&"k".to_string()));
    assert!(!column_names(&lookup, q.range("id", 1).start).contains(&"k".to_string()));
}

#[test]
fn test_subquery_nodes_are_children() {
    let (q, model) = correlated_query();

    assert_eq!(model.descendants().len(), 4);
    let node = model
        .find_node_containing(q.range("orders", 0).start)
        .unwrap();
    assert!(node.real_table().is_some_and(|t| t.name == "orders"));
    assert!(model.find_node_containing(q.sql.as_str().len() + 5).is_none());
}

#[test]
fn test_every_entry_is_classified() {
    let q = Query::new("SELECT id AS k FROM users ORDER BY k");
    let root = q
        .select_all(vec![q.item_as(q.column("id", 0), "k", 0)])
        .with_from(q.table("users", 0))
        .with_order_by(vec![q.column("k", 1)]);

    let result = analyze(root);
    assert!(result.is_clean(), "{:?}", result.diagnostics);
    let model = result.model.unwrap();
    let entries = ScopeLookup::new(&model).entries();

    let summary: Vec<(&str, SymbolClass)> = entries
        .iter()
        .map(|e| (e.raw_name(), e.symbol().class()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("id", SymbolClass::Column),
            ("k", SymbolClass::ColumnDerived),
            ("k", SymbolClass::ColumnDerived),
            ("users", SymbolClass::Table),
        ]
    );

    // ORDER BY k points back at the alias
    let alias = entries[1].symbol().definition().and_then(|d| d.range());
    let reference = entries[2].symbol().definition().and_then(|d| d.range());
    assert_eq!(alias, Some(q.range("k", 0)));
    assert_eq!(reference, alias);
}

#[test]
fn test_printer_snapshot() {
    let q = Query::new("WITH t AS (SELECT 1 AS one) SELECT one FROM t");
    let body = q.select(
        q.between("SELECT", 0, "one", 0),
        vec![q.item_as(q.number("1", 0), "one", 0)],
    );
    let subquery = CteSubquery::new(
        q.syntax(SyntaxKind::CommonTableExpression, q.between("t", 0, ")", 0)),
        q.entry("t", 0),
        body,
    );
    let main = q
        .select(
            q.between("SELECT", 1, "t", 1),
            vec![q.item(q.column("one", 1))],
        )
        .with_from(q.table("t", 1));
    let root = Cte::new(q.whole(SyntaxKind::WithClause), vec![subquery], main);

    let result = analyze(root);
    assert!(result.is_clean(), "{:?}", result.diagnostics);

    let expected = "\
#0 With [one: NUMERIC]
  #1 Cte t [one: NUMERIC]
    #2 Projection [one: NUMERIC]
  #3 Projection [one: NUMERIC]
    #4 Table t -> cte #1 [one: NUMERIC]
";
    assert_eq!(ModelPrinter::print(&result.model.unwrap()), expected);
}

#[test]
fn test_printer_marks_partial_results() {
    let q = Query::new("SELECT x FROM missing");
    let root = q
        .select_all(vec![q.item(q.column("x", 0))])
        .with_from(q.table("missing", 0));

    let result = analyze(root);
    let expected = "\
#0 Projection [x: ?] partial
  #1 Table missing -> unresolved [] partial
";
    assert_eq!(ModelPrinter::print(&result.model.unwrap()), expected);
}

/// Names the variant of every node it visits
#[derive(Default)]
struct KindCollector {
    kinds: Vec<&'static str>,
}

impl KindCollector {
    fn descend(&mut self, node: &ResolvedRowsSource) {
        for child in node.children() {
            child.accept(self);
        }
    }
}

impl ModelVisitor for KindCollector {
    type Output = ();

    fn visit_table_data(&mut self, _node: &ResolvedRowsSource, _data: &ResolvedTableData) {
        self.kinds.push("table");
    }

    fn visit_table_value(&mut self, node: &ResolvedRowsSource, _values: &ResolvedTableValue) {
        self.kinds.push("values");
        self.descend(node);
    }

    fn visit_projection(&mut self, node: &ResolvedRowsSource, _projection: &ResolvedProjection) {
        self.kinds.push("projection");
        self.descend(node);
    }

    fn visit_cross_join(&mut self, node: &ResolvedRowsSource, _join: &ResolvedCrossJoin) {
        self.kinds.push("cross");
        self.descend(node);
    }

    fn visit_natural_join(&mut self, node: &ResolvedRowsSource, _join: &ResolvedNaturalJoin) {
        self.kinds.push("join");
        self.descend(node);
    }

    fn visit_set_correspondence(
        &mut self,
        node: &ResolvedRowsSource,
        _set: &ResolvedSetCorrespondence,
    ) {
        self.kinds.push("set");
        self.descend(node);
    }

    fn visit_cte(&mut self, _node: &ResolvedRowsSource, cte: &ResolvedCte) {
        self.kinds.push("with");
        for subquery in &cte.subqueries {
            self.visit_cte_subquery(subquery);
        }
        cte.main.accept(self);
    }

    fn visit_cte_subquery(&mut self, subquery: &ResolvedCteSubquery) {
        self.kinds.push("cte");
        subquery.body.accept(self);
    }

    fn visit_correlated(&mut self, node: &ResolvedRowsSource, _correlated: &ResolvedCorrelated) {
        self.kinds.push("alias");
        self.descend(node);
    }
}

#[test]
fn test_visitor_walks_nested_sources() {
    let q = Query::new("SELECT * FROM (VALUES (1)) v, users");
    let values = q.values(q.between("VALUES", 0, ")", 0), vec![vec![q.number("1", 0)]]);
    let from = CrossJoin::new(
        q.syntax(SyntaxKind::CrossJoin, q.between("(", 0, "users", 0)),
        q.derived(values, q.between("(", 0, ")", 1), "v", 0),
        q.table("users", 0),
    );
    let root = q.select_all(vec![q.star(0)]).with_from(from);

    let result = analyze(root);
    assert!(result.is_clean(), "{:?}", result.diagnostics);

    let mut collector = KindCollector::default();
    result.model.unwrap().accept(&mut collector);
    assert_eq!(
        collector.kinds,
        vec!["projection", "cross", "alias", "values", "table"]
    );
}
