// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Model printer
//!
//! Renders a resolved tree as indented text, one node per line with its
//! result columns. Output depends only on the tree, so it doubles as a
//! snapshot format in tests.

use std::fmt::Write;

use crate::data_context::DataContext;
use crate::model::{
    ResolvedCorrelated, ResolvedCrossJoin, ResolvedCte, ResolvedCteSubquery, ResolvedNaturalJoin,
    ResolvedProjection, ResolvedRowsSource, ResolvedSetCorrespondence, ResolvedTableData,
    ResolvedTableValue,
};
use crate::visitor::ModelVisitor;

#[derive(Debug, Default)]
pub struct ModelPrinter {
    out: String,
    depth: usize,
}

impl ModelPrinter {
    pub fn print(root: &ResolvedRowsSource) -> String {
        let mut printer = ModelPrinter::default();
        root.accept(&mut printer);
        printer.out
    }

    fn line(&mut self, node: &ResolvedRowsSource, label: &str) {
        self.header(&format!("{} {}", node.id(), label));
        self.columns(node.result_context());
    }

    fn header(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
    }

    fn columns(&mut self, context: &DataContext) {
        let columns: Vec<String> = context
            .columns()
            .iter()
            .map(|c| format!("{}: {}", c.name(), c.ty))
            .collect();
        let _ = write!(self.out, " [{}]", columns.join(", "));
        if context.has_unresolved_source() {
            self.out.push_str(" partial");
        }
        self.out.push('\n');
    }

    fn children(&mut self, node: &ResolvedRowsSource) {
        self.depth += 1;
        for child in node.children() {
            child.accept(self);
        }
        self.depth -= 1;
    }
}

impl ModelVisitor for ModelPrinter {
    type Output = ();

    fn visit_table_data(&mut self, node: &ResolvedRowsSource, data: &ResolvedTableData) {
        let target = match (&data.table, data.cte) {
            (Some(table), _) => format!("table {}", table.qualified_name()),
            (None, Some(cte)) => format!("cte {}", cte),
            (None, None) => "unresolved".to_string(),
        };
        self.line(node, &format!("Table {} -> {}", data.name, target));
    }

    fn visit_table_value(&mut self, node: &ResolvedRowsSource, values: &ResolvedTableValue) {
        self.line(node, &format!("Values rows={}", values.rows.len()));
        self.children(node);
    }

    fn visit_projection(&mut self, node: &ResolvedRowsSource, _projection: &ResolvedProjection) {
        self.line(node, "Projection");
        self.children(node);
    }

    fn visit_cross_join(&mut self, node: &ResolvedRowsSource, _join: &ResolvedCrossJoin) {
        self.line(node, "CrossJoin");
        self.children(node);
    }

    fn visit_natural_join(&mut self, node: &ResolvedRowsSource, join: &ResolvedNaturalJoin) {
        let using: Vec<&str> = join.columns.iter().map(|c| c.raw_name()).collect();
        let label = if using.is_empty() {
            "Join".to_string()
        } else {
            format!("Join using({})", using.join(", "))
        };
        self.line(node, &label);
        self.children(node);
    }

    fn visit_set_correspondence(
        &mut self,
        node: &ResolvedRowsSource,
        set: &ResolvedSetCorrespondence,
    ) {
        self.line(node, &set.kind.to_string());
        self.children(node);
    }

    fn visit_cte(&mut self, node: &ResolvedRowsSource, cte: &ResolvedCte) {
        self.line(node, if cte.recursive { "With recursive" } else { "With" });
        self.depth += 1;
        for subquery in &cte.subqueries {
            self.visit_cte_subquery(subquery);
        }
        cte.main.accept(self);
        self.depth -= 1;
    }

    fn visit_cte_subquery(&mut self, subquery: &ResolvedCteSubquery) {
        let name = subquery.name.as_ref().map_or("?", |n| n.raw_name());
        self.header(&format!("{} Cte {}", subquery.id, name));
        let columns: Vec<String> = subquery
            .output
            .iter()
            .map(|c| format!("{}: {}", c.name(), c.ty))
            .collect();
        let _ = writeln!(self.out, " [{}]", columns.join(", "));
        self.depth += 1;
        subquery.body.accept(self);
        self.depth -= 1;
    }

    fn visit_correlated(&mut self, node: &ResolvedRowsSource, correlated: &ResolvedCorrelated) {
        self.line(node, &format!("Alias {}", correlated.alias.raw_name()));
        self.children(node);
    }
}
