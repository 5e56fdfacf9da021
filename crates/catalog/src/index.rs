// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Name lookup shared by the in-memory catalogs

use std::sync::Arc;

use sqlmodel_ir::DialectProvider;

use crate::metadata::TableMetadata;

/// How stored table names are compared with the names looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatching {
    /// Case is ignored
    #[default]
    IgnoreCase,
    /// Names must be equal; lookups pass identifiers the dialect already
    /// canonicalized (quoted names keep their case)
    Exact,
}

impl NameMatching {
    /// Matching that agrees with the dialect's identifier lookup
    pub fn for_dialect(dialect: &dyn DialectProvider) -> Self {
        if dialect.is_case_insensitive() {
            NameMatching::IgnoreCase
        } else {
            NameMatching::Exact
        }
    }

    pub fn matches(self, stored: &str, wanted: &str) -> bool {
        match self {
            NameMatching::IgnoreCase => stored.to_lowercase() == wanted.to_lowercase(),
            NameMatching::Exact => stored == wanted,
        }
    }
}

/// Ordered table list with optionally qualified lookup
///
/// Insertion order is kept, so an unqualified name present in several schemas
/// always resolves to the table inserted first. Names compare per
/// [`NameMatching`], case-insensitively unless configured otherwise.
#[derive(Debug, Clone, Default)]
pub struct TableIndex {
    tables: Vec<Arc<TableMetadata>>,
    matching: NameMatching,
}

impl TableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: compare names with `matching`
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    pub fn matching(&self) -> NameMatching {
        self.matching
    }

    /// Insert a table, replacing one with the same qualified name
    pub fn insert(&mut self, table: TableMetadata) {
        let table = Arc::new(table);
        let matching = self.matching;
        match self.tables.iter_mut().find(|t| {
            matching.matches(&t.schema, &table.schema) && matching.matches(&t.name, &table.name)
        }) {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
    }

    /// Find a table by `name`, `schema.name` or `catalog.schema.name`
    ///
    /// A leading catalog part is ignored.
    pub fn lookup(&self, parts: &[String]) -> Option<Arc<TableMetadata>> {
        let (schema, name) = match parts {
            [] => return None,
            [name] => (None, name),
            [.., schema, name] => (Some(schema), name),
        };
        self.tables
            .iter()
            .find(|t| {
                self.matching.matches(&t.name, name)
                    && schema.is_none_or(|s| self.matching.matches(&t.schema, s))
            })
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TableMetadata>> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableMetadata> for TableIndex {
    fn from_iter<I: IntoIterator<Item = TableMetadata>>(iter: I) -> Self {
        let mut index = TableIndex::new();
        for table in iter {
            index.insert(table);
        }
        index
    }
}
