// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dummy Catalog
//!
//! Stand-in catalog for analysing a query without database metadata. Every
//! table name seen in the query becomes a table, and every such table exposes
//! every column name seen in the query, typed [`DataType::Any`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::TableIndex;
use crate::metadata::{ColumnMetadata, DataType, TableMetadata};
use crate::{CatalogProvider, CatalogResult};

/// Catalog synthesized from the identifiers of a query
#[derive(Debug, Clone, Default)]
pub struct DummyCatalog {
    tables: TableIndex,
}

impl DummyCatalog {
    /// Build from the table and column names known to the query
    ///
    /// Names are deduplicated; column order is sorted so the result does not
    /// depend on the order in which identifiers were collected.
    pub fn new<T, C>(table_names: T, column_names: C) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let columns: BTreeSet<String> = column_names.into_iter().map(Into::into).collect();
        let columns: Vec<ColumnMetadata> = columns
            .into_iter()
            .map(|name| ColumnMetadata::new(name, DataType::Any))
            .collect();

        let tables = table_names
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .map(|name| TableMetadata::new(name, "").with_columns(columns.clone()))
            .collect();

        Self { tables }
    }
}

impl CatalogProvider for DummyCatalog {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        // Dummy tables have no schema; only the last part matters
        Ok(name_parts
            .last()
            .and_then(|name| self.tables.lookup(std::slice::from_ref(name))))
    }
}
