// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Static Catalog
//!
//! This module provides a static catalog implementation that uses predefined schema data.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlmodel_catalog::StaticCatalog;
//!
//! let catalog = StaticCatalog::playground();
//! let tables = catalog.list_tables().await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use sqlmodel_ir::DialectProvider;

use crate::index::{NameMatching, TableIndex};
use crate::metadata::{ColumnMetadata, DataType, PseudoAttribute, TableMetadata};
use crate::{Catalog, CatalogError, CatalogProvider, CatalogResult};

/// Static catalog with predefined schema data
///
/// Serves both the async [`Catalog`] and the synchronous [`CatalogProvider`]
/// interface, since everything is already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: TableIndex,
    globals: Vec<PseudoAttribute>,
}

impl StaticCatalog {
    /// Create an empty static catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table);
        self
    }

    /// Builder method: match table names the way `dialect` matches
    /// identifiers
    ///
    /// Call before adding tables, so replacement on insert uses the same
    /// rule.
    pub fn with_dialect(mut self, dialect: &dyn DialectProvider) -> Self {
        self.tables = self
            .tables
            .with_matching(NameMatching::for_dialect(dialect));
        self
    }

    /// Builder method: add a session-wide pseudo-attribute
    pub fn with_global(mut self, attribute: PseudoAttribute) -> Self {
        self.globals.push(attribute);
        self
    }

    /// Load a catalog from a JSON array of table definitions
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let tables: Vec<TableMetadata> = serde_json::from_str(json)?;
        Ok(Self {
            tables: tables.into_iter().collect(),
            globals: Vec::new(),
        })
    }

    /// Small users/orders schema for demos and tests
    pub fn playground() -> Self {
        Self::new()
            .with_table(TableMetadata::new("users", "playground").with_columns(vec![
                ColumnMetadata::new("id", DataType::Integer),
                ColumnMetadata::new("name", DataType::Varchar(Some(100))),
                ColumnMetadata::new("email", DataType::Varchar(Some(255))),
                ColumnMetadata::new("created_at", DataType::Timestamp),
            ]))
            .with_table(TableMetadata::new("orders", "playground").with_columns(vec![
                ColumnMetadata::new("id", DataType::Integer),
                ColumnMetadata::new("user_id", DataType::Integer),
                ColumnMetadata::new("total", DataType::Decimal),
                ColumnMetadata::new("status", DataType::Varchar(Some(20))),
            ]))
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Ok(self.tables.iter().map(|t| (**t).clone()).collect())
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        let parts: Vec<String> = table.split('.').map(str::to_string).collect();
        self.tables
            .lookup(&parts)
            .map(|t| t.columns.clone())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string(), "static".to_string()))
    }

    async fn global_pseudo_attributes(&self) -> CatalogResult<Vec<PseudoAttribute>> {
        Ok(self.globals.clone())
    }
}

impl CatalogProvider for StaticCatalog {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        Ok(self.tables.lookup(name_parts))
    }

    fn global_pseudo_attributes(&self) -> Vec<PseudoAttribute> {
        self.globals.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PropagationPolicy;
    use sqlmodel_ir::Dialect;

    #[tokio::test]
    async fn test_static_catalog_playground() {
        let catalog = StaticCatalog::playground();
        let tables = catalog.list_tables().await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "users");
    }

    #[tokio::test]
    async fn test_static_catalog_get_columns() {
        let catalog = StaticCatalog::playground();
        let columns = catalog.get_columns("playground.users").await.unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[1].name, "name");
    }

    #[tokio::test]
    async fn test_static_catalog_table_not_found() {
        let catalog = StaticCatalog::playground();
        let result = catalog.get_columns("nonexistent").await;
        assert!(matches!(result, Err(CatalogError::TableNotFound(_, _))));
    }

    #[test]
    fn test_static_catalog_from_json() {
        let json = r#"[
            {
                "name": "events",
                "schema": "log",
                "columns": [
                    { "name": "id", "data_type": "BigInt" },
                    { "name": "xmin", "data_type": "BigInt", "hidden": true }
                ]
            }
        ]"#;
        let catalog = StaticCatalog::from_json(json).unwrap();
        let table = catalog
            .find_table(&["log".to_string(), "events".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(table.columns[0].data_type, DataType::BigInt);
        assert!(!table.columns[0].hidden);
        assert!(table.columns[1].hidden);
        assert!(table.pseudo_attributes.is_empty());
    }

    #[test]
    fn test_static_catalog_from_invalid_json() {
        let result = StaticCatalog::from_json("not json");
        assert!(matches!(result, Err(CatalogError::SerializationError(_))));
    }

    #[test]
    fn test_provider_lookup_and_globals() {
        let catalog = StaticCatalog::playground().with_global(PseudoAttribute::new(
            "current_user",
            DataType::Text,
            PropagationPolicy::GlobalVariable,
        ));

        assert!(catalog.find_table(&["ORDERS".to_string()]).unwrap().is_some());
        assert!(catalog.find_table(&["missing".to_string()]).unwrap().is_none());
        assert_eq!(
            CatalogProvider::global_pseudo_attributes(&catalog)[0].name,
            "current_user"
        );
    }

    #[test]
    fn test_with_dialect_matches_quoted_names_exactly() {
        let postgres = Dialect::PostgreSQL.settings();
        let catalog = StaticCatalog::new()
            .with_dialect(&postgres)
            .with_table(TableMetadata::new("Users", "app"));

        assert!(catalog.find_table(&["users".to_string()]).unwrap().is_none());
        assert!(catalog.find_table(&["Users".to_string()]).unwrap().is_some());
        assert!(StaticCatalog::new()
            .with_table(TableMetadata::new("Users", "app"))
            .find_table(&["users".to_string()])
            .unwrap()
            .is_some());
    }
}
