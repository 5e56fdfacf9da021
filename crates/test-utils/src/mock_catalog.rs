// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Mock catalog implementation for testing
//!
//! Provides an in-memory catalog with builder pattern for easy test setup.
//! Lookups can be made to fail per table to exercise error reporting.

use std::collections::HashSet;
use std::sync::Arc;

use sqlmodel_catalog::{
    Catalog, CatalogError, CatalogProvider, CatalogResult, ColumnMetadata, DataType,
    PropagationPolicy, PseudoAttribute, TableIndex, TableMetadata,
};

/// In-memory mock catalog for testing
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    tables: TableIndex,
    globals: Vec<PseudoAttribute>,
    failing_lookups: HashSet<String>,
    failing_attributes: HashSet<String>,
}

impl MockCatalog {
    /// Create a new empty mock catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the catalog
    pub fn add_table(mut self, table: TableMetadata) -> Self {
        self.tables.insert(table);
        self
    }

    /// Add a session-wide pseudo-attribute
    pub fn add_global(mut self, attribute: PseudoAttribute) -> Self {
        self.globals.push(attribute);
        self
    }

    /// Get a table by name (any schema)
    pub fn get_table(&self, name: &str) -> Option<Arc<TableMetadata>> {
        self.tables.lookup(&[name.to_string()])
    }

    fn check_lookup(&self, name: &str) -> CatalogResult<()> {
        if self.failing_lookups.contains(&name.to_lowercase()) {
            return Err(CatalogError::ConnectionFailed(format!(
                "lookup of '{}' failed",
                name
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Catalog for MockCatalog {
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
        Ok(self.tables.iter().map(|t| (**t).clone()).collect())
    }

    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
        let name = table.rsplit('.').next().unwrap_or(table);
        self.check_lookup(name)?;
        match self.get_table(name) {
            Some(table_metadata) => Ok(table_metadata.columns.clone()),
            None => Err(CatalogError::TableNotFound(
                table.to_string(),
                "mock".to_string(),
            )),
        }
    }

    async fn global_pseudo_attributes(&self) -> CatalogResult<Vec<PseudoAttribute>> {
        Ok(self.globals.clone())
    }
}

impl CatalogProvider for MockCatalog {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        if let Some(name) = name_parts.last() {
            self.check_lookup(name)?;
        }
        Ok(self.tables.lookup(name_parts))
    }

    fn attributes(&self, table: &TableMetadata) -> CatalogResult<Vec<ColumnMetadata>> {
        if self.failing_attributes.contains(&table.name.to_lowercase()) {
            return Err(CatalogError::AttributeIntrospection {
                table: table.qualified_name(),
                reason: "mock failure".to_string(),
            });
        }
        Ok(table.columns.clone())
    }

    fn global_pseudo_attributes(&self) -> Vec<PseudoAttribute> {
        self.globals.clone()
    }
}

/// Builder for creating mock catalogs with a fluent API
#[derive(Debug, Default)]
pub struct MockCatalogBuilder {
    catalog: MockCatalog,
}

impl MockCatalogBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the standard test schema (users, orders and products tables)
    ///
    /// `users` carries a table-local `rowid` and `orders` a hidden `xmin`
    /// column next to a rowset-wide `ctid`.
    pub fn with_standard_schema(mut self) -> Self {
        self.catalog = self
            .catalog
            .add_table(
                TableMetadata::new("users", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt),
                        ColumnMetadata::new("email", DataType::Varchar(Some(255))),
                        ColumnMetadata::new("name", DataType::Varchar(Some(100))),
                        ColumnMetadata::new("created_at", DataType::Timestamp),
                    ])
                    .with_pseudo_attribute(PseudoAttribute::new(
                        "rowid",
                        DataType::BigInt,
                        PropagationPolicy::TableLocal,
                    )),
            )
            .add_table(
                TableMetadata::new("orders", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt),
                        ColumnMetadata::new("user_id", DataType::BigInt),
                        ColumnMetadata::new("total", DataType::Decimal),
                        ColumnMetadata::new("status", DataType::Varchar(Some(50))),
                        ColumnMetadata::new("created_at", DataType::Timestamp),
                        ColumnMetadata::new("xmin", DataType::BigInt).with_hidden(),
                    ])
                    .with_pseudo_attribute(PseudoAttribute::new(
                        "ctid",
                        DataType::Text,
                        PropagationPolicy::TableNormal,
                    )),
            )
            .add_table(
                TableMetadata::new("products", "myapp")
                    .with_columns(vec![
                        ColumnMetadata::new("id", DataType::BigInt),
                        ColumnMetadata::new("name", DataType::Varchar(Some(255))),
                        ColumnMetadata::new("price", DataType::Decimal),
                        ColumnMetadata::new("stock", DataType::Integer),
                    ]),
            )
            .add_global(PseudoAttribute::new(
                "current_user",
                DataType::Text,
                PropagationPolicy::GlobalVariable,
            ));

        self
    }

    /// Add a custom table
    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.catalog = self.catalog.add_table(table);
        self
    }

    /// Add a session-wide pseudo-attribute
    pub fn with_global(mut self, attribute: PseudoAttribute) -> Self {
        self.catalog = self.catalog.add_global(attribute);
        self
    }

    /// Make every lookup of `table` fail
    pub fn with_failing_lookup(mut self, table: &str) -> Self {
        self.catalog.failing_lookups.insert(table.to_lowercase());
        self
    }

    /// Make reading the attributes of `table` fail
    pub fn with_failing_attributes(mut self, table: &str) -> Self {
        self.catalog.failing_attributes.insert(table.to_lowercase());
        self
    }

    /// Build the mock catalog
    pub fn build(self) -> MockCatalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_catalog_list_tables() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();

        let tables = catalog.list_tables().await.unwrap();
        assert_eq!(tables.len(), 3);

        let table_names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert!(table_names.contains(&"users"));
        assert!(table_names.contains(&"orders"));
        assert!(table_names.contains(&"products"));
    }

    #[tokio::test]
    async fn test_mock_catalog_get_columns() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();

        let columns = catalog.get_columns("myapp.users").await.unwrap();
        let column_names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(column_names, vec!["id", "email", "name", "created_at"]);
    }

    #[test]
    fn test_find_table_by_qualified_name() {
        let catalog = MockCatalogBuilder::new().with_standard_schema().build();

        let parts = vec!["MyApp".to_string(), "Orders".to_string()];
        let table = catalog.find_table(&parts).unwrap().unwrap();
        assert_eq!(table.qualified_name(), "myapp.orders");

        let missing = vec!["other".to_string(), "orders".to_string()];
        assert!(catalog.find_table(&missing).unwrap().is_none());
    }

    #[test]
    fn test_failure_injection() {
        let catalog = MockCatalogBuilder::new()
            .with_standard_schema()
            .with_failing_lookup("users")
            .with_failing_attributes("orders")
            .build();

        assert!(matches!(
            catalog.find_table(&["users".to_string()]),
            Err(CatalogError::ConnectionFailed(_))
        ));

        let orders = catalog.find_table(&["orders".to_string()]).unwrap().unwrap();
        assert!(matches!(
            catalog.attributes(&orders),
            Err(CatalogError::AttributeIntrospection { .. })
        ));
    }
}
