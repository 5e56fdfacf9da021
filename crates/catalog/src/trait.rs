// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog traits
//!
//! Two views of the same metadata:
//!
//! - [`Catalog`]: async bulk source (database connection, schema file, cache).
//! - [`CatalogProvider`]: synchronous point lookups used while resolving a
//!   query. Resolution is a single synchronous tree walk, so an async catalog
//!   is first loaded into a [`CatalogSnapshot`](crate::CatalogSnapshot).

use std::sync::Arc;

use crate::error::CatalogResult;
use crate::metadata::{ColumnMetadata, DataType, PseudoAttribute, TableMetadata};

/// Catalog trait for database schema abstraction
///
/// This trait provides an async interface for querying database schema information.
/// Implementations can connect to live databases, read from static files, or use caches.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlmodel_catalog::{Catalog, CatalogError};
///
/// async fn list_user_tables(catalog: &impl Catalog) -> Result<Vec<String>, CatalogError> {
///     let tables = catalog.list_tables().await?;
///     Ok(tables.into_iter()
///         .filter(|t| t.schema == "users")
///         .map(|t| t.name)
///         .collect())
/// }
/// ```
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// List all tables in the database
    ///
    /// Returns metadata for all tables accessible to the current connection.
    /// Columns may be left empty; they are then fetched with [`get_columns`](Self::get_columns).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ConnectionFailed` if database connection fails.
    /// Returns `CatalogError::QueryTimeout` if the query exceeds timeout.
    async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>>;

    /// Get column metadata for a specific table
    ///
    /// # Arguments
    ///
    /// * `table` - Table name (may include schema qualifier like "schema.table")
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::TableNotFound` if the table doesn't exist.
    /// Returns `CatalogError::PermissionDenied` if access is denied.
    async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>>;

    /// Session-wide pseudo-attributes (variables visible in every query)
    async fn global_pseudo_attributes(&self) -> CatalogResult<Vec<PseudoAttribute>> {
        Ok(Vec::new())
    }
}

/// Synchronous metadata lookups performed during resolution
///
/// Callers pass identifiers already canonicalized by the dialect. The
/// in-memory catalogs match them case-insensitively unless built with a
/// case-sensitive [`NameMatching`](crate::NameMatching). Every method may
/// fail, and callers turn the failure into a diagnostic rather than aborting.
pub trait CatalogProvider: Send + Sync {
    /// Resolve `[catalog.][schema.]table` to a real table
    ///
    /// `Ok(None)` means "no such table"; `Err` means the lookup itself failed.
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>>;

    /// Ordered attributes of `table`, hidden ones included
    fn attributes(&self, table: &TableMetadata) -> CatalogResult<Vec<ColumnMetadata>> {
        Ok(table.columns.clone())
    }

    /// Type of one attribute
    fn attribute_type(
        &self,
        _table: &TableMetadata,
        column: &ColumnMetadata,
    ) -> CatalogResult<DataType> {
        Ok(column.data_type.clone())
    }

    /// Pseudo-attributes every row of `table` carries
    fn pseudo_attributes(&self, table: &TableMetadata) -> Vec<PseudoAttribute> {
        table.pseudo_attributes.clone()
    }

    /// Session-wide pseudo-attributes
    fn global_pseudo_attributes(&self) -> Vec<PseudoAttribute> {
        Vec::new()
    }
}

impl<T: CatalogProvider + ?Sized> CatalogProvider for Arc<T> {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        (**self).find_table(name_parts)
    }

    fn attributes(&self, table: &TableMetadata) -> CatalogResult<Vec<ColumnMetadata>> {
        (**self).attributes(table)
    }

    fn attribute_type(
        &self,
        table: &TableMetadata,
        column: &ColumnMetadata,
    ) -> CatalogResult<DataType> {
        (**self).attribute_type(table, column)
    }

    fn pseudo_attributes(&self, table: &TableMetadata) -> Vec<PseudoAttribute> {
        (**self).pseudo_attributes(table)
    }

    fn global_pseudo_attributes(&self) -> Vec<PseudoAttribute> {
        (**self).global_pseudo_attributes()
    }
}
