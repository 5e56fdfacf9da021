// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Model - Catalog Layer
//!
//! This crate is the boundary between the semantic model and whatever knows
//! about real tables. It defines:
//!
//! - [`Catalog`]: async metadata source (database, schema file, cache)
//! - [`CatalogProvider`]: synchronous lookups consumed during resolution
//!
//! ## Implementations
//!
//! - [`StaticCatalog`]: in-memory schema, buildable in code or from JSON
//! - [`CatalogSnapshot`]: a prefetched copy of any async [`Catalog`]
//! - [`DummyCatalog`]: metadata-less analysis, every known name resolves
//!
//! ## Usage
//!
//! ```rust
//! use sqlmodel_catalog::{CatalogProvider, StaticCatalog};
//!
//! let catalog = StaticCatalog::playground();
//! let users = catalog.find_table(&["users".to_string()]).unwrap().unwrap();
//! assert_eq!(users.columns.len(), 4);
//! ```
//!
//! ## Implementing the Catalog Trait
//!
//! ```rust,ignore
//! use sqlmodel_catalog::{Catalog, CatalogResult, ColumnMetadata, TableMetadata};
//! use async_trait::async_trait;
//!
//! struct MyCatalog;
//!
//! #[async_trait]
//! impl Catalog for MyCatalog {
//!     async fn list_tables(&self) -> CatalogResult<Vec<TableMetadata>> {
//!         // Your implementation here
//!     }
//!
//!     async fn get_columns(&self, table: &str) -> CatalogResult<Vec<ColumnMetadata>> {
//!         // Your implementation here
//!     }
//! }
//! ```

pub mod dummy;
pub mod error;
pub mod index;
pub mod metadata;
pub mod snapshot;
pub mod r#static;
pub mod r#trait;

// Re-exports
pub use dummy::DummyCatalog;
pub use error::{CatalogError, CatalogResult};
pub use index::{NameMatching, TableIndex};
pub use metadata::{
    ColumnMetadata, DataKind, DataType, PropagationPolicy, PseudoAttribute, TableMetadata,
};
pub use r#static::StaticCatalog;
pub use r#trait::{Catalog, CatalogProvider};
pub use snapshot::CatalogSnapshot;
