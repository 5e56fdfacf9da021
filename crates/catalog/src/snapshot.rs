// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog Snapshot
//!
//! Prefetches an async [`Catalog`] into memory so that resolution can run as
//! one synchronous pass. Tables whose columns could not be fetched are kept;
//! asking for their attributes later returns the original error, which the
//! resolver reports as a diagnostic.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::index::TableIndex;
use crate::metadata::{ColumnMetadata, PseudoAttribute, TableMetadata};
use crate::{Catalog, CatalogError, CatalogProvider, CatalogResult};

/// In-memory copy of a catalog taken at one point in time
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    tables: TableIndex,
    globals: Vec<PseudoAttribute>,
    failures: HashMap<String, CatalogError>,
}

impl CatalogSnapshot {
    /// Load every table (and its columns) from `catalog`
    ///
    /// Listing failures abort the load. Column failures are recorded per table.
    #[instrument(skip_all)]
    pub async fn load(catalog: &dyn Catalog) -> CatalogResult<Self> {
        let mut snapshot = CatalogSnapshot::default();

        for mut table in catalog.list_tables().await? {
            if table.columns.is_empty() {
                let qualified = table.qualified_name();
                match catalog.get_columns(&qualified).await {
                    Ok(columns) => table.columns = columns,
                    Err(err) => {
                        warn!(table = %qualified, error = %err, "Failed to fetch columns");
                        snapshot.failures.insert(qualified.to_lowercase(), err);
                    }
                }
            }
            snapshot.tables.insert(table);
        }

        snapshot.globals = catalog.global_pseudo_attributes().await?;

        debug!(
            tables = snapshot.tables.len(),
            failures = snapshot.failures.len(),
            "Catalog snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl CatalogProvider for CatalogSnapshot {
    fn find_table(&self, name_parts: &[String]) -> CatalogResult<Option<Arc<TableMetadata>>> {
        Ok(self.tables.lookup(name_parts))
    }

    fn attributes(&self, table: &TableMetadata) -> CatalogResult<Vec<ColumnMetadata>> {
        match self.failures.get(&table.qualified_name().to_lowercase()) {
            Some(err) => Err(err.clone()),
            None => Ok(table.columns.clone()),
        }
    }

    fn global_pseudo_attributes(&self) -> Vec<PseudoAttribute> {
        self.globals.clone()
    }
}
