// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Semantic Analyzer
//!
//! Entry point that runs one resolution pass over a rows-source tree.
//!
//! The analyzer holds the capabilities a pass needs (catalog, dialect) and
//! the configuration; everything produced by a pass is returned in an
//! [`AnalysisResult`]. `analyze` takes `&self`, so one analyzer can serve
//! several threads, each resolving its own tree.

use std::sync::Arc;

use sqlmodel_catalog::{Catalog, CatalogProvider, CatalogResult, CatalogSnapshot, DummyCatalog};
use sqlmodel_ir::DialectProvider;
use tracing::{debug, info, instrument};

use crate::config::AnalyzerConfig;
use crate::data_context::{DataContext, PseudoColumn};
use crate::error::SemanticError;
use crate::model::{KnownIdentifiers, ResolvedRowsSource, RowsSource};
use crate::recognition::{CancellationToken, Diagnostic, RecognitionContext, Severity};

/// Outcome of one analysis pass
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Resolved tree; `None` if the pass was cancelled
    pub model: Option<ResolvedRowsSource>,
    /// Diagnostics in the order they were found
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics dropped because of `max_diagnostics`
    pub suppressed: usize,
    pub cancelled: bool,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Resolved without cancellation and without diagnostics
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.diagnostics.is_empty()
    }
}

/// Semantic analyzer for rows-source trees
pub struct SemanticAnalyzer {
    catalog: Arc<dyn CatalogProvider>,
    dialect: Arc<dyn DialectProvider>,
    config: AnalyzerConfig,
}

impl SemanticAnalyzer {
    /// Create an analyzer over `catalog` with the given dialect rules
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use sqlmodel_catalog::StaticCatalog;
    /// use sqlmodel_ir::Dialect;
    /// use sqlmodel_semantic::SemanticAnalyzer;
    ///
    /// let catalog = Arc::new(StaticCatalog::playground());
    /// let analyzer = SemanticAnalyzer::new(catalog, Dialect::MySQL.settings());
    /// assert_eq!(analyzer.dialect().name(), "MySQL");
    /// ```
    pub fn new(catalog: Arc<dyn CatalogProvider>, dialect: impl DialectProvider + 'static) -> Self {
        Self::with_dialect_provider(catalog, Arc::new(dialect))
    }

    /// Create an analyzer with a custom dialect implementation
    pub fn with_dialect_provider(
        catalog: Arc<dyn CatalogProvider>,
        dialect: Arc<dyn DialectProvider>,
    ) -> Self {
        Self {
            catalog,
            dialect,
            config: AnalyzerConfig::default(),
        }
    }

    /// Create an analyzer whose dialect comes from `config`
    pub fn from_config(catalog: Arc<dyn CatalogProvider>, config: AnalyzerConfig) -> Self {
        Self::new(catalog, config.dialect_settings()).with_config(config)
    }

    /// Load a snapshot of an async catalog, then build an analyzer over it
    ///
    /// Resolution itself never waits on I/O; all metadata is fetched here.
    #[instrument(skip_all)]
    pub async fn load(catalog: &dyn Catalog, config: AnalyzerConfig) -> CatalogResult<Self> {
        let snapshot = CatalogSnapshot::load(catalog).await?;
        info!("Catalog snapshot loaded: tables={}", snapshot.table_count());
        Ok(Self::from_config(Arc::new(snapshot), config))
    }

    /// Builder method: replace resolution options
    ///
    /// The dialect is left as is; use [`from_config`](Self::from_config) to
    /// take it from the configuration.
    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn DialectProvider {
        self.dialect.as_ref()
    }

    /// Resolve `root` and collect its diagnostics
    ///
    /// Cancellation through `cancel` stops the pass at the next node; the
    /// result then has no model but keeps the diagnostics found so far.
    #[instrument(skip_all, fields(dialect = %self.dialect.name()))]
    pub fn analyze(
        &self,
        root: impl Into<RowsSource>,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let root = root.into();
        let range = root.syntax().range();

        let dummy;
        let catalog: &dyn CatalogProvider = if self.config.use_real_metadata {
            self.catalog.as_ref()
        } else {
            let known = KnownIdentifiers::collect(&root, self.dialect.as_ref());
            debug!(
                "Using identifiers as metadata: tables={:?}",
                known.tables().collect::<Vec<_>>()
            );
            dummy = DummyCatalog::new(known.tables(), known.columns());
            &dummy
        };

        let globals = catalog
            .global_pseudo_attributes()
            .into_iter()
            .map(|attribute| PseudoColumn::from_attribute(attribute, None, None))
            .collect();
        let mut rc = RecognitionContext::new(catalog, self.dialect.as_ref(), cancel.clone())
            .with_options(self.config.resolution_options());

        let outcome = root.propagate(DataContext::with_pseudo_columns(globals), &mut rc);
        let suppressed = rc.suppressed();
        let mut diagnostics = rc.into_diagnostics();

        let (model, cancelled) = match outcome {
            Ok(model) => (Some(model), false),
            Err(SemanticError::Cancelled) => {
                info!("Analysis cancelled: diagnostics={}", diagnostics.len());
                (None, true)
            }
            Err(error) => {
                diagnostics.push(Diagnostic {
                    range,
                    severity: Severity::Error,
                    error,
                });
                (None, false)
            }
        };
        debug!(
            "Analysis finished: diagnostics={}, suppressed={}",
            diagnostics.len(),
            suppressed
        );

        AnalysisResult {
            model,
            diagnostics,
            suppressed,
            cancelled,
        }
    }
}
