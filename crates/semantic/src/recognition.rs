// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Recognition context
//!
//! State of one resolution pass: the capabilities a node may use (catalog,
//! dialect, cancellation) and the diagnostics it produces. Nothing here
//! outlives the pass.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use sqlmodel_catalog::{CatalogError, CatalogProvider};
use sqlmodel_ir::{DialectProvider, TextRange};
use tracing::debug;

use crate::error::{SemanticError, SemanticResult};

/// Identifier of a rows-source node within one resolved tree
///
/// Ids are assigned in propagation order, so resolving equal trees yields
/// equal ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-owned cancellation flag
///
/// Clones share the flag, so the caller can keep one handle and cancel from
/// another thread while the pass runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found during resolution, anchored to a source range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: TextRange,
    pub severity: Severity,
    pub error: SemanticError,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Catalog failure behind this diagnostic, if any
    pub fn cause(&self) -> Option<&CatalogError> {
        self.error.catalog_cause()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.severity, self.range, self.error)
    }
}

/// Knobs that change what resolution produces
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Keep hidden catalog attributes in table column lists
    pub include_hidden_attributes: bool,
    /// Stop recording diagnostics after this many
    pub max_diagnostics: Option<usize>,
}

/// Capabilities and diagnostic sink for one resolution pass
pub struct RecognitionContext<'a> {
    catalog: &'a dyn CatalogProvider,
    dialect: &'a dyn DialectProvider,
    cancel: CancellationToken,
    options: ResolutionOptions,
    diagnostics: Vec<Diagnostic>,
    suppressed: usize,
    next_id: u32,
}

impl<'a> RecognitionContext<'a> {
    pub fn new(
        catalog: &'a dyn CatalogProvider,
        dialect: &'a dyn DialectProvider,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            catalog,
            dialect,
            cancel,
            options: ResolutionOptions::default(),
            diagnostics: Vec::new(),
            suppressed: 0,
            next_id: 0,
        }
    }

    /// Builder method: set resolution options
    pub fn with_options(mut self, options: ResolutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &'a dyn CatalogProvider {
        self.catalog
    }

    pub fn dialect(&self) -> &'a dyn DialectProvider {
        self.dialect
    }

    pub fn options(&self) -> &ResolutionOptions {
        &self.options
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once the caller has cancelled the pass
    pub fn check_cancelled(&self) -> SemanticResult<()> {
        if self.cancel.is_cancelled() {
            debug!("Resolution cancelled");
            Err(SemanticError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn append_error(&mut self, range: TextRange, error: SemanticError) {
        self.append(range, Severity::Error, error);
    }

    pub fn append_warning(&mut self, range: TextRange, error: SemanticError) {
        self.append(range, Severity::Warning, error);
    }

    fn append(&mut self, range: TextRange, severity: Severity, error: SemanticError) {
        debug!(%range, ?severity, %error, "Diagnostic");
        if self
            .options
            .max_diagnostics
            .is_some_and(|max| self.diagnostics.len() >= max)
        {
            self.suppressed += 1;
            return;
        }
        self.diagnostics.push(Diagnostic {
            range,
            severity,
            error,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics dropped because of `max_diagnostics`
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
