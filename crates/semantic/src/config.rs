// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Analyzer configuration
//!
//! ```
//! use sqlmodel_semantic::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::from_json(r#"{ "dialect": "PostgreSQL", "max_diagnostics": 50 }"#)
//!     .unwrap();
//! assert!(config.use_real_metadata);
//! assert_eq!(config.dialect_settings().name, "PostgreSQL");
//! ```

use serde::{Deserialize, Serialize};
use sqlmodel_ir::{Dialect, DialectSettings};

use crate::recognition::ResolutionOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Dialect whose preset is used when `dialect_settings` is not given
    pub dialect: Option<Dialect>,
    /// Explicit dialect rules, overriding `dialect`
    pub dialect_settings: Option<DialectSettings>,
    /// Resolve against the catalog; when off, tables and columns are
    /// synthesized from the identifiers of the query
    pub use_real_metadata: bool,
    pub include_hidden_attributes: bool,
    pub max_diagnostics: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            dialect_settings: None,
            use_real_metadata: true,
            include_hidden_attributes: false,
            max_diagnostics: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Effective dialect rules: explicit settings, then the dialect preset,
    /// then ANSI
    pub fn dialect_settings(&self) -> DialectSettings {
        match (&self.dialect_settings, self.dialect) {
            (Some(settings), _) => settings.clone(),
            (None, Some(dialect)) => dialect.settings(),
            (None, None) => DialectSettings::standard(),
        }
    }

    pub fn resolution_options(&self) -> ResolutionOptions {
        ResolutionOptions {
            include_hidden_attributes: self.include_hidden_attributes,
            max_diagnostics: self.max_diagnostics,
        }
    }
}
