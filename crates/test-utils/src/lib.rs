// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for the SQL semantic model
//!
//! This crate provides common testing components including:
//! - Mock catalog implementations with failure injection
//! - Syntax nodes positioned over real query text
//! - Log output for tests

pub mod mock_catalog;
pub mod sql_text;

use tracing_subscriber::EnvFilter;

// Re-exports for convenience
pub use mock_catalog::{MockCatalog, MockCatalogBuilder};
pub use sql_text::SqlText;

/// Send `tracing` output of the current test to the test harness
///
/// Filtered by `RUST_LOG`; calling it more than once is harmless.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
