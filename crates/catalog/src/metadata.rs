// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata types for database schema information
//!
//! This module re-exports metadata types from the `sqlmodel-ir` crate.

pub use sqlmodel_ir::{
    ColumnMetadata, DataKind, DataType, PropagationPolicy, PseudoAttribute, TableMetadata,
};
