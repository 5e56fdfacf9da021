// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect Support
//!
//! This module defines SQL dialects and the per-dialect rules the semantic
//! model depends on.
//!
//! ## Design
//!
//! The dialect system is organized into two levels:
//!
//! 1. **Dialect Family**: High-level groupings (MySQL, PostgreSQL) that share common rules
//! 2. **Specific Dialect**: Individual database implementations (MySQL,
//!    PostgreSQL, TiDB, MariaDB, CockroachDB)
//!
//! ## Dialect Rules
//!
//! Resolution only needs two things from a dialect:
//!
//! - **Alias visibility**: in which clauses (`WHERE`, `GROUP BY`, `HAVING`,
//!   `ORDER BY`) a SELECT-list alias can be referenced
//! - **Identifier canonicalization**: case folding and quote stripping
//!
//! Both are described by [`DialectSettings`], a plain data table. The built-in
//! presets live in a static table keyed by family; custom settings can be
//! deserialized from JSON.

use serde::{Deserialize, Serialize};

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Dialect {
    /// MySQL (5.7, 8.0)
    MySQL,
    /// PostgreSQL (12, 14, 15+)
    PostgreSQL,
    /// TiDB (5.0, 6.0, 7.0, 8.0)
    TiDB,
    /// MariaDB (10.x, 11.x)
    MariaDB,
    /// CockroachDB (21.x, 22.x, 23.x)
    CockroachDB,
}

impl Dialect {
    /// Returns the family this dialect belongs to
    pub fn family(&self) -> DialectFamily {
        match self {
            Dialect::MySQL | Dialect::TiDB | Dialect::MariaDB => DialectFamily::MySQL,
            Dialect::PostgreSQL | Dialect::CockroachDB => DialectFamily::PostgreSQL,
        }
    }

    /// Built-in settings for this dialect
    pub fn settings(&self) -> DialectSettings {
        DialectSettings::for_dialect(*self)
    }
}

/// Dialect family groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectFamily {
    MySQL,
    PostgreSQL,
    /// ANSI SQL, used when no concrete dialect is known
    Standard,
}

/// Clauses that may or may not see SELECT-list aliases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Where,
    GroupBy,
    Having,
    OrderBy,
}

/// Case folding applied to unquoted identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierCase {
    Upper,
    Lower,
    Preserve,
}

/// Dialect rules consumed by semantic resolution
pub trait DialectProvider: Send + Sync {
    /// Human-readable dialect name
    fn name(&self) -> &str;

    /// Clauses in which SELECT-list aliases are visible
    fn projection_alias_visibility(&self) -> &[ClauseKind];

    /// Canonical form of an identifier (quotes stripped, case folded)
    fn canonicalize_identifier(&self, name: &str) -> String;

    /// Whether identifier lookups ignore case after canonicalization
    fn is_case_insensitive(&self) -> bool;

    fn is_alias_visible_in(&self, clause: ClauseKind) -> bool {
        self.projection_alias_visibility().contains(&clause)
    }

    /// Whether two identifiers name the same object
    fn identifiers_match(&self, left: &str, right: &str) -> bool {
        let left = self.canonicalize_identifier(left);
        let right = self.canonicalize_identifier(right);
        if self.is_case_insensitive() {
            left.to_lowercase() == right.to_lowercase()
        } else {
            left == right
        }
    }
}

/// Table-driven description of a dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectSettings {
    pub name: String,
    pub projection_alias_scope: Vec<ClauseKind>,
    pub identifier_case: IdentifierCase,
    pub case_insensitive_lookup: bool,
    pub quote_pairs: Vec<(char, char)>,
}

struct Preset {
    family: DialectFamily,
    alias_scope: &'static [ClauseKind],
    identifier_case: IdentifierCase,
    case_insensitive: bool,
    quotes: &'static [(char, char)],
}

const PRESETS: &[Preset] = &[
    Preset {
        family: DialectFamily::MySQL,
        alias_scope: &[ClauseKind::GroupBy, ClauseKind::Having, ClauseKind::OrderBy],
        identifier_case: IdentifierCase::Preserve,
        case_insensitive: true,
        quotes: &[('`', '`'), ('"', '"')],
    },
    Preset {
        family: DialectFamily::PostgreSQL,
        alias_scope: &[ClauseKind::GroupBy, ClauseKind::OrderBy],
        identifier_case: IdentifierCase::Lower,
        case_insensitive: false,
        quotes: &[('"', '"')],
    },
    Preset {
        family: DialectFamily::Standard,
        alias_scope: &[ClauseKind::OrderBy],
        identifier_case: IdentifierCase::Upper,
        case_insensitive: true,
        quotes: &[('"', '"')],
    },
];

impl DialectSettings {
    /// Settings for a concrete dialect
    pub fn for_dialect(dialect: Dialect) -> Self {
        let mut settings = Self::for_family(dialect.family());
        settings.name = format!("{:?}", dialect);
        settings
    }

    /// Settings shared by a dialect family
    pub fn for_family(family: DialectFamily) -> Self {
        let preset = PRESETS
            .iter()
            .find(|p| p.family == family)
            .unwrap_or(&PRESETS[PRESETS.len() - 1]);
        Self {
            name: format!("{:?}", family),
            projection_alias_scope: preset.alias_scope.to_vec(),
            identifier_case: preset.identifier_case,
            case_insensitive_lookup: preset.case_insensitive,
            quote_pairs: preset.quotes.to_vec(),
        }
    }

    /// ANSI SQL settings
    pub fn standard() -> Self {
        Self::for_family(DialectFamily::Standard)
    }

    /// Parse settings from a JSON document
    ///
    /// Missing fields fall back to the [`standard`](Self::standard) preset.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn unquote<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.quote_pairs.iter().find_map(|(open, close)| {
            name.strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
    }
}

impl Default for DialectSettings {
    fn default() -> Self {
        Self::standard()
    }
}

impl DialectProvider for DialectSettings {
    fn name(&self) -> &str {
        &self.name
    }

    fn projection_alias_visibility(&self) -> &[ClauseKind] {
        &self.projection_alias_scope
    }

    fn canonicalize_identifier(&self, name: &str) -> String {
        if let Some(quoted) = self.unquote(name) {
            return quoted.to_string();
        }
        match self.identifier_case {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
            IdentifierCase::Preserve => name.to_string(),
        }
    }

    fn is_case_insensitive(&self) -> bool {
        self.case_insensitive_lookup
    }
}
