// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Symbols
//!
//! A [`Symbol`] is a logical identifier: a name, a classification and an
//! optional definition. A [`SymbolEntry`] is one textual occurrence of it.
//!
//! Classification happens at most once. A symbol starts
//! [`SymbolClass::Unclassified`] and moves to a terminal class on the first
//! call to [`Symbol::classify`] or [`Symbol::classify_as`]; every later call is
//! a no-op. Shared subtrees visited twice therefore never change an answer
//! already given.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use sqlmodel_catalog::{ColumnMetadata, PseudoAttribute, TableMetadata};
use sqlmodel_ir::{SyntaxNode, TextRange};

use crate::recognition::NodeId;

/// Classification state of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolClass {
    Unclassified,
    /// A real catalog table
    Table,
    /// An alias, CTE name or derived-table name
    TableAlias,
    /// A column taken as-is from a source
    Column,
    /// A column introduced by an alias or a column-name list
    ColumnDerived,
    /// A member of a composite value
    CompositeField,
    /// Reference that could not be resolved
    Error,
    /// Reference that could not be checked (e.g. its source failed to resolve)
    Unknown,
}

impl SymbolClass {
    pub fn is_terminal(self) -> bool {
        self != SymbolClass::Unclassified
    }

    pub fn is_error(self) -> bool {
        self == SymbolClass::Error
    }
}

/// What a symbol stands for
///
/// Definitions are back-references, never ownership edges: they point at a
/// syntax occurrence, a catalog object or a rows-source node by id.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDefinition {
    /// The syntax occurrence that introduced the name
    Occurrence { name: String, range: TextRange },
    /// A real catalog table
    Table(Arc<TableMetadata>),
    /// A real catalog attribute
    Attribute {
        table: Arc<TableMetadata>,
        column: ColumnMetadata,
    },
    /// A catalog pseudo-attribute
    PseudoAttribute(PseudoAttribute),
    /// A rows-source node of the model
    Source(NodeId),
    /// A renamed column: where the new name was declared, and what it renames
    Derived {
        name: String,
        range: TextRange,
        original: Option<Box<SymbolDefinition>>,
    },
}

impl SymbolDefinition {
    /// Source range of the declaring occurrence, if the definition has one
    pub fn range(&self) -> Option<TextRange> {
        match self {
            SymbolDefinition::Occurrence { range, .. }
            | SymbolDefinition::Derived { range, .. } => {
                Some(*range)
            }
            _ => None,
        }
    }

    /// Follow `Derived` links down to the definition that was renamed
    pub fn original(&self) -> &SymbolDefinition {
        match self {
            SymbolDefinition::Derived {
                original: Some(original),
                ..
            } => original.original(),
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Resolution {
    class: SymbolClass,
    definition: Option<SymbolDefinition>,
}

struct SymbolInner {
    name: String,
    entries: Vec<TextRange>,
    resolution: OnceLock<Resolution>,
}

/// A logical identifier shared by all of its occurrences
///
/// Cloning is cheap and yields a handle to the same symbol.
#[derive(Clone)]
pub struct Symbol {
    inner: Arc<SymbolInner>,
}

impl Symbol {
    /// Unclassified symbol with no occurrences
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_entries(name, Vec::new())
    }

    fn with_entries(name: impl Into<String>, entries: Vec<TextRange>) -> Self {
        Self {
            inner: Arc::new(SymbolInner {
                name: name.into(),
                entries,
                resolution: OnceLock::new(),
            }),
        }
    }

    /// Symbol that is born classified, for names that come from the catalog
    /// or are generated during resolution
    pub fn classified(
        name: impl Into<String>,
        class: SymbolClass,
        definition: Option<SymbolDefinition>,
    ) -> Self {
        let symbol = Symbol::new(name);
        symbol.classify_as(class, definition);
        symbol
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Source ranges of the occurrences bound to this symbol
    pub fn entries(&self) -> &[TextRange] {
        &self.inner.entries
    }

    pub fn class(&self) -> SymbolClass {
        self.inner
            .resolution
            .get()
            .map_or(SymbolClass::Unclassified, |r| r.class)
    }

    pub fn definition(&self) -> Option<&SymbolDefinition> {
        self.inner
            .resolution
            .get()
            .and_then(|r| r.definition.as_ref())
    }

    pub fn is_not_classified(&self) -> bool {
        self.inner.resolution.get().is_none()
    }

    /// Classify without a definition; see [`classify_as`](Self::classify_as)
    pub fn classify(&self, class: SymbolClass) -> bool {
        self.classify_as(class, None)
    }

    /// Move from `Unclassified` to `class`
    ///
    /// Returns `false` (and changes nothing) if the symbol is already
    /// classified or `class` is `Unclassified`.
    pub fn classify_as(&self, class: SymbolClass, definition: Option<SymbolDefinition>) -> bool {
        if !class.is_terminal() {
            return false;
        }
        self.inner
            .resolution
            .set(Resolution { class, definition })
            .is_ok()
    }

    /// Unify two symbols naming the same result column of a set operation
    ///
    /// The merged symbol keeps the left name and the union of both entry
    /// sets. The left definition wins; the right one is used only when the
    /// left has none. The class is the left class unless the left is
    /// unclassified or `Unknown`, in which case the right class is taken.
    pub fn merge(&self, other: &Symbol) -> Symbol {
        if self.ptr_eq(other) {
            return self.clone();
        }

        let mut entries = self.entries().to_vec();
        for range in other.entries() {
            if !entries.contains(range) {
                entries.push(*range);
            }
        }
        let merged = Symbol::with_entries(self.name(), entries);

        let class = match self.class() {
            SymbolClass::Unclassified | SymbolClass::Unknown if other.class().is_terminal() => {
                other.class()
            }
            class => class,
        };
        let definition = self
            .definition()
            .or_else(|| other.definition())
            .cloned();
        merged.classify_as(class, definition);
        merged
    }

    /// Whether both handles point to the same symbol
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.inner.name == other.inner.name
                && self.inner.entries == other.inner.entries
                && self.inner.resolution.get() == other.inner.resolution.get())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("name", &self.inner.name)
            .field("class", &self.class())
            .field("definition", &self.definition())
            .finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One occurrence of a symbol in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    raw_name: String,
    range: TextRange,
    symbol: Symbol,
}

impl SymbolEntry {
    /// Occurrence with its own fresh symbol
    pub fn new(raw_name: impl Into<String>, range: TextRange) -> Self {
        let raw_name = raw_name.into();
        let symbol = Symbol::with_entries(raw_name.clone(), vec![range]);
        Self {
            raw_name,
            range,
            symbol,
        }
    }

    /// Occurrence taken from an identifier node; missing text yields an empty name
    pub fn from_syntax(node: &SyntaxNode) -> Self {
        Self::new(node.text().unwrap_or_default(), node.range())
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Definition pointing back at this occurrence
    pub fn occurrence(&self) -> SymbolDefinition {
        SymbolDefinition::Occurrence {
            name: self.raw_name.clone(),
            range: self.range,
        }
    }

    /// Shorthand for `self.symbol().classify_as(..)`
    pub fn classify_as(&self, class: SymbolClass, definition: Option<SymbolDefinition>) -> bool {
        self.symbol.classify_as(class, definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_set_once() {
        let symbol = Symbol::new("users");
        assert!(symbol.is_not_classified());
        assert_eq!(symbol.class(), SymbolClass::Unclassified);

        assert!(symbol.classify(SymbolClass::Table));
        assert!(!symbol.classify(SymbolClass::Error));
        assert_eq!(symbol.class(), SymbolClass::Table);
    }

    #[test]
    fn test_classify_as_unclassified_is_rejected() {
        let symbol = Symbol::new("x");
        assert!(!symbol.classify(SymbolClass::Unclassified));
        assert!(symbol.is_not_classified());
    }

    #[test]
    fn test_shared_handles_see_classification() {
        let entry = SymbolEntry::new("u", TextRange::new(10, 11));
        let handle = entry.symbol().clone();
        entry.classify_as(SymbolClass::TableAlias, Some(entry.occurrence()));

        assert_eq!(handle.class(), SymbolClass::TableAlias);
        assert_eq!(
            handle.definition().and_then(SymbolDefinition::range),
            Some(TextRange::new(10, 11))
        );
    }

    #[test]
    fn test_merge_keeps_left_definition() {
        let left = SymbolEntry::new("a", TextRange::new(7, 8));
        let right = SymbolEntry::new("a", TextRange::new(30, 31));
        left.classify_as(SymbolClass::Column, Some(left.occurrence()));
        right.classify_as(SymbolClass::ColumnDerived, Some(right.occurrence()));

        let merged = left.symbol().merge(right.symbol());
        assert_eq!(merged.name(), "a");
        assert_eq!(merged.class(), SymbolClass::Column);
        assert_eq!(merged.definition(), Some(&left.occurrence()));
        assert_eq!(
            merged.entries(),
            &[TextRange::new(7, 8), TextRange::new(30, 31)]
        );
    }

    #[test]
    fn test_merge_promotes_unknown_left_class() {
        let left = Symbol::classified("n", SymbolClass::Unknown, None);
        let right = SymbolEntry::new("m", TextRange::new(3, 4));
        right.classify_as(SymbolClass::ColumnDerived, Some(right.occurrence()));

        let merged = left.merge(right.symbol());
        assert_eq!(merged.name(), "n");
        assert_eq!(merged.class(), SymbolClass::ColumnDerived);
        // Left had no definition, so the right one fills in
        assert_eq!(merged.definition(), Some(&right.occurrence()));
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let left = Symbol::new("a");
        let right = Symbol::classified("a", SymbolClass::Column, None);
        let merged = left.merge(&right);

        assert!(left.is_not_classified());
        assert_eq!(merged.class(), SymbolClass::Column);
    }

    #[test]
    fn test_derived_definition_original() {
        let table = Arc::new(TableMetadata::new("t", "app"));
        let attribute = SymbolDefinition::Attribute {
            table,
            column: ColumnMetadata::new("x", sqlmodel_catalog::DataType::Integer),
        };
        let derived = SymbolDefinition::Derived {
            name: "y".to_string(),
            range: TextRange::new(12, 13),
            original: Some(Box::new(attribute.clone())),
        };

        assert_eq!(derived.range(), Some(TextRange::new(12, 13)));
        assert_eq!(derived.original(), &attribute);
    }
}
