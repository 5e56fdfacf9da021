// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Syntax node handles
//!
//! The semantic model never parses SQL itself. A parser produces
//! [`SyntaxNode`]s (source range, kind tag, children) and the recognizer
//! builds model nodes that keep an [`Arc`] to the syntax they came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Byte range in the source text (`start..end`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {}..{}", start, end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` lies inside the range; the end offset is included so a
    /// cursor placed right after a token still belongs to it
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest range covering both
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Kind tag of a syntax node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SyntaxKind {
    QueryExpression,
    SelectStatement,
    SelectList,
    DerivedColumn,
    TableReference,
    QualifiedName,
    Identifier,
    CrossJoin,
    QualifiedJoin,
    SetOperation,
    WithClause,
    CommonTableExpression,
    ValuesClause,
    Subquery,
    CorrelationSpec,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    Expression,
    Literal,
    TypeName,
    Asterisk,
    Variable,
    Other(String),
}

/// A node of the concrete syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: SyntaxKind,
    range: TextRange,
    text: Option<String>,
    children: Vec<Arc<SyntaxNode>>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, range: TextRange) -> Self {
        Self {
            kind,
            range,
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder method: attach the token text (identifiers, literals)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method: attach children
    pub fn with_children(mut self, children: Vec<Arc<SyntaxNode>>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> &SyntaxKind {
        &self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Arc<SyntaxNode>] {
        &self.children
    }

    pub fn into_arc(self) -> Arc<SyntaxNode> {
        Arc::new(self)
    }

    /// Innermost descendant (or self) whose range contains `offset`
    pub fn find_covering(self: &Arc<Self>, offset: usize) -> Option<Arc<SyntaxNode>> {
        if !self.range.contains(offset) {
            return None;
        }
        self.children
            .iter()
            .find_map(|child| child.find_covering(offset))
            .or_else(|| Some(Arc::clone(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let range = TextRange::new(5, 10);
        assert!(range.contains(5));
        assert!(range.contains(10));
        assert!(!range.contains(11));
        assert!(range.contains_range(TextRange::new(6, 9)));
        assert_eq!(range.cover(TextRange::new(2, 7)), TextRange::new(2, 10));
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn test_find_covering() {
        let ident = SyntaxNode::new(SyntaxKind::Identifier, TextRange::new(14, 19))
            .with_text("users")
            .into_arc();
        let table = SyntaxNode::new(SyntaxKind::TableReference, TextRange::new(14, 19))
            .with_children(vec![ident])
            .into_arc();
        let select = SyntaxNode::new(SyntaxKind::SelectStatement, TextRange::new(0, 19))
            .with_children(vec![table])
            .into_arc();

        let found = select.find_covering(16).unwrap();
        assert_eq!(found.kind(), &SyntaxKind::Identifier);
        assert_eq!(found.text(), Some("users"));

        let found = select.find_covering(3).unwrap();
        assert_eq!(found.kind(), &SyntaxKind::SelectStatement);

        assert!(select.find_covering(40).is_none());
    }
}
