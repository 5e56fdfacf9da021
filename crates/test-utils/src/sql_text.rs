// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Syntax nodes positioned over real SQL text
//!
//! Tests build model trees by hand; [`SqlText`] gives their syntax nodes the
//! ranges the tokens actually occupy, so position lookups can be checked
//! against the query as written.

use std::sync::Arc;

use sqlmodel_ir::{SyntaxKind, SyntaxNode, TextRange};

/// A query text and helpers to address its tokens
#[derive(Debug, Clone)]
pub struct SqlText {
    text: String,
}

impl SqlText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Range of the whole text
    pub fn full_range(&self) -> TextRange {
        TextRange::new(0, self.text.len())
    }

    /// Range of the first occurrence of `token`
    ///
    /// # Panics
    ///
    /// Panics if `token` does not occur in the text.
    pub fn range(&self, token: &str) -> TextRange {
        self.range_nth(token, 0)
    }

    /// Range of the `n`th (0-based) occurrence of `token` as a whole word
    ///
    /// # Panics
    ///
    /// Panics if there are fewer than `n + 1` occurrences.
    pub fn range_nth(&self, token: &str, n: usize) -> TextRange {
        self.occurrences(token)
            .nth(n)
            .unwrap_or_else(|| {
                panic!(
                    "'{}' occurs fewer than {} times in '{}'",
                    token,
                    n + 1,
                    self.text
                )
            })
    }

    /// Range from the first occurrence of `first` to the end of the first
    /// following occurrence of `last`
    pub fn span(&self, first: &str, last: &str) -> TextRange {
        let start = self.range(first);
        let end = self
            .occurrences(last)
            .find(|r| r.start >= start.start)
            .unwrap_or_else(|| panic!("'{}' does not follow '{}' in '{}'", last, first, self.text));
        start.cover(end)
    }

    /// Offset of the first character of the `n`th occurrence of `token`
    pub fn offset_of(&self, token: &str, n: usize) -> usize {
        self.range_nth(token, n).start
    }

    /// Leaf node over the first occurrence of `token`
    pub fn leaf(&self, kind: SyntaxKind, token: &str) -> Arc<SyntaxNode> {
        self.leaf_nth(kind, token, 0)
    }

    pub fn leaf_nth(&self, kind: SyntaxKind, token: &str, n: usize) -> Arc<SyntaxNode> {
        SyntaxNode::new(kind, self.range_nth(token, n))
            .with_text(token)
            .into_arc()
    }

    /// Node spanning `first` .. `last`
    pub fn node(&self, kind: SyntaxKind, first: &str, last: &str) -> Arc<SyntaxNode> {
        SyntaxNode::new(kind, self.span(first, last)).into_arc()
    }

    /// Node covering the whole text
    pub fn root(&self, kind: SyntaxKind) -> Arc<SyntaxNode> {
        SyntaxNode::new(kind, self.full_range())
            .with_text(self.text.clone())
            .into_arc()
    }

    fn occurrences<'a>(&'a self, token: &'a str) -> impl Iterator<Item = TextRange> + 'a {
        let bytes = self.text.as_bytes();
        let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        self.text
            .match_indices(token)
            .filter(move |(start, _)| {
                let end = start + token.len();
                let word_token = token.bytes().all(is_word);
                !word_token
                    || ((*start == 0 || !is_word(bytes[start - 1]))
                        && (end == bytes.len() || !is_word(bytes[end])))
            })
            .map(move |(start, _)| TextRange::new(start, start + token.len()))
    }
}
