//! Subtree boundaries over a flat token sequence.
//!
//! A node is the inclusive index range `[start, end]` of an element: a
//! self-closing tag on its own, or a start tag together with its matching
//! end tag at nesting depth zero. Only tags with the same name count towards
//! the depth, which is how the archive's markup is balanced in practice.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

/// Inclusive token range covered by one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRange {
    pub start: usize,
    pub end: usize,
}

impl NodeRange {
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Number of tokens in the node.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a node holds at least its opening token.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Indices strictly between the opening and closing tokens.
    pub fn inner(&self) -> std::ops::Range<usize> {
        if self.start == self.end {
            self.start + 1..self.start + 1
        } else {
            self.start + 1..self.end
        }
    }
}

/// Find the node rooted at `tokens[start]`.
///
/// Returns `Ok(None)` when `tokens[start]` does not open an element (text,
/// end tags, comments, or an index past the end). Fails with
/// [`Error::UnterminatedNode`] when the start tag is never closed.
pub fn extract_node(tokens: &[Token], start: usize) -> Result<Option<NodeRange>> {
    let Some(first) = tokens.get(start) else {
        return Ok(None);
    };

    match first.kind {
        TokenKind::SelfClosingTag => return Ok(Some(NodeRange::single(start))),
        TokenKind::StartTag => {}
        _ => return Ok(None),
    }

    let mut depth = 1usize;
    for (offset, token) in tokens[start + 1..].iter().enumerate() {
        if token.name != first.name {
            continue;
        }
        match token.kind {
            TokenKind::StartTag => depth += 1,
            TokenKind::EndTag => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(NodeRange {
                        start,
                        end: start + 1 + offset,
                    }));
                }
            }
            _ => {}
        }
    }

    Err(Error::UnterminatedNode {
        tag: first.name.clone(),
        position: start,
    })
}

/// Like [`extract_node`], treating anything that does not open an element as
/// a one-token node.
pub(crate) fn node_at(tokens: &[Token], start: usize) -> Result<NodeRange> {
    Ok(extract_node(tokens, start)?.unwrap_or(NodeRange::single(start)))
}

/// Plain text of the node at `start`, leaving out ruby readings and their
/// fallback parentheses.
pub fn text_content(tokens: &[Token], start: usize) -> Result<String> {
    let node = node_at(tokens, start)?;
    let mut text = String::new();

    let mut k = node.start;
    while k <= node.end {
        let token = &tokens[k];
        if token.is_start("rt") || token.is_start("rp") {
            k = node_at(&tokens[..=node.end], k)?.end + 1;
            continue;
        }
        if token.is_text() {
            text.push_str(&token.unescaped_text());
        }
        k += 1;
    }

    Ok(text)
}
