//! Non-fatal conditions found while normalizing a document.

use std::fmt;

/// Something that degraded the output without stopping the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "type", rename_all = "snake_case"))]
pub enum Diagnostic {
    /// A glyph image whose code the resolver could not map. The image was
    /// kept as is.
    UnresolvedGaiji { code: String, reason: String },
    /// A `U+` directive without a usable code point. The span was kept.
    InvalidCodePoint { directive: String },
    /// A centering block still open at the end of the body.
    UnclosedCentering,
    /// A node that was dropped from the output.
    RemovedNode { kind: RemovedKind, markup: String },
}

/// What kind of node was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum RemovedKind {
    Script,
    Index,
}

impl fmt::Display for RemovedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovedKind::Script => f.write_str("script"),
            RemovedKind::Index => f.write_str("index"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedGaiji { code, reason } => {
                write!(f, "unresolved gaiji {code}: {reason}")
            }
            Diagnostic::InvalidCodePoint { directive } => {
                write!(f, "invalid code point in {directive}")
            }
            Diagnostic::UnclosedCentering => {
                f.write_str("centering block not closed before end of body")
            }
            Diagnostic::RemovedNode { kind, markup } => {
                let preview: String = markup.chars().take(60).collect();
                write!(f, "removed {kind}: {preview}")
            }
        }
    }
}

/// Diagnostics collected for one document, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(transparent))]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of unresolved glyph images.
    pub fn unresolved_gaiji(&self) -> usize {
        self.0
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedGaiji { .. }))
            .count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
