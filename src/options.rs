//! Tunables for a normalization run.

/// Options for [`Document::from_bytes`](crate::Document::from_bytes) and the
/// individual pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct NormalizeOptions {
    /// Encoding label used when the input is neither UTF-8 nor declares a
    /// charset that encoding_rs recognizes.
    pub fallback_encoding: String,
    /// How section anchors are named.
    pub anchors: AnchorScheme,
    /// Blank-line breaks that close a centering block.
    pub centering_blank_lines: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            fallback_encoding: "Shift_JIS".to_string(),
            anchors: AnchorScheme::default(),
            centering_blank_lines: 4,
        }
    }
}

/// Anchor ids are `prefix` followed by a number: the document root gets
/// `base`, and each heading without an id gets the next multiple of `stride`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct AnchorScheme {
    pub prefix: String,
    pub base: u32,
    pub stride: u32,
}

impl Default for AnchorScheme {
    fn default() -> Self {
        Self {
            prefix: "azbc_".to_string(),
            base: 100,
            stride: 10,
        }
    }
}

impl AnchorScheme {
    /// Anchor for the document root.
    pub fn root_anchor(&self) -> String {
        format!("{}{}", self.prefix, self.base)
    }

    /// A fresh counter for one tree build.
    pub fn counter(&self) -> AnchorCounter<'_> {
        AnchorCounter {
            scheme: self,
            next: self.base,
        }
    }
}

/// Hands out anchor ids for a single document.
///
/// Each build gets its own counter, so documents processed one after another
/// (or on different threads) number their anchors independently.
#[derive(Debug)]
pub struct AnchorCounter<'a> {
    scheme: &'a AnchorScheme,
    next: u32,
}

impl AnchorCounter<'_> {
    pub fn next_anchor(&mut self) -> String {
        self.next = self.next.saturating_add(self.scheme.stride);
        format!("{}{}", self.scheme.prefix, self.next)
    }
}
