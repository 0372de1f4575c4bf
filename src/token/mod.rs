//! Flat token model for archive XHTML.
//!
//! A document is kept as a flat `Vec<Token>` rather than a tree. Subtrees are
//! addressed as index ranges (see [`crate::node`]), so the rewriter can copy,
//! drop, or replace whole elements without building a DOM.
//!
//! Text payloads and attribute values keep their source escaping. Tokens
//! created by the rewriter go through [`Token::text`], which escapes, so the
//! serialized output is always well-formed.

mod serialize;
mod tokenizer;

pub use serialize::render_tokens;
pub use tokenizer::tokenize;

use std::borrow::Cow;

/// Lexical kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    StartTag,
    EndTag,
    SelfClosingTag,
    Text,
    Comment,
    /// XML declaration, doctype, processing instruction or CDATA, kept verbatim.
    Declaration,
}

/// Element attributes in source order.
///
/// Keys compare case-insensitively and [`Attributes::set`] replaces any
/// existing entry for the key, moving it to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key` to `value`, dropping earlier values for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.remove(&key);
        self.0.push((key, value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

/// One lexical unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Lowercase tag name; empty for non-tag tokens.
    pub name: String,
    pub attrs: Attributes,
    /// Raw text for text, comment and declaration tokens.
    pub data: String,
}

impl Token {
    fn tag(kind: TokenKind, name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            kind,
            name: name.into(),
            attrs,
            data: String::new(),
        }
    }

    pub fn start_tag(name: impl Into<String>, attrs: Attributes) -> Self {
        Self::tag(TokenKind::StartTag, name, attrs)
    }

    pub fn end_tag(name: impl Into<String>) -> Self {
        Self::tag(TokenKind::EndTag, name, Attributes::new())
    }

    pub fn self_closing(name: impl Into<String>, attrs: Attributes) -> Self {
        Self::tag(TokenKind::SelfClosingTag, name, attrs)
    }

    /// Text token from plain (unescaped) text.
    pub fn text(plain: &str) -> Self {
        Self::raw_text(quick_xml::escape::partial_escape(plain).into_owned())
    }

    /// Text token from already-escaped source text.
    pub fn raw_text(raw: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            name: String::new(),
            attrs: Attributes::new(),
            data: raw.into(),
        }
    }

    pub fn comment(body: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Comment,
            data: body.into(),
            ..Self::raw_text("")
        }
    }

    pub fn declaration(raw: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Declaration,
            data: raw.into(),
            ..Self::raw_text("")
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::SelfClosingTag
        )
    }

    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }

    /// Start tag named `name`.
    pub fn is_start(&self, name: &str) -> bool {
        self.kind == TokenKind::StartTag && self.name == name
    }

    /// End tag named `name`.
    pub fn is_end(&self, name: &str) -> bool {
        self.kind == TokenKind::EndTag && self.name == name
    }

    /// Start or self-closing tag named `name`.
    pub fn is_element(&self, name: &str) -> bool {
        matches!(self.kind, TokenKind::StartTag | TokenKind::SelfClosingTag) && self.name == name
    }

    /// Level of an `h1`..`h6` start tag.
    pub fn heading_level(&self) -> Option<u8> {
        if self.kind != TokenKind::StartTag {
            return None;
        }
        heading_level_of(&self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key)
    }

    /// The `class` attribute, or an empty string.
    pub fn class(&self) -> &str {
        self.attrs.get("class").unwrap_or("")
    }

    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").filter(|id| !id.is_empty())
    }

    /// `<br class="blankline" />`, the marker for an empty source line.
    pub fn is_blank_line(&self) -> bool {
        self.kind == TokenKind::SelfClosingTag && self.name == "br" && self.class() == "blankline"
    }

    /// Text payload with character references resolved.
    ///
    /// Falls back to the raw text when it contains references XML does not
    /// define (`&nbsp;` and friends).
    pub fn unescaped_text(&self) -> Cow<'_, str> {
        quick_xml::escape::unescape(&self.data).unwrap_or(Cow::Borrowed(&self.data))
    }
}

pub(crate) fn heading_level_of(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}
