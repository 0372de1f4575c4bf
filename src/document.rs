//! Whole-document pipeline: bytes in, normalized tokens and sections out.

use crate::diagnostic::Diagnostics;
use crate::error::{Error, Result};
use crate::gaiji::GaijiResolver;
use crate::node::{extract_node, text_content};
use crate::options::NormalizeOptions;
use crate::preprocess::preprocess;
use crate::rewrite::rewrite_body;
use crate::section::{SectionTree, TocEntry, build_sections};
use crate::token::{Token, render_tokens, tokenize};

/// Bibliographic fields found in the document head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Metadata {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub publisher: Option<String>,
}

impl Metadata {
    /// Read Dublin Core `<meta name="DC.*" content="…">` entries, falling back
    /// to `<title>` for the title.
    pub fn from_preamble(preamble: &[Token]) -> Self {
        let mut meta = Metadata::default();
        let mut fallback_title = None;

        for (i, token) in preamble.iter().enumerate() {
            if token.is_element("meta") {
                let content = token.attr("content").map(|c| c.trim().to_string());
                match token.attr("name") {
                    Some("DC.Title") => meta.title = content,
                    Some("DC.Creator") => meta.creator = content,
                    Some("DC.Publisher") => meta.publisher = content,
                    _ => {}
                }
            } else if token.is_start("title") && fallback_title.is_none() {
                fallback_title = text_content(preamble, i)
                    .ok()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
            }
        }

        if meta.title.as_deref().is_none_or(str::is_empty) {
            meta.title = fallback_title;
        }
        meta
    }
}

/// A normalized document.
#[derive(Debug, Clone)]
pub struct Document {
    pub metadata: Metadata,
    /// Tokens before `<body>`.
    pub preamble: Vec<Token>,
    /// Rewritten body, from `<body>` to `</body>` inclusive.
    pub body: Vec<Token>,
    /// Tokens after `</body>`.
    pub trailer: Vec<Token>,
    pub sections: SectionTree,
    pub diagnostics: Diagnostics,
}

impl Document {
    /// Normalize raw archive bytes.
    pub fn from_bytes<R: GaijiResolver + ?Sized>(
        input: &[u8],
        resolver: &R,
        options: &NormalizeOptions,
    ) -> Result<Self> {
        let cleaned = String::from_utf8(preprocess(input, options))?;
        let tokens = tokenize(&cleaned)?;
        log::debug!("Tokenized document into {} tokens", tokens.len());
        Self::from_tokens(tokens, resolver, options)
    }

    /// Normalize an already tokenized (and preprocessed) document.
    pub fn from_tokens<R: GaijiResolver + ?Sized>(
        mut tokens: Vec<Token>,
        resolver: &R,
        options: &NormalizeOptions,
    ) -> Result<Self> {
        let start = tokens
            .iter()
            .position(|t| t.is_start("body"))
            .ok_or(Error::MissingBody)?;
        let node = extract_node(&tokens, start)?.ok_or(Error::MissingBody)?;

        let trailer = tokens.split_off(node.end + 1);
        let body = tokens.split_off(start);
        let preamble = tokens;

        let metadata = Metadata::from_preamble(&preamble);
        let mut diagnostics = Diagnostics::new();
        let mut body = rewrite_body(&body, resolver, options, &mut diagnostics)?;
        let sections = build_sections(&mut body, &options.anchors)?;

        log::info!(
            "Normalized document: {} sections, {} diagnostics",
            sections.section_count(),
            diagnostics.len()
        );

        Ok(Self {
            metadata,
            preamble,
            body,
            trailer,
            sections,
            diagnostics,
        })
    }

    /// Serialize the whole document.
    pub fn render(&self) -> String {
        let mut out = render_tokens(&self.preamble);
        out.push_str(&render_tokens(&self.body));
        out.push_str(&render_tokens(&self.trailer));
        out
    }

    /// Nested table of contents, headed by the document title.
    pub fn toc(&self) -> TocEntry {
        self.sections
            .to_toc(self.metadata.title.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaiji::NoGaiji;

    const HEAD: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        "\n<html><head>",
        r#"<meta name="DC.Title" content=" 吾輩は猫である " />"#,
        r#"<meta name="DC.Creator" content="夏目漱石" />"#,
        "<title>夏目漱石 吾輩は猫である</title>",
        "</head>\n"
    );

    fn document(body: &str) -> Document {
        let source = format!("{HEAD}{body}\n</html>\n");
        Document::from_bytes(source.as_bytes(), &NoGaiji, &NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn test_metadata() {
        let doc = document("<body></body>");
        assert_eq!(doc.metadata.title.as_deref(), Some("吾輩は猫である"));
        assert_eq!(doc.metadata.creator.as_deref(), Some("夏目漱石"));
        assert_eq!(doc.metadata.publisher, None);
    }

    #[test]
    fn test_title_fallback() {
        let tokens = tokenize("<head><title> 題 </title></head>").unwrap();
        assert_eq!(Metadata::from_preamble(&tokens).title.as_deref(), Some("題"));
    }

    #[test]
    fn test_render_keeps_head_and_trailer() {
        let doc = document("<body>\n<h3>一</h3>\n本文<br />\n</body>");
        let out = doc.render();
        assert!(out.starts_with(HEAD));
        assert!(out.contains(r#"<body id="azbc_100"><h3 id="azbc_110">一</h3>本文<br />"#));
        assert!(out.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn test_toc_uses_document_title() {
        let doc = document("<body><h3>一</h3><h4>上</h4><h3>二</h3></body>");
        let toc = doc.toc();
        assert_eq!(toc.title, "吾輩は猫である");
        assert_eq!(toc.children.len(), 2);
        assert_eq!(toc.children[0].children[0].title, "上");
    }

    #[test]
    fn test_missing_body() {
        let result = Document::from_bytes(b"<html></html>", &NoGaiji, &NormalizeOptions::default());
        assert!(matches!(result, Err(Error::MissingBody)));
    }

    #[test]
    fn test_unclosed_body() {
        let tokens = tokenize("<html><body><p>x</p></html>").unwrap();
        let result = Document::from_tokens(tokens, &NoGaiji, &NormalizeOptions::default());
        assert!(matches!(result, Err(Error::UnterminatedNode { ref tag, .. }) if tag == "body"));
    }
}
