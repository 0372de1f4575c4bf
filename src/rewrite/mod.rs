//! Body rewriting: archive conventions to portable markup.
//!
//! One left-to-right pass over the body tokens. Each position is first
//! classified into a [`Shape`], then the shape's rewrite emits replacement
//! tokens into a fresh output sequence and the pass continues after the
//! consumed node. Container shapes (headings, line emphasis) rewrite their
//! content recursively, within the bounds of their own node.

mod classify;
mod directive;
mod emphasis;
mod indent;

pub use classify::{Shape, classify};
pub use directive::{Directive, PageBreak, page_break_marker};
pub use emphasis::{BotenSide, EmphasisStyle, boten_glyph};
pub use indent::IndentBlock;

use crate::diagnostic::{Diagnostic, Diagnostics, RemovedKind};
use crate::error::Result;
use crate::gaiji::{GaijiResolver, glyph_code};
use crate::node::node_at;
use crate::options::NormalizeOptions;
use crate::token::{Attributes, Token, render_tokens};

/// Rewrite a body token sequence (including its `<body>` tags).
///
/// Non-fatal problems are appended to `diagnostics`. An element that is
/// never closed fails the whole pass with
/// [`Error::UnterminatedNode`](crate::Error::UnterminatedNode).
pub fn rewrite_body<R: GaijiResolver + ?Sized>(
    body: &[Token],
    resolver: &R,
    options: &NormalizeOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Token>> {
    let mut rewriter = Rewriter {
        resolver,
        diagnostics,
        centering_blank_lines: options.centering_blank_lines,
    };

    let mut out = rewriter.emitter();
    rewriter.rewrite_range(body, 0, body.len(), &mut out)?;
    Ok(rewriter.drain(out))
}

// ============================================================================
// Output
// ============================================================================

/// Output buffer that also tracks an open centering block.
///
/// While a block is open, blank-line breaks are swallowed and counted; the
/// block closes once `close_after` of them have gone by.
struct Emitter {
    tokens: Vec<Token>,
    close_after: usize,
    centering: Option<usize>,
    unclosed: bool,
}

impl Emitter {
    fn push(&mut self, token: Token) {
        if let Some(remaining) = self.centering.as_mut() {
            if token.is_blank_line() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.centering = None;
                    self.tokens.push(Token::end_tag("div"));
                    log::debug!("Closed centering block");
                }
                return;
            }
            if token.is_end("body") {
                self.close_unfinished();
            }
        }
        self.tokens.push(token);
    }

    fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.push(token);
        }
    }

    fn open_centering(&mut self) {
        if self.centering.is_some() {
            self.tokens.push(Token::end_tag("div"));
        }
        let attrs: Attributes = [("class", "centered")].into_iter().collect();
        self.tokens.push(Token::start_tag("div", attrs));
        if self.close_after == 0 {
            self.tokens.push(Token::end_tag("div"));
            self.centering = None;
        } else {
            self.centering = Some(self.close_after);
        }
        log::debug!("Opened centering block");
    }

    fn close_unfinished(&mut self) {
        if self.centering.take().is_some() {
            log::warn!("Centering block still open at end of body; closing it");
            self.tokens.push(Token::end_tag("div"));
            self.unclosed = true;
        }
    }

    fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    fn pop(&mut self) -> Option<Token> {
        self.tokens.pop()
    }
}

// ============================================================================
// Rewriter
// ============================================================================

struct Rewriter<'a, R: ?Sized> {
    resolver: &'a R,
    diagnostics: &'a mut Diagnostics,
    centering_blank_lines: usize,
}

impl<R: GaijiResolver + ?Sized> Rewriter<'_, R> {
    fn emitter(&self) -> Emitter {
        Emitter {
            tokens: Vec::new(),
            close_after: self.centering_blank_lines,
            centering: None,
            unclosed: false,
        }
    }

    /// Close any open centering block and hand back the tokens.
    fn drain(&mut self, mut out: Emitter) -> Vec<Token> {
        out.close_unfinished();
        if out.unclosed {
            self.diagnostics.push(Diagnostic::UnclosedCentering);
        }
        out.tokens
    }

    /// Rewrite `tokens[start..end]`. Nodes may not extend past `end`.
    fn rewrite_range(
        &mut self,
        tokens: &[Token],
        start: usize,
        end: usize,
        out: &mut Emitter,
    ) -> Result<()> {
        let scope = &tokens[..end];
        let mut i = start;
        while i < end {
            i = self.rewrite_at(scope, i, out)?;
        }
        Ok(())
    }

    /// Rewrite whatever starts at `tokens[i]` and return the next position.
    fn rewrite_at(&mut self, tokens: &[Token], i: usize, out: &mut Emitter) -> Result<usize> {
        let token = &tokens[i];

        match classify(tokens, i) {
            Shape::MetadataHeading => {
                let node = node_at(tokens, i)?;
                out.push(Token::start_tag("div", token.attrs.clone()));
                self.rewrite_range(tokens, node.start + 1, node.end, out)?;
                out.push(Token::end_tag("div"));
                log::debug!("Converted <{}> metadata heading to <div>", token.name);
                Ok(node.end + 1)
            }

            Shape::Heading(_) => {
                let node = node_at(tokens, i)?;
                let mut next = node.end + 1;

                let wrapped = i > 0
                    && tokens[i - 1].is_start("div")
                    && out.last().is_some_and(|t| t.is_start("div"))
                    && tokens.get(node.end + 1).is_some_and(|t| t.is_end("div"));
                if wrapped {
                    out.pop();
                    next += 1;
                    log::debug!("Removed <div> wrapping <{}>", token.name);
                }

                out.push(token.clone());
                self.rewrite_range(tokens, node.start + 1, node.end, out)?;
                out.push(tokens[node.end].clone());
                Ok(next)
            }

            Shape::Ruby => {
                let node = node_at(tokens, i)?;
                self.rewrite_ruby(&tokens[..=node.end], node.start, out)?;
                Ok(node.end + 1)
            }

            Shape::Emphasis(EmphasisStyle::Line) => {
                let node = node_at(tokens, i)?;
                out.push(Token::start_tag("span", token.attrs.clone()));
                self.rewrite_range(tokens, node.start + 1, node.end, out)?;
                out.push(Token::end_tag("span"));
                Ok(node.end + 1)
            }

            Shape::Emphasis(EmphasisStyle::Dots { glyph, side }) => {
                let node = node_at(tokens, i)?;
                let mut inner = self.emitter();
                self.rewrite_range(tokens, node.start + 1, node.end, &mut inner)?;
                let content = self.drain(inner);

                let mut expanded = Vec::new();
                emphasis::expand_boten(content, glyph, side, &mut expanded);
                log::debug!(
                    "Expanded {} emphasis into {} tokens",
                    token.class(),
                    expanded.len()
                );
                out.extend(expanded);
                Ok(node.end + 1)
            }

            Shape::Directive(directive) => {
                let node = node_at(tokens, i)?;
                let span = &tokens[node.range()];
                self.rewrite_directive(directive, span, out);
                Ok(node.end + 1)
            }

            Shape::Script => {
                let node = node_at(tokens, i)?;
                self.remove(RemovedKind::Script, &tokens[node.range()]);
                Ok(node.end + 1)
            }

            Shape::Index => {
                let node = node_at(tokens, i)?;
                self.remove(RemovedKind::Index, &tokens[node.range()]);
                Ok(node.end + 1)
            }

            Shape::IndentBlock(block) => {
                let mut rewritten = token.clone();
                block.apply(&mut rewritten);
                log::debug!("Styled indent block {block:?}");
                out.push(rewritten);
                Ok(i + 1)
            }

            Shape::GlyphImage(code) => {
                let resolved = self.resolve_glyph(token, &code);
                out.push(resolved);
                Ok(i + 1)
            }

            Shape::Plain => {
                out.push(token.clone());
                Ok(i + 1)
            }
        }
    }

    /// Drop `rb` tags and `rp` nodes, keeping the base text and `rt`.
    fn rewrite_ruby(&mut self, tokens: &[Token], start: usize, out: &mut Emitter) -> Result<()> {
        let mut k = start;
        while k < tokens.len() {
            let token = &tokens[k];
            if token.is_start("rp") {
                k = node_at(tokens, k)?.end + 1;
                continue;
            }
            if token.is_tag() && (token.name == "rb" || token.name == "rp") {
                k += 1;
                continue;
            }
            match glyph_code(token) {
                Some(code) => {
                    let resolved = self.resolve_glyph(token, &code);
                    out.push(resolved);
                }
                None => out.push(token.clone()),
            }
            k += 1;
        }
        Ok(())
    }

    fn rewrite_directive(&mut self, directive: Directive, span: &[Token], out: &mut Emitter) {
        let markup = || render_tokens(span);

        match directive {
            Directive::CodePoint(c) => {
                log::debug!("Replaced {} with {c}", markup());
                out.push(Token::text(c.encode_utf8(&mut [0; 4])));
            }
            Directive::BadCodePoint => {
                let directive = markup();
                log::warn!("No valid code point in {directive}");
                self.diagnostics.push(Diagnostic::InvalidCodePoint { directive });
                out.extend(span.iter().cloned());
            }
            Directive::CharNote => {
                let mut open = span[0].clone();
                open.attrs.set("class", "charNote");
                out.push(open);
                out.extend(span[1..].iter().cloned());
            }
            Directive::PageBreak(kind) => {
                log::debug!("Page break ({kind:?}): {}", markup());
                out.extend(page_break_marker());
            }
            Directive::Centering => out.open_centering(),
            Directive::Unknown => out.extend(span.iter().cloned()),
        }
    }

    fn remove(&mut self, kind: RemovedKind, node: &[Token]) {
        let markup = render_tokens(node);
        log::info!("Removed {kind}: {markup}");
        self.diagnostics.push(Diagnostic::RemovedNode { kind, markup });
    }

    /// The resolved text, or the unchanged image if the code has no mapping.
    fn resolve_glyph(&mut self, image: &Token, code: &str) -> Token {
        match self.resolver.resolve(code) {
            Ok(text) => {
                log::debug!("Replaced gaiji {code} with {text}");
                Token::text(&text)
            }
            Err(err) => {
                log::warn!("Could not resolve gaiji {code}: {err}");
                self.diagnostics.push(Diagnostic::UnresolvedGaiji {
                    code: code.to_string(),
                    reason: err.to_string(),
                });
                image.clone()
            }
        }
    }
}
