//! Shape classification for rewriter dispatch.

use super::directive::Directive;
use super::emphasis::EmphasisStyle;
use super::indent::IndentBlock;
use crate::gaiji::glyph_code;
use crate::token::Token;

/// What the token at a position starts, as far as the rewriter cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `h1`/`h2`, used by the archive for title, author and the like.
    MetadataHeading,
    /// `h3`..`h6`.
    Heading(u8),
    Ruby,
    Emphasis(EmphasisStyle),
    /// `<span class="notes">` followed by its instruction text.
    Directive(Directive),
    Script,
    /// The `div#contents` table of contents.
    Index,
    IndentBlock(IndentBlock),
    /// A glyph image and the code it stands for.
    GlyphImage(String),
    Plain,
}

/// Classify `tokens[i]`. The first matching shape wins, in declaration
/// order of [`Shape`].
pub fn classify(tokens: &[Token], i: usize) -> Shape {
    let Some(token) = tokens.get(i) else {
        return Shape::Plain;
    };

    match token.heading_level() {
        Some(1 | 2) => return Shape::MetadataHeading,
        Some(level) => return Shape::Heading(level),
        None => {}
    }

    if token.is_start("ruby") {
        return Shape::Ruby;
    }

    if token.is_start("em") {
        return Shape::Emphasis(EmphasisStyle::from_class(token.class()));
    }

    if token.is_start("span")
        && token.class() == "notes"
        && let Some(next) = tokens.get(i + 1)
        && next.is_text()
    {
        return Shape::Directive(Directive::parse(&next.unescaped_text()));
    }

    if token.is_start("script") {
        return Shape::Script;
    }

    if token.is_start("div") && token.id() == Some("contents") {
        return Shape::Index;
    }

    if let Some(block) = IndentBlock::from_token(token) {
        return Shape::IndentBlock(block);
    }

    if let Some(code) = glyph_code(token) {
        return Shape::GlyphImage(code);
    }

    Shape::Plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::directive::PageBreak;
    use crate::token::tokenize;

    fn shape_of(source: &str) -> Shape {
        classify(&tokenize(source).unwrap(), 0)
    }

    #[test]
    fn test_headings() {
        assert_eq!(shape_of("<h1>題</h1>"), Shape::MetadataHeading);
        assert_eq!(shape_of(r#"<h2 class="author">著者</h2>"#), Shape::MetadataHeading);
        assert_eq!(shape_of("<h4>節</h4>"), Shape::Heading(4));
    }

    #[test]
    fn test_directive_needs_text() {
        assert_eq!(
            shape_of(r#"<span class="notes">［＃改ページ］</span>"#),
            Shape::Directive(Directive::PageBreak(PageBreak::NewPage))
        );
        assert_eq!(shape_of(r#"<span class="notes"><img src="a.png" /></span>"#), Shape::Plain);
        assert_eq!(shape_of(r#"<span class="other">［＃改ページ］</span>"#), Shape::Plain);
    }

    #[test]
    fn test_index_beats_indent() {
        assert_eq!(
            shape_of(r#"<div id="contents" class="jisage_2"></div>"#),
            Shape::Index
        );
        assert_eq!(
            shape_of(r#"<div class="jisage_2"></div>"#),
            Shape::IndentBlock(IndentBlock::Jisage(2))
        );
    }

    #[test]
    fn test_glyph_image_and_plain() {
        assert_eq!(
            shape_of(r#"<img src="../../../gaiji/1-84/1-84-77.png" class="gaiji" />"#),
            Shape::GlyphImage("1-84-77".to_string())
        );
        assert_eq!(shape_of(r#"<img src="fig01.png" />"#), Shape::Plain);
        assert_eq!(shape_of("text"), Shape::Plain);
        assert_eq!(shape_of("<script>x</script>"), Shape::Script);
        assert!(matches!(shape_of(r#"<em class="sesame_dot">a</em>"#), Shape::Emphasis(_)));
        assert_eq!(shape_of("<ruby>a</ruby>"), Shape::Ruby);
    }
}
