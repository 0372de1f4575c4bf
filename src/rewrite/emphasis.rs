//! `<em>` emphasis: side lines and boten (emphasis dots).

use crate::token::{Attributes, Token};

/// Which side of the column the emphasis marks sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotenSide {
    Right,
    /// Classes ending in `_after` put the marks on the left.
    Left,
}

impl BotenSide {
    fn class(self) -> &'static str {
        match self {
            BotenSide::Right => "right-boten",
            BotenSide::Left => "left-boten",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmphasisStyle {
    /// `underline*` / `overline*`: a plain span, styled by its class.
    Line,
    /// One ruby unit per character, glossed with `glyph`.
    Dots {
        glyph: &'static str,
        side: BotenSide,
    },
}

impl EmphasisStyle {
    pub fn from_class(class: &str) -> Self {
        if class.starts_with("underline") || class.starts_with("overline") {
            return EmphasisStyle::Line;
        }
        let side = if class.ends_with("after") {
            BotenSide::Left
        } else {
            BotenSide::Right
        };
        EmphasisStyle::Dots {
            glyph: boten_glyph(class),
            side,
        }
    }
}

/// Mark printed beside each emphasized character. Unknown classes get none.
pub fn boten_glyph(class: &str) -> &'static str {
    match class.trim_end_matches("_after") {
        "sesame_dot" => "﹅",
        "white_sesame_dot" => "﹆",
        "black_circle" => "●",
        "white_circle" => "○",
        "black_up-pointing_triangle" => "▲",
        "white_up-pointing_triangle" => "△",
        "bullseye" => "◎",
        "fisheye" => "⦿",
        "saltire" => "×",
        _ => "",
    }
}

/// Expand already rewritten emphasis content into boten ruby units.
///
/// Every character of every text token becomes
/// `<ruby class="…-boten">c<rt>glyph</rt></ruby>`. A character reference
/// such as `&amp;` counts as one character. Other tokens pass through in
/// place, and so does any ruby already inside the emphasis, since ruby
/// cannot nest.
pub fn expand_boten(content: Vec<Token>, glyph: &str, side: BotenSide, out: &mut Vec<Token>) {
    let mut ruby_depth = 0usize;

    for token in content {
        if token.is_start("ruby") {
            ruby_depth += 1;
        } else if token.is_end("ruby") {
            ruby_depth = ruby_depth.saturating_sub(1);
        }
        if !token.is_text() || ruby_depth > 0 {
            out.push(token);
            continue;
        }
        for unit in text_units(&token.data) {
            let attrs: Attributes = [("class", side.class())].into_iter().collect();
            out.push(Token::start_tag("ruby", attrs));
            out.push(if unit == "&" {
                Token::text(unit)
            } else {
                Token::raw_text(unit)
            });
            out.push(Token::start_tag("rt", Attributes::new()));
            out.push(Token::text(glyph));
            out.push(Token::end_tag("rt"));
            out.push(Token::end_tag("ruby"));
        }
    }
}

/// Split escaped text into characters, keeping character references whole.
fn text_units(raw: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        let len = if c == '&' {
            reference_len(rest).unwrap_or(1)
        } else {
            c.len_utf8()
        };
        units.push(&rest[..len]);
        rest = &rest[len..];
    }

    units
}

/// Length of a `&name;` or `&#NNN;` reference at the start of `s`.
fn reference_len(s: &str) -> Option<usize> {
    let end = s.char_indices().take(12).find(|&(_, c)| c == ';')?.0;
    let name = &s[1..end];
    let valid = !name.is_empty()
        && name
            .strip_prefix('#')
            .unwrap_or(name)
            .chars()
            .all(|c| c.is_ascii_alphanumeric());
    valid.then_some(end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render_tokens;

    #[test]
    fn test_style_from_class() {
        assert_eq!(EmphasisStyle::from_class("underline_solid"), EmphasisStyle::Line);
        assert_eq!(EmphasisStyle::from_class("overline_dotted"), EmphasisStyle::Line);
        assert_eq!(
            EmphasisStyle::from_class("sesame_dot"),
            EmphasisStyle::Dots {
                glyph: "﹅",
                side: BotenSide::Right
            }
        );
        assert_eq!(
            EmphasisStyle::from_class("white_circle_after"),
            EmphasisStyle::Dots {
                glyph: "○",
                side: BotenSide::Left
            }
        );
    }

    #[test]
    fn test_glyph_table() {
        assert_eq!(boten_glyph("fisheye"), "⦿");
        assert_eq!(boten_glyph("saltire_after"), "×");
        assert_eq!(boten_glyph("black_up-pointing_triangle"), "▲");
        assert_eq!(boten_glyph("mystery"), "");
    }

    #[test]
    fn test_expand_per_character() {
        let mut out = Vec::new();
        expand_boten(vec![Token::raw_text("ab")], "﹅", BotenSide::Right, &mut out);
        assert_eq!(
            render_tokens(&out),
            concat!(
                r#"<ruby class="right-boten">a<rt>﹅</rt></ruby>"#,
                r#"<ruby class="right-boten">b<rt>﹅</rt></ruby>"#
            )
        );
    }

    #[test]
    fn test_reference_is_one_unit() {
        assert_eq!(text_units("a&amp;b&#x3042;"), vec!["a", "&amp;", "b", "&#x3042;"]);
        assert_eq!(text_units("a & b"), vec!["a", " ", "&", " ", "b"]);
    }

    #[test]
    fn test_nested_ruby_kept_whole() {
        let mut out = Vec::new();
        let content = vec![
            Token::raw_text("白"),
            Token::start_tag("ruby", Attributes::new()),
            Token::raw_text("漢"),
            Token::start_tag("rt", Attributes::new()),
            Token::raw_text("かん"),
            Token::end_tag("rt"),
            Token::end_tag("ruby"),
            Token::raw_text("字"),
        ];
        expand_boten(content, "﹅", BotenSide::Right, &mut out);
        assert_eq!(
            render_tokens(&out),
            concat!(
                r#"<ruby class="right-boten">白<rt>﹅</rt></ruby>"#,
                "<ruby>漢<rt>かん</rt></ruby>",
                r#"<ruby class="right-boten">字<rt>﹅</rt></ruby>"#
            )
        );
    }

    #[test]
    fn test_non_text_passes_through() {
        let mut out = Vec::new();
        let content = vec![
            Token::raw_text("猫"),
            Token::start_tag("span", Attributes::new()),
            Token::end_tag("span"),
        ];
        expand_boten(content, "●", BotenSide::Left, &mut out);
        assert_eq!(out.len(), 8);
        assert!(out[6].is_start("span"));
        assert_eq!(out[0].class(), "left-boten");
    }
}
