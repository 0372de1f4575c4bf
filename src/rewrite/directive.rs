//! Bracketed instructions carried by `<span class="notes">` annotations.

use crate::token::{Attributes, Token};

const CENTERING: &str = "［＃ページの左右中央］";

/// Kind of page break. Renderers do not distinguish them yet, so all three
/// produce the same marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBreak {
    /// 改丁: continue on the next recto page.
    NewRecto,
    /// 改ページ
    NewPage,
    /// 改見開き: continue on the next spread.
    NewSpread,
}

/// Meaning of an annotation span, decided from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `U+XXXX`: insert this character.
    CodePoint(char),
    /// A `U+` directive whose digits do not name a character.
    BadCodePoint,
    /// Note explaining the preceding `※` character.
    CharNote,
    PageBreak(PageBreak),
    /// Center the following lines on the page.
    Centering,
    Unknown,
}

impl Directive {
    pub fn parse(text: &str) -> Self {
        if let Some(pos) = text.find("U+") {
            return match parse_code_point(&text[pos + 2..]) {
                Some(c) => Directive::CodePoint(c),
                None => Directive::BadCodePoint,
            };
        }

        if text.contains('※') {
            return Directive::CharNote;
        }

        if text.contains("［＃改丁］") {
            Directive::PageBreak(PageBreak::NewRecto)
        } else if text.contains("［＃改ページ］") {
            Directive::PageBreak(PageBreak::NewPage)
        } else if text.contains("［＃改見開き］") {
            Directive::PageBreak(PageBreak::NewSpread)
        } else if text.trim() == CENTERING {
            Directive::Centering
        } else {
            Directive::Unknown
        }
    }
}

/// Four to six hex digits naming a Unicode scalar value.
fn parse_code_point(digits: &str) -> Option<char> {
    let hex: String = digits
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .take(6)
        .collect();
    if hex.len() < 4 {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// `<div style="page-break-before: always;" data-AmznPageBreak="always"></div>`
pub fn page_break_marker() -> [Token; 2] {
    let attrs: Attributes = [
        ("style", "page-break-before: always;"),
        ("data-AmznPageBreak", "always"),
    ]
    .into_iter()
    .collect();
    [Token::start_tag("div", attrs), Token::end_tag("div")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render_tokens;

    #[test]
    fn test_code_point() {
        assert_eq!(
            Directive::parse("［＃「てへん＋劣」、U+6318、109-2］"),
            Directive::CodePoint('\u{6318}')
        );
        assert_eq!(Directive::parse("［＃U+20B9F］"), Directive::CodePoint('\u{20B9F}'));
        assert_eq!(Directive::parse("［＃U+12］"), Directive::BadCodePoint);
        assert_eq!(Directive::parse("［＃U+D800］"), Directive::BadCodePoint);
    }

    #[test]
    fn test_page_breaks() {
        assert_eq!(
            Directive::parse("［＃改丁］"),
            Directive::PageBreak(PageBreak::NewRecto)
        );
        assert_eq!(
            Directive::parse("\n　［＃改ページ］ "),
            Directive::PageBreak(PageBreak::NewPage)
        );
        assert_eq!(
            Directive::parse("［＃改見開き］"),
            Directive::PageBreak(PageBreak::NewSpread)
        );
    }

    #[test]
    fn test_char_note_beats_page_break() {
        assert_eq!(
            Directive::parse("※［＃「口＋世」、第3水準1-15-8］"),
            Directive::CharNote
        );
    }

    #[test]
    fn test_centering_and_unknown() {
        assert_eq!(Directive::parse(" ［＃ページの左右中央］ "), Directive::Centering);
        assert_eq!(Directive::parse("［＃ここから２字下げ］"), Directive::Unknown);
    }

    #[test]
    fn test_page_break_marker() {
        assert_eq!(
            render_tokens(&page_break_marker()),
            r#"<div style="page-break-before: always;" data-AmznPageBreak="always"></div>"#
        );
    }
}
