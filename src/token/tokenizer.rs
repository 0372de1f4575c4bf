//! quick-xml backed tokenizer.
//!
//! The reader runs with end-name checks off: archive files are not always
//! balanced, and deciding what to do about that is the node extractor's job.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Attributes, Token, TokenKind};
use crate::error::Result;

/// Split a document into a flat token sequence.
///
/// Adjacent text and entity references are merged into one text token that
/// keeps its source escaping.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut tokens = Vec::new();

    loop {
        let before = offset(&reader);
        let event = reader.read_event()?;
        let raw = &input[before..offset(&reader)];

        match event {
            Event::Start(e) if is_raw_text_element(&e) => {
                let name = tag_name(&e);
                tokens.push(Token::start_tag(name.clone(), attributes(&e)));

                let content_start = offset(&reader);
                let end = e.to_end().into_owned();
                reader.read_text(end.name())?;
                let closed = &input[content_start..offset(&reader)];
                let content = closed.rfind("</").map_or(closed, |at| &closed[..at]);

                if !content.is_empty() {
                    tokens.push(Token::raw_text(content));
                }
                tokens.push(Token::end_tag(name));
            }
            Event::Start(e) => tokens.push(Token::start_tag(tag_name(&e), attributes(&e))),
            Event::Empty(e) => tokens.push(Token::self_closing(tag_name(&e), attributes(&e))),
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                tokens.push(Token::end_tag(name));
            }
            Event::Text(_) | Event::GeneralRef(_) => push_text(&mut tokens, raw),
            Event::Comment(e) => tokens.push(Token::comment(String::from_utf8_lossy(&e))),
            Event::Eof => break,
            _ => tokens.push(Token::declaration(raw)),
        }
    }

    Ok(tokens)
}

fn offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// `<script>` and `<style>` bodies are not markup and are read verbatim.
fn is_raw_text_element(e: &BytesStart<'_>) -> bool {
    let name = e.name();
    name.as_ref().eq_ignore_ascii_case(b"script") || name.as_ref().eq_ignore_ascii_case(b"style")
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

fn attributes(e: &BytesStart<'_>) -> Attributes {
    e.html_attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect()
}

fn push_text(tokens: &mut Vec<Token>, raw: &str) {
    if let Some(last) = tokens.last_mut()
        && last.kind == TokenKind::Text
    {
        last.data.push_str(raw);
        return;
    }
    tokens.push(Token::raw_text(raw));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render_tokens;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_kinds() {
        let tokens = tokenize(r#"<p class="a">猫<br />犬</p><!-- note -->"#).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::StartTag,
                TokenKind::Text,
                TokenKind::SelfClosingTag,
                TokenKind::Text,
                TokenKind::EndTag,
                TokenKind::Comment,
            ]
        );
        assert_eq!(tokens[0].class(), "a");
        assert_eq!(tokens[1].data, "猫");
        assert_eq!(tokens[5].data, " note ");
    }

    #[test]
    fn test_names_are_lowercased() {
        let tokens = tokenize("<DIV ID=\"x\"></DIV>").unwrap();
        assert!(tokens[0].is_start("div"));
        assert_eq!(tokens[0].id(), Some("x"));
        assert!(tokens[1].is_end("div"));
    }

    #[test]
    fn test_entities_merge_into_text() {
        let tokens = tokenize("<p>a&amp;b&nbsp;c</p>").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].data, "a&amp;b&nbsp;c");
    }

    #[test]
    fn test_unbalanced_input_tokenizes() {
        let tokens = tokenize("<h3>title</div>").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[2].is_end("div"));
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let source = "<body><script>if (a < b && c) { x(); }</script><p>本文</p></body>";
        let tokens = tokenize(source).unwrap();
        assert!(tokens[1].is_start("script"));
        assert_eq!(tokens[2].kind, TokenKind::Text);
        assert_eq!(tokens[2].data, "if (a < b && c) { x(); }");
        assert!(tokens[3].is_end("script"));
        assert!(tokens[4].is_start("p"));
        assert_eq!(render_tokens(&tokens), source);
    }

    #[test]
    fn test_empty_style_element() {
        let tokens = tokenize("<STYLE></STYLE><p>x</p>").unwrap();
        assert!(tokens[0].is_start("style"));
        assert!(tokens[1].is_end("style"));
        assert!(tokens[2].is_start("p"));
    }

    #[test]
    fn test_declarations_kept_verbatim() {
        let source = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html></html>";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Declaration);
        assert_eq!(render_tokens(&tokens), source);
    }
}
