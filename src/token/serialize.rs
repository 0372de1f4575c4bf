//! Token serialization back to markup.

use std::fmt::{self, Write};

use super::{Token, TokenKind};

/// Serialize a token slice to markup.
///
/// Untouched tokens reproduce their source text, so rendering the tokens of
/// a well-formed node gives back the node's original markup.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        // Writing into a String cannot fail.
        let _ = write!(out, "{token}");
    }
    out
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::StartTag => {
                f.write_char('<')?;
                write_tag_body(f, self)?;
                f.write_char('>')
            }
            TokenKind::SelfClosingTag => {
                f.write_char('<')?;
                write_tag_body(f, self)?;
                f.write_str(" />")
            }
            TokenKind::EndTag => write!(f, "</{}>", self.name),
            TokenKind::Comment => write!(f, "<!--{}-->", self.data),
            TokenKind::Text | TokenKind::Declaration => f.write_str(&self.data),
        }
    }
}

fn write_tag_body(f: &mut fmt::Formatter<'_>, token: &Token) -> fmt::Result {
    f.write_str(&token.name)?;
    for (key, value) in token.attrs.iter() {
        write!(f, " {key}=\"")?;
        for c in value.chars() {
            match c {
                '"' => f.write_str("&quot;")?,
                '<' => f.write_str("&lt;")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')?;
    }
    Ok(())
}
