//! Error types for normalization.

use thiserror::Error;

/// Errors that abort processing of a document.
///
/// Conditions that only degrade the output (an unmapped glyph, an unknown
/// directive) are not errors; they are recorded as
/// [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML tokenizing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unterminated <{tag}> opened at token {position}")]
    UnterminatedNode { tag: String, position: usize },

    #[error("document has no <body> element")]
    MissingBody,

    #[error("gaiji table line {line}: {message}")]
    GaijiTable { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
