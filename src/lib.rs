//! # aozora-normalize
//!
//! Normalizes XHTML files from the Aozora Bunko archive into portable markup
//! and recovers their section structure.
//!
//! Archive files encode vertical-typesetting instructions, emphasis dots,
//! page breaks and non-Unicode glyphs in a private vocabulary that no
//! renderer understands. This crate rewrites all of it into standard markup
//! (ruby, CSS classes and inline styles, Unicode text) and builds a section
//! tree with stable anchors for a table of contents.
//!
//! ## Pipeline
//!
//! 1. [`preprocess`](preprocess::preprocess): line endings, decoding to
//!    UTF-8, body compaction, kunojiten and note-marker fixes
//! 2. [`tokenize`](token::tokenize): flat token sequence
//! 3. [`rewrite_body`](rewrite::rewrite_body): one pass of shape-directed
//!    rewrites over the `<body>` tokens
//! 4. [`build_sections`](section::build_sections): anchors and section tree
//!
//! [`Document`] runs all of them.
//!
//! ## Quick Start
//!
//! ```
//! use aozora_normalize::{Document, NoGaiji, NormalizeOptions};
//!
//! let html = r#"<html><head><title>猫</title></head><body><h3>一</h3><span class="notes">［＃改ページ］</span></body></html>"#;
//! let doc = Document::from_bytes(html.as_bytes(), &NoGaiji, &NormalizeOptions::default())?;
//!
//! assert_eq!(doc.sections.section_count(), 1);
//! assert!(doc.render().contains("page-break-before: always;"));
//! # Ok::<(), aozora_normalize::Error>(())
//! ```

pub mod diagnostic;
pub mod document;
pub mod error;
pub mod gaiji;
pub mod node;
pub mod options;
pub mod preprocess;
pub mod rewrite;
pub mod section;
pub mod token;
pub(crate) mod util;

pub use diagnostic::{Diagnostic, Diagnostics, RemovedKind};
pub use document::{Document, Metadata};
pub use error::{Error, Result};
pub use gaiji::{GaijiError, GaijiResolver, GaijiTable, MenKuTen, NoGaiji};
pub use node::{NodeRange, extract_node, text_content};
pub use options::{AnchorScheme, NormalizeOptions};
pub use section::{Section, SectionId, SectionTree, TocEntry};
pub use token::{Attributes, Token, TokenKind};
