//! Whole-document text fixes applied before tokenizing.
//!
//! Every step works on the raw byte buffer and only touches ASCII markup or
//! complete UTF-8 sequences, so a valid UTF-8 buffer stays valid. Running
//! [`preprocess`] on its own output changes nothing.

use bstr::ByteSlice;
use memchr::memmem;

use crate::options::NormalizeOptions;
use crate::util::{decode_text, encoding_for_label};

const BODY_OPEN: &[u8] = b"<body";
const BODY_CLOSE: &[u8] = b"</body>";

/// Marker for an empty source line inside the body.
pub const BLANK_LINE_BR: &str = r#"<br class="blankline" />"#;

const NOTE_MARKER_BEFORE: &str = r#"※<span class="notes">"#;
const NOTE_MARKER_INSIDE: &str = r#"<span class="notes">※"#;

/// Run every preprocessing step and return UTF-8 markup ready for
/// [`tokenize`](crate::token::tokenize).
pub fn preprocess(input: &[u8], options: &NormalizeOptions) -> Vec<u8> {
    let unix = fix_line_endings(input);
    let fallback = encoding_for_label(&options.fallback_encoding);
    let text = decode_text(&unix, fallback);

    let relabelled = relabel_charset(text.as_bytes());
    let compacted = compact_body(&relabelled);
    let kunojiten = fix_kunojiten(&compacted);
    move_note_markers(&kunojiten)
}

/// `\r\n` and lone `\r` become `\n`.
pub fn fix_line_endings(input: &[u8]) -> Vec<u8> {
    input.replace("\r\n", "\n").replace("\r", "\n")
}

/// Rewrite declared Shift_JIS charsets to UTF-8 once the text is decoded.
pub fn relabel_charset(html: &[u8]) -> Vec<u8> {
    let mut out = html.to_vec();
    for label in ["Shift_JIS", "shift_jis", "SHIFT_JIS", "Shift-JIS", "x-sjis"] {
        out = out
            .replace(format!("encoding=\"{label}\""), "encoding=\"UTF-8\"")
            .replace(format!("charset={label}"), "charset=UTF-8");
    }
    out
}

/// Compact the `<body>` region.
///
/// Source newlines inside the body are dropped (some readers render them as
/// spaces) and `<br>`/`<br/>` are written as `<br />`. Each `<br />` is then
/// followed by a blank line and each `</div>` by a newline, and body lines
/// consisting of a bare `<br />` are marked with [`BLANK_LINE_BR`].
/// Everything outside the body is untouched.
pub fn compact_body(html: &[u8]) -> Vec<u8> {
    let Some((start, end)) = body_region(html) else {
        log::debug!("No <body> region found; skipping body compaction");
        return html.to_vec();
    };

    let body = html[start..end]
        .replace("\n", "")
        .replace(BLANK_LINE_BR, "<br />")
        .replace("<br>", "<br />")
        .replace("<br/>", "<br />")
        .replace("<br />", "<br />\n\n")
        .replace("</div>", "</div>\n");
    let body = mark_blank_lines(&body);

    let mut out = Vec::with_capacity(html.len() + body.len());
    out.extend_from_slice(&html[..start]);
    out.extend_from_slice(&body);
    out.extend_from_slice(&html[end..]);
    out
}

/// Start and end (exclusive, after `</body>`) of the body element.
fn body_region(html: &[u8]) -> Option<(usize, usize)> {
    let start = memmem::find(html, BODY_OPEN)?;
    let close = memmem::find(&html[start..], BODY_CLOSE)?;
    Some((start, start + close + BODY_CLOSE.len()))
}

/// Replace lines that are exactly `<br />` with the blank-line marker.
pub fn mark_blank_lines(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for (i, line) in text.split_str("\n").enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        if line == b"<br />" {
            out.extend_from_slice(BLANK_LINE_BR.as_bytes());
        } else {
            out.extend_from_slice(line);
        }
    }
    out
}

/// Two-character kunojiten digraphs become the vertical repetition marks.
pub fn fix_kunojiten(html: &[u8]) -> Vec<u8> {
    html.replace("／＼", "〳〵").replace("／″＼", "〴〵")
}

/// Move a `※` standing right before a note span to just inside it.
pub fn move_note_markers(html: &[u8]) -> Vec<u8> {
    let mut out = html.to_vec();
    // A run of markers moves one step per pass.
    while out.find(NOTE_MARKER_BEFORE).is_some() {
        out = out.replace(NOTE_MARKER_BEFORE, NOTE_MARKER_INSIDE);
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn run(input: &str) -> String {
        String::from_utf8(preprocess(input.as_bytes(), &NormalizeOptions::default())).unwrap()
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(fix_line_endings(b"a\r\nb\rc\n"), b"a\nb\nc\n");
    }

    #[test]
    fn test_compact_body_leaves_head_alone() {
        let input = "<head>\n<title>t</title>\n</head>\n<body>\n<div>a<br>\nb</div>\n</body>\n";
        let expected = "<head>\n<title>t</title>\n</head>\n<body><div>a<br />\n\nb</div>\n</body>\n";
        assert_eq!(run(input), expected);
    }

    #[test]
    fn test_blank_lines_are_marked() {
        let input = "<body>\n一<br />\n<br />\n二<br />\n</body>";
        let expected = concat!(
            "<body>一<br />\n\n",
            r#"<br class="blankline" />"#,
            "\n\n二<br />\n\n</body>"
        );
        assert_eq!(run(input), expected);
    }

    #[test]
    fn test_compact_br_variants_are_marked() {
        let input = "<body>\n一<br/>\n<br/>\n<br>\n二</body>";
        let expected = concat!(
            "<body>一<br />\n\n",
            r#"<br class="blankline" />"#,
            "\n\n",
            r#"<br class="blankline" />"#,
            "\n\n二</body>"
        );
        assert_eq!(run(input), expected);
    }

    #[test]
    fn test_kunojiten() {
        assert_eq!(fix_kunojiten("いろ／＼と".as_bytes()), "いろ〳〵と".as_bytes());
        assert_eq!(fix_kunojiten("また／″＼".as_bytes()), "また〴〵".as_bytes());
    }

    #[test]
    fn test_note_markers_move_inside() {
        let input = r#"※※<span class="notes">［＃「口＋世」、第3水準1-15-8］</span>"#;
        let expected = r#"<span class="notes">※※［＃「口＋世」、第3水準1-15-8］</span>"#;
        assert_eq!(move_note_markers(input.as_bytes()), expected.as_bytes());
    }

    #[test]
    fn test_shift_jis_input_is_decoded_and_relabelled() {
        let source = concat!(
            "<?xml version=\"1.0\" encoding=\"Shift_JIS\"?>\r\n",
            "<html><head><meta http-equiv=\"Content-Type\" content=\"text/html;charset=Shift_JIS\" />",
            "</head>\r\n<body>\r\n吾輩は猫である。<br />\r\n</body></html>"
        );
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(source);
        let out = String::from_utf8(preprocess(&bytes, &NormalizeOptions::default())).unwrap();

        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(out.contains("charset=UTF-8"));
        assert!(out.contains("<body>吾輩は猫である。<br />\n\n</body>"));
    }

    fn document() -> impl Strategy<Value = String> {
        let fragment = prop::sample::select(vec![
            "<br>",
            "<br/>",
            "<br />",
            BLANK_LINE_BR,
            "\n",
            "\r\n",
            "\r",
            "<div>",
            "</div>",
            "本文",
            "※",
            r#"<span class="notes">"#,
            "</span>",
            "／",
            "＼",
            "″",
        ]);
        (
            prop::collection::vec(fragment.clone(), 0..8),
            prop::collection::vec(fragment, 0..32),
        )
            .prop_map(|(head, body)| {
                format!(
                    "<html><head>{}</head>\n<body>{}</body>\n</html>",
                    head.concat(),
                    body.concat()
                )
            })
    }

    proptest! {
        #[test]
        fn prop_preprocess_is_idempotent(doc in document()) {
            let options = NormalizeOptions::default();
            let once = preprocess(doc.as_bytes(), &options);
            let twice = preprocess(&once, &options);
            prop_assert_eq!(once.as_bstr(), twice.as_bstr());
        }
    }
}
