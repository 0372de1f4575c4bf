//! Text decoding helpers shared by the preprocessor and the tokenizer.

use std::borrow::Cow;

use encoding_rs::Encoding;
use memchr::memmem;

/// How far into the document a charset declaration is searched for.
const DECLARATION_WINDOW: usize = 1024;

/// Decode bytes to a string, handling legacy encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the charset the document declares
/// 3. Falls back to `fallback` (Shift_JIS for archive files)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8 without
/// a BOM.
pub fn decode_text<'a>(bytes: &'a [u8], fallback: &'static Encoding) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(label) = extract_declared_charset(bytes)
        && let Some(encoding) = Encoding::for_label(label.as_bytes())
        && encoding != encoding_rs::UTF_8
    {
        let (result, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            log::warn!("Input is not clean {}; some characters were replaced", encoding.name());
        }
        return result;
    }

    let (result, _, had_errors) = fallback.decode(bytes);
    if had_errors {
        log::warn!("Input is not clean {}; some characters were replaced", fallback.name());
    }
    result
}

/// Look up an encoding by label, falling back to Shift_JIS for unknown labels.
pub fn encoding_for_label(label: &str) -> &'static Encoding {
    Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
        log::warn!("Unknown encoding label {label:?}, using Shift_JIS");
        encoding_rs::SHIFT_JIS
    })
}

/// Extract the charset a document declares for itself.
///
/// Checks `<?xml ... encoding="..."?>` first, then `charset=` as used by
/// `<meta charset="...">` and `<meta http-equiv="Content-Type" ...>`.
pub fn extract_declared_charset(bytes: &[u8]) -> Option<&str> {
    extract_xml_encoding(bytes).or_else(|| extract_meta_charset(bytes))
}

/// Extract encoding from XML declaration.
///
/// Only the first ~100 bytes are checked.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    quoted_value(&after_xml[enc_pos + 9..])
}

fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let pos = window
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let after = &window[pos + 8..];

    if let Some(value) = quoted_value(after) {
        return Some(value);
    }

    // http-equiv form: content="text/html; charset=Shift_JIS"
    let end = after
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b' ' | b'>'))
        .unwrap_or(after.len());
    std::str::from_utf8(&after[..end]).ok().filter(|s| !s.is_empty())
}

fn quoted_value(bytes: &[u8]) -> Option<&str> {
    let quote = *bytes.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = bytes[1..].iter().position(|&b| b == quote)? + 1;
    std::str::from_utf8(&bytes[1..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_borrows() {
        let text = "吾輩は猫である";
        let decoded = decode_text(text.as_bytes(), encoding_rs::SHIFT_JIS);
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_decode_shift_jis_fallback() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("吾輩は猫である");
        let decoded = decode_text(&bytes, encoding_rs::SHIFT_JIS);
        assert_eq!(decoded, "吾輩は猫である");
    }

    #[test]
    fn test_decode_uses_declared_charset() {
        let source = "<?xml version=\"1.0\" encoding=\"EUC-JP\"?><p>吾輩は猫である</p>";
        let (bytes, _, _) = encoding_rs::EUC_JP.encode(source);
        let decoded = decode_text(&bytes, encoding_rs::SHIFT_JIS);
        assert_eq!(decoded, source);
    }

    #[test]
    fn test_extract_xml_encoding() {
        let bytes = br#"<?xml version="1.0" encoding="Shift_JIS"?>"#;
        assert_eq!(extract_xml_encoding(bytes), Some("Shift_JIS"));
        assert_eq!(extract_xml_encoding(b"<html>"), None);
    }

    #[test]
    fn test_extract_meta_charset() {
        let quoted = br#"<html><head><meta charset="Shift_JIS" />"#;
        assert_eq!(extract_declared_charset(quoted), Some("Shift_JIS"));

        let http_equiv =
            br#"<meta http-equiv="Content-Type" content="text/html;charset=Shift_JIS" />"#;
        assert_eq!(extract_declared_charset(http_equiv), Some("Shift_JIS"));
    }

    #[test]
    fn test_encoding_for_label() {
        assert_eq!(encoding_for_label("shift_jis"), encoding_rs::SHIFT_JIS);
        assert_eq!(encoding_for_label("EUC-JP"), encoding_rs::EUC_JP);
        assert_eq!(encoding_for_label("no-such-thing"), encoding_rs::SHIFT_JIS);
    }
}
