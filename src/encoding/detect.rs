use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::TextEncoding;

/// Only the head of a file is inspected for markers and charset tags.
pub const DETECTION_WINDOW: usize = 5000;

/// Outcome of a successful detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub encoding: TextEncoding,
    /// Leading marker bytes to drop before decoding.
    pub skip_bytes: usize,
}

/// Detect the encoding of `bytes` from a byte-order mark, an XML declaration,
/// or an HTML `<meta>` charset, in that order.
pub fn detect_encoding(bytes: &[u8]) -> Option<Detected> {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Some(Detected {
            encoding: TextEncoding::Utf16Le,
            skip_bytes: 2,
        });
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Some(Detected {
            encoding: TextEncoding::Utf16Be,
            skip_bytes: 2,
        });
    }
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Some(Detected {
            encoding: TextEncoding::Utf8Bom,
            skip_bytes: 3,
        });
    }

    let head = &bytes[..bytes.len().min(DETECTION_WINDOW)];
    let encoding = match find(head, b"<?xml", 0) {
        Some(xml_start) => find(head, b"?>", xml_start)
            .and_then(|xml_end| encoding_from_tag(&head[xml_start..xml_end], b"encoding=")),
        None => meta_charset(head),
    }?;

    Some(Detected {
        encoding,
        skip_bytes: 0,
    })
}

/// Read at most [`DETECTION_WINDOW`] bytes of `path` and detect from them.
pub fn detect_file_encoding(path: &Path) -> io::Result<Option<Detected>> {
    let mut head = Vec::with_capacity(DETECTION_WINDOW);
    File::open(path)?
        .take(DETECTION_WINDOW as u64)
        .read_to_end(&mut head)?;
    Ok(detect_encoding(&head))
}

fn meta_charset(head: &[u8]) -> Option<TextEncoding> {
    let mut pos = find(head, b"<meta", 0);
    while let Some(meta_start) = pos {
        let meta_end = find(head, b">", meta_start)?;
        if let Some(encoding) = encoding_from_tag(&head[meta_start..meta_end], b"charset=") {
            return Some(encoding);
        }
        pos = find(head, b"<meta", meta_end);
    }
    None
}

/// Pull the value following `key` out of a tag.
///
/// Whichever quote character shows up first after the key delimits the value.
/// Without a closing quote the value runs from the key up to the opening quote,
/// which covers `content="text/html; charset=utf-8"`.
fn encoding_from_tag(tag: &[u8], key: &[u8]) -> Option<TextEncoding> {
    let key_pos = find(tag, key, 0)?;
    let value_start = key_pos + key.len();

    let double = find(tag, b"\"", value_start);
    let single = find(tag, b"'", value_start);
    let (quote, open) = match (double, single) {
        (Some(d), Some(s)) if s < d => (b'\'', Some(s)),
        (None, Some(s)) => (b'\'', Some(s)),
        (d, _) => (b'"', d),
    };

    let close = open.and_then(|o| tag[o + 1..].iter().position(|&b| b == quote).map(|p| o + 1 + p));
    let value = match (open, close) {
        (Some(o), Some(c)) => &tag[o + 1..c],
        (Some(o), None) => &tag[value_start..o],
        (None, _) => &tag[value_start..],
    };

    let label = std::str::from_utf8(value).ok()?;
    TextEncoding::for_label(label)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order_marks() {
        let d = detect_encoding(&[0xFF, 0xFE, b'a', 0]).unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf16Le);
        assert_eq!(d.skip_bytes, 2);

        let d = detect_encoding(&[0xFE, 0xFF, 0, b'a']).unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf16Be);
        assert_eq!(d.skip_bytes, 2);

        let d = detect_encoding(&[0xEF, 0xBB, 0xBF, b'a']).unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf8Bom);
        assert_eq!(d.skip_bytes, 3);
    }

    #[test]
    fn test_xml_single_quotes() {
        let d = detect_encoding(b"<?xml version=\"1.0\" encoding='ISO-8859-1'?>\n<a/>").unwrap();
        assert_eq!(d.encoding, TextEncoding::Latin1);
        assert_eq!(d.encoding.name(), "ISO-8859-1");
        assert_eq!(d.skip_bytes, 0);
    }

    #[test]
    fn test_xml_double_quotes() {
        let d = detect_encoding(b"<?xml version='1.0' encoding=\"UTF-16BE\"?>").unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf16Be);
    }

    #[test]
    fn test_xml_without_encoding_does_not_fall_through_to_meta() {
        let input = b"<?xml version=\"1.0\"?><html><meta charset=\"latin1\"></html>";
        assert_eq!(detect_encoding(input), None);
    }

    #[test]
    fn test_meta_charset_forms() {
        let d = detect_encoding(b"<html><head><meta charset=\"latin1\"></head>").unwrap();
        assert_eq!(d.encoding, TextEncoding::Latin1);

        let d = detect_encoding(
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\">",
        )
        .unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_first_resolvable_meta_wins() {
        let input = b"<meta name=\"x\"><meta charset=\"bogus\"><meta charset='utf-16le'>";
        let d = detect_encoding(input).unwrap();
        assert_eq!(d.encoding, TextEncoding::Utf16Le);
    }

    #[test]
    fn test_plain_text_is_undetected() {
        assert_eq!(detect_encoding(b"hello world\n"), None);
        assert_eq!(detect_encoding(b""), None);
        assert_eq!(detect_encoding(&[0xFF]), None);
    }

    #[test]
    fn test_tag_beyond_window_is_ignored() {
        let mut input = vec![b' '; DETECTION_WINDOW];
        input.extend_from_slice(b"<meta charset=\"latin1\">");
        assert_eq!(detect_encoding(&input), None);
    }
}
