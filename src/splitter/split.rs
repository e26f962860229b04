use thiserror::Error;

use super::types::{LineEndStyle, LineRecord, SplitOptions};
use crate::comments::CommentClassifier;
use crate::encoding::{detect_encoding, TextEncoding};

/// NUL characters tolerated between CR and LF before the pair stops counting as DOS.
const MAX_CRLF_PADDING: usize = 4;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("input exceeds the line or byte ceiling")]
pub struct TooLarge;

/// A decoded, line-indexed buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitText {
    /// Every line followed by a single `\n`.
    pub text: String,
    /// One record per line plus the trailing sentinel.
    pub records: Vec<LineRecord>,
    pub line_count: usize,
    pub line_end_style: LineEndStyle,
    pub incomplete_conversion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split {
    Text(SplitText),
    /// A NUL or Unicode non-character was hit; no lines are kept.
    Binary,
}

fn is_noncharacter(c: char) -> bool {
    let cp = u32::from(c);
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}

/// Decode `bytes` as `encoding` and cut it into normalized lines.
///
/// A leading byte-order mark is skipped only when it belongs to the same
/// encoding family that is used for decoding.
pub fn split_lines(
    bytes: &[u8],
    encoding: TextEncoding,
    options: &SplitOptions,
    classifier: &mut dyn CommentClassifier,
) -> Result<Split, TooLarge> {
    let skip = match detect_encoding(bytes) {
        Some(d) if d.skip_bytes > 0 && encoding.same_family(&d.encoding) => d.skip_bytes,
        _ => 0,
    };
    let payload = &bytes[skip..];
    if payload.len() > options.limits.max_bytes {
        return Err(TooLarge);
    }

    let (decoded, _) = encoding.decode(payload);
    let src: &str = &decoded;

    let mut out = SplitText {
        text: String::with_capacity(src.len() + 1),
        ..SplitText::default()
    };
    let mut first_style: Option<LineEndStyle> = None;
    let mut line = String::new();
    let mut pos = 0;

    while pos < src.len() {
        if out.line_count >= options.limits.max_lines {
            return Err(TooLarge);
        }

        line.clear();
        let rest = &src[pos..];
        let mut consumed = rest.len();
        let mut style = None;
        let mut first_non_white = None;
        let mut column = 0;

        for (i, ch) in rest.char_indices() {
            match ch {
                '\n' => {
                    style = Some(LineEndStyle::Unix);
                    consumed = i + 1;
                    break;
                }
                '\r' => {
                    let after = &rest.as_bytes()[i + 1..];
                    let padding = after
                        .iter()
                        .take(MAX_CRLF_PADDING)
                        .take_while(|&&b| b == 0)
                        .count();
                    if after.get(padding) == Some(&b'\n') {
                        style = Some(LineEndStyle::Dos);
                        consumed = i + 1 + padding + 1;
                    } else {
                        // Old Mac ending.
                        style = Some(LineEndStyle::Undefined);
                        consumed = i + 1;
                    }
                    break;
                }
                c if c == '\0' || is_noncharacter(c) => {
                    log::debug!("binary content at byte {} of decoded text", pos + i);
                    return Ok(Split::Binary);
                }
                c => {
                    if c == char::REPLACEMENT_CHARACTER {
                        out.incomplete_conversion = true;
                    }
                    if first_non_white.is_none() && !c.is_whitespace() {
                        first_non_white = Some(column);
                    }
                    line.push(c);
                    column += 1;
                }
            }
        }
        pos += consumed;
        out.line_count += 1;
        if first_style.is_none() {
            first_style = style;
        }

        classifier.process_line(&line);
        if options.remove_comments {
            classifier.remove_comment(&mut line);
        }
        if options.fold_case {
            line = line.to_lowercase();
        }
        if options.strip_numbers {
            line.retain(|c| !c.is_ascii_digit());
        }

        out.records.push(LineRecord {
            offset: out.text.len(),
            size: line.len(),
            first_non_white,
            pure_comment: classifier.is_pure_comment(),
        });
        out.text.push_str(&line);
        out.text.push('\n');
    }

    out.records.push(LineRecord::empty_at(out.text.len()));
    out.line_end_style = first_style.unwrap_or_default();
    Ok(Split::Text(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{CStyleComments, NoComments};
    use crate::splitter::SplitLimits;

    fn split_plain(bytes: &[u8], encoding: TextEncoding) -> Split {
        split_lines(bytes, encoding, &SplitOptions::default(), &mut NoComments).unwrap()
    }

    fn text_of(split: Split) -> SplitText {
        match split {
            Split::Text(t) => t,
            Split::Binary => panic!("expected text"),
        }
    }

    fn lines(t: &SplitText) -> Vec<&str> {
        t.records[..t.line_count].iter().map(|r| r.text(&t.text)).collect()
    }

    #[test]
    fn test_mixed_line_endings() {
        let t = text_of(split_plain(b"a\nb\r\nc\rd", TextEncoding::Utf8));
        assert_eq!(lines(&t), vec!["a", "b", "c", "d"]);
        assert_eq!(t.text, "a\nb\nc\nd\n");
        assert_eq!(t.line_count, 4);
        assert_eq!(t.line_end_style, LineEndStyle::Unix);
        assert_eq!(t.records.len(), 5);
        assert_eq!(t.records[4], LineRecord::empty_at(t.text.len()));
    }

    #[test]
    fn test_first_terminator_decides_style() {
        let t = text_of(split_plain(b"a\r\nb\n", TextEncoding::Utf8));
        assert_eq!(t.line_end_style, LineEndStyle::Dos);

        let t = text_of(split_plain(b"a\rb\n", TextEncoding::Utf8));
        assert_eq!(t.line_end_style, LineEndStyle::Undefined);

        let t = text_of(split_plain(b"no terminator", TextEncoding::Utf8));
        assert_eq!(t.line_end_style, LineEndStyle::Undefined);
        assert_eq!(t.line_count, 1);
    }

    #[test]
    fn test_offsets_strictly_increase() {
        let t = text_of(split_plain(b"\n\nx\n\n", TextEncoding::Utf8));
        assert_eq!(t.line_count, 4);
        for pair in t.records.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn test_empty_buffer_has_only_sentinel() {
        let t = text_of(split_plain(b"", TextEncoding::Utf8));
        assert_eq!(t.line_count, 0);
        assert_eq!(t.records, vec![LineRecord::empty_at(0)]);
        assert!(t.text.is_empty());
    }

    #[test]
    fn test_nul_means_binary() {
        assert_eq!(split_plain(b"abc\ndef\0ghi\n", TextEncoding::Utf8), Split::Binary);
        assert_eq!(split_plain("x\u{FFFF}".as_bytes(), TextEncoding::Utf8), Split::Binary);
        assert_eq!(split_plain("x\u{FDD0}".as_bytes(), TextEncoding::Utf8), Split::Binary);
    }

    #[test]
    fn test_crlf_with_nul_padding() {
        let t = text_of(split_plain(b"a\r\0\0\nb", TextEncoding::Utf8));
        assert_eq!(lines(&t), vec!["a", "b"]);
        assert_eq!(t.line_end_style, LineEndStyle::Dos);
    }

    #[test]
    fn test_replacement_sets_incomplete_conversion() {
        let t = text_of(split_plain(b"ok\nbad \xFF byte\nok\n", TextEncoding::Utf8));
        assert!(t.incomplete_conversion);
        assert_eq!(t.line_count, 3);

        let t = text_of(split_plain(b"clean\n", TextEncoding::Utf8));
        assert!(!t.incomplete_conversion);
    }

    #[test]
    fn test_utf16_with_bom_is_skipped() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(TextEncoding::Utf16Le.encode("hi\r\nthere"));
        let t = text_of(split_plain(&bytes, TextEncoding::Utf16Le));
        assert_eq!(lines(&t), vec!["hi", "there"]);
        assert_eq!(t.line_end_style, LineEndStyle::Dos);
    }

    #[test]
    fn test_utf8_bom_skipped_for_plain_utf8() {
        let t = text_of(split_plain(b"\xEF\xBB\xBFfirst\n", TextEncoding::Utf8));
        assert_eq!(lines(&t), vec!["first"]);
    }

    #[test]
    fn test_first_non_white_column() {
        let t = text_of(split_plain(" \t x\n   \n\u{e9}\n".as_bytes(), TextEncoding::Utf8));
        assert_eq!(t.records[0].first_non_white, Some(3));
        assert_eq!(t.records[1].first_non_white, None);
        assert_eq!(t.records[2].first_non_white, Some(0));
    }

    #[test]
    fn test_line_ceiling() {
        let options = SplitOptions {
            limits: SplitLimits {
                max_lines: 2,
                ..SplitLimits::default()
            },
            ..SplitOptions::default()
        };
        assert_eq!(
            split_lines(b"1\n2\n3\n", TextEncoding::Utf8, &options, &mut NoComments),
            Err(TooLarge)
        );
        assert!(split_lines(b"1\n2\n", TextEncoding::Utf8, &options, &mut NoComments).is_ok());
    }

    #[test]
    fn test_byte_ceiling() {
        let options = SplitOptions {
            limits: SplitLimits {
                max_bytes: 3,
                ..SplitLimits::default()
            },
            ..SplitOptions::default()
        };
        assert_eq!(
            split_lines(b"abcd", TextEncoding::Utf8, &options, &mut NoComments),
            Err(TooLarge)
        );
    }

    #[test]
    fn test_comment_tagging_and_removal() {
        let input = b"int a; // x\n// whole\nb();\n";

        let kept = text_of(
            split_lines(input, TextEncoding::Utf8, &SplitOptions::default(), &mut CStyleComments::default())
                .unwrap(),
        );
        assert_eq!(lines(&kept), vec!["int a; // x", "// whole", "b();"]);
        assert!(kept.records[1].pure_comment);
        assert!(!kept.records[0].pure_comment);

        let options = SplitOptions {
            remove_comments: true,
            ..SplitOptions::default()
        };
        let stripped = text_of(
            split_lines(input, TextEncoding::Utf8, &options, &mut CStyleComments::default()).unwrap(),
        );
        assert_eq!(lines(&stripped), vec!["int a; ", "", "b();"]);
        assert!(stripped.records[1].pure_comment);
    }

    #[test]
    fn test_case_and_number_folding() {
        let options = SplitOptions {
            fold_case: true,
            strip_numbers: true,
            ..SplitOptions::default()
        };
        let t = text_of(split_lines(b"Value 42\n", TextEncoding::Utf8, &options, &mut NoComments).unwrap());
        assert_eq!(lines(&t), vec!["value "]);
    }
}
