use super::{remove_ranges, CommentClassifier};

/// C/C++ style `//` line comments and `/* */` block comments.
///
/// A block comment left open at the end of a line carries into the next one.
/// Quoted string and character literals are never treated as comments.
#[derive(Debug, Default)]
pub struct CStyleComments {
    in_block: bool,
    pure: bool,
    ranges: Vec<(usize, usize)>,
}

impl CommentClassifier for CStyleComments {
    fn process_line(&mut self, line: &str) {
        self.ranges.clear();

        let mut has_code = false;
        let mut has_comment = self.in_block;
        let mut block_start = self.in_block.then_some(0);
        let mut quote: Option<char> = None;
        let mut escaped = false;

        let mut chars = line.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            let next = chars.peek().map(|&(_, c)| c);

            if let Some(start) = block_start {
                if ch == '*' && next == Some('/') {
                    chars.next();
                    self.ranges.push((start, i + 2));
                    block_start = None;
                }
                continue;
            }

            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                continue;
            }

            match (ch, next) {
                ('/', Some('/')) => {
                    self.ranges.push((i, line.len()));
                    has_comment = true;
                    break;
                }
                ('/', Some('*')) => {
                    chars.next();
                    block_start = Some(i);
                    has_comment = true;
                }
                ('"' | '\'', _) => {
                    quote = Some(ch);
                    has_code = true;
                }
                (c, _) if c.is_whitespace() => {}
                _ => has_code = true,
            }
        }

        if let Some(start) = block_start {
            self.ranges.push((start, line.len()));
        }
        self.in_block = block_start.is_some();
        self.pure = has_comment && !has_code;
    }

    fn is_pure_comment(&self) -> bool {
        self.pure
    }

    fn remove_comment(&mut self, line: &mut String) {
        remove_ranges(line, &self.ranges);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(lines: &[&str]) -> Vec<(bool, String)> {
        let mut c = CStyleComments::default();
        lines
            .iter()
            .map(|l| {
                let mut owned = l.to_string();
                c.process_line(&owned);
                c.remove_comment(&mut owned);
                (c.is_pure_comment(), owned)
            })
            .collect()
    }

    #[test]
    fn test_line_comments() {
        let out = classify(&["  // note", "int x; // trailing", "int y;"]);
        assert_eq!(out[0], (true, "  ".to_string()));
        assert_eq!(out[1], (false, "int x; ".to_string()));
        assert_eq!(out[2], (false, "int y;".to_string()));
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let out = classify(&["a = 1; /* start", "   middle", "", "end */ b = 2;", "c();"]);
        assert_eq!(out[0], (false, "a = 1; ".to_string()));
        assert_eq!(out[1], (true, String::new()));
        assert_eq!(out[2], (true, String::new()));
        assert_eq!(out[3], (false, " b = 2;".to_string()));
        assert_eq!(out[4], (false, "c();".to_string()));
    }

    #[test]
    fn test_inline_block_comment() {
        let out = classify(&["f(/* arg */ 1);", "/* a */ /* b */"]);
        assert_eq!(out[0], (false, "f( 1);".to_string()));
        assert_eq!(out[1], (true, " ".to_string()));
    }

    #[test]
    fn test_comment_markers_inside_literals() {
        let out = classify(&[r#"s = "// not /* a comment";"#, r"c = '\'';  // yes"]);
        assert_eq!(out[0], (false, r#"s = "// not /* a comment";"#.to_string()));
        assert_eq!(out[1], (false, r"c = '\'';  ".to_string()));
    }

    #[test]
    fn test_blank_line_outside_block_is_not_comment() {
        let out = classify(&["   "]);
        assert!(!out[0].0);
    }
}
