use super::{remove_ranges, CommentClassifier};

/// `#` to end of line, skipping `#` inside single or double quoted strings.
#[derive(Debug, Default)]
pub struct HashComments {
    pure: bool,
    comment_start: Option<usize>,
}

impl CommentClassifier for HashComments {
    fn process_line(&mut self, line: &str) {
        let mut quote: Option<char> = None;
        let mut escaped = false;
        self.comment_start = None;

        for (i, ch) in line.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match (quote, ch) {
                (Some(_), '\\') => escaped = true,
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '#') => {
                    self.comment_start = Some(i);
                    break;
                }
                (None, _) => {}
            }
        }

        self.pure = match self.comment_start {
            Some(start) => line[..start].trim().is_empty(),
            None => false,
        };
    }

    fn is_pure_comment(&self) -> bool {
        self.pure
    }

    fn remove_comment(&mut self, line: &mut String) {
        if let Some(start) = self.comment_start {
            remove_ranges(line, &[(start, line.len())]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_and_trailing_comments() {
        let mut c = HashComments::default();
        c.process_line("   # only a comment");
        assert!(c.is_pure_comment());

        let mut line = String::from("x = 1  # trailing");
        c.process_line(&line);
        assert!(!c.is_pure_comment());
        c.remove_comment(&mut line);
        assert_eq!(line, "x = 1  ");
    }

    #[test]
    fn test_hash_inside_string_is_code() {
        let mut c = HashComments::default();
        let mut line = String::from("echo \"#not\" 'a # comment'");
        c.process_line(&line);
        assert!(!c.is_pure_comment());
        c.remove_comment(&mut line);
        assert_eq!(line, "echo \"#not\" 'a # comment'");
    }
}
