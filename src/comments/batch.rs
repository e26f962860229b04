use super::CommentClassifier;

/// `REM` and `::` comments in batch scripts. They only count at line start.
#[derive(Debug, Default)]
pub struct BatchComments {
    pure: bool,
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    let upper = trimmed.to_uppercase();
    trimmed.starts_with("::")
        || upper == "REM"
        || upper.starts_with("REM ")
        || upper.starts_with("REM\t")
}

impl CommentClassifier for BatchComments {
    fn process_line(&mut self, line: &str) {
        self.pure = is_comment(line);
    }

    fn is_pure_comment(&self) -> bool {
        self.pure
    }

    fn remove_comment(&mut self, line: &mut String) {
        if self.pure {
            line.clear();
        }
    }
}
