mod batch;
mod cstyle;
mod hash;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use batch::BatchComments;
pub use cstyle::CStyleComments;
pub use hash::HashComments;

/// Language-specific comment recognition, fed one physical line at a time.
///
/// Implementations keep whatever running state they need (an open block
/// comment, for instance) between calls to [`process_line`](Self::process_line).
pub trait CommentClassifier {
    /// Scan a line and update running state.
    fn process_line(&mut self, line: &str);

    /// Whether the last processed line held nothing but comment text.
    fn is_pure_comment(&self) -> bool;

    /// Delete the comment text found by the last `process_line` call.
    fn remove_comment(&mut self, line: &mut String);
}

/// Treats no line as a comment.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoComments;

impl CommentClassifier for NoComments {
    fn process_line(&mut self, _line: &str) {}

    fn is_pure_comment(&self) -> bool {
        false
    }

    fn remove_comment(&mut self, _line: &mut String) {}
}

/// Which comment syntax to apply to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSyntax {
    /// Pick by file extension.
    #[default]
    Auto,
    None,
    C,
    Hash,
    Batch,
}

impl CommentSyntax {
    pub fn for_path(path: Option<&Path>) -> CommentSyntax {
        let ext = path
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some(
                "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" | "cs" | "java" | "js"
                | "jsx" | "ts" | "tsx" | "rs" | "go" | "kt" | "swift" | "scala" | "css" | "php",
            ) => CommentSyntax::C,
            Some(
                "sh" | "bash" | "zsh" | "py" | "rb" | "pl" | "pm" | "toml" | "yaml" | "yml"
                | "conf" | "cfg" | "ini" | "r" | "cmake" | "mk",
            ) => CommentSyntax::Hash,
            Some("bat" | "cmd") => CommentSyntax::Batch,
            _ => match path.and_then(Path::file_name).and_then(|n| n.to_str()) {
                Some("Makefile" | "makefile" | "Dockerfile" | "CMakeLists.txt") => {
                    CommentSyntax::Hash
                }
                _ => CommentSyntax::None,
            },
        }
    }

    /// Resolve `Auto` against `path`.
    pub fn resolve(self, path: Option<&Path>) -> CommentSyntax {
        match self {
            CommentSyntax::Auto => CommentSyntax::for_path(path),
            other => other,
        }
    }
}

/// Build a fresh classifier for one splitting pass.
pub fn classifier_for(syntax: CommentSyntax, path: Option<&Path>) -> Box<dyn CommentClassifier> {
    match syntax.resolve(path) {
        CommentSyntax::C => Box::new(CStyleComments::default()),
        CommentSyntax::Hash => Box::new(HashComments::default()),
        CommentSyntax::Batch => Box::new(BatchComments::default()),
        CommentSyntax::None | CommentSyntax::Auto => Box::new(NoComments),
    }
}

/// Remove byte ranges from `line`, last first so earlier offsets stay valid.
pub(crate) fn remove_ranges(line: &mut String, ranges: &[(usize, usize)]) {
    for &(start, end) in ranges.iter().rev() {
        if start <= end && end <= line.len() {
            line.replace_range(start..end, "");
        }
    }
}
