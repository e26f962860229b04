use serde::{Deserialize, Serialize};

/// One physical line inside a normalized text buffer.
///
/// Records do not own text; `offset` and `size` are byte positions into the
/// buffer they were produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRecord {
    pub offset: usize,
    pub size: usize,
    /// Character column of the first non-whitespace character.
    pub first_non_white: Option<usize>,
    pub pure_comment: bool,
}

impl LineRecord {
    /// A zero-length record at `offset`, used for the sentinel and padding.
    pub fn empty_at(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.offset..self.end()]
    }
}

/// Line terminator style of the first line in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEndStyle {
    Unix,
    Dos,
    /// No terminator seen, or a lone carriage return.
    #[default]
    Undefined,
}

/// Ceilings that guard line and byte counters on huge inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitLimits {
    pub max_lines: usize,
    pub max_bytes: usize,
}

impl Default for SplitLimits {
    fn default() -> Self {
        Self {
            max_lines: (i32::MAX - 5) as usize,
            max_bytes: i32::MAX as usize,
        }
    }
}

/// Per-pass transformations applied while splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    pub remove_comments: bool,
    pub fold_case: bool,
    pub strip_numbers: bool,
    pub limits: SplitLimits,
}

impl SplitOptions {
    pub fn display(limits: SplitLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }
}
