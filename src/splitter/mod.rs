mod split;
mod types;

pub use split::{split_lines, Split, SplitText, TooLarge};
pub use types::{LineEndStyle, LineRecord, SplitLimits, SplitOptions};
