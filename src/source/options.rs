use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::comments::CommentSyntax;
use crate::encoding::TextEncoding;
use crate::error::OptionsError;
use crate::preprocess::PreprocessorRunner;
use crate::splitter::SplitLimits;

/// Settings shared by every source in a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// General preprocessor; empty disables it.
    pub preprocessor_cmd: String,
    /// Preprocessor whose output is only used for line matching.
    pub line_matching_preprocessor_cmd: String,
    /// Encoding both preprocessors read and write. `None` keeps the working encoding.
    pub preprocessor_encoding: Option<TextEncoding>,
    pub ignore_comments: bool,
    pub ignore_case: bool,
    pub ignore_numbers: bool,
    pub comment_syntax: CommentSyntax,
    /// Kill a preprocessor after this many seconds. `None` waits forever.
    pub preprocessor_timeout_secs: Option<u64>,
    pub limits: SplitLimits,
}

impl Options {
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let contents = fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loading options from {:?}", path);
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn runner(&self) -> PreprocessorRunner {
        PreprocessorRunner::new(self.preprocessor_timeout_secs.map(Duration::from_secs))
    }

    /// Whether the comparison view needs its own copy of the display bytes.
    pub fn wants_comparison_copy(&self) -> bool {
        self.ignore_comments || self.ignore_case || self.ignore_numbers
    }
}

/// Changes a pipeline run asks its caller to make to the shared [`Options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionsUpdate {
    pub disable_preprocessor: bool,
    pub disable_line_matching: bool,
}

impl OptionsUpdate {
    pub fn is_empty(&self) -> bool {
        !self.disable_preprocessor && !self.disable_line_matching
    }

    pub fn apply(&self, options: &mut Options) {
        if self.disable_preprocessor {
            log::info!("Disabling preprocessor command: {}", options.preprocessor_cmd);
            options.preprocessor_cmd.clear();
        }
        if self.disable_line_matching {
            log::info!(
                "Disabling line-matching preprocessor command: {}",
                options.line_matching_preprocessor_cmd
            );
            options.line_matching_preprocessor_cmd.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_everything() {
        let options = Options::default();
        assert!(options.preprocessor_cmd.is_empty());
        assert!(options.line_matching_preprocessor_cmd.is_empty());
        assert!(!options.wants_comparison_copy());
        assert_eq!(options.runner().timeout(), None);
    }

    #[test]
    fn test_from_json_partial() {
        let options = Options::from_json(
            r#"{
                "preprocessor_cmd": "sed s/a/b/",
                "preprocessor_encoding": "latin1",
                "ignore_comments": true,
                "comment_syntax": "hash",
                "preprocessor_timeout_secs": 3
            }"#,
        )
        .unwrap();
        assert_eq!(options.preprocessor_cmd, "sed s/a/b/");
        assert_eq!(options.preprocessor_encoding, Some(TextEncoding::Latin1));
        assert_eq!(options.comment_syntax, CommentSyntax::Hash);
        assert_eq!(options.runner().timeout(), Some(Duration::from_secs(3)));
        assert!(options.wants_comparison_copy());
        assert_eq!(options.limits, SplitLimits::default());
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let err = Options::from_json(r#"{"preprocessor_encoding": "klingon"}"#).unwrap_err();
        assert!(matches!(err, OptionsError::Parse(_)));
    }

    #[test]
    fn test_update_clears_commands() {
        let mut options = Options {
            preprocessor_cmd: "a".into(),
            line_matching_preprocessor_cmd: "b".into(),
            ..Options::default()
        };
        OptionsUpdate {
            disable_preprocessor: true,
            ..OptionsUpdate::default()
        }
        .apply(&mut options);
        assert!(options.preprocessor_cmd.is_empty());
        assert_eq!(options.line_matching_preprocessor_cmd, "b");
        assert!(OptionsUpdate::default().is_empty());
    }
}
