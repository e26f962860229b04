//! Error types for the ingestion pipeline.
//!
//! [`SourceError`] is what a pipeline run reports back to its caller;
//! [`PreprocessError`] describes why a single external command failed and is
//! folded into one of the two preprocessor variants of `SourceError`.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{} is not a normal file.", .path.display())]
    NotRegularFile { path: PathBuf },

    #[error("Failed to read file: {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write file: {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Preprocessing possibly failed. Check this command:\n\n  {command}\n\n\
         The preprocessing command will be disabled now.\n({reason})"
    )]
    PreprocessorFailed {
        command: String,
        #[source]
        reason: PreprocessError,
    },

    #[error(
        "The line-matching-preprocessing possibly failed. Check this command:\n\n  {command}\n\n\
         The line-matching-preprocessing command will be disabled now.\n({reason})"
    )]
    LineMatchingPreprocessorFailed {
        command: String,
        #[source]
        reason: PreprocessError,
    },

    #[error("File {} too large to process. Skipping.", .path.display())]
    TooLargeToProcess { path: PathBuf },
}

impl SourceError {
    /// Fatal errors end the run for that source; the rest are warnings.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SourceError::PreprocessorFailed { .. } | SourceError::LineMatchingPreprocessorFailed { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("the command line is empty")]
    EmptyCommandLine,

    #[error("cannot parse command line: {0}")]
    InvalidCommandLine(String),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("command exited with {0}")]
    ExitStatus(ExitStatus),

    #[error("command did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("command produced no output")]
    EmptyOutput,

    #[error("command output is not text")]
    NotText,
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("cannot read options file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),
}
