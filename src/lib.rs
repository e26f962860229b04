//! Source ingestion for line-based comparison.
//!
//! Turns a file, a remote location or in-memory text into two aligned,
//! line-indexed views: a display view holding the original content and a
//! comparison view produced by an optional line-matching preprocessor and
//! comment stripping. See [`source::SourceData`] for the entry point.

pub mod comments;
pub mod encoding;
pub mod error;
pub mod preprocess;
pub mod source;
pub mod splitter;

pub use encoding::{EncodingChoice, TextEncoding};
pub use error::{OptionsError, PreprocessError, SourceError};
pub use source::{Options, OptionsUpdate, PipelineReport, SourceData};
