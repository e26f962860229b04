//! Per-source ingestion: resolve the input, run both preprocessing stages and
//! build the display and comparison views.
//!
//! Order of operations for one run:
//!  1. In-memory data lives in a scratch file; remote inputs are copied to one.
//!  2. Pick the working encoding (detector or explicit choice).
//!  3. Stage A: general preprocessor, output decoded into the display view.
//!  4. Stage B: line-matching preprocessor, or a private copy of the display
//!     bytes when comments, case or numbers are ignored.
//!  5. Pad the comparison view to the display view's line count.
//!  6. Carry pure-comment flags back to the display view.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::buffer::{DataBuffer, Lines};
use super::input::{InputReference, LocalOnlyFetcher, RemoteFetcher};
use super::options::{Options, OptionsUpdate};
use crate::comments::classifier_for;
use crate::encoding::{detect_file_encoding, EncodingChoice, TextEncoding};
use crate::error::{PreprocessError, SourceError};
use crate::preprocess::{transcode_file, PreprocessorRunner};
use crate::splitter::{LineEndStyle, SplitOptions};

pub const CLIPBOARD_ALIAS: &str = "From Clipboard";

/// Everything a pipeline run wants its caller to know.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Warnings and, last, at most one fatal error.
    pub errors: Vec<SourceError>,
    pub options_update: OptionsUpdate,
}

impl PipelineReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fatal(&self) -> Option<&SourceError> {
        self.errors.iter().find(|e| e.is_fatal())
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// One side of a comparison.
#[derive(Debug)]
pub struct SourceData {
    input: InputReference,
    alias_name: Option<String>,
    from_buffer: bool,
    scratch_input: Option<NamedTempFile>,
    encoding: Option<TextEncoding>,
    display: DataBuffer,
    comparison: DataBuffer,
    fetcher: Arc<dyn RemoteFetcher>,
}

impl Default for SourceData {
    fn default() -> Self {
        Self::with_fetcher(Arc::new(LocalOnlyFetcher))
    }
}

fn scratch_file() -> io::Result<NamedTempFile> {
    tempfile::Builder::new().prefix("source-ingest-").tempfile()
}

impl SourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetcher(fetcher: Arc<dyn RemoteFetcher>) -> Self {
        Self {
            input: InputReference::None,
            alias_name: None,
            from_buffer: false,
            scratch_input: None,
            encoding: None,
            display: DataBuffer::default(),
            comparison: DataBuffer::default(),
            fetcher,
        }
    }

    /// Drop all data and delete any scratch file.
    pub fn reset(&mut self) {
        self.input = InputReference::None;
        self.alias_name = None;
        self.from_buffer = false;
        self.scratch_input = None;
        self.encoding = None;
        self.display.reset();
        self.comparison.reset();
    }

    pub fn set_file(&mut self, location: &str) {
        if location.is_empty() {
            self.reset();
        } else {
            self.set_location(InputReference::parse(location));
        }
    }

    pub fn set_location(&mut self, input: InputReference) {
        self.input = input;
        self.alias_name = None;
        self.from_buffer = false;
        self.scratch_input = None;
    }

    /// Use in-memory text as the input. It is stored as UTF-8 in a scratch file.
    pub fn set_data(&mut self, data: &str) -> Result<(), SourceError> {
        let scratch = match self.scratch_input.take() {
            Some(file) if self.from_buffer => file,
            _ => scratch_file().map_err(|source| SourceError::WriteFailed {
                path: std::env::temp_dir(),
                source,
            })?,
        };
        fs::write(scratch.path(), data.as_bytes()).map_err(|source| SourceError::WriteFailed {
            path: scratch.path().to_path_buf(),
            source,
        })?;

        self.scratch_input = Some(scratch);
        self.input = InputReference::None;
        self.from_buffer = true;
        self.alias_name = Some(CLIPBOARD_ALIAS.to_string());
        Ok(())
    }

    pub fn set_alias_name(&mut self, name: impl Into<String>) {
        self.alias_name = Some(name.into());
    }

    pub fn alias_name(&self) -> String {
        self.alias_name
            .clone()
            .unwrap_or_else(|| self.input.to_string())
    }

    pub fn input(&self) -> &InputReference {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        !self.input.is_valid() && !self.from_buffer
    }

    pub fn has_data(&self) -> bool {
        self.display.has_data()
    }

    /// No input, or an input that was read.
    pub fn is_valid(&self) -> bool {
        self.is_empty() || self.has_data()
    }

    pub fn is_text(&self) -> bool {
        self.display.is_text()
    }

    pub fn is_incomplete_conversion(&self) -> bool {
        self.display.is_incomplete_conversion()
    }

    pub fn is_from_buffer(&self) -> bool {
        self.from_buffer
    }

    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    pub fn line_end_style(&self) -> LineEndStyle {
        self.display.line_end_style()
    }

    pub fn size_lines(&self) -> usize {
        self.display.line_count()
    }

    pub fn size_bytes(&self) -> usize {
        self.display.size()
    }

    pub fn bytes(&self) -> &[u8] {
        self.display.bytes()
    }

    pub fn text(&self) -> &str {
        self.display.text()
    }

    pub fn display_buffer(&self) -> &DataBuffer {
        &self.display
    }

    pub fn comparison_buffer(&self) -> &DataBuffer {
        &self.comparison
    }

    pub fn display_lines(&self) -> Option<Lines<'_>> {
        self.display.lines()
    }

    /// The comparison view when one was built, otherwise the display view.
    pub fn lines_for_comparison(&self) -> Option<Lines<'_>> {
        if self.comparison.has_data() {
            self.comparison.lines()
        } else {
            self.display.lines()
        }
    }

    fn input_exists(&self) -> bool {
        match &self.input {
            InputReference::None => false,
            InputReference::Local(path) => path.exists(),
            InputReference::Remote(_) => self.scratch_input.is_some(),
        }
    }

    pub fn is_binary_equal_with(&self, other: &SourceData) -> bool {
        self.input_exists()
            && other.input_exists()
            && self.size_bytes() == other.size_bytes()
            && self.bytes() == other.bytes()
    }

    pub fn save_display_data_as(&self, path: &Path) -> Result<(), SourceError> {
        self.display
            .write_file(path)
            .map_err(|source| SourceError::WriteFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Run the whole pipeline. Warnings and any fatal error end up in the report.
    ///
    /// `options` is never modified; apply [`PipelineReport::options_update`]
    /// to stop failing commands from running again.
    pub fn read_and_preprocess(&mut self, choice: EncodingChoice, options: &Options) -> PipelineReport {
        let mut report = PipelineReport::default();
        if let Err(e) = self.run_pipeline(choice, options, &mut report) {
            log::error!("{}: {}", self.alias_name(), e);
            report.errors.push(e);
        }
        for warning in report.errors.iter().filter(|e| !e.is_fatal()) {
            log::warn!("{}: {}", self.alias_name(), warning);
        }
        report
    }

    fn resolve_input(&mut self) -> Result<Option<PathBuf>, SourceError> {
        if self.from_buffer {
            return Ok(self.scratch_input.as_ref().map(|f| f.path().to_path_buf()));
        }

        self.input.check_regular()?;
        match &self.input {
            InputReference::None => Ok(None),
            InputReference::Local(path) => Ok(Some(path.clone())),
            InputReference::Remote(url) => {
                if self.scratch_input.is_none() {
                    let read_failed = |source| SourceError::ReadFailed {
                        path: PathBuf::from(url.as_str()),
                        source,
                    };
                    let mut copy = scratch_file().map_err(read_failed)?;
                    log::info!("Copying {} to {:?}", url, copy.path());
                    self.fetcher
                        .fetch(url, copy.as_file_mut())
                        .map_err(read_failed)?;
                    self.scratch_input = Some(copy);
                }
                Ok(self.scratch_input.as_ref().map(|f| f.path().to_path_buf()))
            }
        }
    }

    fn run_pipeline(
        &mut self,
        choice: EncodingChoice,
        options: &Options,
        report: &mut PipelineReport,
    ) -> Result<(), SourceError> {
        self.display.reset();
        self.comparison.reset();
        self.encoding = Some(choice.encoding);

        let Some(input) = self.resolve_input()? else {
            return Ok(());
        };

        let encoding = if self.from_buffer {
            TextEncoding::Utf8
        } else if choice.auto_detect {
            match detect_file_encoding(&input) {
                Ok(Some(detected)) => detected.encoding,
                _ => choice.encoding,
            }
        } else {
            choice.encoding
        };
        self.encoding = Some(encoding);
        log::debug!("{}: working encoding {}", self.alias_name(), encoding.name());

        let Ok(meta) = fs::metadata(&input) else {
            log::debug!("{:?} does not exist, nothing to read", input);
            return Ok(());
        };
        let input_size = meta.len();

        let runner = options.runner();
        let name_hint = self.input.name_hint();
        let too_large = |_| SourceError::TooLargeToProcess {
            path: input.clone(),
        };

        // Stage A
        let mut stage_a_output: Option<NamedTempFile> = None;
        let mut encoding_a = encoding;
        if options.preprocessor_cmd.is_empty() {
            read_into(&mut self.display, &input)?;
        } else {
            match run_stage(
                &runner,
                &options.preprocessor_cmd,
                &input,
                encoding,
                options.preprocessor_encoding,
                input_size,
                &mut self.display,
            ) {
                Ok((output, tool_encoding)) => {
                    stage_a_output = Some(output);
                    encoding_a = tool_encoding;
                }
                Err(reason) => {
                    report.errors.push(SourceError::PreprocessorFailed {
                        command: options.preprocessor_cmd.clone(),
                        reason,
                    });
                    report.options_update.disable_preprocessor = true;
                    read_into(&mut self.display, &input)?;
                }
            }
        }

        let mut classifier = classifier_for(options.comment_syntax, name_hint.as_deref());
        self.display
            .decode(encoding_a, &SplitOptions::display(options.limits), classifier.as_mut())
            .map_err(too_large)?;

        if !self.display.is_text() {
            log::info!("{}: binary content, skipping line processing", self.alias_name());
            return Ok(());
        }

        // Stage B
        let mut encoding_b = encoding_a;
        if !options.line_matching_preprocessor_cmd.is_empty() {
            let stage_b_input = stage_a_output.as_ref().map_or(input.as_path(), NamedTempFile::path);
            let stage_b_size = fs::metadata(stage_b_input).map_or(0, |m| m.len());
            match run_stage(
                &runner,
                &options.line_matching_preprocessor_cmd,
                stage_b_input,
                encoding_a,
                options.preprocessor_encoding,
                stage_b_size,
                &mut self.comparison,
            ) {
                Ok((_output, tool_encoding)) => encoding_b = tool_encoding,
                Err(reason) => {
                    report.errors.push(SourceError::LineMatchingPreprocessorFailed {
                        command: options.line_matching_preprocessor_cmd.clone(),
                        reason,
                    });
                    report.options_update.disable_line_matching = true;
                    read_into(&mut self.comparison, stage_b_input)?;
                }
            }
        } else if options.wants_comparison_copy() {
            self.comparison.copy_bytes_from(&self.display);
        }

        if !self.comparison.has_data() {
            return Ok(());
        }

        let split = SplitOptions {
            remove_comments: options.ignore_comments,
            fold_case: options.ignore_case,
            strip_numbers: options.ignore_numbers,
            limits: options.limits,
        };
        let mut classifier = classifier_for(options.comment_syntax, name_hint.as_deref());
        self.comparison
            .decode(encoding_b, &split, classifier.as_mut())
            .map_err(too_large)?;

        if !self.comparison.is_text() {
            log::debug!(
                "{}: line-matching output is not text, comparing display lines instead",
                self.alias_name()
            );
            self.comparison.reset();
            report.errors.push(SourceError::LineMatchingPreprocessorFailed {
                command: options.line_matching_preprocessor_cmd.clone(),
                reason: PreprocessError::NotText,
            });
            report.options_update.disable_line_matching = true;
            return Ok(());
        }

        self.comparison.pad_to(self.display.line_count());

        if options.ignore_comments {
            self.display.adopt_comment_flags(&self.comparison);
        }
        Ok(())
    }
}

fn read_into(buffer: &mut DataBuffer, path: &Path) -> Result<(), SourceError> {
    buffer
        .read_file(path)
        .map_err(|source| SourceError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Run one external stage and read its output into `target`.
///
/// Returns the output file, which must outlive any later stage that reads it,
/// and the encoding the output is in.
fn run_stage(
    runner: &PreprocessorRunner,
    command: &str,
    input: &Path,
    working: TextEncoding,
    tool_encoding: Option<TextEncoding>,
    input_size: u64,
    target: &mut DataBuffer,
) -> Result<(NamedTempFile, TextEncoding), PreprocessError> {
    let tool_encoding = tool_encoding.unwrap_or(working);
    let transcoded = if tool_encoding != working {
        let converted = scratch_file()?;
        transcode_file(input, working, converted.path(), tool_encoding)?;
        Some(converted)
    } else {
        None
    };
    let stage_input = transcoded.as_ref().map_or(input, NamedTempFile::path);

    let output = scratch_file()?;
    runner.run(command, stage_input, output.path())?;
    target.read_file(output.path())?;
    if input_size > 0 && target.is_empty() {
        return Err(PreprocessError::EmptyOutput);
    }
    Ok((output, tool_encoding))
}
