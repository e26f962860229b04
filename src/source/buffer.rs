use std::fs;
use std::io;
use std::path::Path;

use crate::comments::CommentClassifier;
use crate::encoding::TextEncoding;
use crate::splitter::{split_lines, LineEndStyle, LineRecord, Split, SplitOptions, TooLarge};

/// Zeroed bytes kept after the logical end of every [`ByteBuffer`] so that
/// comparison code may probe a little past it.
pub const GUARD_BYTES: usize = 100;

/// Raw bytes of one source, followed by [`GUARD_BYTES`] zeroes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    len: usize,
}

impl ByteBuffer {
    pub fn from_vec(mut bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        bytes.resize(len + GUARD_BYTES, 0);
        Self { data: bytes, len }
    }

    pub fn read_from(path: &Path) -> io::Result<Self> {
        Ok(Self::from_vec(fs::read(path)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The content plus its guard area.
    pub fn with_guard(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One decoded view of a source.
#[derive(Debug, Clone, Default)]
pub struct DataBuffer {
    raw: Option<ByteBuffer>,
    text: String,
    records: Vec<LineRecord>,
    line_count: usize,
    line_end_style: LineEndStyle,
    is_text: bool,
    incomplete_conversion: bool,
}

impl DataBuffer {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn read_file(&mut self, path: &Path) -> io::Result<()> {
        self.reset();
        self.raw = Some(ByteBuffer::read_from(path)?);
        Ok(())
    }

    /// Take a private copy of another view's raw bytes, dropping any decode.
    pub fn copy_bytes_from(&mut self, other: &DataBuffer) {
        self.reset();
        self.raw = other.raw.clone();
    }

    pub fn write_file(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.bytes())
    }

    pub fn has_data(&self) -> bool {
        self.raw.is_some()
    }

    pub fn size(&self) -> usize {
        self.raw.as_ref().map_or(0, ByteBuffer::len)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Empty buffers count as text.
    pub fn is_text(&self) -> bool {
        self.is_text || self.is_empty()
    }

    pub fn is_incomplete_conversion(&self) -> bool {
        self.incomplete_conversion
    }

    pub fn line_end_style(&self) -> LineEndStyle {
        self.line_end_style
    }

    pub fn bytes(&self) -> &[u8] {
        self.raw.as_ref().map(ByteBuffer::as_bytes).unwrap_or_default()
    }

    pub fn raw(&self) -> Option<&ByteBuffer> {
        self.raw.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// All records, including the sentinel and any padding.
    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Decode the raw bytes into lines. A buffer that was never read stays empty.
    pub fn decode(
        &mut self,
        encoding: TextEncoding,
        options: &SplitOptions,
        classifier: &mut dyn CommentClassifier,
    ) -> Result<(), TooLarge> {
        let Some(raw) = &self.raw else {
            return Ok(());
        };

        match split_lines(raw.as_bytes(), encoding, options, classifier)? {
            Split::Text(split) => {
                self.text = split.text;
                self.records = split.records;
                self.line_count = split.line_count;
                self.line_end_style = split.line_end_style;
                self.incomplete_conversion = split.incomplete_conversion;
                self.is_text = true;
            }
            Split::Binary => {
                self.text.clear();
                self.records.clear();
                self.line_count = 0;
                self.line_end_style = LineEndStyle::Undefined;
                self.incomplete_conversion = false;
                self.is_text = false;
            }
        }
        Ok(())
    }

    /// Append empty records at the end of the text until `line_count` lines exist.
    pub fn pad_to(&mut self, line_count: usize) {
        while self.line_count < line_count {
            self.records.push(LineRecord::empty_at(self.text.len()));
            self.line_count += 1;
        }
    }

    /// Copy pure-comment flags from `other` for the lines both views share.
    pub fn adopt_comment_flags(&mut self, other: &DataBuffer) {
        let shared = self.line_count.min(other.line_count);
        for (mine, theirs) in self.records[..shared].iter_mut().zip(&other.records[..shared]) {
            mine.pure_comment = theirs.pure_comment;
        }
    }

    /// `None` until the buffer has been decoded as text.
    pub fn lines(&self) -> Option<Lines<'_>> {
        if self.records.is_empty() {
            return None;
        }
        Some(Lines {
            text: &self.text,
            records: &self.records,
            count: self.line_count,
        })
    }
}

/// Borrowed, line-indexed view over a decoded buffer.
#[derive(Debug, Clone, Copy)]
pub struct Lines<'a> {
    text: &'a str,
    records: &'a [LineRecord],
    count: usize,
}

impl<'a> Lines<'a> {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Records for every line, followed by the sentinel.
    pub fn records(&self) -> &'a [LineRecord] {
        self.records
    }

    pub fn record(&self, index: usize) -> Option<&'a LineRecord> {
        let records: &'a [LineRecord] = self.records;
        records[..self.count].get(index)
    }

    pub fn line(&self, index: usize) -> Option<&'a str> {
        let text = self.text;
        self.record(index).map(|r| r.text(text))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + 'a {
        let text = self.text;
        let records: &'a [LineRecord] = self.records;
        records[..self.count].iter().map(move |r| r.text(text))
    }
}
