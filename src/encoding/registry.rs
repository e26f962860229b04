use std::borrow::Cow;

use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A named text encoding known to the pipeline.
///
/// The Unicode variants and Latin-1 are handled here directly so that
/// decoding never sniffs byte-order marks on its own and Latin-1 stays a true
/// byte-to-codepoint mapping. Everything else resolves through `encoding_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// UTF-8 that writes its marker back out on encode.
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    Latin1,
    Other(&'static encoding_rs::Encoding),
}

impl TextEncoding {
    /// Resolve a user or tag supplied label, case-insensitively.
    pub fn for_label(label: &str) -> Option<Self> {
        let key = label.trim().to_ascii_lowercase();
        match key.as_str() {
            "" => None,
            "utf-8-bom" | "utf8-bom" => Some(Self::Utf8Bom),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
                Some(Self::Latin1)
            }
            _ => {
                let found = encoding_rs::Encoding::for_label_no_replacement(key.as_bytes())?;
                Some(Self::from_codec(found))
            }
        }
    }

    fn from_codec(codec: &'static encoding_rs::Encoding) -> Self {
        if codec == encoding_rs::UTF_8 {
            Self::Utf8
        } else if codec == encoding_rs::UTF_16LE {
            Self::Utf16Le
        } else if codec == encoding_rs::UTF_16BE {
            Self::Utf16Be
        } else {
            Self::Other(codec)
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf8Bom => "UTF-8-BOM",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Latin1 => "ISO-8859-1",
            Self::Other(codec) => codec.name(),
        }
    }

    /// True when a marker detected as `other` may be skipped while decoding as `self`.
    pub fn same_family(&self, other: &TextEncoding) -> bool {
        matches!(
            (self, other),
            (Self::Utf8 | Self::Utf8Bom, Self::Utf8 | Self::Utf8Bom)
        ) || self == other
    }

    /// Decode without any byte-order-mark handling.
    ///
    /// The flag is true when malformed input was replaced with U+FFFD.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> (Cow<'a, str>, bool) {
        match self {
            Self::Utf8 | Self::Utf8Bom => encoding_rs::UTF_8.decode_without_bom_handling(bytes),
            Self::Utf16Le => encoding_rs::UTF_16LE.decode_without_bom_handling(bytes),
            Self::Utf16Be => encoding_rs::UTF_16BE.decode_without_bom_handling(bytes),
            Self::Latin1 => (Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()), false),
            Self::Other(codec) => codec.decode_without_bom_handling(bytes),
        }
    }

    /// Encode text; characters outside the target repertoire become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => {
                let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
                out.extend_from_slice(UTF8_BOM);
                out.extend_from_slice(text.as_bytes());
                out
            }
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Self::Other(codec) => {
                let (bytes, _, _) = codec.encode(text);
                bytes.into_owned()
            }
        }
    }
}

impl Serialize for TextEncoding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TextEncoding {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        TextEncoding::for_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown encoding: {label}")))
    }
}

/// The encoding to use for one source, and whether the detector may override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingChoice {
    pub encoding: TextEncoding,
    pub auto_detect: bool,
}

impl EncodingChoice {
    pub fn fixed(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            auto_detect: false,
        }
    }
}

impl Default for EncodingChoice {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            auto_detect: true,
        }
    }
}
