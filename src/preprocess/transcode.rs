use std::fs;
use std::io;
use std::path::Path;

use crate::encoding::{detect_encoding, TextEncoding};

/// Re-encode a file so an external tool sees the encoding it expects.
pub fn transcode_file(
    input: &Path,
    from: TextEncoding,
    output: &Path,
    to: TextEncoding,
) -> io::Result<()> {
    let bytes = fs::read(input)?;
    let skip = match detect_encoding(&bytes) {
        Some(d) if from.same_family(&d.encoding) => d.skip_bytes,
        _ => 0,
    };
    let (text, _) = from.decode(&bytes[skip..]);
    log::debug!(
        "Transcoding {} from {} to {}",
        input.display(),
        from.name(),
        to.name()
    );
    fs::write(output, to.encode(&text))
}
