mod detect;
mod registry;

pub use detect::{detect_encoding, detect_file_encoding, Detected, DETECTION_WINDOW};
pub use registry::{EncodingChoice, TextEncoding};
