mod buffer;
mod input;
mod options;
mod pipeline;

pub use buffer::{ByteBuffer, DataBuffer, Lines, GUARD_BYTES};
pub use input::{InputReference, LocalOnlyFetcher, RemoteFetcher};
pub use options::{Options, OptionsUpdate};
pub use pipeline::{PipelineReport, SourceData, CLIPBOARD_ALIAS};
