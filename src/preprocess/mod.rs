mod runner;
mod transcode;

pub use runner::PreprocessorRunner;
pub use transcode::transcode_file;
