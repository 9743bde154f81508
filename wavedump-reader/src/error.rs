use std::path::PathBuf;
use thiserror::Error;
use wavedump_common::Channel;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Cannot list files: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("No channel files match {0}")]
    NoChannelFiles(String),
    #[error("Event starting at byte {offset} of {path} is truncated")]
    Truncated { path: PathBuf, offset: u64 },
    #[error("Channel {channel} of event starting at byte {offset} declares {size} words, fewer than its own header")]
    InvalidChannelSize {
        channel: Channel,
        offset: u64,
        size: u32,
    },
    #[error("{path}:{line}: invalid header field '{text}'")]
    MalformedHeader {
        path: PathBuf,
        line: usize,
        text: String,
    },
    #[error("{path}:{line}: record has no 'Record Length' field")]
    MissingRecordLength { path: PathBuf, line: usize },
    #[error("{path}:{line}: invalid sample '{text}'")]
    InvalidSample {
        path: PathBuf,
        line: usize,
        text: String,
    },
    #[error("{path}: record ends after {found} of {expected} samples")]
    RecordEndsEarly {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}
