//! Decoders for the files written by CAEN WaveDump.
//!
//! WaveDump saves either a single multiplexed binary file, or one text file
//! per channel. Both are presented as an [EventSource], so that consumers
//! never need to know which encoding an event came from:
//! ```no_run
//! use wavedump_reader::{open_source, FileType};
//!
//! let source = open_source("run_0/wave*.txt".as_ref(), FileType::Ascii)?;
//! for event in source {
//!     let event = event?;
//!     println!("{}: {} channels", event.metadata.event_number, event.channels.len());
//! }
//! # Ok::<(), wavedump_reader::ReaderError>(())
//! ```
mod ascii;
mod binary;
mod error;
mod event;

pub use ascii::AsciiReader;
pub use binary::BinaryReader;
pub use error::ReaderError;
pub use event::{EventMetadata, WaveDumpEvent};

use clap::ValueEnum;
use std::path::Path;

/// An ordered, finite sequence of events read from one input.
pub trait EventSource: Iterator<Item = Result<WaveDumpEvent, ReaderError>> {
    /// The fraction of the input consumed so far, if it is known.
    fn progress(&self) -> Option<f64>;
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FileType {
    /// A single binary file holding every channel.
    #[default]
    Binary,
    /// One text file per channel, selected by a glob pattern.
    Ascii,
}

/// Opens `input` as an [EventSource]. For [FileType::Ascii], `input` is a
/// glob pattern selecting the channel files.
pub fn open_source(input: &Path, file_type: FileType) -> Result<Box<dyn EventSource>, ReaderError> {
    Ok(match file_type {
        FileType::Binary => Box::new(BinaryReader::open(input)?),
        FileType::Ascii => Box::new(AsciiReader::open(&input.to_string_lossy())?),
    })
}
