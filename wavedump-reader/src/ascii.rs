use crate::{EventMetadata, EventSource, ReaderError, WaveDumpEvent};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};
use wavedump_common::{BoardId, Channel, EventNumber, Sample, TriggerTime};

/// The fields of a record header that are used; all others are ignored.
#[derive(Default, Debug)]
struct RecordHeader {
    record_length: Option<u32>,
    board_id: Option<BoardId>,
    event_number: Option<EventNumber>,
    trigger_time: Option<TriggerTime>,
}

#[derive(Debug)]
struct Record {
    header: RecordHeader,
    samples: Vec<Sample>,
}

/// Integers may be written in decimal or, with a `0x` prefix, hexadecimal.
fn parse_integer(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// The channel number is the first run of digits in the file name, as in `wave3.txt`.
fn channel_from_file_name(path: &Path) -> Option<Channel> {
    let name = path.file_name()?.to_str()?;
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// One channel's text file.
struct ChannelFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl ChannelFile {
    fn open(path: PathBuf) -> Result<Self, ReaderError> {
        let file = File::open(&path).map_err(|source| ReaderError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    /// Returns the next non-blank line, trimmed.
    fn next_line(&mut self) -> Result<Option<String>, ReaderError> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = line.map_err(|source| ReaderError::Io {
                path: self.path.clone(),
                source,
            })?;
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(line.to_owned()));
            }
        }
        Ok(None)
    }

    fn header_error(&self, text: &str) -> ReaderError {
        ReaderError::MalformedHeader {
            path: self.path.clone(),
            line: self.line_number,
            text: text.to_owned(),
        }
    }

    fn parse_sample(&self, text: &str) -> Result<Sample, ReaderError> {
        parse_integer(text)
            .and_then(|value| Sample::try_from(value).ok())
            .ok_or_else(|| ReaderError::InvalidSample {
                path: self.path.clone(),
                line: self.line_number,
                text: text.to_owned(),
            })
    }

    /// Reads the next record, or returns `None` if the file ends cleanly before one starts.
    fn next_record(&mut self) -> Result<Option<Record>, ReaderError> {
        let mut header = RecordHeader::default();
        let mut header_lines = 0;
        let first_sample = loop {
            let Some(line) = self.next_line()? else {
                if header_lines == 0 {
                    return Ok(None);
                }
                return Err(ReaderError::RecordEndsEarly {
                    path: self.path.clone(),
                    expected: header.record_length.unwrap_or_default() as usize,
                    found: 0,
                });
            };
            let Some((key, value)) = line.split_once(':') else {
                break line;
            };
            header_lines += 1;
            let field = match key.trim() {
                "Record Length" => &mut header.record_length,
                "BoardID" => &mut header.board_id,
                "Event Number" => &mut header.event_number,
                "Trigger Time Stamp" => &mut header.trigger_time,
                _ => continue,
            };
            *field = Some(parse_integer(value).ok_or_else(|| self.header_error(&line))?);
        };

        let record_length = match header.record_length {
            Some(0) => return Err(self.header_error("Record Length: 0")),
            Some(length) => length as usize,
            None => {
                return Err(ReaderError::MissingRecordLength {
                    path: self.path.clone(),
                    line: self.line_number,
                });
            }
        };

        let mut samples = vec![self.parse_sample(&first_sample)?];
        while samples.len() < record_length {
            let Some(line) = self.next_line()? else {
                return Err(ReaderError::RecordEndsEarly {
                    path: self.path.clone(),
                    expected: record_length,
                    found: samples.len(),
                });
            };
            samples.push(self.parse_sample(&line)?);
        }
        Ok(Some(Record { header, samples }))
    }
}

/// Reads events from a set of WaveDump text files, one per channel.
///
/// The n-th event is assembled from the n-th record of every file, and
/// reading stops as soon as any file runs out of records.
pub struct AsciiReader {
    files: BTreeMap<Channel, ChannelFile>,
    events_read: EventNumber,
    finished: bool,
}

impl AsciiReader {
    /// Opens every file matching `pattern` whose name carries a channel number.
    pub fn open(pattern: &str) -> Result<Self, ReaderError> {
        let mut files = BTreeMap::new();
        for path in glob::glob(pattern)? {
            let path = path?;
            let Some(channel) = channel_from_file_name(&path) else {
                warn!("Skipping {}: no channel number in file name", path.display());
                continue;
            };
            if files.contains_key(&channel) {
                warn!("Skipping {}: channel {channel} already has a file", path.display());
                continue;
            }
            debug!("Channel {channel}: {}", path.display());
            files.insert(channel, ChannelFile::open(path)?);
        }
        if files.is_empty() {
            return Err(ReaderError::NoChannelFiles(pattern.to_owned()));
        }
        info!(
            "Found {} channel files: {:?}",
            files.len(),
            files.keys().collect::<Vec<_>>()
        );
        Ok(Self {
            files,
            events_read: 0,
            finished: false,
        })
    }

    fn read_event(&mut self) -> Result<Option<WaveDumpEvent>, ReaderError> {
        let mut metadata = None;
        let mut channels = BTreeMap::new();
        for (&channel, file) in self.files.iter_mut() {
            let Some(record) = file.next_record()? else {
                if !channels.is_empty() {
                    warn!(
                        "{} has fewer records than the other channel files",
                        file.path.display()
                    );
                }
                return Ok(None);
            };
            // Metadata is taken from the lowest-numbered channel.
            metadata.get_or_insert(EventMetadata {
                event_number: record.header.event_number.unwrap_or(self.events_read),
                trigger_time: record.header.trigger_time.unwrap_or_default(),
                board_id: record.header.board_id.unwrap_or_default(),
            });
            channels.insert(channel, record.samples);
        }
        self.events_read += 1;
        Ok(Some(WaveDumpEvent {
            metadata: metadata.unwrap_or_default(),
            channels,
        }))
    }
}

impl Iterator for AsciiReader {
    type Item = Result<WaveDumpEvent, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.read_event().transpose();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

impl EventSource for AsciiReader {
    fn progress(&self) -> Option<f64> {
        None
    }
}
