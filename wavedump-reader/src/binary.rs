use crate::{EventMetadata, EventSource, ReaderError, WaveDumpEvent};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};
use tracing::debug;
use wavedump_common::{ADC_SAMPLE_MASK, CHANNELS_PER_DIGITIZER, Channel, Sample};

const WORD_BYTES: usize = size_of::<u32>();
/// Board header (size, board id, pattern, channel mask), event counter and trigger time tag.
const EVENT_HEADER_WORDS: usize = 6;
/// Each channel block starts with its size word and one further header word.
const CHANNEL_HEADER_WORDS: u32 = 2;

/// Reads events from a multiplexed WaveDump binary file.
///
/// All words are little-endian. Reading stops at the first truncated event.
pub struct BinaryReader<R: Read = BufReader<File>> {
    path: PathBuf,
    reader: R,
    bytes_read: u64,
    file_size: Option<u64>,
    finished: bool,
}

impl BinaryReader {
    pub fn open(path: &Path) -> Result<Self, ReaderError> {
        let io_error = |source| ReaderError::Io {
            path: path.to_owned(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let file_size = file.metadata().map_err(io_error)?.len();
        debug!("Opened {} ({file_size} bytes)", path.display());
        Ok(Self::new(path, BufReader::new(file), Some(file_size)))
    }
}

impl<R: Read> BinaryReader<R> {
    /// Wraps `reader`; `path` is only used to identify the input in errors.
    pub fn new(path: &Path, reader: R, file_size: Option<u64>) -> Self {
        Self {
            path: path.to_owned(),
            reader,
            bytes_read: 0,
            file_size,
            finished: false,
        }
    }

    fn read_block(&mut self, len: usize) -> Result<Vec<u8>, ReaderError> {
        let mut block = Vec::new();
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut block)
            .map_err(|source| ReaderError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.bytes_read += block.len() as u64;
        Ok(block)
    }

    /// Reads exactly `len` bytes belonging to the event which started at `offset`.
    /// A `len` beyond the end of the file is reported as truncation without being read.
    fn read_event_block(&mut self, len: usize, offset: u64) -> Result<Vec<u8>, ReaderError> {
        let remaining = self
            .file_size
            .map(|size| size.saturating_sub(self.bytes_read));
        if remaining.is_some_and(|remaining| len as u64 > remaining) {
            return Err(ReaderError::Truncated {
                path: self.path.clone(),
                offset,
            });
        }
        let block = self.read_block(len)?;
        if block.len() == len {
            Ok(block)
        } else {
            Err(ReaderError::Truncated {
                path: self.path.clone(),
                offset,
            })
        }
    }

    fn read_event(&mut self) -> Result<Option<WaveDumpEvent>, ReaderError> {
        let offset = self.bytes_read;
        let header = self.read_block(EVENT_HEADER_WORDS * WORD_BYTES)?;
        if header.is_empty() {
            return Ok(None);
        }
        let &[_event_size, board_id, _pattern, channel_mask, event_counter, trigger_time_tag] =
            words(&header).as_slice()
        else {
            return Err(ReaderError::Truncated {
                path: self.path.clone(),
                offset,
            });
        };

        let mut channels = BTreeMap::new();
        for channel in (0..CHANNELS_PER_DIGITIZER as Channel).filter(|ch| channel_mask & (1 << ch) != 0) {
            let size_word = self.read_event_block(WORD_BYTES, offset)?;
            let size = words(&size_word).first().copied().unwrap_or_default();
            let Some(payload_words) = size.checked_sub(CHANNEL_HEADER_WORDS) else {
                return Err(ReaderError::InvalidChannelSize {
                    channel,
                    offset,
                    size,
                });
            };
            // Two samples are packed into each payload word.
            let payload_bytes = (payload_words as usize).saturating_mul(WORD_BYTES);
            let payload = self.read_event_block(payload_bytes, offset)?;
            channels.insert(channel, samples(&payload));
        }

        Ok(Some(WaveDumpEvent {
            metadata: EventMetadata {
                event_number: event_counter,
                trigger_time: trigger_time_tag,
                board_id,
            },
            channels,
        }))
    }
}

fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(WORD_BYTES)
        .flat_map(<[u8; 4]>::try_from)
        .map(u32::from_le_bytes)
        .collect()
}

fn samples(bytes: &[u8]) -> Vec<Sample> {
    bytes
        .chunks_exact(size_of::<Sample>())
        .flat_map(<[u8; 2]>::try_from)
        .map(|pair| Sample::from_le_bytes(pair) & ADC_SAMPLE_MASK)
        .collect()
}

impl<R: Read> Iterator for BinaryReader<R> {
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

impl<R: Read> EventSource for BinaryReader<R> {
    fn progress(&self) -> Option<f64> {
        self.file_size
            .filter(|&size| size > 0)
            .map(|size| self.bytes_read as f64 / size as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_event(
        board_id: u32,
        counter: u32,
        trigger_time: u32,
        channels: &[(Channel, Vec<u16>)],
    ) -> Vec<u8> {
        let mask = channels.iter().fold(0u32, |mask, (ch, _)| mask | 1 << ch);
        let channel_words: usize = channels.iter().map(|(_, s)| 2 + s.len() / 2).sum();
        let mut words = vec![
            (EVENT_HEADER_WORDS + channel_words) as u32,
            board_id,
            0,
            mask,
            counter,
            trigger_time,
        ];
        let mut bytes: Vec<u8> = Vec::new();
        for (_, samples) in channels {
            words.push(2 + samples.len() as u32 / 2);
            let mut block: Vec<u8> = words.drain(..).flat_map(u32::to_le_bytes).collect();
            bytes.append(&mut block);
            bytes.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
        }
        bytes.extend(words.drain(..).flat_map(u32::to_le_bytes));
        bytes
    }

    fn reader(bytes: Vec<u8>) -> BinaryReader<Cursor<Vec<u8>>> {
        let size = bytes.len() as u64;
        BinaryReader::new(Path::new("test.dat"), Cursor::new(bytes), Some(size))
    }

    #[test]
    fn empty_file() {
        let mut reader = reader(Vec::new());
        assert!(reader.next().is_none());
        assert_eq!(reader.progress(), None);
    }

    #[test]
    fn two_events() {
        let mut bytes = encode_event(
            3,
            0,
            1000,
            &[(0, vec![1, 2, 3, 4]), (2, vec![5, 6, 7, 8])],
        );
        bytes.extend(encode_event(3, 1, 2000, &[(0, vec![9, 10, 11, 12]), (2, vec![13, 14, 15, 16])]));
        let mut reader = reader(bytes);

        let event = reader.next().unwrap().unwrap();
        assert_eq!(
            event.metadata,
            EventMetadata {
                event_number: 0,
                trigger_time: 1000,
                board_id: 3
            }
        );
        assert_eq!(event.channels.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(event.channels[&2], vec![5, 6, 7, 8]);
        assert_eq!(reader.progress(), Some(0.5));

        let event = reader.next().unwrap().unwrap();
        assert_eq!(event.metadata.event_number, 1);
        assert_eq!(event.channels[&0], vec![9, 10, 11, 12]);
        assert_eq!(reader.progress(), Some(1.0));

        assert!(reader.next().is_none());
    }

    #[test]
    fn samples_are_masked() {
        let bytes = encode_event(0, 0, 0, &[(5, vec![0xFFFF, 0x4001, 0x3FFF, 0x8000])]);
        let event = reader(bytes).next().unwrap().unwrap();
        assert_eq!(event.channels[&5], vec![0x3FFF, 0x0001, 0x3FFF, 0]);
    }

    #[test]
    fn channels_above_eight_are_ignored() {
        let mut bytes = encode_event(0, 0, 0, &[(1, vec![1, 2])]);
        // Set bit 9 of the channel mask, which has no data block.
        bytes[13] |= 0x02;
        let event = reader(bytes).next().unwrap().unwrap();
        assert_eq!(event.channels.len(), 1);
    }

    #[test]
    fn truncated_event() {
        let mut bytes = encode_event(0, 0, 0, &[(0, vec![1, 2, 3, 4])]);
        let first_len = bytes.len();
        bytes.extend(encode_event(0, 1, 0, &[(0, vec![1, 2, 3, 4])]));
        bytes.truncate(bytes.len() - 2);
        let mut reader = reader(bytes);

        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(ReaderError::Truncated { offset, .. })) => {
                assert_eq!(offset, first_len as u64)
            }
            other => panic!("Expected truncation, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncated_header() {
        let mut reader = reader(vec![0; 10]);
        assert!(matches!(
            reader.next(),
            Some(Err(ReaderError::Truncated { offset: 0, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn oversized_channel_size() {
        let mut bytes = encode_event(0, 0, 0, &[(0, vec![1, 2, 3, 4])]);
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut reader = reader(bytes);
        assert!(matches!(
            reader.next(),
            Some(Err(ReaderError::Truncated { offset: 0, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn oversized_channel_size_without_file_size() {
        let mut bytes = encode_event(0, 0, 0, &[(0, vec![1, 2, 3, 4])]);
        bytes[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut reader = BinaryReader::new(Path::new("test.dat"), Cursor::new(bytes), None);
        assert!(matches!(
            reader.next(),
            Some(Err(ReaderError::Truncated { offset: 0, .. }))
        ));
    }

    #[test]
    fn invalid_channel_size() {
        let mut bytes = encode_event(0, 0, 0, &[(4, vec![])]);
        // Overwrite the channel size word with 1.
        bytes[24..28].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            reader(bytes).next(),
            Some(Err(ReaderError::InvalidChannelSize {
                channel: 4,
                size: 1,
                ..
            }))
        ));
    }

    #[test]
    fn open_file() {
        let path = std::env::temp_dir().join(format!("wavedump-binary-{}.dat", std::process::id()));
        std::fs::write(&path, encode_event(7, 42, 99, &[(3, vec![100, 200])])).unwrap();

        let mut reader = BinaryReader::open(&path).unwrap();
        let event = reader.next().unwrap().unwrap();
        assert_eq!(event.metadata.board_id, 7);
        assert_eq!(event.metadata.event_number, 42);
        assert_eq!(event.channels[&3], vec![100, 200]);
        assert!(reader.next().is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            BinaryReader::open(Path::new("/no/such/file.dat")),
            Err(ReaderError::Io { .. })
        ));
    }
}
