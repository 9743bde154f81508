use crate::Real;
use thiserror::Error;
use wavedump_common::Channel;

/// Raised while building a [ChannelConfig](crate::ChannelConfig), or when one is checked
/// against the record length of a run. Any of these aborts the run before an event is processed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Charge method must be 'fixed' or 'dynamic', got '{0}'")]
    InvalidChargeMethod(String),
    #[error("Polarity must be 1 or -1, got {0}")]
    InvalidPolarity(i64),
    #[error("CFD fraction must be in (0, 1], got {0}")]
    CfdFractionOutOfRange(Real),
    #[error("Threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(Real),
    #[error("Baseline must be estimated from at least one sample")]
    ZeroBaselineSamples,
    #[error("Charge window values must be non-negative, got ({0}, {1})")]
    NegativeChargeWindow(i64, i64),
    #[error("Fixed charge window must end after it starts, got [{start}, {end})")]
    EmptyFixedWindow { start: usize, end: usize },
    #[error("Channel {0} is configured more than once")]
    DuplicateChannel(Channel),
    #[error("Channel {channel}: baseline of {baseline_samples} samples does not fit in records of {record_length} samples")]
    BaselineExceedsRecord {
        channel: Channel,
        baseline_samples: usize,
        record_length: usize,
    },
    #[error("Channel {channel}: fixed charge window ending at {end} does not fit in records of {record_length} samples")]
    ChargeWindowExceedsRecord {
        channel: Channel,
        end: usize,
        record_length: usize,
    },
}

/// A waveform that cannot be analysed with its channel's configuration.
/// The caller recovers from this by recording the channel as missing for that event.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedWaveform {
    #[error("Waveform of {length} samples is too short for a baseline of {baseline_samples} samples")]
    TooShortForBaseline {
        baseline_samples: usize,
        length: usize,
    },
    #[error("Waveform of {length} samples is too short for a fixed charge window ending at {end}")]
    TooShortForChargeWindow { end: usize, length: usize },
}
