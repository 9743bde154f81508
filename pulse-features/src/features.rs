use crate::Real;
use wavedump_common::{MISSING, NOT_FOUND};

pub const FIELD_COUNT: usize = 7;

/// Column suffixes, in the order returned by [FeatureRecord::to_columns].
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "baseline_mean",
    "baseline_rms",
    "peak_height",
    "peak_time",
    "charge",
    "threshold_time",
    "cfd_time",
];

/// The pulse parameters extracted from one waveform of one channel.
///
/// Times are in units of samples from the start of the record.
/// Amplitudes are in ADC counts above the baseline, after polarity correction.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub baseline_mean: Real,
    pub baseline_rms: Real,
    pub peak_height: Real,
    pub peak_time: Real,
    pub charge: Real,
    /// `None` if the waveform never reaches the threshold.
    pub threshold_time: Option<Real>,
    /// `None` if the waveform never reaches the given fraction of its peak.
    pub cfd_time: Option<Real>,
}

impl FeatureRecord {
    /// Flattens the record for columnar output, with timings
    /// that were not found written as [NOT_FOUND].
    pub fn to_columns(&self) -> [Real; FIELD_COUNT] {
        [
            self.baseline_mean,
            self.baseline_rms,
            self.peak_height,
            self.peak_time,
            self.charge,
            self.threshold_time.unwrap_or(NOT_FOUND),
            self.cfd_time.unwrap_or(NOT_FOUND),
        ]
    }

    /// The columns written for a channel absent from an event, or whose waveform was malformed.
    pub fn missing_columns() -> [Real; FIELD_COUNT] {
        [MISSING; FIELD_COUNT]
    }
}
