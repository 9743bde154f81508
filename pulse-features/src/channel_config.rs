//! Per-channel analysis parameters.
//!
//! A [ChannelConfig] is built once from a configuration source and only read
//! afterwards. Deserialisation goes through [ChannelConfigDef] so that every
//! entry of a configuration file is validated exactly as [ChannelConfig::new] is.
use crate::{ConfigError, MalformedWaveform, Real};
use serde::Deserialize;
use std::ops::Range;
use wavedump_common::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    #[strum(to_string = "positive")]
    Positive,
    #[strum(to_string = "negative")]
    Negative,
}

impl Polarity {
    /// The factor which makes a pulse of this polarity positive-going.
    pub fn sign(self) -> Real {
        match self {
            Polarity::Positive => 1.0,
            Polarity::Negative => -1.0,
        }
    }
}

impl TryFrom<i64> for Polarity {
    type Error = ConfigError;

    fn try_from(sign: i64) -> Result<Self, Self::Error> {
        match sign {
            1 => Ok(Polarity::Positive),
            -1 => Ok(Polarity::Negative),
            other => Err(ConfigError::InvalidPolarity(other)),
        }
    }
}

/// The region of the waveform summed into the charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeWindow {
    /// Absolute sample indices `[start, end)`.
    Fixed { start: usize, end: usize },
    /// `[peak - before, peak + after)`, clamped to the waveform.
    Dynamic { before: usize, after: usize },
}

impl ChargeWindow {
    /// Returns the index range to integrate over for a waveform of `length` samples
    /// whose peak lies at `peak_index`.
    /// # Error Modes
    /// - [MalformedWaveform::TooShortForChargeWindow] if a fixed window does not fit.
    pub fn range(&self, peak_index: usize, length: usize) -> Result<Range<usize>, MalformedWaveform> {
        match *self {
            ChargeWindow::Fixed { start, end } => {
                if end <= length {
                    Ok(start..end)
                } else {
                    Err(MalformedWaveform::TooShortForChargeWindow { end, length })
                }
            }
            ChargeWindow::Dynamic { before, after } => {
                let start = peak_index.saturating_sub(before).min(length);
                let end = peak_index.saturating_add(after).min(length);
                Ok(start..end.max(start))
            }
        }
    }

    fn method_name(&self) -> &'static str {
        match self {
            ChargeWindow::Fixed { .. } => "fixed",
            ChargeWindow::Dynamic { .. } => "dynamic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ChannelConfigDef")]
pub struct ChannelConfig {
    channel_id: Channel,
    polarity: Polarity,
    baseline_samples: usize,
    charge_window: ChargeWindow,
    threshold: Real,
    cfd_fraction: Real,
}

impl ChannelConfig {
    /// Creates a validated configuration.
    /// # Error Modes
    /// - [ConfigError::ZeroBaselineSamples] if `baseline_samples` is zero.
    /// - [ConfigError::EmptyFixedWindow] if a fixed window does not end after it starts.
    /// - [ConfigError::InvalidThreshold] if `threshold` is negative or not finite.
    /// - [ConfigError::CfdFractionOutOfRange] if `cfd_fraction` is not in (0, 1].
    pub fn new(
        channel_id: Channel,
        polarity: Polarity,
        baseline_samples: usize,
        charge_window: ChargeWindow,
        threshold: Real,
        cfd_fraction: Real,
    ) -> Result<Self, ConfigError> {
        if baseline_samples == 0 {
            return Err(ConfigError::ZeroBaselineSamples);
        }
        if let ChargeWindow::Fixed { start, end } = charge_window {
            if end <= start {
                return Err(ConfigError::EmptyFixedWindow { start, end });
            }
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        // Written so that NaN is rejected.
        if !(cfd_fraction > 0.0 && cfd_fraction <= 1.0) {
            return Err(ConfigError::CfdFractionOutOfRange(cfd_fraction));
        }
        Ok(Self {
            channel_id,
            polarity,
            baseline_samples,
            charge_window,
            threshold,
            cfd_fraction,
        })
    }

    pub fn channel_id(&self) -> Channel {
        self.channel_id
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn baseline_samples(&self) -> usize {
        self.baseline_samples
    }

    pub fn charge_window(&self) -> ChargeWindow {
        self.charge_window
    }

    pub fn threshold(&self) -> Real {
        self.threshold
    }

    pub fn cfd_fraction(&self) -> Real {
        self.cfd_fraction
    }

    /// Checks the parts of the configuration which depend on the record length of a run.
    /// This cannot be done at construction, as the record length is only known once the
    /// first event has been read.
    pub fn validate_record_length(&self, record_length: usize) -> Result<(), ConfigError> {
        if self.baseline_samples >= record_length {
            return Err(ConfigError::BaselineExceedsRecord {
                channel: self.channel_id,
                baseline_samples: self.baseline_samples,
                record_length,
            });
        }
        if let ChargeWindow::Fixed { end, .. } = self.charge_window {
            if end > record_length {
                return Err(ConfigError::ChargeWindowExceedsRecord {
                    channel: self.channel_id,
                    end,
                    record_length,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (a, b) = match self.charge_window {
            ChargeWindow::Fixed { start, end } => (start, end),
            ChargeWindow::Dynamic { before, after } => (before, after),
        };
        write!(
            f,
            "ch{}: {} polarity, baseline {} samples, {} charge window ({a}, {b}), threshold {}, cfd fraction {}",
            self.channel_id,
            self.polarity,
            self.baseline_samples,
            self.charge_window.method_name(),
            self.threshold,
            self.cfd_fraction
        )
    }
}

/// Polarity may be written either by name or as a sign.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PolarityDef {
    Named(Polarity),
    Sign(i64),
}

/// The unvalidated form of a [ChannelConfig], as it appears in a configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ChannelConfigDef {
    channel_id: Channel,
    polarity: PolarityDef,
    #[serde(default = "default_baseline_samples")]
    baseline_samples: usize,
    #[serde(default = "default_charge_method")]
    charge_method: String,
    #[serde(default = "default_charge_window")]
    charge_window: (i64, i64),
    #[serde(default = "default_threshold")]
    threshold: Real,
    #[serde(default = "default_cfd_fraction")]
    cfd_fraction: Real,
}

fn default_baseline_samples() -> usize {
    100
}

fn default_charge_method() -> String {
    "dynamic".to_owned()
}

fn default_charge_window() -> (i64, i64) {
    (0, 100)
}

fn default_threshold() -> Real {
    10.0
}

fn default_cfd_fraction() -> Real {
    0.5
}

impl TryFrom<ChannelConfigDef> for ChannelConfig {
    type Error = ConfigError;

    fn try_from(def: ChannelConfigDef) -> Result<Self, Self::Error> {
        let polarity = match def.polarity {
            PolarityDef::Named(polarity) => polarity,
            PolarityDef::Sign(sign) => Polarity::try_from(sign)?,
        };
        let (a, b) = def.charge_window;
        let (a, b) = usize::try_from(a)
            .ok()
            .zip(usize::try_from(b).ok())
            .ok_or(ConfigError::NegativeChargeWindow(a, b))?;
        let charge_window = match def.charge_method.as_str() {
            "fixed" => ChargeWindow::Fixed { start: a, end: b },
            "dynamic" => ChargeWindow::Dynamic {
                before: a,
                after: b,
            },
            other => return Err(ConfigError::InvalidChargeMethod(other.to_owned())),
        };
        ChannelConfig::new(
            def.channel_id,
            polarity,
            def.baseline_samples,
            charge_window,
            def.threshold,
            def.cfd_fraction,
        )
    }
}

/// An ordered collection of [ChannelConfig], at most one per channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<ChannelConfig>")]
pub struct ChannelConfigs(Vec<ChannelConfig>);

impl ChannelConfigs {
    pub fn iter(&self) -> std::slice::Iter<'_, ChannelConfig> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelConfig> {
        self.0.iter().find(|config| config.channel_id == channel)
    }

    /// Checks every configuration against the record length of a run.
    pub fn validate_record_length(&self, record_length: usize) -> Result<(), ConfigError> {
        self.0
            .iter()
            .try_for_each(|config| config.validate_record_length(record_length))
    }
}

impl TryFrom<Vec<ChannelConfig>> for ChannelConfigs {
    type Error = ConfigError;

    fn try_from(configs: Vec<ChannelConfig>) -> Result<Self, Self::Error> {
        for (index, config) in configs.iter().enumerate() {
            if configs
                .iter()
                .take(index)
                .any(|earlier| earlier.channel_id == config.channel_id)
            {
                return Err(ConfigError::DuplicateChannel(config.channel_id));
            }
        }
        Ok(Self(configs))
    }
}

impl<'a> IntoIterator for &'a ChannelConfigs {
    type Item = &'a ChannelConfig;
    type IntoIter = std::slice::Iter<'a, ChannelConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
