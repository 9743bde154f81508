//! This crate provides tools for extracting pulse parameters from a single
//! digitised waveform.
//!
//! A raw waveform takes the form of a slice of ADC counts, sampled at a
//! fixed interval. Each physical channel has one [ChannelConfig] which is
//! built (and validated) once, before any waveform is seen. Typical usage
//! may look like:
//! ```rust
//! use pulse_features::{ChannelConfig, ChargeWindow, Polarity, WaveformProcessor};
//!
//! let config = ChannelConfig::new(0, Polarity::Positive, 3, ChargeWindow::Fixed { start: 0, end: 10 }, 15.0, 0.5)
//!     .expect("config is valid");
//! let record = WaveformProcessor::new(&config)
//!     .process(&[0u16, 0, 0, 10, 20, 30, 20, 10, 0, 0])
//!     .expect("waveform is long enough");
//! assert_eq!(record.peak_height, 30.0);
//! assert_eq!(record.charge, 90.0);
//! ```
//! Nothing in this crate performs I/O, logging, or holds state between calls,
//! so a [ChannelConfig] may be shared freely between threads.

pub mod channel_config;
pub mod error;
pub mod features;
pub mod processor;

pub use channel_config::{ChannelConfig, ChannelConfigs, ChargeWindow, Polarity};
pub use error::{ConfigError, MalformedWaveform};
pub use features::{FeatureRecord, FIELD_COUNT, FIELD_NAMES};
pub use processor::WaveformProcessor;

pub type Real = f64;
