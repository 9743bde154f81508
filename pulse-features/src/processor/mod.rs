//! Extraction of a [FeatureRecord] from one waveform.
//!
//! The stages run in a fixed order, each over the output of the last:
//! the baseline is estimated from the raw samples, the signal is
//! baseline-subtracted and made positive-going, and the peak, charge and
//! crossing times are then all measured on that corrected signal.
mod baseline;
mod charge;
mod discriminators;
mod peak;

use crate::{ChannelConfig, FeatureRecord, MalformedWaveform, Real};
use discriminators::{ConstantFraction, Discriminator, LeadingEdge};

use baseline::Baseline;
use peak::Peak;

/// Returns `polarity * (raw - mean)` for each sample of `raw`.
pub(crate) fn correct_polarity<S: Copy + Into<Real>>(
    raw: &[S],
    mean: Real,
    sign: Real,
) -> Vec<Real> {
    raw.iter()
        .copied()
        .map(|value| sign * (value.into() - mean))
        .collect()
}

/// Applies one [ChannelConfig] to any number of waveforms.
#[derive(Debug, Clone, Copy)]
pub struct WaveformProcessor<'a> {
    config: &'a ChannelConfig,
}

impl<'a> WaveformProcessor<'a> {
    pub fn new(config: &'a ChannelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a ChannelConfig {
        self.config
    }

    /// Computes the features of `raw`.
    /// # Error Modes
    /// - [MalformedWaveform] if `raw` is too short for the baseline region or the fixed charge window.
    pub fn process<S: Copy + Into<Real>>(
        &self,
        raw: &[S],
    ) -> Result<FeatureRecord, MalformedWaveform> {
        let baseline = Baseline::estimate(raw, self.config.baseline_samples())?;
        let signal = correct_polarity(raw, baseline.mean, self.config.polarity().sign());

        // Non-empty, as the baseline estimate requires samples beyond its region.
        let peak = Peak::find(&signal).ok_or(MalformedWaveform::TooShortForBaseline {
            baseline_samples: self.config.baseline_samples(),
            length: raw.len(),
        })?;
        let charge = charge::integrate(&signal, self.config.charge_window(), peak.index)?;

        let leading_edge = LeadingEdge {
            threshold: self.config.threshold(),
        };
        let constant_fraction = ConstantFraction {
            fraction: self.config.cfd_fraction(),
        };

        Ok(FeatureRecord {
            baseline_mean: baseline.mean,
            baseline_rms: baseline.rms,
            peak_height: peak.height,
            peak_time: peak.time,
            charge,
            threshold_time: leading_edge.time(&signal, &peak),
            cfd_time: constant_fraction.time(&signal, &peak),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChargeWindow, Polarity};
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn config(
        polarity: Polarity,
        baseline_samples: usize,
        charge_window: ChargeWindow,
        threshold: Real,
        cfd_fraction: Real,
    ) -> ChannelConfig {
        ChannelConfig::new(
            0,
            polarity,
            baseline_samples,
            charge_window,
            threshold,
            cfd_fraction,
        )
        .unwrap()
    }

    #[test]
    fn worked_example() {
        let config = config(
            Polarity::Positive,
            3,
            ChargeWindow::Fixed { start: 0, end: 10 },
            15.0,
            0.5,
        );
        let raw: [u16; 10] = [0, 0, 0, 10, 20, 30, 20, 10, 0, 0];
        let record = WaveformProcessor::new(&config).process(&raw).unwrap();

        assert_eq!(record.baseline_mean, 0.0);
        assert_eq!(record.baseline_rms, 0.0);
        assert_eq!(record.peak_height, 30.0);
        assert_approx_eq!(record.peak_time, 5.0);
        assert_eq!(record.charge, 90.0);
        assert_approx_eq!(record.threshold_time.unwrap(), 3.5);
        assert_approx_eq!(record.cfd_time.unwrap(), 3.5);
        assert_eq!(record.threshold_time, record.cfd_time);
    }

    #[test]
    fn flat_zero_waveform() {
        let config = config(
            Polarity::Positive,
            10,
            ChargeWindow::Dynamic {
                before: 5,
                after: 20,
            },
            5.0,
            0.5,
        );
        let record = WaveformProcessor::new(&config)
            .process(&[0u16; 100])
            .unwrap();
        assert_eq!(record.peak_height, 0.0);
        assert_eq!(record.charge, 0.0);
        assert_eq!(record.threshold_time, None);
        assert_eq!(record.cfd_time, None);
        assert_eq!(&record.to_columns()[5..], &[-1.0, -1.0]);
    }

    #[test]
    fn negative_polarity_mirrors_positive() {
        let window = ChargeWindow::Dynamic {
            before: 4,
            after: 8,
        };
        let positive = config(Polarity::Positive, 5, window, 12.0, 0.4);
        let negative = config(Polarity::Negative, 5, window, 12.0, 0.4);

        let raw: Vec<Real> = [3.0, 2.0, 3.0, 4.0, 3.0, 10.0, 45.0, 80.0, 50.0, 20.0, 6.0, 3.0]
            .into_iter()
            .collect();
        let inverted: Vec<Real> = raw.iter().map(|v| -v).collect();

        let up = WaveformProcessor::new(&positive).process(&raw).unwrap();
        let down = WaveformProcessor::new(&negative).process(&inverted).unwrap();

        assert_eq!(down.baseline_mean, -up.baseline_mean);
        assert_eq!(down.baseline_rms, up.baseline_rms);
        assert_eq!(down.peak_height, up.peak_height);
        assert_eq!(down.peak_time, up.peak_time);
        assert_eq!(down.charge, up.charge);
        assert_eq!(down.threshold_time, up.threshold_time);
        assert_eq!(down.cfd_time, up.cfd_time);
        assert_eq!(
            correct_polarity(&inverted, down.baseline_mean, -1.0),
            correct_polarity(&raw, up.baseline_mean, 1.0)
        );
    }

    #[test]
    fn negative_pulse_on_adc_offset() {
        let config = config(
            Polarity::Negative,
            4,
            ChargeWindow::Fixed { start: 4, end: 8 },
            100.0,
            0.5,
        );
        let raw: [u16; 8] = [8000, 8000, 8000, 8000, 7800, 7400, 7800, 8000];
        let record = WaveformProcessor::new(&config).process(&raw).unwrap();
        assert_eq!(record.baseline_mean, 8000.0);
        assert_eq!(record.peak_height, 600.0);
        assert_eq!(record.charge, 1000.0);
        assert_approx_eq!(record.threshold_time.unwrap(), 3.5);
        assert_approx_eq!(record.cfd_time.unwrap(), 4.25);
    }

    #[test]
    fn deterministic() {
        let config = config(
            Polarity::Positive,
            20,
            ChargeWindow::Dynamic {
                before: 10,
                after: 30,
            },
            8.0,
            0.3,
        );
        let mut rng = StdRng::seed_from_u64(17);
        let raw: Vec<u16> = (0..200)
            .map(|i| {
                let pulse = if (80..90).contains(&i) { 150 } else { 0 };
                500 + pulse + rng.random_range(0..6)
            })
            .collect();
        let processor = WaveformProcessor::new(&config);
        assert_eq!(processor.process(&raw), processor.process(&raw));
    }

    #[test]
    fn noisy_baseline() {
        let mut rng = StdRng::seed_from_u64(2024);
        let noise: Vec<Real> = (0..1000).map(|_| rng.random_range(-3.0..3.0)).collect();
        let config = config(
            Polarity::Positive,
            500,
            ChargeWindow::Dynamic {
                before: 20,
                after: 50,
            },
            20.0,
            0.5,
        );
        let raw: Vec<Real> = noise
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let t = i as Real - 700.0;
                let pulse = if t >= 0.0 { 200.0 * (-t / 30.0).exp() } else { 0.0 };
                1000.0 + n + pulse
            })
            .collect();
        let record = WaveformProcessor::new(&config).process(&raw).unwrap();

        assert_approx_eq!(record.baseline_mean, 1000.0, 0.5);
        // Uniform noise on [-3, 3) has an RMS of sqrt(3).
        assert_approx_eq!(record.baseline_rms, (3.0 as Real).sqrt(), 0.2);
        assert!((699.0..=700.0).contains(&record.threshold_time.unwrap()));
        assert!((699.0..=700.0).contains(&record.cfd_time.unwrap()));
        assert!(record.peak_height > 195.0);
        assert!((699.0..=701.0).contains(&record.peak_time));
    }

    #[test]
    fn dynamic_charge_is_shift_invariant() {
        let config = config(
            Polarity::Positive,
            10,
            ChargeWindow::Dynamic {
                before: 3,
                after: 9,
            },
            5.0,
            0.5,
        );
        let pulse = [4u16, 18, 35, 60, 41, 22, 11, 5, 2];
        let mut results = Vec::new();
        for shift in [20, 33, 71] {
            let mut raw = vec![0u16; 100];
            raw[shift..shift + pulse.len()].copy_from_slice(&pulse);
            let record = WaveformProcessor::new(&config).process(&raw).unwrap();
            results.push((shift, record));
        }
        let (first_shift, first) = &results[0];
        for (shift, record) in &results[1..] {
            let offset = (shift - first_shift) as Real;
            assert_eq!(record.charge, first.charge);
            assert_approx_eq!(record.peak_time - first.peak_time, offset);
            assert_approx_eq!(
                record.threshold_time.unwrap() - first.threshold_time.unwrap(),
                offset
            );
        }
        assert_eq!(first.charge, 198.0);
    }

    #[test]
    fn lower_threshold_is_never_later() {
        let raw: [u16; 12] = [0, 0, 0, 2, 9, 25, 48, 70, 52, 30, 11, 3];
        let times: Vec<Real> = [40.0, 20.0, 10.0, 5.0, 1.0]
            .into_iter()
            .map(|threshold| {
                let config = config(
                    Polarity::Positive,
                    2,
                    ChargeWindow::Fixed { start: 0, end: 12 },
                    threshold,
                    threshold / 70.0,
                );
                let record = WaveformProcessor::new(&config).process(&raw).unwrap();
                assert_approx_eq!(record.threshold_time.unwrap(), record.cfd_time.unwrap());
                record.threshold_time.unwrap()
            })
            .collect();
        assert!(times.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn leading_edge_after_noisy_first_sample() {
        let config = config(
            Polarity::Positive,
            4,
            ChargeWindow::Fixed { start: 0, end: 12 },
            5.0,
            0.5,
        );
        let raw: [Real; 12] = [
            8.0, -8.0, 0.0, 0.0, 0.0, 20.0, 60.0, 100.0, 60.0, 20.0, 0.0, 0.0,
        ];
        let record = WaveformProcessor::new(&config).process(&raw).unwrap();

        assert_eq!(record.baseline_mean, 0.0);
        assert_eq!(record.peak_height, 100.0);
        assert_eq!(record.threshold_time, Some(4.25));
        assert_eq!(record.cfd_time, Some(5.75));
    }

    #[test]
    fn malformed() {
        let config = config(
            Polarity::Positive,
            5,
            ChargeWindow::Fixed { start: 5, end: 20 },
            5.0,
            0.5,
        );
        let processor = WaveformProcessor::new(&config);
        assert_eq!(
            processor.process(&[0u16; 5]),
            Err(MalformedWaveform::TooShortForBaseline {
                baseline_samples: 5,
                length: 5
            })
        );
        assert_eq!(
            processor.process(&[0u16; 12]),
            Err(MalformedWaveform::TooShortForChargeWindow { end: 20, length: 12 })
        );
    }
}
