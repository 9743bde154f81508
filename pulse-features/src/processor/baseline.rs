use crate::{MalformedWaveform, Real};

/// The pre-pulse offset of a waveform and the noise about it.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub(crate) struct Baseline {
    pub(crate) mean: Real,
    /// Population RMS about [Self::mean].
    pub(crate) rms: Real,
}

impl Baseline {
    /// Estimates the baseline from the first `samples` entries of `raw`.
    /// # Error Modes
    /// - [MalformedWaveform::TooShortForBaseline] if `raw` has no samples after the baseline region.
    pub(crate) fn estimate<S: Copy + Into<Real>>(
        raw: &[S],
        samples: usize,
    ) -> Result<Self, MalformedWaveform> {
        let region = raw
            .get(..samples)
            .filter(|region| !region.is_empty() && samples < raw.len())
            .ok_or(MalformedWaveform::TooShortForBaseline {
                baseline_samples: samples,
                length: raw.len(),
            })?;

        let count = region.len() as Real;
        let mean = region.iter().copied().map(Into::into).sum::<Real>() / count;
        let variance = region
            .iter()
            .copied()
            .map(|value| (value.into() - mean).powi(2))
            .sum::<Real>()
            / count;
        Ok(Self {
            mean,
            rms: variance.sqrt(),
        })
    }
}
