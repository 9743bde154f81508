use super::Peak;
use crate::Real;

/// Produces a timing for a polarity-corrected signal.
pub(crate) trait Discriminator {
    /// The level whose first crossing is the timing.
    fn level(&self, peak: &Peak) -> Real;

    /// Returns the interpolated time at which `signal` first rises through [Self::level],
    /// or `None` if it never does.
    fn time(&self, signal: &[Real], peak: &Peak) -> Option<Real> {
        find_crossing(signal, self.level(peak))
    }
}

/// Fires when the signal reaches a fixed threshold.
pub(crate) struct LeadingEdge {
    pub(crate) threshold: Real,
}

impl Discriminator for LeadingEdge {
    fn level(&self, _peak: &Peak) -> Real {
        self.threshold
    }
}

/// Fires when the signal reaches a fixed fraction of its own peak height.
pub(crate) struct ConstantFraction {
    pub(crate) fraction: Real,
}

impl Discriminator for ConstantFraction {
    fn level(&self, peak: &Peak) -> Real {
        self.fraction * peak.height
    }
}

/// Scans `signal` from its start for the first rising crossing of `level`,
/// interpolating linearly between the bracketing samples.
/// A first sample already at or above `level` is not a crossing, but a later rise still is.
pub(crate) fn find_crossing(signal: &[Real], level: Real) -> Option<Real> {
    signal
        .windows(2)
        .enumerate()
        .find_map(|(i, pair)| match *pair {
            [prev, next] if prev < level && next >= level => {
                Some(i as Real + (level - prev) / (next - prev))
            }
            _ => None,
        })
}
