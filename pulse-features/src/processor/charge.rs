use crate::{ChargeWindow, MalformedWaveform, Real};

/// Sums `signal` over the range `window` selects around the peak at `peak_index`.
/// # Error Modes
/// - [MalformedWaveform::TooShortForChargeWindow] if a fixed window extends past the end of `signal`.
pub(crate) fn integrate(
    signal: &[Real],
    window: ChargeWindow,
    peak_index: usize,
) -> Result<Real, MalformedWaveform> {
    let range = window.range(peak_index, signal.len())?;
    Ok(signal.iter().take(range.end).skip(range.start).sum())
}
