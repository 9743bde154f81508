use crate::Real;

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub(crate) struct Peak {
    /// Index of the first maximal sample.
    pub(crate) index: usize,
    pub(crate) height: Real,
    /// Sub-sample position of the maximum.
    pub(crate) time: Real,
}

impl Peak {
    /// Finds the maximum of `signal`, returning `None` if `signal` is empty.
    pub(crate) fn find(signal: &[Real]) -> Option<Self> {
        let (index, &height) = signal
            .iter()
            .enumerate()
            .reduce(|max, value| if value.1 > max.1 { value } else { max })?;

        Some(Self {
            index,
            height,
            time: index as Real + Self::parabolic_offset(signal, index).unwrap_or_default(),
        })
    }

    /// Offset from `index` of the vertex of the parabola through the sample
    /// at `index` and its two neighbours.
    /// Returns `None` at either end of `signal`, or if the three points do not curve downwards.
    fn parabolic_offset(signal: &[Real], index: usize) -> Option<Real> {
        let neighbours = signal.get(index.checked_sub(1)?..=index.checked_add(1)?)?;
        let &[left, centre, right] = neighbours else {
            return None;
        };
        let curvature = left - 2.0 * centre + right;
        (curvature < 0.0).then(|| 0.5 * (left - right) / curvature)
    }
}
