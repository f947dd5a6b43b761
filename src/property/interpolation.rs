use crate::grid::Grid;
use ndarray::{ArrayD, ArrayView1, IxDyn};

/// Direction of a strictly monotonic sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Monotonicity {
    Increasing,
    Decreasing,
}

/// Classify a sequence as strictly increasing or strictly decreasing.
pub(crate) fn monotonicity(values: ArrayView1<f64>) -> Option<Monotonicity> {
    if values.len() < 2 {
        return None;
    }
    let pairs = || values.windows(2).into_iter();
    if pairs().all(|w| w[1] > w[0]) {
        Some(Monotonicity::Increasing)
    } else if pairs().all(|w| w[1] < w[0]) {
        Some(Monotonicity::Decreasing)
    } else {
        None
    }
}

/// Lower bracket index of `x` on a strictly increasing axis and the
/// fractional position inside the bracket. `None` outside the axis range.
fn bracket(axis: ArrayView1<f64>, x: f64) -> Option<(usize, f64)> {
    let n = axis.len();
    if n == 1 {
        return (x == axis[0]).then_some((0, 0.0));
    }
    if x < axis[0] || x > axis[n - 1] || !x.is_finite() {
        return None;
    }
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if axis[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = (x - axis[lo]) / (axis[lo + 1] - axis[lo]);
    Some((lo, t))
}

/// Multilinear interpolation of an N-dimensional field at a point.
///
/// Zero-weight corners are skipped, which makes axes of length one valid as
/// long as the point lies exactly on them.
pub(crate) fn multilinear(grid: &Grid, values: &ArrayD<f64>, point: &[f64]) -> Option<f64> {
    let ndim = point.len();
    let mut brackets = Vec::with_capacity(ndim);
    for (d, &x) in point.iter().enumerate() {
        brackets.push(bracket(grid.axis(d).view(), x)?);
    }
    let mut result = 0.0;
    let mut index = vec![0; ndim];
    for corner in 0..1_usize << ndim {
        let mut weight = 1.0;
        for (d, &(lo, t)) in brackets.iter().enumerate() {
            let upper = (corner >> d) & 1 == 1;
            index[d] = if upper && grid.axis(d).len() > 1 {
                lo + 1
            } else {
                lo
            };
            weight *= if upper { t } else { 1.0 - t };
        }
        if weight != 0.0 {
            result += weight * values[IxDyn(&index)];
        }
    }
    Some(result)
}

/// Linear interpolation of a one-dimensional series at `x`.
pub(crate) fn linear(axis: ArrayView1<f64>, values: ArrayView1<f64>, x: f64) -> Option<f64> {
    let (lo, t) = bracket(axis, x)?;
    if axis.len() == 1 {
        return Some(values[0]);
    }
    Some(values[lo] * (1.0 - t) + values[lo + 1] * t)
}

/// Solve `series(x) = target` on a strictly monotonic piecewise-linear
/// series sampled at `axis`. `None` if the target is outside the sampled
/// range.
pub(crate) fn invert_monotonic(
    axis: ArrayView1<f64>,
    series: ArrayView1<f64>,
    direction: Monotonicity,
    target: f64,
) -> Option<f64> {
    let n = series.len();
    let (min, max) = match direction {
        Monotonicity::Increasing => (series[0], series[n - 1]),
        Monotonicity::Decreasing => (series[n - 1], series[0]),
    };
    if target < min || target > max || !target.is_finite() {
        return None;
    }
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        let below = match direction {
            Monotonicity::Increasing => series[mid] <= target,
            Monotonicity::Decreasing => series[mid] >= target,
        };
        if below {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = (target - series[lo]) / (series[lo + 1] - series[lo]);
    Some(axis[lo] + t * (axis[lo + 1] - axis[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn bracket_endpoints() {
        let axis = arr1(&[1.0, 2.0, 4.0]);
        assert_eq!(bracket(axis.view(), 1.0), Some((0, 0.0)));
        assert_eq!(bracket(axis.view(), 4.0), Some((1, 1.0)));
        assert_eq!(bracket(axis.view(), 0.5), None);
        assert_eq!(bracket(axis.view(), 4.5), None);
    }

    #[test]
    fn linear_interpolation() {
        let axis = arr1(&[0.0, 1.0, 3.0]);
        let values = arr1(&[2.0, 4.0, 0.0]);
        assert_relative_eq!(linear(axis.view(), values.view(), 0.5).unwrap(), 3.0);
        assert_relative_eq!(linear(axis.view(), values.view(), 2.0).unwrap(), 2.0);
    }

    #[test]
    fn invert_increasing() {
        let axis = arr1(&[0.0, 1.0, 2.0]);
        let series = arr1(&[10.0, 20.0, 40.0]);
        let x = invert_monotonic(axis.view(), series.view(), Monotonicity::Increasing, 30.0);
        assert_relative_eq!(x.unwrap(), 1.5);
    }

    #[test]
    fn invert_decreasing() {
        let axis = arr1(&[0.0, 1.0, 2.0]);
        let series = arr1(&[40.0, 20.0, 10.0]);
        let x = invert_monotonic(axis.view(), series.view(), Monotonicity::Decreasing, 15.0);
        assert_relative_eq!(x.unwrap(), 1.5);
        assert!(
            invert_monotonic(axis.view(), series.view(), Monotonicity::Decreasing, 45.0).is_none()
        );
    }

    #[test]
    fn classify_monotonicity() {
        assert_eq!(
            monotonicity(arr1(&[1.0, 2.0, 3.0]).view()),
            Some(Monotonicity::Increasing)
        );
        assert_eq!(
            monotonicity(arr1(&[3.0, 2.0, 1.0]).view()),
            Some(Monotonicity::Decreasing)
        );
        assert_eq!(monotonicity(arr1(&[1.0, 2.0, 2.0]).view()), None);
    }
}
