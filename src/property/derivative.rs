use crate::errors::{ZentropyError, ZentropyResult};
use ndarray::{Array1, ArrayD, ArrayView1, ArrayViewMut1, Axis, Zip};

/// Finite-difference gradient of an N-dimensional field along one axis.
///
/// Interior points use the second-order central stencil for arbitrary (also
/// non-uniform) spacing; the two boundary points use one-sided first-order
/// stencils. The grid is never refined.
pub(crate) fn gradient(
    coordinates: &Array1<f64>,
    values: &ArrayD<f64>,
    axis: usize,
    label: &str,
) -> ZentropyResult<ArrayD<f64>> {
    if coordinates.len() < 2 {
        return Err(ZentropyError::InsufficientGridPoints(label.to_owned()));
    }
    let mut output = ArrayD::zeros(values.raw_dim());
    Zip::from(output.lanes_mut(Axis(axis)))
        .and(values.lanes(Axis(axis)))
        .for_each(|out, lane| gradient_lane(coordinates.view(), lane, out));
    Ok(output)
}

fn gradient_lane(x: ArrayView1<f64>, f: ArrayView1<f64>, mut out: ArrayViewMut1<f64>) {
    let n = x.len();
    out[0] = (f[1] - f[0]) / (x[1] - x[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (x[n - 1] - x[n - 2]);
    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        out[i] = (hs * hs * f[i + 1] + (hd * hd - hs * hs) * f[i] - hd * hd * f[i - 1])
            / (hs * hd * (hs + hd));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn quadratic_on_non_uniform_axis() -> ZentropyResult<()> {
        // the central stencil is exact for quadratics, also with uneven spacing
        let x = arr1(&[0.0, 1.0, 3.0, 4.0, 7.0]);
        let f = x.mapv(|x| x * x).into_dyn();
        let df = gradient(&x, &f, 0, "x")?;
        for i in 1..4 {
            assert_relative_eq!(df[[i]], 2.0 * x[i], max_relative = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn one_sided_edges() -> ZentropyResult<()> {
        let x = arr1(&[0.0, 1.0, 2.0]);
        let f = arr1(&[1.0, 3.0, 7.0]).into_dyn();
        let df = gradient(&x, &f, 0, "x")?;
        assert_relative_eq!(df[[0]], 2.0);
        assert_relative_eq!(df[[2]], 4.0);
        Ok(())
    }

    #[test]
    fn along_second_axis() -> ZentropyResult<()> {
        let x = arr1(&[0.0, 2.0]);
        let f = arr1(&[1.0, 5.0]).into_dyn().into_shape((1, 2)).unwrap();
        let df = gradient(&x, &f.into_dyn(), 1, "x")?;
        assert_relative_eq!(df[[0, 0]], 2.0);
        assert_relative_eq!(df[[0, 1]], 2.0);
        Ok(())
    }

    #[test]
    fn too_few_points() {
        let x = arr1(&[1.0]);
        let f = arr1(&[0.0]).into_dyn();
        assert!(matches!(
            gradient(&x, &f, 0, "volume"),
            Err(ZentropyError::InsufficientGridPoints(_))
        ));
    }
}
