//! Re-expression of tabulated (temperature, volume) fields in
//! (temperature, pressure) coordinates.
//!
//! For every temperature row the coordinate isotherm is inverted by
//! monotonic piecewise-linear interpolation and the field is evaluated at
//! the solved volumes. Target values outside the sampled range of an
//! isotherm yield NaN.

use crate::errors::{ZentropyError, ZentropyResult};
use crate::grid::Grid;
use crate::property::{invert_monotonic, linear, monotonicity, TabulatedProperty};
use crate::{log_iter, log_result, Verbosity, PRESSURE, TEMPERATURE, VOLUME};
use ndarray::{Array1, ArrayD, Axis, IxDyn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::Arc;

/// Options for the isotherm inversion.
#[derive(Clone, Copy, Default)]
pub struct TransformOptions {
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Re-express a two-dimensional tabulated field in terms of a conjugate
/// coordinate.
///
/// `field` and `coordinate` must live on the same (temperature, x) grid.
/// Per temperature row, `coordinate(x)` is verified to be strictly
/// monotonic (either direction), inverted at every target value and `field`
/// is interpolated at the solutions. The output is tabulated on
/// (temperature, `targets`) with the axis labeled `target_label`; targets
/// outside the sampled range of an isotherm yield NaN.
pub fn isotherm_reexpress(
    field: &TabulatedProperty,
    coordinate: &TabulatedProperty,
    targets: &Array1<f64>,
    target_label: &str,
    options: TransformOptions,
) -> ZentropyResult<TabulatedProperty> {
    if field.grid().ndim() != 2 {
        return Err(ZentropyError::DimensionMismatch(
            field.property_label().to_owned(),
            field.variable_labels().len(),
            2,
        ));
    }
    if field.variable_labels()[0] != TEMPERATURE {
        return Err(ZentropyError::MissingVariable(
            TEMPERATURE.to_owned(),
            field.variable_labels().to_vec(),
        ));
    }
    if coordinate.grid().as_ref() != field.grid().as_ref() {
        return Err(ZentropyError::GridMismatch(
            coordinate.property_label().to_owned(),
            field.property_label().to_owned(),
        ));
    }
    let grid = field.grid();
    let temperatures = grid.axis(0);
    let abscissa = grid.axis(1);
    let coordinate_label = coordinate.property_label().to_owned();

    let rows: Vec<(f64, Array1<f64>, Array1<f64>)> = (0..temperatures.len())
        .map(|i| {
            let c = coordinate.values().index_axis(Axis(0), i);
            let f = field.values().index_axis(Axis(0), i);
            (
                temperatures[i],
                c.iter().copied().collect(),
                f.iter().copied().collect(),
            )
        })
        .collect();

    let invert = |(temperature, c, f): &(f64, Array1<f64>, Array1<f64>)| {
        invert_isotherm(
            &coordinate_label,
            *temperature,
            abscissa,
            c,
            f,
            targets,
            options.verbosity,
        )
    };
    #[cfg(feature = "rayon")]
    let inverted = rows.par_iter().map(invert).collect::<ZentropyResult<Vec<_>>>()?;
    #[cfg(not(feature = "rayon"))]
    let inverted = rows.iter().map(invert).collect::<ZentropyResult<Vec<_>>>()?;

    let mut values = ArrayD::zeros(IxDyn(&[temperatures.len(), targets.len()]));
    for (i, row) in inverted.into_iter().enumerate() {
        values.index_axis_mut(Axis(0), i).assign(&row);
    }
    log_result!(
        options.verbosity,
        "isotherm re-expression of `{}`: {} isotherms mapped onto {} `{}` targets",
        field.property_label(),
        temperatures.len(),
        targets.len(),
        target_label
    );
    let output_grid = Arc::new(Grid::new(vec![temperatures.clone(), targets.clone()])?);
    Ok(TabulatedProperty::new(
        vec![TEMPERATURE.to_owned(), target_label.to_owned()],
        field.property_label(),
        output_grid,
        values,
    )?
    .with_interpolation(field.interpolation())
    .with_bounds_policy(field.bounds_policy()))
}

/// Helmholtz energy over (temperature, pressure) from its (temperature,
/// volume) representation and the matching pressure field.
pub fn helmholtz_to_temperature_pressure(
    helmholtz: &TabulatedProperty,
    pressure: &TabulatedProperty,
    pressures: &Array1<f64>,
    options: TransformOptions,
) -> ZentropyResult<TabulatedProperty> {
    isotherm_reexpress(helmholtz, pressure, pressures, PRESSURE, options)
}

/// Equilibrium volume over (temperature, pressure), obtained by
/// re-expressing the identity volume field.
pub fn volume_to_temperature_pressure(
    pressure: &TabulatedProperty,
    pressures: &Array1<f64>,
    options: TransformOptions,
) -> ZentropyResult<TabulatedProperty> {
    let grid = pressure.grid();
    let volume = TabulatedProperty::new(
        pressure.variable_labels().to_vec(),
        VOLUME,
        grid.clone(),
        grid.axis_field(1),
    )?;
    isotherm_reexpress(&volume, pressure, pressures, PRESSURE, options)
}

#[allow(clippy::too_many_arguments)]
fn invert_isotherm(
    coordinate_label: &str,
    temperature: f64,
    abscissa: &Array1<f64>,
    coordinate: &Array1<f64>,
    field: &Array1<f64>,
    targets: &Array1<f64>,
    verbosity: Verbosity,
) -> ZentropyResult<Array1<f64>> {
    let Some(direction) = monotonicity(coordinate.view()) else {
        return Err(ZentropyError::NonMonotonicIsotherm(
            coordinate_label.to_owned(),
            temperature,
        ));
    };
    let mut row = Array1::from_elem(targets.len(), f64::NAN);
    let mut solved = 0;
    for (out, &target) in row.iter_mut().zip(targets) {
        if let Some(x) = invert_monotonic(abscissa.view(), coordinate.view(), direction, target)
        {
            if let Some(value) = linear(abscissa.view(), field.view(), x) {
                *out = value;
                solved += 1;
            }
        }
    }
    log_iter!(
        verbosity,
        "T = {:10.4} K: {}/{} targets inside the sampled isotherm",
        temperature,
        solved,
        targets.len()
    );
    Ok(row)
}
