use approx::assert_abs_diff_eq;
use ndarray::{arr1, Array1};
use std::sync::Arc;
use zentropy::{
    helmholtz_to_temperature_pressure, isotherm_reexpress, volume_to_temperature_pressure,
    AnalyticalProperty, Grid, TabulatedProperty, TransformOptions, ZentropyResult, PRESSURE,
    TEMPERATURE, VOLUME,
};

const A: f64 = 1e-4;
const B: f64 = 0.01;
const V0: f64 = 25.0;

fn tv_labels() -> Vec<String> {
    vec![TEMPERATURE.into(), VOLUME.into()]
}

/// F(T, V) = a T + b (V - V0)^2 with V < V0, so that
/// P(V) = -dF/dV = 2 b (V0 - V) is positive and strictly decreasing.
fn helmholtz(t: f64, v: f64) -> f64 {
    A * t + B * (v - V0) * (v - V0)
}

fn grid() -> Arc<Grid> {
    Arc::new(
        Grid::new(vec![
            arr1(&[300.0, 400.0, 500.0]),
            Array1::linspace(10.0, 20.0, 21),
        ])
        .unwrap(),
    )
}

#[test]
fn roundtrip_through_the_pressure_representation() -> ZentropyResult<()> {
    let grid = grid();
    let f_tv = AnalyticalProperty::new(tv_labels(), "helmholtz_energy", |x| {
        helmholtz(x[0], x[1])
    })
    .tabulate(&grid)?;
    // the finite-difference pressure is exact at interior volumes
    let dfdv = f_tv.partial_derivative(1)?;
    let p_tv = TabulatedProperty::new(tv_labels(), PRESSURE, grid.clone(), -dfdv.values())?;
    let options = TransformOptions::new();

    // P ranges over [0.1, 0.3]; stay away from the one-sided edge stencils
    let pressures = Array1::linspace(0.12, 0.28, 33);
    let f_tp = helmholtz_to_temperature_pressure(&f_tv, &p_tv, &pressures, options)?;
    let v_tp = volume_to_temperature_pressure(&p_tv, &pressures, options)?;
    assert_eq!(f_tp.variable_labels(), [TEMPERATURE, PRESSURE]);
    assert_eq!(v_tp.property_label(), VOLUME);

    // invert back: volumes as a function of pressure are strictly monotonic
    let interior_volumes = Array1::linspace(11.5, 18.5, 15);
    let f_back = isotherm_reexpress(&f_tp, &v_tp, &interior_volumes, VOLUME, options)?;

    for &t in grid.axis(0).iter() {
        for &v in interior_volumes.iter() {
            assert_abs_diff_eq!(
                f_back.value_at(&[t, v])?,
                helmholtz(t, v),
                epsilon = 5e-3
            );
        }
    }
    Ok(())
}

#[test]
fn forward_transform_matches_the_analytic_solution() -> ZentropyResult<()> {
    let grid = grid();
    let f_tv = AnalyticalProperty::new(tv_labels(), "helmholtz_energy", |x| {
        helmholtz(x[0], x[1])
    })
    .tabulate(&grid)?;
    let p_tv = AnalyticalProperty::new(tv_labels(), PRESSURE, |x| 2.0 * B * (V0 - x[1]))
        .tabulate(&grid)?;

    let pressures = arr1(&[0.15, 0.2, 0.25]);
    let f_tp =
        helmholtz_to_temperature_pressure(&f_tv, &p_tv, &pressures, TransformOptions::new())?;
    for &p in pressures.iter() {
        let v = V0 - p / (2.0 * B);
        assert_abs_diff_eq!(
            f_tp.value_at(&[400.0, p])?,
            helmholtz(400.0, v),
            epsilon = 2e-3
        );
    }
    Ok(())
}

#[test]
fn pressures_outside_every_isotherm_stay_nan() -> ZentropyResult<()> {
    let grid = grid();
    let f_tv = AnalyticalProperty::new(tv_labels(), "helmholtz_energy", |x| {
        helmholtz(x[0], x[1])
    })
    .tabulate(&grid)?;
    let p_tv = AnalyticalProperty::new(tv_labels(), PRESSURE, |x| 2.0 * B * (V0 - x[1]))
        .tabulate(&grid)?;

    // 0.05 is below, 0.35 above the sampled range [0.1, 0.3]
    let pressures = arr1(&[0.05, 0.2, 0.35]);
    let f_tp =
        helmholtz_to_temperature_pressure(&f_tv, &p_tv, &pressures, TransformOptions::new())?;
    for i in 0..3 {
        assert!(f_tp.values()[[i, 0]].is_nan());
        assert!(f_tp.values()[[i, 1]].is_finite());
        assert!(f_tp.values()[[i, 2]].is_nan());
    }
    Ok(())
}
