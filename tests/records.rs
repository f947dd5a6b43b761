use approx::assert_abs_diff_eq;
use zentropy::record::ConfigurationRecord;
use zentropy::{Configuration, Ensemble, ZentropyResult};

#[test]
fn ensemble_from_json_file() -> ZentropyResult<()> {
    let ensemble = Ensemble::from_json("fe3pt", "tests/configurations.json")?;
    assert_eq!(ensemble.len(), 2);
    assert_eq!(ensemble.get("afm").map(|c| c.multiplicity()), Some(2.0));

    let probabilities = ensemble.probabilities()?;
    for (_, p) in probabilities.iter() {
        assert_eq!(p.values().shape(), [3, 2]);
    }
    // fm is the ground state everywhere
    let p_fm = ensemble.probability("fm")?;
    assert_eq!(p_fm.value_at(&[0.0, 10.0])?, 1.0);
    assert!(p_fm.value_at(&[300.0, 11.0])? > 0.5);
    Ok(())
}

#[test]
fn configuration_from_json_by_name() -> ZentropyResult<()> {
    let configuration = Configuration::from_json("afm", "tests/configurations.json")?;
    assert_eq!(configuration.structure(), Some("fe3pt-afm"));
    let u = configuration.internal_energy()?;
    assert_abs_diff_eq!(
        u.value_at(&[300.0, 10.0])?,
        0.046 + 300.0 * 1.3e-5,
        epsilon = 1e-12
    );
    Ok(())
}

#[test]
fn records_reject_unknown_names() -> ZentropyResult<()> {
    let records = ConfigurationRecord::from_json("tests/configurations.json")
        .map_err(zentropy::ZentropyError::from)?;
    assert_eq!(records.len(), 2);
    assert!(Configuration::from_json("fim", "tests/configurations.json").is_err());
    Ok(())
}
