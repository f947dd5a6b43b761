//! Input records for per-configuration raw data.
//!
//! External collaborators (document databases, equation-of-state fits)
//! deliver per-configuration series as grid axes plus property arrays
//! aligned to them. [ConfigurationRecord] is the serde representation of one
//! such series; [Configuration] and [Ensemble] provide constructors from
//! records and from JSON files.

use crate::configuration::{Configuration, PropertyKind};
use crate::ensemble::Ensemble;
use crate::errors::{ZentropyError, ZentropyResult};
use crate::grid::Grid;
use crate::property::TabulatedProperty;
use indexmap::IndexMap;
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for reading and interpreting configuration records.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("`{0}` is not a recognized property.")]
    UnknownProperty(String),
    #[error("The values of `{0}` have {1} entries while the grid has {2} points.")]
    ValueCount(String, usize, usize),
}

/// Raw data of a single configuration.
///
/// Property tables are flat arrays in row-major order with respect to the
/// grid axes, keyed by property label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub structure: Option<String>,
    pub multiplicity: f64,
    pub variable_labels: Vec<String>,
    pub grid: Vec<Vec<f64>>,
    pub properties: IndexMap<String, Vec<f64>>,
}

impl ConfigurationRecord {
    /// Read a list of configuration records from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Vec<Self>, RecordError> {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Configuration {
    /// Build a configuration from a raw data record.
    pub fn from_record(record: ConfigurationRecord) -> ZentropyResult<Self> {
        let axes = record.grid.into_iter().map(Array1::from_vec).collect();
        let grid = Arc::new(Grid::new(axes)?);
        let shape = grid.shape();
        let points: usize = shape.iter().product();
        let mut configuration = Configuration::new(
            record.name,
            record.structure,
            record.multiplicity,
            record.variable_labels.clone(),
            grid.clone(),
        )?;
        for (label, values) in record.properties {
            let kind = PropertyKind::from_label(&label)
                .ok_or_else(|| RecordError::UnknownProperty(label.clone()))?;
            if values.len() != points {
                return Err(RecordError::ValueCount(label, values.len(), points).into());
            }
            let values = ArrayD::from_shape_vec(IxDyn(&shape), values)
                .map_err(|e| ZentropyError::Error(e.to_string()))?;
            let table = TabulatedProperty::new(
                record.variable_labels.clone(),
                kind.label(),
                grid.clone(),
                values,
            )?;
            configuration.set(kind, table.into())?;
        }
        Ok(configuration)
    }

    /// Read a single configuration from a JSON file containing a list of
    /// records, selected by name.
    pub fn from_json<P: AsRef<Path>>(name: &str, file: P) -> ZentropyResult<Self> {
        let records = ConfigurationRecord::from_json(file)?;
        let record = records
            .into_iter()
            .find(|record| record.name == name)
            .ok_or_else(|| ZentropyError::UnknownConfiguration(name.to_owned()))?;
        Self::from_record(record)
    }
}

impl Ensemble {
    /// Build an ensemble from raw data records.
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<ConfigurationRecord>,
    ) -> ZentropyResult<Self> {
        let configurations = records
            .into_iter()
            .map(Configuration::from_record)
            .collect::<ZentropyResult<Vec<_>>>()?;
        Ensemble::new(name, configurations)
    }

    /// Read all configuration records from a JSON file into an ensemble.
    pub fn from_json<P: AsRef<Path>>(name: impl Into<String>, file: P) -> ZentropyResult<Self> {
        Self::from_records(name, ConfigurationRecord::from_json(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record_json() -> &'static str {
        r#"{
            "name": "afm",
            "structure": "mp-13",
            "multiplicity": 2.0,
            "variable_labels": ["temperature", "volume"],
            "grid": [[0.0, 300.0], [10.0, 11.0, 12.0]],
            "properties": {
                "helmholtz_energy": [-1.0, -1.1, -1.2, -2.0, -2.1, -2.2],
                "entropy": [0.0, 0.0, 0.0, 1e-4, 1e-4, 1e-4]
            }
        }"#
    }

    #[test]
    fn configuration_from_record() -> ZentropyResult<()> {
        let record: ConfigurationRecord =
            serde_json::from_str(record_json()).map_err(RecordError::from)?;
        let configuration = Configuration::from_record(record)?;
        assert_eq!(configuration.name(), "afm");
        assert_eq!(configuration.structure(), Some("mp-13"));
        assert_relative_eq!(configuration.multiplicity(), 2.0);
        let f = configuration.helmholtz_energy()?;
        assert_relative_eq!(f.value_at(&[300.0, 12.0])?, -2.2);
        // U is derivable from the supplied F and S
        let u = configuration.internal_energy()?;
        assert_relative_eq!(u.value_at(&[300.0, 10.0])?, -2.0 + 300.0 * 1e-4);
        Ok(())
    }

    #[test]
    fn unknown_property() {
        let json = record_json().replace("helmholtz_energy", "helmholz_energy");
        let record: ConfigurationRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            Configuration::from_record(record),
            Err(ZentropyError::RecordError(RecordError::UnknownProperty(_)))
        ));
    }

    #[test]
    fn wrong_value_count() {
        let json = record_json().replace("[0.0, 0.0, 0.0, 1e-4, 1e-4, 1e-4]", "[0.0, 0.0]");
        let record: ConfigurationRecord = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            Configuration::from_record(record),
            Err(ZentropyError::RecordError(RecordError::ValueCount(..)))
        ));
    }

    #[test]
    fn record_roundtrip() -> Result<(), RecordError> {
        let record: ConfigurationRecord = serde_json::from_str(record_json())?;
        let serialized = serde_json::to_string(&record)?;
        let read_back: ConfigurationRecord = serde_json::from_str(&serialized)?;
        assert_eq!(read_back.name, record.name);
        assert_eq!(read_back.properties["entropy"], record.properties["entropy"]);
        Ok(())
    }
}
