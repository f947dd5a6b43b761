//! Canonical-ensemble aggregation of configurations.
//!
//! An [Ensemble] owns an insertion-ordered collection of uniquely named
//! [Configuration]s sharing one grid and one set of independent variables.
//! It is meant to be constructed once from finalized configurations;
//! system-level properties are evaluated lazily on first access and
//! memoized, so member configurations must not be mutated afterwards.

mod cache;
mod properties;

use crate::configuration::Configuration;
use crate::errors::{ZentropyError, ZentropyResult};
use crate::grid::Grid;
use crate::{TEMPERATURE, VOLUME};
use cache::Cache;
pub(crate) use cache::EnsembleProperty;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Supported sets of independent variables of an ensemble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableSet {
    /// Properties over (temperature,).
    Temperature,
    /// Properties over (temperature, volume).
    TemperatureVolume,
}

impl VariableSet {
    /// The variable labels of this set, in axis order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Temperature => &[TEMPERATURE],
            Self::TemperatureVolume => &[TEMPERATURE, VOLUME],
        }
    }

    fn from_labels(labels: &[String]) -> ZentropyResult<Self> {
        [Self::Temperature, Self::TemperatureVolume]
            .into_iter()
            .find(|set| set.labels() == labels)
            .ok_or_else(|| ZentropyError::UnsupportedVariables(labels.to_vec()))
    }

    pub(crate) fn temperature_axis(&self) -> usize {
        0
    }

    pub(crate) fn volume_axis(&self) -> Option<usize> {
        match self {
            Self::Temperature => None,
            Self::TemperatureVolume => Some(1),
        }
    }
}

/// The full set of configurations whose weighted combination yields the
/// material's observable properties.
#[derive(Debug)]
pub struct Ensemble {
    name: String,
    variables: VariableSet,
    variable_labels: Vec<String>,
    grid: Arc<Grid>,
    configurations: IndexMap<String, Configuration>,
    cache: Mutex<Cache>,
}

impl Clone for Ensemble {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            variables: self.variables,
            variable_labels: self.variable_labels.clone(),
            grid: self.grid.clone(),
            configurations: self.configurations.clone(),
            cache: Mutex::new(self.cache.lock().unwrap().clone()),
        }
    }
}

impl Ensemble {
    /// Create a new ensemble from its member configurations.
    ///
    /// All members must share the same variable labels and the same grid,
    /// and their names must be unique; the variable labels must form one of
    /// the supported [VariableSet]s.
    pub fn new(
        name: impl Into<String>,
        configurations: Vec<Configuration>,
    ) -> ZentropyResult<Self> {
        let name = name.into();
        let Some(first) = configurations.first() else {
            return Err(ZentropyError::EmptyEnsemble(name));
        };
        let variable_labels = first.variable_labels().to_vec();
        let variables = VariableSet::from_labels(&variable_labels)?;
        let grid = first.grid().clone();
        let first_name = first.name().to_owned();
        let mut members = IndexMap::with_capacity(configurations.len());
        for configuration in configurations {
            if configuration.variable_labels() != variable_labels {
                return Err(ZentropyError::LabelMismatch(
                    configuration.name().to_owned(),
                    configuration.variable_labels().to_vec(),
                    variable_labels.clone(),
                ));
            }
            if configuration.grid().as_ref() != grid.as_ref() {
                return Err(ZentropyError::GridMismatch(
                    configuration.name().to_owned(),
                    first_name.clone(),
                ));
            }
            let key = configuration.name().to_owned();
            if members.insert(key.clone(), configuration).is_some() {
                return Err(ZentropyError::DuplicateConfiguration(key));
            }
        }
        Ok(Self {
            name,
            variables,
            variable_labels,
            grid,
            configurations: members,
            cache: Mutex::new(Cache::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag of independent variables all members share.
    pub fn variables(&self) -> VariableSet {
        self.variables
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// The number of member configurations.
    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// A member configuration by name.
    pub fn get(&self, name: &str) -> Option<&Configuration> {
        self.configurations.get(name)
    }

    /// All member configurations in insertion order.
    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.configurations.values()
    }

    pub(crate) fn members(&self) -> &IndexMap<String, Configuration> {
        &self.configurations
    }

    pub(crate) fn cache(&self) -> &Mutex<Cache> {
        &self.cache
    }

    /// Hits and misses of the system-property cache.
    pub fn cache_statistics(&self) -> (u64, u64) {
        let cache = self.cache.lock().unwrap();
        (cache.hit, cache.miss)
    }

    pub(crate) fn temperature_axis(&self) -> usize {
        self.variables.temperature_axis()
    }

    pub(crate) fn volume_axis(&self) -> ZentropyResult<usize> {
        self.variables.volume_axis().ok_or_else(|| {
            ZentropyError::MissingVariable(VOLUME.to_owned(), self.variable_labels.clone())
        })
    }
}

impl fmt::Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} configurations over ({})",
            self.name,
            self.configurations.len(),
            self.variable_labels.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn labels() -> Vec<String> {
        vec![TEMPERATURE.into(), VOLUME.into()]
    }

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::new(vec![arr1(&[0.0, 300.0]), arr1(&[10.0])]).unwrap())
    }

    fn configuration(name: &str) -> Configuration {
        Configuration::new(name, None, 1.0, labels(), grid()).unwrap()
    }

    #[test]
    fn duplicate_name() {
        let ensemble = Ensemble::new("fe3pt", vec![configuration("fm"), configuration("fm")]);
        assert!(matches!(
            ensemble,
            Err(ZentropyError::DuplicateConfiguration(_))
        ));
    }

    #[test]
    fn empty_ensemble() {
        assert!(matches!(
            Ensemble::new("fe3pt", vec![]),
            Err(ZentropyError::EmptyEnsemble(_))
        ));
    }

    #[test]
    fn grid_mismatch() {
        let other_grid = Arc::new(Grid::new(vec![arr1(&[0.0, 400.0]), arr1(&[10.0])]).unwrap());
        let other = Configuration::new("afm", None, 1.0, labels(), other_grid).unwrap();
        assert!(matches!(
            Ensemble::new("fe3pt", vec![configuration("fm"), other]),
            Err(ZentropyError::GridMismatch(..))
        ));
    }

    #[test]
    fn unsupported_variables() {
        let grid = Arc::new(Grid::new(vec![arr1(&[10.0, 11.0])]).unwrap());
        let c = Configuration::new("fm", None, 1.0, vec![VOLUME.into()], grid).unwrap();
        assert!(matches!(
            Ensemble::new("fe3pt", vec![c]),
            Err(ZentropyError::UnsupportedVariables(_))
        ));
    }

    #[test]
    fn insertion_order_is_preserved() -> ZentropyResult<()> {
        let ensemble = Ensemble::new(
            "fe3pt",
            vec![configuration("fm"), configuration("afm"), configuration("nm")],
        )?;
        let names: Vec<&str> = ensemble.configurations().map(|c| c.name()).collect();
        assert_eq!(names, ["fm", "afm", "nm"]);
        assert_eq!(ensemble.variables(), VariableSet::TemperatureVolume);
        Ok(())
    }
}
