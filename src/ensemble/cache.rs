use crate::property::TabulatedProperty;
use indexmap::IndexMap;
use std::collections::HashMap;

/// System-level properties that are memoized after their first evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum EnsembleProperty {
    LogPartitionFunction,
    HelmholtzEnergy,
    Entropy,
    InterEntropy,
    IntraEntropy,
    InternalEnergy,
    Pressure,
    BulkModulus,
    InterBulkModulus,
    IntraBulkModulus,
    HeatCapacity,
    InterHeatCapacity,
    IntraHeatCapacity,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Cache {
    map: HashMap<EnsembleProperty, TabulatedProperty>,
    probabilities: Option<IndexMap<String, TabulatedProperty>>,
    pub hit: u64,
    pub miss: u64,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, property: EnsembleProperty) -> Option<TabulatedProperty> {
        if let Some(value) = self.map.get(&property) {
            self.hit += 1;
            Some(value.clone())
        } else {
            self.miss += 1;
            None
        }
    }

    pub fn insert(&mut self, property: EnsembleProperty, value: TabulatedProperty) {
        self.map.insert(property, value);
    }

    pub fn probabilities(&mut self) -> Option<IndexMap<String, TabulatedProperty>> {
        if let Some(value) = &self.probabilities {
            self.hit += 1;
            Some(value.clone())
        } else {
            self.miss += 1;
            None
        }
    }

    pub fn insert_probabilities(&mut self, value: IndexMap<String, TabulatedProperty>) {
        self.probabilities = Some(value);
    }
}
