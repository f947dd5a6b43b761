use crate::errors::{ZentropyError, ZentropyResult};
use crate::grid::Grid;
use crate::property::{Property, TabulatedProperty};
use crate::TEMPERATURE;
use ndarray::{ArrayD, Zip};
use std::fmt;
use std::sync::Arc;

/// Names of the property slots of a [Configuration].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    InternalEnergy,
    Entropy,
    HelmholtzEnergy,
    Enthalpy,
    GibbsEnergy,
    HeatCapacity,
    BulkModulus,
    ThermalExpansionCoefficient,
}

impl PropertyKind {
    /// All property slots in declaration order.
    pub const ALL: [PropertyKind; 8] = [
        PropertyKind::InternalEnergy,
        PropertyKind::Entropy,
        PropertyKind::HelmholtzEnergy,
        PropertyKind::Enthalpy,
        PropertyKind::GibbsEnergy,
        PropertyKind::HeatCapacity,
        PropertyKind::BulkModulus,
        PropertyKind::ThermalExpansionCoefficient,
    ];

    /// Property label used in records, derived tables and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InternalEnergy => "internal_energy",
            Self::Entropy => "entropy",
            Self::HelmholtzEnergy => "helmholtz_energy",
            Self::Enthalpy => "enthalpy",
            Self::GibbsEnergy => "gibbs_energy",
            Self::HeatCapacity => "heat_capacity",
            Self::BulkModulus => "bulk_modulus",
            Self::ThermalExpansionCoefficient => "thermal_expansion_coefficient",
        }
    }

    pub(crate) fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Debug, Default)]
struct PropertySlots {
    internal_energy: Option<Property>,
    entropy: Option<Property>,
    helmholtz_energy: Option<Property>,
    enthalpy: Option<Property>,
    gibbs_energy: Option<Property>,
    heat_capacity: Option<Property>,
    bulk_modulus: Option<Property>,
    thermal_expansion_coefficient: Option<Property>,
}

impl PropertySlots {
    fn get(&self, kind: PropertyKind) -> Option<&Property> {
        match kind {
            PropertyKind::InternalEnergy => self.internal_energy.as_ref(),
            PropertyKind::Entropy => self.entropy.as_ref(),
            PropertyKind::HelmholtzEnergy => self.helmholtz_energy.as_ref(),
            PropertyKind::Enthalpy => self.enthalpy.as_ref(),
            PropertyKind::GibbsEnergy => self.gibbs_energy.as_ref(),
            PropertyKind::HeatCapacity => self.heat_capacity.as_ref(),
            PropertyKind::BulkModulus => self.bulk_modulus.as_ref(),
            PropertyKind::ThermalExpansionCoefficient => {
                self.thermal_expansion_coefficient.as_ref()
            }
        }
    }

    fn slot_mut(&mut self, kind: PropertyKind) -> &mut Option<Property> {
        match kind {
            PropertyKind::InternalEnergy => &mut self.internal_energy,
            PropertyKind::Entropy => &mut self.entropy,
            PropertyKind::HelmholtzEnergy => &mut self.helmholtz_energy,
            PropertyKind::Enthalpy => &mut self.enthalpy,
            PropertyKind::GibbsEnergy => &mut self.gibbs_energy,
            PropertyKind::HeatCapacity => &mut self.heat_capacity,
            PropertyKind::BulkModulus => &mut self.bulk_modulus,
            PropertyKind::ThermalExpansionCoefficient => {
                &mut self.thermal_expansion_coefficient
            }
        }
    }
}

/// A single microstate of the material: a degeneracy weight plus named
/// thermodynamic property tables over the configuration's state variables.
///
/// The three energetic quantities are connected by $U = F + TS$. A
/// configuration stores the values it was supplied with; when one of
/// $\{U, S, F\}$ is absent but the other two are present, the read accessor
/// derives it on the fly. Derived values are never cached, so a property
/// that is set later is picked up by subsequent derivations.
#[derive(Clone, Debug)]
pub struct Configuration {
    name: String,
    structure: Option<String>,
    multiplicity: f64,
    variable_labels: Vec<String>,
    grid: Arc<Grid>,
    properties: PropertySlots,
}

impl Configuration {
    /// Create a new configuration without properties.
    pub fn new(
        name: impl Into<String>,
        structure: Option<String>,
        multiplicity: f64,
        variable_labels: Vec<String>,
        grid: Arc<Grid>,
    ) -> ZentropyResult<Self> {
        let name = name.into();
        if !multiplicity.is_finite() || multiplicity <= 0.0 {
            return Err(ZentropyError::InvalidMultiplicity(name, multiplicity));
        }
        if variable_labels.len() != grid.ndim() {
            return Err(ZentropyError::DimensionMismatch(
                name,
                variable_labels.len(),
                grid.ndim(),
            ));
        }
        Ok(Self {
            name,
            structure,
            multiplicity,
            variable_labels,
            grid,
            properties: PropertySlots::default(),
        })
    }

    /// Store a property. Its variable labels and grid must match the
    /// configuration's; dependent fields are not re-derived.
    pub fn set(&mut self, kind: PropertyKind, property: Property) -> ZentropyResult<()> {
        if property.variable_labels() != self.variable_labels {
            return Err(ZentropyError::LabelMismatch(
                kind.label().to_owned(),
                property.variable_labels().to_vec(),
                self.variable_labels.clone(),
            ));
        }
        if let Property::Tabulated(table) = &property {
            if table.grid().as_ref() != self.grid.as_ref() {
                return Err(ZentropyError::GridMismatch(
                    kind.label().to_owned(),
                    self.name.clone(),
                ));
            }
        }
        *self.properties.slot_mut(kind) = Some(property);
        Ok(())
    }

    /// Store a property, by value.
    pub fn with(
        mut self,
        kind: PropertyKind,
        property: impl Into<Property>,
    ) -> ZentropyResult<Self> {
        self.set(kind, property.into())?;
        Ok(self)
    }

    /// The stored property, if present. No derivation is applied.
    pub fn get(&self, kind: PropertyKind) -> Option<&Property> {
        self.properties.get(kind)
    }

    /// The property, derived from $U = F + TS$ if it is one of the three
    /// energetic quantities and the other two are stored.
    pub fn property(&self, kind: PropertyKind) -> ZentropyResult<Property> {
        if let Some(property) = self.properties.get(kind) {
            return Ok(property.clone());
        }
        match kind {
            PropertyKind::InternalEnergy
            | PropertyKind::Entropy
            | PropertyKind::HelmholtzEnergy => self.derive(kind),
            _ => Err(self.missing(kind)),
        }
    }

    /// Internal energy $U$, derived as $U = F + TS$ if absent.
    pub fn internal_energy(&self) -> ZentropyResult<Property> {
        self.property(PropertyKind::InternalEnergy)
    }

    /// Entropy $S$, derived as $S = (U - F)/T$ if absent (0 where $T = 0$).
    pub fn entropy(&self) -> ZentropyResult<Property> {
        self.property(PropertyKind::Entropy)
    }

    /// Helmholtz energy $F$, derived as $F = U - TS$ if absent.
    pub fn helmholtz_energy(&self) -> ZentropyResult<Property> {
        self.property(PropertyKind::HelmholtzEnergy)
    }

    /// Isochoric heat capacity $C_V$.
    pub fn heat_capacity(&self) -> ZentropyResult<Property> {
        self.property(PropertyKind::HeatCapacity)
    }

    /// Bulk modulus $B$.
    pub fn bulk_modulus(&self) -> ZentropyResult<Property> {
        self.property(PropertyKind::BulkModulus)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque reference to the atomic structure; not interpreted here.
    pub fn structure(&self) -> Option<&str> {
        self.structure.as_deref()
    }

    /// Degeneracy weight $w_k$ in the partition function.
    pub fn multiplicity(&self) -> f64 {
        self.multiplicity
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// The property as a table on the configuration's grid.
    pub(crate) fn tabulated(&self, kind: PropertyKind) -> ZentropyResult<TabulatedProperty> {
        self.property(kind)?.tabulate(&self.grid)
    }

    fn missing(&self, kind: PropertyKind) -> ZentropyError {
        ZentropyError::MissingProperty(self.name.clone(), kind.label().to_owned())
    }

    fn temperature_axis(&self) -> ZentropyResult<usize> {
        self.variable_labels
            .iter()
            .position(|label| label == TEMPERATURE)
            .ok_or_else(|| {
                ZentropyError::MissingVariable(
                    TEMPERATURE.to_owned(),
                    self.variable_labels.clone(),
                )
            })
    }

    fn stored_tabulated(&self, kind: PropertyKind, requested: PropertyKind) -> ZentropyResult<TabulatedProperty> {
        self.properties
            .get(kind)
            .ok_or_else(|| self.missing(requested))?
            .tabulate(&self.grid)
    }

    fn derive(&self, kind: PropertyKind) -> ZentropyResult<Property> {
        let temperature = self.grid.axis_field(self.temperature_axis()?);
        let values = match kind {
            PropertyKind::HelmholtzEnergy => {
                let u = self.stored_tabulated(PropertyKind::InternalEnergy, kind)?;
                let s = self.stored_tabulated(PropertyKind::Entropy, kind)?;
                u.values() - &(temperature * s.values())
            }
            PropertyKind::InternalEnergy => {
                let f = self.stored_tabulated(PropertyKind::HelmholtzEnergy, kind)?;
                let s = self.stored_tabulated(PropertyKind::Entropy, kind)?;
                f.values() + &(temperature * s.values())
            }
            PropertyKind::Entropy => {
                let u = self.stored_tabulated(PropertyKind::InternalEnergy, kind)?;
                let f = self.stored_tabulated(PropertyKind::HelmholtzEnergy, kind)?;
                let mut values = ArrayD::zeros(temperature.raw_dim());
                Zip::from(&mut values)
                    .and(u.values())
                    .and(f.values())
                    .and(&temperature)
                    .for_each(|s, &u, &f, &t| {
                        *s = if t > 0.0 { (u - f) / t } else { 0.0 };
                    });
                values
            }
            _ => unreachable!(),
        };
        Ok(Property::Tabulated(TabulatedProperty::new(
            self.variable_labels.clone(),
            kind.label(),
            self.grid.clone(),
            values,
        )?))
    }
}
