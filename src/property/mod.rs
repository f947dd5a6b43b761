//! Thermodynamic quantities defined over a lattice of state variables.
//!
//! A [Property] is either given in closed form ([AnalyticalProperty]) or as a
//! sampled table on a [Grid] ([TabulatedProperty]). Both variants evaluate at
//! a point; only tabulated properties can be differentiated, by central
//! finite differences on the existing grid.

mod derivative;
mod interpolation;

use crate::errors::{ZentropyError, ZentropyResult};
use crate::grid::Grid;
use derivative::gradient;
use interpolation::multilinear;
pub(crate) use interpolation::{invert_monotonic, linear, monotonicity};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Interpolation method of a tabulated property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Multilinear interpolation between neighboring lattice points.
    #[default]
    Multilinear,
}

/// Behavior when a tabulated property is evaluated outside of its grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Fail with [ZentropyError::OutOfBounds].
    #[default]
    Error,
    /// Return NaN.
    Nan,
}

/// A thermodynamic quantity over a fixed, ordered set of independent
/// variables.
#[derive(Clone, Debug)]
pub enum Property {
    /// A closed-form function of the state variables.
    Analytical(AnalyticalProperty),
    /// A table sampled on a grid.
    Tabulated(TabulatedProperty),
}

impl Property {
    /// Labels of the independent variables, in axis order.
    pub fn variable_labels(&self) -> &[String] {
        match self {
            Self::Analytical(p) => &p.variable_labels,
            Self::Tabulated(p) => &p.variable_labels,
        }
    }

    /// Name of the quantity.
    pub fn property_label(&self) -> &str {
        match self {
            Self::Analytical(p) => &p.property_label,
            Self::Tabulated(p) => &p.property_label,
        }
    }

    /// Evaluate the quantity at a point with one coordinate per variable.
    pub fn value_at(&self, point: &[f64]) -> ZentropyResult<f64> {
        match self {
            Self::Analytical(p) => p.value_at(point),
            Self::Tabulated(p) => p.value_at(point),
        }
    }

    /// Partial derivative with respect to the variable at `axis`.
    pub fn partial_derivative(&self, axis: usize) -> ZentropyResult<Property> {
        match self {
            Self::Analytical(_) => Err(ZentropyError::NotImplemented(String::from(
                "differentiation of an analytical property",
            ))),
            Self::Tabulated(p) => Ok(Property::Tabulated(p.partial_derivative(axis)?)),
        }
    }

    /// Location of the minimum. Reserved; no search is in scope.
    pub fn minimum(&self) -> ZentropyResult<Vec<f64>> {
        Err(ZentropyError::NotImplemented(String::from(
            "Property::minimum",
        )))
    }

    /// Representation of the quantity as a table on `grid`.
    ///
    /// Analytical properties are sampled; tabulated properties must already
    /// live on `grid` and are returned as they are.
    pub fn tabulate(&self, grid: &Arc<Grid>) -> ZentropyResult<TabulatedProperty> {
        match self {
            Self::Analytical(p) => p.tabulate(grid),
            Self::Tabulated(p) => {
                if p.grid.as_ref() != grid.as_ref() {
                    Err(ZentropyError::GridMismatch(
                        p.property_label.clone(),
                        String::from("the shared grid"),
                    ))
                } else {
                    Ok(p.clone())
                }
            }
        }
    }
}

impl From<AnalyticalProperty> for Property {
    fn from(property: AnalyticalProperty) -> Self {
        Self::Analytical(property)
    }
}

impl From<TabulatedProperty> for Property {
    fn from(property: TabulatedProperty) -> Self {
        Self::Tabulated(property)
    }
}

/// A quantity given as a closed-form function of the state variables.
#[derive(Clone)]
pub struct AnalyticalProperty {
    variable_labels: Vec<String>,
    property_label: String,
    function: Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl fmt::Debug for AnalyticalProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticalProperty")
            .field("variable_labels", &self.variable_labels)
            .field("property_label", &self.property_label)
            .finish()
    }
}

impl AnalyticalProperty {
    /// Create a new analytical property from a function of the state
    /// variables, passed as one coordinate per variable label.
    pub fn new<F: Fn(&[f64]) -> f64 + Send + Sync + 'static>(
        variable_labels: Vec<String>,
        property_label: impl Into<String>,
        function: F,
    ) -> Self {
        Self {
            variable_labels,
            property_label: property_label.into(),
            function: Arc::new(function),
        }
    }

    /// Evaluate the function at a point.
    pub fn value_at(&self, point: &[f64]) -> ZentropyResult<f64> {
        if point.len() != self.variable_labels.len() {
            return Err(ZentropyError::PointDimension(
                self.variable_labels.len(),
                point.len(),
            ));
        }
        Ok((self.function)(point))
    }

    /// Sample the function on a grid.
    pub fn tabulate(&self, grid: &Arc<Grid>) -> ZentropyResult<TabulatedProperty> {
        if grid.ndim() != self.variable_labels.len() {
            return Err(ZentropyError::DimensionMismatch(
                self.property_label.clone(),
                self.variable_labels.len(),
                grid.ndim(),
            ));
        }
        let shape = grid.shape();
        let mut point = vec![0.0; shape.len()];
        let values = ArrayD::from_shape_fn(ndarray::IxDyn(&shape), |idx| {
            for (d, x) in point.iter_mut().enumerate() {
                *x = grid.axis(d)[idx[d]];
            }
            (self.function)(&point)
        });
        TabulatedProperty::new(
            self.variable_labels.clone(),
            self.property_label.clone(),
            grid.clone(),
            values,
        )
    }
}

/// A quantity sampled on a rectilinear grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabulatedProperty {
    variable_labels: Vec<String>,
    property_label: String,
    grid: Arc<Grid>,
    values: ArrayD<f64>,
    #[serde(default)]
    interpolation: Interpolation,
    #[serde(default)]
    bounds: BoundsPolicy,
}

impl TabulatedProperty {
    /// Create a new tabulated property.
    ///
    /// The shape of `values` must equal the grid shape and one variable
    /// label must be given per grid axis.
    pub fn new(
        variable_labels: Vec<String>,
        property_label: impl Into<String>,
        grid: Arc<Grid>,
        values: ArrayD<f64>,
    ) -> ZentropyResult<Self> {
        let property_label = property_label.into();
        if variable_labels.len() != grid.ndim() {
            return Err(ZentropyError::DimensionMismatch(
                property_label,
                variable_labels.len(),
                grid.ndim(),
            ));
        }
        if values.shape() != grid.shape() {
            return Err(ZentropyError::ShapeMismatch {
                values: values.shape().to_vec(),
                grid: grid.shape(),
            });
        }
        Ok(Self {
            variable_labels,
            property_label,
            grid,
            values,
            interpolation: Interpolation::default(),
            bounds: BoundsPolicy::default(),
        })
    }

    /// Replace the out-of-bounds policy.
    pub fn with_bounds_policy(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    /// Replace the interpolation method.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Labels of the independent variables, in axis order.
    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    /// Name of the quantity.
    pub fn property_label(&self) -> &str {
        &self.property_label
    }

    /// The grid the values are sampled on.
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// The sampled values, aligned with the grid shape.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// The out-of-bounds policy.
    pub fn bounds_policy(&self) -> BoundsPolicy {
        self.bounds
    }

    /// The interpolation method.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Interpolate the table at a point with one coordinate per variable.
    pub fn value_at(&self, point: &[f64]) -> ZentropyResult<f64> {
        if point.len() != self.variable_labels.len() {
            return Err(ZentropyError::PointDimension(
                self.variable_labels.len(),
                point.len(),
            ));
        }
        match multilinear(&self.grid, &self.values, point) {
            Some(value) => Ok(value),
            None => match self.bounds {
                BoundsPolicy::Error => Err(ZentropyError::OutOfBounds(point.to_vec())),
                BoundsPolicy::Nan => Ok(f64::NAN),
            },
        }
    }

    /// Partial derivative with respect to the variable at `axis`, as a new
    /// table on the same grid.
    pub fn partial_derivative(&self, axis: usize) -> ZentropyResult<TabulatedProperty> {
        if axis >= self.grid.ndim() {
            return Err(ZentropyError::Error(format!(
                "axis index {} out of range for a {}-dimensional grid",
                axis,
                self.grid.ndim()
            )));
        }
        let label = &self.variable_labels[axis];
        let values = gradient(self.grid.axis(axis), &self.values, axis, label)?;
        Ok(self.with_values(format!("d({})/d({})", self.property_label, label), values))
    }

    /// Location of the minimum. Reserved; no search is in scope.
    pub fn minimum(&self) -> ZentropyResult<Vec<f64>> {
        Err(ZentropyError::NotImplemented(String::from(
            "TabulatedProperty::minimum",
        )))
    }

    /// The sampled values, consuming the table.
    pub(crate) fn into_values(self) -> ArrayD<f64> {
        self.values
    }

    /// New table on the same grid with the same policies but different
    /// values.
    pub(crate) fn with_values(
        &self,
        property_label: impl Into<String>,
        values: ArrayD<f64>,
    ) -> TabulatedProperty {
        debug_assert_eq!(values.shape(), self.grid.shape());
        Self {
            variable_labels: self.variable_labels.clone(),
            property_label: property_label.into(),
            grid: self.grid.clone(),
            values,
            interpolation: self.interpolation,
            bounds: self.bounds,
        }
    }
}
