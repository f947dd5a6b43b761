use crate::errors::{ZentropyError, ZentropyResult};
use itertools::Itertools;
use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Rectilinear lattice of independent state variables.
///
/// A grid is an ordered tuple of one-dimensional coordinate arrays, one per
/// independent variable. Every axis must be finite and strictly monotonically
/// increasing. Grids are immutable once constructed and are shared by
/// reference between the properties defined on them; combining properties
/// defined on different grids is a validation error, never a silent coercion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    axes: Vec<Array1<f64>>,
}

impl Grid {
    /// Create a new grid from its coordinate axes.
    pub fn new(axes: Vec<Array1<f64>>) -> ZentropyResult<Self> {
        if axes.is_empty() {
            return Err(ZentropyError::Error(String::from(
                "a grid requires at least one axis",
            )));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(ZentropyError::EmptyAxis(i));
            }
            if !axis.iter().all(|x| x.is_finite())
                || !axis.iter().tuple_windows().all(|(a, b)| a < b)
            {
                return Err(ZentropyError::NonMonotonicAxis(i));
            }
        }
        Ok(Self { axes })
    }

    /// The number of independent variables.
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// The number of lattice points along every axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.len()).collect()
    }

    /// Coordinate values of a single axis.
    pub fn axis(&self, index: usize) -> &Array1<f64> {
        &self.axes[index]
    }

    /// All coordinate axes in declaration order.
    pub fn axes(&self) -> &[Array1<f64>] {
        &self.axes
    }

    /// N-dimensional field in which every lattice point carries its own
    /// coordinate along `axis`.
    pub(crate) fn axis_field(&self, axis: usize) -> ArrayD<f64> {
        let shape = self.shape();
        ArrayD::from_shape_fn(IxDyn(&shape), |idx| self.axes[axis][idx[axis]])
    }
}
