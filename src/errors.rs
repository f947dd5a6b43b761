use crate::record::RecordError;
use thiserror::Error;

/// Error type for invalid property tables and ensemble aggregation.
#[derive(Error, Debug)]
pub enum ZentropyError {
    #[error("{0}")]
    Error(String),
    #[error("Grid axis {0} is empty.")]
    EmptyAxis(usize),
    #[error("Grid axis {0} is not strictly monotonically increasing.")]
    NonMonotonicAxis(usize),
    #[error("Property values have shape {values:?} while the grid implies {grid:?}.")]
    ShapeMismatch { values: Vec<usize>, grid: Vec<usize> },
    #[error("`{0}` declares {1} variable label(s) for a {2}-dimensional grid.")]
    DimensionMismatch(String, usize, usize),
    #[error("Expected a point with {0} coordinate(s), got {1}.")]
    PointDimension(usize, usize),
    #[error("`{0}` and `{1}` are defined on different grids.")]
    GridMismatch(String, String),
    #[error("`{0}` is defined over the variables {1:?} instead of {2:?}.")]
    LabelMismatch(String, Vec<String>, Vec<String>),
    #[error("The variable `{0}` is required but the independent variables are {1:?}.")]
    MissingVariable(String, Vec<String>),
    #[error("The point {0:?} lies outside of the tabulated domain.")]
    OutOfBounds(Vec<f64>),
    #[error("Configuration `{0}` neither defines `{1}` nor allows it to be derived.")]
    MissingProperty(String, String),
    #[error("The ensemble already contains a configuration named `{0}`.")]
    DuplicateConfiguration(String),
    #[error("There is no configuration named `{0}`.")]
    UnknownConfiguration(String),
    #[error("Ensemble `{0}` contains no configurations.")]
    EmptyEnsemble(String),
    #[error("Configuration `{0}` has a non-positive multiplicity ({1}).")]
    InvalidMultiplicity(String, f64),
    #[error("The variable labels {0:?} do not form a supported ensemble.")]
    UnsupportedVariables(Vec<String>),
    #[error("Differentiation along `{0}` requires at least two grid points.")]
    InsufficientGridPoints(String),
    #[error("The `{0}` isotherm at T = {1} K is not strictly monotonic.")]
    NonMonotonicIsotherm(String, f64),
    #[error("`{0}` is not implemented.")]
    NotImplemented(String),
    #[error(transparent)]
    RecordError(#[from] RecordError),
}

/// Convenience type for `Result<T, ZentropyError>`.
pub type ZentropyResult<T> = Result<T, ZentropyError>;
