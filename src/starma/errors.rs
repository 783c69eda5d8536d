//! Errors for STARMA-GARCH models (grid / stack construction, data and
//! parameter validation, masking, and optimizer / inference failures).
//!
//! This module defines the model error type, [`StarmaError`], and the
//! parameter error type, [`ParamError`]. Both implement `Display`/`Error`.
//!
//! ## Conventions
//! - **Indices are 0-based.** Locations follow the grid's linear index
//!   (first dimension fastest); time indices count columns of the series.
//! - Shape and dimension problems are raised at construction time and are
//!   fatal. Optimizer trouble after a successful run is reported through the
//!   fit result, not through these types.
//! - Optimizer/backend errors that abort a fit are normalized to
//!   [`StarmaError::OptimizationFailed`] with a human-readable status.
use crate::{
    inference::errors::InferenceError,
    optimization::errors::OptError,
    starma::core::params::ParamKey,
};

/// Result alias for STARMA-GARCH operations that may produce [`StarmaError`].
pub type StarmaResult<T> = Result<T, StarmaError>;

/// Result alias for parameter construction / mapping paths.
pub type ParamResult<T> = Result<T, ParamError>;

/// Unified error type for STARMA-GARCH modeling.
#[derive(Debug, Clone, PartialEq)]
pub enum StarmaError {
    // ---- Grid / neighborhood ----
    /// Grid shape is empty or has a zero extent.
    InvalidGridShape { dims: Vec<usize>, reason: &'static str },

    /// Maximum spatial lag order must be at least 1.
    InvalidSpatialOrder { order: usize },

    /// Topology name did not parse.
    InvalidTopology { name: String },

    // ---- Dimensions ----
    /// Two components disagree on a size (stack length, location count, ...).
    DimensionMismatch { what: &'static str, expected: usize, actual: usize },

    // ---- Input/data validation ----
    /// Series has no locations or no time steps.
    EmptySeries,

    /// A data point is NaN/±inf.
    NonFiniteData { location: usize, t: usize, value: f64 },

    /// Initial conditional variance must be finite and non-negative.
    InvalidInitVariance { index: usize, value: f64 },

    /// Requested simulation length must be positive.
    InvalidSampleLength { n: usize },

    /// Series is too short for the conditioning window of the model.
    InsufficientTimeSteps { needed: usize, actual: usize },

    // ---- Options ----
    /// Variance guards must be finite with 0 < min < max.
    InvalidVarianceGuards { min: f64, max: f64, reason: &'static str },

    // ---- Masking ----
    /// Mask refers to an entry that the parameter layout does not have.
    UnknownMaskKey { key: ParamKey },

    /// Every parameter is fixed; there is nothing to optimize.
    NoFreeParameters,

    // ---- Recursion ----
    /// Variance recursion produced a non-finite value.
    NonFiniteVariance { t: usize, location: usize, value: f64 },

    // ---- Wrapped ----
    /// Parameter construction or mapping failed.
    Param(ParamError),

    /// Optimizer failed; include a human-readable status/reason.
    OptimizationFailed { status: String },

    /// Post-estimation inference failed.
    InferenceFailed { text: String },
}

impl std::error::Error for StarmaError {}

impl std::fmt::Display for StarmaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StarmaError::InvalidGridShape { dims, reason } => {
                write!(f, "Invalid grid shape {dims:?}: {reason}")
            }
            StarmaError::InvalidSpatialOrder { order } => {
                write!(f, "Spatial order must be at least 1, got {order}")
            }
            StarmaError::InvalidTopology { name } => {
                write!(f, "Unknown topology '{name}': valid options are 'rook' or 'queen'")
            }
            StarmaError::DimensionMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, got {actual}")
            }
            StarmaError::EmptySeries => write!(f, "Lattice series is empty"),
            StarmaError::NonFiniteData { location, t, value } => {
                write!(f, "Non-finite data at location {location}, time {t}: {value}")
            }
            StarmaError::InvalidInitVariance { index, value } => {
                write!(
                    f,
                    "Initial variance at location {index} must be finite and >= 0, got {value}"
                )
            }
            StarmaError::InvalidSampleLength { n } => {
                write!(f, "Sample length must be positive, got {n}")
            }
            StarmaError::InsufficientTimeSteps { needed, actual } => {
                write!(f, "Series needs more than {needed} time steps, got {actual}")
            }
            StarmaError::InvalidVarianceGuards { min, max, reason } => {
                write!(f, "Invalid variance guards (min={min}, max={max}): {reason}")
            }
            StarmaError::UnknownMaskKey { key } => {
                write!(f, "Mask entry {key} is not part of the parameter layout")
            }
            StarmaError::NoFreeParameters => {
                write!(f, "All parameters are fixed; nothing to estimate")
            }
            StarmaError::NonFiniteVariance { t, location, value } => {
                write!(
                    f,
                    "Recursion produced non-finite variance at time {t}, location {location}: {value}"
                )
            }
            StarmaError::Param(err) => write!(f, "{err}"),
            StarmaError::OptimizationFailed { status } => {
                write!(f, "Optimizer failed with status: {status}")
            }
            StarmaError::InferenceFailed { text } => {
                write!(f, "Inference failed: {text}")
            }
        }
    }
}

impl From<ParamError> for StarmaError {
    fn from(err: ParamError) -> StarmaError {
        StarmaError::Param(err)
    }
}

impl From<OptError> for StarmaError {
    fn from(err: OptError) -> StarmaError {
        StarmaError::OptimizationFailed { status: err.to_string() }
    }
}

impl From<InferenceError> for StarmaError {
    fn from(err: InferenceError) -> StarmaError {
        StarmaError::InferenceFailed { text: err.to_string() }
    }
}

/// Errors specific to parameter construction and optimizer-space mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Free-parameter vector has the wrong length.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Unconstrained optimization input must have finite values.
    InvalidThetaInput { index: usize, value: f64 },

    /// A model-space parameter entry is NaN/±inf.
    NonFiniteEntry { key: ParamKey, value: f64 },

    /// Key addresses an entry outside the parameter layout.
    KeyOutOfLayout { key: ParamKey },
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, got {actual}")
            }
            ParamError::InvalidThetaInput { index, value } => {
                write!(f, "Theta input at index {index} must be finite, got {value}")
            }
            ParamError::NonFiniteEntry { key, value } => {
                write!(f, "Parameter {key} must be finite, got {value}")
            }
            ParamError::KeyOutOfLayout { key } => {
                write!(f, "Parameter {key} is outside the parameter layout")
            }
        }
    }
}
