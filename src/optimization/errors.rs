use argmin::core::{ArgminError, Error};

use crate::starma::errors::{ParamError, StarmaError};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Derivatives ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Implies that the FD Hessian of the cost should be used
    HessianNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Finite Diffs ----
    /// Hessian matrix dimensions do not match parameter dimensions.
    HessianDimMismatch {
        expected: usize,
        found: (usize, usize),
    },

    /// Hessian values need to be finite.
    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Param Errors ----
    /// Free-parameter vector has the wrong length for the resolved mask.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Unconstrained optimization input must have finite values.
    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    /// A model-space parameter entry is not finite.
    NonFiniteParameter {
        key: String,
        value: f64,
    },

    // ---- Model Errors ----
    /// Variance recursion produced a non-finite value.
    NonFiniteVariance {
        t: usize,
        location: usize,
        value: f64,
    },

    /// Model data and likelihood bundle disagree on a dimension.
    DataDimMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Any other model-layer failure, carried as text.
    ModelFailure {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Derivatives ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::HessianNotImplemented => {
                write!(f, "Analytic Hessian not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Finite Diffs ----
            OptError::HessianDimMismatch { expected, found } => {
                write!(
                    f,
                    "Hessian dimension mismatch: expected ({expected}, {expected}), found {found:?}"
                )
            }
            OptError::InvalidHessian { row, col, value } => {
                write!(f, "Invalid Hessian at ({row}, {col}): {value}, must be finite")
            }

            // ---- Param Errors ----
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }
            OptError::NonFiniteParameter { key, value } => {
                write!(f, "Parameter {key} must be finite, got {value}")
            }

            // ---- Model Errors ----
            OptError::NonFiniteVariance { t, location, value } => {
                write!(
                    f,
                    "Conditional variance at time {t}, location {location} is non-finite: {value}"
                )
            }
            OptError::DataDimMismatch { what, expected, actual } => {
                write!(f, "Data dimension mismatch for {what}: expected {expected}, got {actual}")
            }
            OptError::ModelFailure { text } => {
                write!(f, "Model failure: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast::<ArgminError>() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => match err.downcast::<OptError>() {
                Ok(inner) => inner,
                Err(err) => OptError::BackendError { text: err.to_string() },
            },
        }
    }
}

impl From<ParamError> for OptError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::ThetaLengthMismatch { expected, actual } => {
                OptError::ThetaLengthMismatch { expected, actual }
            }
            ParamError::InvalidThetaInput { index, value } => {
                OptError::InvalidThetaInput { index, value }
            }
            ParamError::NonFiniteEntry { key, value } => {
                OptError::NonFiniteParameter { key: key.to_string(), value }
            }
            other => OptError::ModelFailure { text: other.to_string() },
        }
    }
}

impl From<StarmaError> for OptError {
    fn from(err: StarmaError) -> Self {
        match err {
            StarmaError::NonFiniteVariance { t, location, value } => {
                OptError::NonFiniteVariance { t, location, value }
            }
            StarmaError::DimensionMismatch { what, expected, actual } => {
                OptError::DataDimMismatch { what, expected, actual }
            }
            StarmaError::Param(inner) => inner.into(),
            other => OptError::ModelFailure { text: other.to_string() },
        }
    }
}
