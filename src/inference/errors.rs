//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used when turning a
//! fitted optimum into observed information and standard errors. An alias
//! `InferenceResult<T>` standardizes the return type across inference code.
use crate::optimization::errors::OptError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Observed information ----
    /// Neither an analytic nor a finite-difference Hessian could be formed.
    Hessian { text: String },

    /// Information matrix is not square or does not match the parameter count.
    CovarianceDimMismatch { expected: usize, found: (usize, usize) },

    // ---- Fallback ----
    UnknownError,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Hessian { text: err.to_string() }
    }
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::Hessian { text } => {
                write!(f, "Inference Error: could not form observed information ({text})")
            }
            InferenceError::CovarianceDimMismatch { expected, found } => write!(
                f,
                "Inference Error: information matrix must be {expected}x{expected}, got {}x{}",
                found.0, found.1
            ),
            InferenceError::UnknownError => write!(f, "Inference Error: Unknown error occurred"),
        }
    }
}
