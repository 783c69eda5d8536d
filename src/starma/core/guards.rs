//! Variance guards for STARMA-GARCH likelihood evaluation.
//!
//! Purpose
//! -------
//! Provide a small, validated container of lower/upper bounds that keep the
//! conditional variance `h_t` inside a safe numeric range while the optimizer
//! explores parameter space.
//!
//! Key behaviors
//! -------------
//! - [`VarianceGuards::new`] enforces `0 < min < max` with finite bounds and
//!   returns `StarmaError::InvalidVarianceGuards` otherwise.
//! - [`VarianceGuards::clamp`] applies the bounds and reports whether the
//!   value was moved, so derivative recursions can zero the sensitivity of a
//!   clamped entry.
//!
//! Conventions
//! -----------
//! - Guards apply to likelihood evaluation only. The simulator never clamps:
//!   explosive parameters produce diverging paths.
//! - Bounds are in squared data units.
use crate::starma::errors::{StarmaError, StarmaResult};

/// Default lower bound on `h_t`.
pub const DEFAULT_VARIANCE_MIN: f64 = 1e-10;

/// Default upper bound on `h_t`.
pub const DEFAULT_VARIANCE_MAX: f64 = 1e12;

/// VarianceGuards: lower/upper bounds for the conditional-variance recursion.
///
/// Fields
/// ------
/// - `min`: `f64`
///   Lower bound (strictly > 0) so `ln h_t` and `ε²/h_t` stay defined.
/// - `max`: `f64`
///   Upper bound (strictly > `min`) to stop overflow when the optimizer tries
///   explosive coefficients.
///
/// Invariants
/// ----------
/// - `0.0 < min < max`, both finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceGuards {
    pub min: f64,
    pub max: f64,
}

impl VarianceGuards {
    /// Construct validated bounds from a `(min, max)` tuple.
    ///
    /// Errors
    /// ------
    /// - `StarmaError::InvalidVarianceGuards` when `min >= max`, either bound
    ///   is non-finite, or `min <= 0`.
    pub fn new(value: (f64, f64)) -> StarmaResult<Self> {
        let (min, max) = value;
        if !min.is_finite() || !max.is_finite() {
            return Err(StarmaError::InvalidVarianceGuards {
                min,
                max,
                reason: "Variance guards must be finite.",
            });
        }
        if min >= max {
            return Err(StarmaError::InvalidVarianceGuards {
                min,
                max,
                reason: "Variance guards must have min < max.",
            });
        }
        if min <= 0.0 {
            return Err(StarmaError::InvalidVarianceGuards {
                min,
                max,
                reason: "Variance guards must be strictly positive.",
            });
        }
        Ok(VarianceGuards { min, max })
    }

    /// Clamp `h` into `[min, max]`, returning the clamped value and whether
    /// the bound was active. NaN is mapped to `max` and reported as clamped.
    #[inline]
    pub fn clamp(&self, h: f64) -> (f64, bool) {
        if h.is_nan() || h > self.max {
            (self.max, true)
        } else if h < self.min {
            (self.min, true)
        } else {
            (h, false)
        }
    }
}

impl Default for VarianceGuards {
    fn default() -> Self {
        VarianceGuards { min: DEFAULT_VARIANCE_MIN, max: DEFAULT_VARIANCE_MAX }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation in `VarianceGuards::new`.
    // - Clamping behavior, including NaN input.
    //
    // They intentionally DO NOT cover:
    // - How guards interact with the likelihood recursion (see `recursion`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify valid bounds construct and invalid ones are rejected.
    //
    // Given
    // -----
    // - (1e-6, 1e6) valid; (1, 1), (0, 10) and (1, inf) invalid.
    //
    // Expect
    // ------
    // - `Ok` for the first, `InvalidVarianceGuards` for the rest.
    fn new_validates_bounds() {
        // Act
        let ok = VarianceGuards::new((1e-6, 1e6)).expect("valid guards");

        // Assert
        assert_eq!((ok.min, ok.max), (1e-6, 1e6));
        for bad in [(1.0, 1.0), (0.0, 10.0), (1.0, f64::INFINITY)] {
            match VarianceGuards::new(bad) {
                Err(StarmaError::InvalidVarianceGuards { min, max, .. }) => {
                    assert_eq!((min, max), bad);
                }
                other => panic!("expected InvalidVarianceGuards for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Check `clamp` reports whether a bound was active.
    //
    // Given
    // -----
    // - Guards (0.1, 10) and inputs 0.01, 5, 50, NaN.
    //
    // Expect
    // ------
    // - (0.1, true), (5, false), (10, true), (10, true).
    fn clamp_reports_active_bounds() {
        // Arrange
        let g = VarianceGuards::new((0.1, 10.0)).expect("valid guards");

        // Act / Assert
        assert_eq!(g.clamp(0.01), (0.1, true));
        assert_eq!(g.clamp(5.0), (5.0, false));
        assert_eq!(g.clamp(50.0), (10.0, true));
        assert_eq!(g.clamp(f64::NAN), (10.0, true));
        assert!(VarianceGuards::default().min > 0.0);
    }
}
