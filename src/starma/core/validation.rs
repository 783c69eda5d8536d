//! Construction-time checks shared by the likelihood bundle and simulator.
//!
//! Every check returns a typed [`StarmaError`]; none panics. Shape problems
//! are fatal at construction so the recursions can index without bounds
//! worries.
use crate::starma::{
    core::{data::LatticeSeries, neighborhood::NeighborhoodStack, params::ParameterSet},
    errors::{StarmaError, StarmaResult},
};
use ndarray::ArrayView1;

/// The stack and the series must cover the same locations.
pub fn validate_stack_matches_series(
    stack: &NeighborhoodStack, series: &LatticeSeries,
) -> StarmaResult<()> {
    if stack.n_locations() != series.n_locations() {
        return Err(StarmaError::DimensionMismatch {
            what: "series locations",
            expected: stack.n_locations(),
            actual: series.n_locations(),
        });
    }
    Ok(())
}

/// The stack must reach every spatial lag the parameters use.
pub fn validate_stack_covers(stack: &NeighborhoodStack, params: &ParameterSet) -> StarmaResult<()> {
    let needed = params.max_spatial_order();
    if stack.len() < needed {
        return Err(StarmaError::DimensionMismatch {
            what: "spatial lags in stack",
            expected: needed,
            actual: stack.len(),
        });
    }
    Ok(())
}

/// One finite, non-negative initial variance per location.
pub fn validate_init_variance(init: ArrayView1<f64>, n_locations: usize) -> StarmaResult<()> {
    if init.len() != n_locations {
        return Err(StarmaError::DimensionMismatch {
            what: "initial variance length",
            expected: n_locations,
            actual: init.len(),
        });
    }
    let invalid = init.iter().enumerate().find(|(_, v)| !(v.is_finite() && **v >= 0.0));
    if let Some((index, &value)) = invalid {
        return Err(StarmaError::InvalidInitVariance { index, value });
    }
    Ok(())
}

/// At least one time step must remain after the conditioning window.
pub fn validate_time_steps(series: &LatticeSeries, t0: usize) -> StarmaResult<()> {
    if series.n_steps() <= t0 {
        return Err(StarmaError::InsufficientTimeSteps { needed: t0, actual: series.n_steps() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starma::core::grid::{GridShape, Topology};
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each construction check on its failing input and one passing input.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Exercise every check.
    //
    // Given
    // -----
    // - A 2 × 2 grid (4 locations) with a 1-lag stack, a 3-location series,
    //   short and negative initial variances, and parameters needing 2 lags.
    //
    // Expect
    // ------
    // - The matching error from each check; `Ok` for valid inputs.
    fn checks_report_typed_errors() {
        // Arrange
        let grid = GridShape::new(&[2, 2]).expect("valid grid");
        let stack = NeighborhoodStack::build(&grid, 1, Topology::Rook, false).expect("stack");
        let three = LatticeSeries::new(Array2::zeros((3, 5))).expect("series");
        let four = LatticeSeries::new(Array2::zeros((4, 2))).expect("series");
        let params = ParameterSet::new(
            0.0,
            array![[0.1], [0.1]],
            Array2::zeros((0, 0)),
            1.0,
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
        )
        .expect("valid params");

        // Act / Assert
        assert!(matches!(
            validate_stack_matches_series(&stack, &three),
            Err(StarmaError::DimensionMismatch { expected: 4, actual: 3, .. })
        ));
        assert!(validate_stack_matches_series(&stack, &four).is_ok());
        assert!(matches!(
            validate_stack_covers(&stack, &params),
            Err(StarmaError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            validate_init_variance(array![1.0, 1.0].view(), 4),
            Err(StarmaError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            validate_init_variance(array![1.0, -0.1, 1.0, 0.0].view(), 4),
            Err(StarmaError::InvalidInitVariance { index: 1, .. })
        ));
        assert!(validate_init_variance(array![1.0, 0.0, 2.0, 0.5].view(), 4).is_ok());
        assert_eq!(
            validate_time_steps(&four, 2),
            Err(StarmaError::InsufficientTimeSteps { needed: 2, actual: 2 })
        );
        assert!(validate_time_steps(&four, 1).is_ok());
    }
}
