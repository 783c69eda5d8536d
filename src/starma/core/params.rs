//! STARMA-GARCH parameter container and entry addressing.
//!
//! This module provides the **model-space** parameter set [`ParameterSet`]
//! and the keys used to address its entries one at a time ([`ParamKey`]) or
//! a whole block at a time ([`ParamBlock`]).
//!
//! ## Layout
//! - `mu`, `omega`: scalars.
//! - `phi`, `theta`, `alpha`, `beta`: `Array2<f64>` with **rows = spatial
//!   lag** (row 0 is the location itself) and **columns = temporal lag**
//!   (column 0 is lag 1).
//! - A block with zero rows or zero columns switches its term off; its
//!   spatial and temporal orders are then both 0.
//!
//! ## Canonical order
//! [`ParameterSet::keys`] lists entries as
//! `mu, phi, theta, omega, alpha, beta`, each matrix block column-major
//! (temporal lag outer, spatial lag inner). Every flattened view in the
//! crate (free-parameter vectors, coefficient tables) follows this order.
use crate::starma::errors::{ParamError, ParamResult};
use ndarray::Array2;

/// A whole parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamBlock {
    Mu,
    Phi,
    Theta,
    Omega,
    Alpha,
    Beta,
}

impl ParamBlock {
    /// All blocks in canonical order.
    pub const ALL: [ParamBlock; 6] = [
        ParamBlock::Mu,
        ParamBlock::Phi,
        ParamBlock::Theta,
        ParamBlock::Omega,
        ParamBlock::Alpha,
        ParamBlock::Beta,
    ];

    /// `true` for the variance blocks that must stay strictly positive.
    pub fn is_positive(self) -> bool {
        matches!(self, ParamBlock::Omega | ParamBlock::Alpha | ParamBlock::Beta)
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, ParamBlock::Mu | ParamBlock::Omega)
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamBlock::Mu => "mu",
            ParamBlock::Phi => "phi",
            ParamBlock::Theta => "theta",
            ParamBlock::Omega => "omega",
            ParamBlock::Alpha => "alpha",
            ParamBlock::Beta => "beta",
        }
    }
}

impl std::fmt::Display for ParamBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Address of a single parameter entry.
///
/// For matrix blocks, `spatial` is the 0-based spatial lag (row) and
/// `temporal` the 1-based temporal lag, so `Phi { spatial: 0, temporal: 1 }`
/// is the own-location AR coefficient at lag 1 and lives at `phi[[0, 0]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    Mu,
    Phi { spatial: usize, temporal: usize },
    Theta { spatial: usize, temporal: usize },
    Omega,
    Alpha { spatial: usize, temporal: usize },
    Beta { spatial: usize, temporal: usize },
}

impl ParamKey {
    pub fn block(&self) -> ParamBlock {
        match self {
            ParamKey::Mu => ParamBlock::Mu,
            ParamKey::Phi { .. } => ParamBlock::Phi,
            ParamKey::Theta { .. } => ParamBlock::Theta,
            ParamKey::Omega => ParamBlock::Omega,
            ParamKey::Alpha { .. } => ParamBlock::Alpha,
            ParamKey::Beta { .. } => ParamBlock::Beta,
        }
    }

    /// `(spatial, temporal)` for matrix entries, `None` for scalars.
    pub fn lags(&self) -> Option<(usize, usize)> {
        match *self {
            ParamKey::Mu | ParamKey::Omega => None,
            ParamKey::Phi { spatial, temporal }
            | ParamKey::Theta { spatial, temporal }
            | ParamKey::Alpha { spatial, temporal }
            | ParamKey::Beta { spatial, temporal } => Some((spatial, temporal)),
        }
    }

    fn matrix_key(block: ParamBlock, spatial: usize, temporal: usize) -> ParamKey {
        match block {
            ParamBlock::Phi => ParamKey::Phi { spatial, temporal },
            ParamBlock::Theta => ParamKey::Theta { spatial, temporal },
            ParamBlock::Alpha => ParamKey::Alpha { spatial, temporal },
            ParamBlock::Beta => ParamKey::Beta { spatial, temporal },
            ParamBlock::Mu => ParamKey::Mu,
            ParamBlock::Omega => ParamKey::Omega,
        }
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lags() {
            None => write!(f, "{}", self.block()),
            Some((l, j)) => write!(f, "{}[{l},{j}]", self.block()),
        }
    }
}

/// Model-space STARMA-GARCH parameters.
///
/// Only finiteness is validated; positivity of the variance blocks is the
/// caller's responsibility for simulation and is enforced by the softplus
/// map during estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub mu: f64,
    pub phi: Array2<f64>,
    pub theta: Array2<f64>,
    pub omega: f64,
    pub alpha: Array2<f64>,
    pub beta: Array2<f64>,
}

impl ParameterSet {
    /// Create a validated parameter set.
    ///
    /// # Errors
    /// - [`ParamError::NonFiniteEntry`] naming the first NaN/±inf entry.
    pub fn new(
        mu: f64, phi: Array2<f64>, theta: Array2<f64>, omega: f64, alpha: Array2<f64>,
        beta: Array2<f64>,
    ) -> ParamResult<Self> {
        let params = ParameterSet { mu, phi, theta, omega, alpha, beta };
        for key in params.keys() {
            let value = params.value_unchecked(key);
            if !value.is_finite() {
                return Err(ParamError::NonFiniteEntry { key, value });
            }
        }
        Ok(params)
    }

    /// Temporal orders `(p, q, r, s)` of the `phi`, `theta`, `alpha` and
    /// `beta` blocks.
    pub fn orders(&self) -> (usize, usize, usize, usize) {
        (
            temporal_order(&self.phi),
            temporal_order(&self.theta),
            temporal_order(&self.alpha),
            temporal_order(&self.beta),
        )
    }

    /// Longest temporal lag, `max(p, q, r, s)`. This is also the number of
    /// leading time steps the conditional likelihood conditions on.
    pub fn max_temporal_lag(&self) -> usize {
        let (p, q, r, s) = self.orders();
        p.max(q).max(r).max(s)
    }

    /// Number of spatial lags (including lag 0) any active block reaches.
    /// A neighborhood stack must be at least this long.
    pub fn max_spatial_order(&self) -> usize {
        [&self.phi, &self.theta, &self.alpha, &self.beta]
            .into_iter()
            .map(spatial_order)
            .max()
            .unwrap_or(0)
    }

    pub fn block_shape(&self, block: ParamBlock) -> (usize, usize) {
        match self.matrix(block) {
            Some(m) => m.dim(),
            None => (1, 1),
        }
    }

    pub fn matrix(&self, block: ParamBlock) -> Option<&Array2<f64>> {
        match block {
            ParamBlock::Phi => Some(&self.phi),
            ParamBlock::Theta => Some(&self.theta),
            ParamBlock::Alpha => Some(&self.alpha),
            ParamBlock::Beta => Some(&self.beta),
            ParamBlock::Mu | ParamBlock::Omega => None,
        }
    }

    /// Keys of one block in canonical order.
    pub fn block_keys(&self, block: ParamBlock) -> Vec<ParamKey> {
        match self.matrix(block) {
            None => vec![ParamKey::matrix_key(block, 0, 0)],
            Some(m) => {
                let (rows, cols) = m.dim();
                (0..cols)
                    .flat_map(|j| {
                        (0..rows).map(move |l| ParamKey::matrix_key(block, l, j + 1))
                    })
                    .collect()
            }
        }
    }

    /// All keys in canonical order.
    pub fn keys(&self) -> Vec<ParamKey> {
        ParamBlock::ALL.iter().flat_map(|&b| self.block_keys(b)).collect()
    }

    pub fn n_params(&self) -> usize {
        self.keys().len()
    }

    pub fn contains(&self, key: ParamKey) -> bool {
        self.position(key).is_some()
    }

    /// Read one entry.
    ///
    /// # Errors
    /// - [`ParamError::KeyOutOfLayout`] when the key is outside the block
    ///   shape (or has temporal lag 0).
    pub fn get(&self, key: ParamKey) -> ParamResult<f64> {
        match key {
            ParamKey::Mu => Ok(self.mu),
            ParamKey::Omega => Ok(self.omega),
            _ => {
                let idx = self.position(key).ok_or(ParamError::KeyOutOfLayout { key })?;
                let m = self.matrix(key.block()).ok_or(ParamError::KeyOutOfLayout { key })?;
                Ok(m[idx])
            }
        }
    }

    /// Overwrite one entry.
    ///
    /// # Errors
    /// - [`ParamError::KeyOutOfLayout`] for keys outside the layout.
    /// - [`ParamError::NonFiniteEntry`] for NaN/±inf values.
    pub fn set(&mut self, key: ParamKey, value: f64) -> ParamResult<()> {
        if !value.is_finite() {
            return Err(ParamError::NonFiniteEntry { key, value });
        }
        let idx = self.position(key).ok_or(ParamError::KeyOutOfLayout { key })?;
        match key {
            ParamKey::Mu => self.mu = value,
            ParamKey::Omega => self.omega = value,
            ParamKey::Phi { .. } => self.phi[idx] = value,
            ParamKey::Theta { .. } => self.theta[idx] = value,
            ParamKey::Alpha { .. } => self.alpha[idx] = value,
            ParamKey::Beta { .. } => self.beta[idx] = value,
        }
        Ok(())
    }

    /// `[row, col]` index of a key inside its block (`[0, 0]` for scalars).
    fn position(&self, key: ParamKey) -> Option<[usize; 2]> {
        match key.lags() {
            None => Some([0, 0]),
            Some((l, j)) => {
                let (rows, cols) = self.block_shape(key.block());
                (j >= 1 && l < rows && j <= cols).then_some([l, j - 1])
            }
        }
    }

    /// Read a key produced by [`ParameterSet::keys`].
    pub(crate) fn value_unchecked(&self, key: ParamKey) -> f64 {
        match key {
            ParamKey::Mu => self.mu,
            ParamKey::Omega => self.omega,
            ParamKey::Phi { spatial, temporal } => self.phi[[spatial, temporal - 1]],
            ParamKey::Theta { spatial, temporal } => self.theta[[spatial, temporal - 1]],
            ParamKey::Alpha { spatial, temporal } => self.alpha[[spatial, temporal - 1]],
            ParamKey::Beta { spatial, temporal } => self.beta[[spatial, temporal - 1]],
        }
    }
}

/// Temporal lags reached by a block (0 when the block is switched off).
pub(crate) fn temporal_order(m: &Array2<f64>) -> usize {
    if m.nrows() == 0 { 0 } else { m.ncols() }
}

/// Spatial lags reached by a block (0 when the block is switched off).
pub(crate) fn spatial_order(m: &Array2<f64>) -> usize {
    if m.ncols() == 0 { 0 } else { m.nrows() }
}
