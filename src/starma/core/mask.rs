//! Parameter masking and the free-parameter map.
//!
//! A [`ParameterMask`] pins selected entries of a [`ParameterSet`] to fixed
//! values; everything it does not mention is estimated. Before optimization
//! the mask is resolved once against the initial parameters into a
//! [`FreeParamMap`], which owns:
//!
//! - the ordered list of free keys (canonical order, fixed keys skipped),
//! - the per-entry transform into optimizer space,
//! - a base parameter set carrying the fixed values.
//!
//! ## Optimizer-space transforms
//! - `mu`, `phi`, `theta`: identity.
//! - `omega`, `alpha`, `beta`: `θ = softplus⁻¹(v)`, so every iterate maps
//!   back to a strictly positive value. Initial values below
//!   `POSITIVE_FLOOR` are lifted to it before inversion, so the optimizer
//!   never starts on the flat tail of softplus.
//!
//! Fixed values are used exactly as given and are not transformed.
use std::collections::BTreeMap;

use crate::{
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::{POSITIVE_FLOOR, safe_logistic, safe_softplus, safe_softplus_inv},
    },
    starma::{
        core::params::{ParamBlock, ParamKey, ParameterSet},
        errors::{ParamError, ParamResult, StarmaError, StarmaResult},
    },
};
use ndarray::Array1;

/// Status of one parameter entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskEntry {
    Free,
    Fixed(f64),
}

/// Immutable mapping from parameter keys to [`MaskEntry`]; absent keys are
/// free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMask {
    entries: BTreeMap<ParamKey, MaskEntry>,
}

impl ParameterMask {
    /// Mask that estimates every parameter.
    pub fn all_free() -> ParameterMask {
        ParameterMask::default()
    }

    /// Pin `key` at `value`.
    pub fn with_fixed(mut self, key: ParamKey, value: f64) -> ParameterMask {
        self.entries.insert(key, MaskEntry::Fixed(value));
        self
    }

    /// Explicitly free `key` (undoes an earlier pin).
    pub fn with_free(mut self, key: ParamKey) -> ParameterMask {
        self.entries.insert(key, MaskEntry::Free);
        self
    }

    /// Pin every entry of `block` at the value `template` holds for it.
    pub fn fix_block(mut self, block: ParamBlock, template: &ParameterSet) -> ParameterMask {
        for key in template.block_keys(block) {
            self.entries.insert(key, MaskEntry::Fixed(template.value_unchecked(key)));
        }
        self
    }

    pub fn entry(&self, key: ParamKey) -> MaskEntry {
        self.entries.get(&key).copied().unwrap_or(MaskEntry::Free)
    }

    pub fn is_fixed(&self, key: ParamKey) -> bool {
        matches!(self.entry(key), MaskEntry::Fixed(_))
    }

    /// Keys the mask mentions explicitly.
    pub fn keys(&self) -> impl Iterator<Item = ParamKey> + '_ {
        self.entries.keys().copied()
    }
}

/// Map from one free optimizer coordinate to its model-space entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    Softplus,
}

impl Transform {
    fn for_block(block: ParamBlock) -> Transform {
        if block.is_positive() { Transform::Softplus } else { Transform::Identity }
    }

    #[inline]
    fn forward(self, theta: f64) -> f64 {
        match self {
            Transform::Identity => theta,
            Transform::Softplus => safe_softplus(theta),
        }
    }

    #[inline]
    fn inverse(self, value: f64) -> f64 {
        match self {
            Transform::Identity => value,
            Transform::Softplus => safe_softplus_inv(value.max(POSITIVE_FLOOR)),
        }
    }

    #[inline]
    fn derivative(self, theta: f64) -> f64 {
        match self {
            Transform::Identity => 1.0,
            Transform::Softplus => safe_logistic(theta),
        }
    }
}

/// Resolved free-parameter layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParamMap {
    base: ParameterSet,
    free: Vec<(ParamKey, Transform)>,
    theta0: Theta,
}

impl FreeParamMap {
    /// Resolve `mask` against `init`.
    ///
    /// # Errors
    /// - [`StarmaError::UnknownMaskKey`] if the mask mentions a key outside
    ///   the layout of `init`.
    /// - [`StarmaError::Param`] if a fixed value is non-finite.
    /// - [`StarmaError::NoFreeParameters`] if every entry is fixed.
    pub fn resolve(init: &ParameterSet, mask: &ParameterMask) -> StarmaResult<FreeParamMap> {
        let mut base = init.clone();
        for key in mask.keys() {
            if !init.contains(key) {
                return Err(StarmaError::UnknownMaskKey { key });
            }
            if let MaskEntry::Fixed(value) = mask.entry(key) {
                base.set(key, value)?;
            }
        }

        let free: Vec<(ParamKey, Transform)> = init
            .keys()
            .into_iter()
            .filter(|&k| !mask.is_fixed(k))
            .map(|k| (k, Transform::for_block(k.block())))
            .collect();
        if free.is_empty() {
            return Err(StarmaError::NoFreeParameters);
        }
        let theta0 = free.iter().map(|&(k, tr)| tr.inverse(init.value_unchecked(k))).collect();
        Ok(FreeParamMap { base, free, theta0 })
    }

    /// Starting point in optimizer space.
    pub fn theta0(&self) -> &Theta {
        &self.theta0
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    /// Free keys in optimizer order.
    pub fn keys(&self) -> Vec<ParamKey> {
        self.free.iter().map(|&(k, _)| k).collect()
    }

    pub fn transforms(&self) -> impl Iterator<Item = Transform> + '_ {
        self.free.iter().map(|&(_, tr)| tr)
    }

    /// Parameter set with the fixed values and the initial free values.
    pub fn base(&self) -> &ParameterSet {
        &self.base
    }

    /// Full model-space parameter set for an optimizer vector.
    ///
    /// # Errors
    /// - [`ParamError::ThetaLengthMismatch`] for a wrong-length `theta`.
    /// - [`ParamError::InvalidThetaInput`] for a non-finite coordinate.
    pub fn reconstruct(&self, theta: &Theta) -> ParamResult<ParameterSet> {
        self.check_theta(theta)?;
        let mut params = self.base.clone();
        for (&(key, tr), &x) in self.free.iter().zip(theta.iter()) {
            params.set(key, tr.forward(x))?;
        }
        Ok(params)
    }

    /// Model-space values of the free entries.
    pub fn model_values(&self, theta: &Theta) -> ParamResult<Array1<f64>> {
        self.check_theta(theta)?;
        Ok(self.free.iter().zip(theta.iter()).map(|(&(_, tr), &x)| tr.forward(x)).collect())
    }

    /// Diagonal of `∂v/∂θ` for the free entries.
    pub fn jacobian_diag(&self, theta: &Theta) -> ParamResult<Array1<f64>> {
        self.check_theta(theta)?;
        Ok(self.free.iter().zip(theta.iter()).map(|(&(_, tr), &x)| tr.derivative(x)).collect())
    }

    fn check_theta(&self, theta: &Theta) -> ParamResult<()> {
        if theta.len() != self.free.len() {
            return Err(ParamError::ThetaLengthMismatch {
                expected: self.free.len(),
                actual: theta.len(),
            });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ParamError::InvalidThetaInput { index, value });
        }
        Ok(())
    }
}
