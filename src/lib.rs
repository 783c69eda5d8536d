//! rust_starmagarch: spatio-temporal ARMA-GARCH models on regular lattices.
//!
//! Purpose
//! -------
//! Serve as the crate root for neighborhood construction, process simulation
//! and maximum-likelihood estimation of STARMA-GARCH models: every cell of an
//! n-dimensional grid carries a time series whose conditional mean and
//! conditional variance load on its own past and on the past of its spatial
//! neighbors.
//!
//! Key behaviors
//! -------------
//! - [`starma`]: grids, neighborhood stacks, parameter layouts and masks,
//!   the mean / variance recursions, the simulator and the likelihood bundle.
//! - [`optimization`]: the generic `LogLikelihood` trait, an argmin L-BFGS
//!   driver, finite-difference fallbacks and stable transforms.
//! - [`inference`]: observed information and eigen-based standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Series are `N × T` (`N` = number of grid cells, `T` = time steps).
//! - Fallible operations return typed errors (`StarmaError`, `OptError`,
//!   `InferenceError`); panics indicate programming errors, not bad inputs.
//!
//! Conventions
//! -----------
//! - The optimizer maximizes `ℓ(θ)` over the free entries of a parameter mask
//!   in an unconstrained space; positive blocks go through softplus.
//! - Diagnostics go through `tracing`; the crate never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need `use rust_starmagarch::starma::prelude::*;`.
//! - Custom models can reuse [`optimization`] and [`inference`] by
//!   implementing `LogLikelihood` for their own type.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end pipelines
//!   (build → simulate → fit) are in `tests/`.

pub mod inference;
pub mod optimization;
pub mod starma;
