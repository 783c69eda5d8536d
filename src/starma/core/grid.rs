//! Lattice geometry: grid shapes, linear indexing and first-order neighbors.
//!
//! Purpose
//! -------
//! Describe the spatial lattice a STARMA-GARCH series lives on and answer the
//! one question the neighborhood builder needs: "which locations are adjacent
//! to location `i` under this topology?".
//!
//! Key behaviors
//! -------------
//! - [`GridShape`] validates a sequence of positive extents and maps between
//!   linear location indices and coordinates.
//! - [`Topology`] selects rook (axis-aligned, `2·D` offsets) or queen (all
//!   `3^D − 1` non-zero offsets) adjacency and parses case-insensitively.
//! - [`GridShape::neighbors`] applies the offsets with torus wrap or boundary
//!   clipping and removes self-loops and duplicates.
//!
//! Conventions
//! -----------
//! - Linear index is first-dimension-fastest:
//!   `index = c₀ + d₀·(c₁ + d₁·(c₂ + …))`. For a 2-D grid `[rows, cols]` this
//!   is column-major, matching how lattice series are usually vectorized.
//! - Works for any number of dimensions ≥ 1.
use std::str::FromStr;

use crate::starma::errors::{StarmaError, StarmaResult};

/// First-order adjacency rule on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Offsets of ±1 along exactly one axis (4 neighbors in 2-D).
    Rook,
    /// Every non-zero offset in `{-1, 0, 1}^D` (8 neighbors in 2-D).
    Queen,
}

impl FromStr for Topology {
    type Err = StarmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rook" => Ok(Topology::Rook),
            "queen" => Ok(Topology::Queen),
            _ => Err(StarmaError::InvalidTopology { name: s.to_string() }),
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Rook => write!(f, "rook"),
            Topology::Queen => write!(f, "queen"),
        }
    }
}

/// Validated lattice extents.
///
/// Invariants
/// ----------
/// - At least one dimension.
/// - Every extent is `> 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridShape {
    dims: Vec<usize>,
}

impl GridShape {
    /// Build a grid shape from its extents.
    ///
    /// # Errors
    /// - [`StarmaError::InvalidGridShape`] if `dims` is empty or contains a 0.
    pub fn new(dims: &[usize]) -> StarmaResult<Self> {
        if dims.is_empty() {
            return Err(StarmaError::InvalidGridShape {
                dims: dims.to_vec(),
                reason: "Grid shape needs at least one dimension.",
            });
        }
        if dims.contains(&0) {
            return Err(StarmaError::InvalidGridShape {
                dims: dims.to_vec(),
                reason: "Every grid extent must be positive.",
            });
        }
        Ok(Self { dims: dims.to_vec() })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of locations, `prod(dims)`.
    pub fn n_locations(&self) -> usize {
        self.dims.iter().product()
    }

    /// Coordinates of a linear index (first dimension fastest).
    pub fn coords(&self, mut index: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.dims.len());
        for &d in &self.dims {
            out.push(index % d);
            index /= d;
        }
        out
    }

    /// Linear index of in-range coordinates.
    pub fn index(&self, coords: &[usize]) -> usize {
        coords.iter().zip(&self.dims).rev().fold(0, |acc, (&c, &d)| acc * d + c)
    }

    /// First-order neighbors of `index`, sorted ascending.
    ///
    /// With `torus`, coordinates wrap modulo each extent; otherwise offsets
    /// that leave the grid are dropped. The location itself never appears,
    /// and a neighbor reached through several offsets (tiny torus extents)
    /// appears once.
    pub fn neighbors(&self, index: usize, topology: Topology, torus: bool) -> Vec<usize> {
        let origin = self.coords(index);
        let mut out: Vec<usize> = offsets(self.ndim(), topology)
            .iter()
            .filter_map(|offset| self.shift(&origin, offset, torus))
            .filter(|&j| j != index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn shift(&self, origin: &[usize], offset: &[isize], torus: bool) -> Option<usize> {
        let mut moved = Vec::with_capacity(origin.len());
        for ((&c, &o), &d) in origin.iter().zip(offset).zip(&self.dims) {
            let raw = c as isize + o;
            let d = d as isize;
            if torus {
                moved.push(raw.rem_euclid(d) as usize);
            } else if (0..d).contains(&raw) {
                moved.push(raw as usize);
            } else {
                return None;
            }
        }
        Some(self.index(&moved))
    }
}

/// Neighbor offsets for `ndim` dimensions.
fn offsets(ndim: usize, topology: Topology) -> Vec<Vec<isize>> {
    match topology {
        Topology::Rook => (0..ndim)
            .flat_map(|axis| {
                [-1isize, 1].into_iter().map(move |step| {
                    let mut o = vec![0isize; ndim];
                    o[axis] = step;
                    o
                })
            })
            .collect(),
        Topology::Queen => {
            let mut all: Vec<Vec<isize>> = vec![Vec::new()];
            for _ in 0..ndim {
                all = all
                    .into_iter()
                    .flat_map(|prefix| {
                        [-1isize, 0, 1].into_iter().map(move |step| {
                            let mut next = prefix.clone();
                            next.push(step);
                            next
                        })
                    })
                    .collect();
            }
            all.retain(|o| o.iter().any(|&v| v != 0));
            all
        }
    }
}
