//! Self-consistent Franz-Keldysh response of a loaded p-i-n photodiode.
//!
//! The absorption of a reverse-biased GaAs junction depends on its internal
//! field; the photocurrent of that absorption drops across the load and
//! shifts the field. [`solver::solve_point`] finds the self-consistent
//! absorption at one operating point and [`analysis::sweep`] walks ordered
//! sweeps with continuation.

pub mod absorption;
pub mod airy;
pub mod analysis;
pub mod config;
pub mod device;
pub mod dispersion;
pub mod error;
pub mod field;
pub mod fit;
pub mod material;
pub mod output;
pub mod solver;
pub mod stats;
