//! Scalar root finders for the self-consistent absorption equation.
//!
//! A [`RootFinder`] drives a residual `g(α)` to zero from an initial guess.
//! Both implementations share the same damping: a full step is tried first
//! and halved while the trial iterate leaves the model domain or fails to
//! reduce `|g|`. Iterates never drop below [`SolverParams::lower_bound`].

pub mod newton;
pub mod point;
pub mod secant;

use serde::Deserialize;

use crate::error::{ConvergenceFailure, DomainError};

pub use newton::NewtonSolver;
pub use point::{residual, solve_point, PointSolution};
pub use secant::SecantSolver;

/// Residual evaluated by a root finder. Domain errors mark iterates outside
/// the region where the model is defined.
pub type Residual<'a> = dyn Fn(f64) -> Result<f64, DomainError> + 'a;

/// Parameters shared by the root finders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    pub max_iterations: usize,
    /// Relative residual tolerance: converged when `|g| <= tol · max(1, |x|)`.
    pub tolerance: f64,
    /// Step halvings allowed per iteration.
    pub max_backtracks: usize,
    /// Relative finite-difference step for derivatives.
    pub derivative_step: f64,
    /// Iterates are clamped to stay at or above this value.
    pub lower_bound: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
            max_backtracks: 30,
            derivative_step: 1e-6,
            lower_bound: 0.0,
        }
    }
}

impl SolverParams {
    pub fn converged(&self, x: f64, fx: f64) -> bool {
        fx.abs() <= self.tolerance * x.abs().max(1.0)
    }

    fn difference_step(&self, x: f64) -> f64 {
        self.derivative_step * x.abs().max(1.0)
    }
}

/// Selects the root-finding algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootMethod {
    #[default]
    Newton,
    Secant,
}

impl RootMethod {
    pub fn finder(self, params: SolverParams) -> Box<dyn RootFinder> {
        match self {
            RootMethod::Newton => Box::new(NewtonSolver::new(params)),
            RootMethod::Secant => Box::new(SecantSolver::new(params)),
        }
    }
}

/// A converged root together with the work it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootReport {
    pub root: f64,
    pub residual: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub backtracks: usize,
}

/// Finds a zero of a scalar residual.
pub trait RootFinder {
    fn find_root(&self, residual: &Residual<'_>, guess: f64) -> Result<RootReport, ConvergenceFailure>;
}

/// Work counters accumulated during one root search.
#[derive(Debug, Default)]
struct Tally {
    evaluations: usize,
    backtracks: usize,
}

impl Tally {
    fn report(&self, root: f64, residual: f64, iterations: usize) -> RootReport {
        RootReport {
            root,
            residual,
            iterations,
            evaluations: self.evaluations,
            backtracks: self.backtracks,
        }
    }

    /// Evaluate the residual, rejecting non-finite values as a domain exit.
    fn eval(&mut self, residual: &Residual<'_>, x: f64, iteration: usize) -> Result<f64, ConvergenceFailure> {
        self.try_eval(residual, x)
            .map_err(|source| ConvergenceFailure::DomainExit { iteration, source })
    }

    fn try_eval(&mut self, residual: &Residual<'_>, x: f64) -> Result<f64, DomainError> {
        self.evaluations += 1;
        let fx = residual(x)?;
        if !fx.is_finite() {
            return Err(DomainError::NonFinite {
                quantity: "residual",
                value: fx,
            });
        }
        Ok(fx)
    }

    /// Take `x + s · step` for the largest `s = 2^-k` that stays in the
    /// domain and reduces `|g|`. If no halving reduces `|g|`, the shortest
    /// evaluable trial is accepted.
    fn damped_update(
        &mut self,
        residual: &Residual<'_>,
        x: f64,
        fx: f64,
        step: f64,
        params: &SolverParams,
        iteration: usize,
    ) -> Result<(f64, f64), ConvergenceFailure> {
        let mut scale = 1.0;
        let mut fallback = None;
        let mut last_error = None;

        for k in 0..=params.max_backtracks {
            if k > 0 {
                self.backtracks += 1;
            }
            let trial = (x + scale * step).max(params.lower_bound);
            if !trial.is_finite() {
                return Err(ConvergenceFailure::NonFinite { iteration });
            }
            match self.try_eval(residual, trial) {
                Ok(ft) if ft.abs() < fx.abs() => return Ok((trial, ft)),
                Ok(ft) => fallback = Some((trial, ft)),
                Err(e) => last_error = Some(e),
            }
            scale *= 0.5;
        }

        match (fallback, last_error) {
            (Some(update), _) => Ok(update),
            (None, Some(source)) => Err(ConvergenceFailure::DomainExit { iteration, source }),
            (None, None) => Err(ConvergenceFailure::NonFinite { iteration }),
        }
    }
}
