//! Derivative-free secant iteration.

use crate::error::ConvergenceFailure;

use super::{Residual, RootFinder, RootReport, SolverParams, Tally};

/// Secant method started from the guess and a small perturbation of it.
#[derive(Debug, Clone, Default)]
pub struct SecantSolver {
    pub params: SolverParams,
}

impl SecantSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }
}

impl RootFinder for SecantSolver {
    fn find_root(&self, residual: &Residual<'_>, guess: f64) -> Result<RootReport, ConvergenceFailure> {
        let params = &self.params;
        let mut tally = Tally::default();
        let mut x1 = guess;
        let mut f1 = tally.eval(residual, x1, 0)?;
        if params.converged(x1, f1) {
            return Ok(tally.report(x1, f1, 0));
        }

        // Second starting point: above the guess, below it if that fails.
        let h = params.difference_step(guess);
        let (mut x0, mut f0) = match tally.try_eval(residual, guess + h) {
            Ok(f) => (guess + h, f),
            Err(source) if guess - h < params.lower_bound => {
                return Err(ConvergenceFailure::DomainExit { iteration: 0, source });
            }
            Err(_) => (guess - h, tally.eval(residual, guess - h, 0)?),
        };

        for iteration in 0..params.max_iterations {
            if params.converged(x1, f1) {
                return Ok(tally.report(x1, f1, iteration));
            }
            let _span = tracing::trace_span!("secant_iter", iteration).entered();

            let slope = (f1 - f0) / (x1 - x0);
            if !slope.is_finite() || slope == 0.0 {
                return Err(ConvergenceFailure::ZeroDerivative { iteration });
            }
            let (x2, f2) = tally.damped_update(residual, x1, f1, -f1 / slope, params, iteration)?;
            (x0, f0) = (x1, f1);
            (x1, f1) = (x2, f2);
            tracing::trace!(iteration, x = x1, residual = f1, "secant step");
        }

        if params.converged(x1, f1) {
            return Ok(tally.report(x1, f1, params.max_iterations));
        }
        Err(ConvergenceFailure::MaxIterations {
            iterations: params.max_iterations,
            residual: f1,
        })
    }
}
