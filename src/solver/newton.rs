//! Damped Newton-Raphson with a finite-difference slope.

use crate::error::ConvergenceFailure;

use super::{Residual, RootFinder, RootReport, SolverParams, Tally};

/// Newton-Raphson iteration `x ← x - g(x) / g'(x)`.
///
/// `g'` is a central difference, one-sided next to the lower bound or when
/// one neighbour falls outside the domain.
#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    pub params: SolverParams,
}

impl NewtonSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    fn slope(
        &self,
        tally: &mut Tally,
        residual: &Residual<'_>,
        x: f64,
        fx: f64,
        iteration: usize,
    ) -> Result<f64, ConvergenceFailure> {
        let h = self.params.difference_step(x);
        let below = if x - h >= self.params.lower_bound {
            tally.try_eval(residual, x - h).ok()
        } else {
            None
        };
        let above = tally.try_eval(residual, x + h);

        match (above, below) {
            (Ok(up), Some(down)) => Ok((up - down) / (2.0 * h)),
            (Ok(up), None) => Ok((up - fx) / h),
            (Err(_), Some(down)) => Ok((fx - down) / h),
            (Err(source), None) => Err(ConvergenceFailure::DomainExit { iteration, source }),
        }
    }
}

impl RootFinder for NewtonSolver {
    fn find_root(&self, residual: &Residual<'_>, guess: f64) -> Result<RootReport, ConvergenceFailure> {
        let params = &self.params;
        let mut tally = Tally::default();
        let mut x = guess;
        let mut fx = tally.eval(residual, x, 0)?;

        for iteration in 0..params.max_iterations {
            if params.converged(x, fx) {
                return Ok(tally.report(x, fx, iteration));
            }
            let _span = tracing::trace_span!("newton_iter", iteration).entered();

            let slope = self.slope(&mut tally, residual, x, fx, iteration)?;
            if !slope.is_finite() || slope == 0.0 {
                return Err(ConvergenceFailure::ZeroDerivative { iteration });
            }
            (x, fx) = tally.damped_update(residual, x, fx, -fx / slope, params, iteration)?;
            tracing::trace!(iteration, x, residual = fx, "newton step");
        }

        if params.converged(x, fx) {
            return Ok(tally.report(x, fx, params.max_iterations));
        }
        Err(ConvergenceFailure::MaxIterations {
            iterations: params.max_iterations,
            residual: fx,
        })
    }
}
