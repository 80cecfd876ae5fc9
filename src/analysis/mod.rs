//! Sweep orchestration over sequences of operating points.

pub mod sweep;

use crate::error::{ConvergenceFailure, KeldyshError, Result};
use crate::device::OperatingPoint;
use crate::solver::PointSolution;

pub use sweep::{sweep, sweep_many, sweep_plan, Continuation, FailurePolicy, SweepAxis, SweepOptions, SweepPlan};

/// Result of one point in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOutcome {
    Converged(PointSolution),
    Failed {
        point: OperatingPoint,
        reason: ConvergenceFailure,
    },
}

impl PointOutcome {
    pub fn point(&self) -> &OperatingPoint {
        match self {
            PointOutcome::Converged(solution) => &solution.point,
            PointOutcome::Failed { point, .. } => point,
        }
    }

    pub fn solution(&self) -> Option<&PointSolution> {
        match self {
            PointOutcome::Converged(solution) => Some(solution),
            PointOutcome::Failed { .. } => None,
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        self.solution().map(|s| s.alpha)
    }
}

/// Sweep results, one outcome per input point in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepResult {
    pub outcomes: Vec<PointOutcome>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn converged(&self) -> impl Iterator<Item = &PointSolution> {
        self.outcomes.iter().filter_map(PointOutcome::solution)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.len() - self.converged().count()
    }

    /// Converged α per point, `None` where the point failed.
    pub fn alphas(&self) -> Vec<Option<f64>> {
        self.outcomes.iter().map(PointOutcome::alpha).collect()
    }

    /// (output power, α) for every converged point.
    pub fn transmission(&self) -> Vec<(f64, f64)> {
        self.converged().map(|s| (s.power_out, s.alpha)).collect()
    }

    /// (photocurrent, α) for every converged point.
    pub fn photocurrents(&self) -> Vec<(f64, f64)> {
        self.converged().map(|s| (s.photocurrent, s.alpha)).collect()
    }

    /// All solutions, or the first failure as an error.
    pub fn into_solutions(self) -> Result<Vec<PointSolution>> {
        self.outcomes
            .into_iter()
            .map(|outcome| match outcome {
                PointOutcome::Converged(solution) => Ok(solution),
                PointOutcome::Failed { point, reason } => Err(KeldyshError::convergence(&point, reason)),
            })
            .collect()
    }
}
