//! Self-consistent absorption at one operating point.
//!
//! The photocurrent drops across the load and shifts the junction voltage,
//! which changes the field and with it the absorption. The solution is the
//! fixed point of `α ↦ absorption(field(V_d(α)))`, found as the root of
//! `g(α) = α - absorption(field(V_d(α)))`.

use std::time::Instant;

use crate::absorption::absorption;
use crate::device::OperatingPoint;
use crate::error::{ConvergenceFailure, DomainError, KeldyshError, Result};
use crate::field::field;
use crate::stats::Stats;

use super::RootFinder;

/// Fixed-point residual `g(α)` at an operating point.
pub fn residual(point: &OperatingPoint, alpha: f64) -> std::result::Result<f64, DomainError> {
    let f = field(point.device_voltage(alpha))?;
    Ok(alpha - absorption(point.wavelength_nm, &point.device.material, f)?)
}

/// A converged operating point with its derived readouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSolution {
    pub point: OperatingPoint,
    /// Self-consistent absorption α* (cm⁻¹).
    pub alpha: f64,
    /// Transmitted power (µW).
    pub power_out: f64,
    /// Photocurrent (µA).
    pub photocurrent: f64,
    /// Junction voltage at α* (V).
    pub device_voltage: f64,
    /// Internal field at α* (V/cm).
    pub field: f64,
    pub residual: f64,
    pub iterations: usize,
}

/// Solve one operating point from `guess`.
///
/// The point is validated first; invalid inputs are configuration errors.
/// Any failure of the root search is reported as
/// [`KeldyshError::Convergence`] carrying the point's inputs.
pub fn solve_point(
    point: &OperatingPoint,
    guess: f64,
    finder: &dyn RootFinder,
    mut stats: Option<&mut Stats>,
) -> Result<PointSolution> {
    point.validate()?;
    if !guess.is_finite() {
        return Err(KeldyshError::Configuration(format!(
            "initial guess {guess} is not finite"
        )));
    }
    let _span = tracing::debug_span!(
        "solve_point",
        wavelength_nm = point.wavelength_nm,
        voltage = point.applied_voltage,
        power_in = point.power_in,
    )
    .entered();

    let t = stats.as_ref().map(|_| Instant::now());
    let g = |alpha: f64| residual(point, alpha);
    let outcome = finder.find_root(&g, guess).and_then(|report| {
        // Finders with a negative lower bound can land here.
        if report.root < 0.0 {
            return Err(ConvergenceFailure::NegativeAbsorption { alpha: report.root });
        }
        let device_voltage = point.device_voltage(report.root);
        let f = field(device_voltage).map_err(|source| ConvergenceFailure::DomainExit {
            iteration: report.iterations,
            source,
        })?;
        Ok((report, device_voltage, f))
    });

    if let Some(ref mut s) = stats {
        if let Some(t) = t {
            s.solve_time += t.elapsed();
        }
    }

    match outcome {
        Ok((report, device_voltage, f)) => {
            if let Some(ref mut s) = stats {
                s.points_solved += 1;
                s.root_iterations += report.iterations as u32;
                s.residual_evaluations += report.evaluations as u32;
                s.backtracks += report.backtracks as u32;
                s.iterations_per_point.push(report.iterations as u32);
            }
            tracing::debug!(
                alpha = report.root,
                iterations = report.iterations,
                residual = report.residual,
                "point converged"
            );
            Ok(PointSolution {
                point: *point,
                alpha: report.root,
                power_out: point.output_power(report.root),
                photocurrent: point.photocurrent(report.root),
                device_voltage,
                field: f,
                residual: report.residual,
                iterations: report.iterations,
            })
        }
        Err(reason) => {
            if let Some(ref mut s) = stats {
                s.points_failed += 1;
            }
            tracing::debug!(%reason, guess, "point failed");
            Err(KeldyshError::convergence(point, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorption::absorption_at_bias;
    use crate::device::DeviceConfig;
    use crate::solver::{NewtonSolver, Residual, RootReport, SecantSolver, SolverParams};
    use approx::assert_relative_eq;

    fn device() -> DeviceConfig {
        DeviceConfig::default()
    }

    #[test]
    fn test_dark_point_reduces_to_bias_absorption() {
        let point = device().at(930.0, -4.0, 0.0);
        let solution = solve_point(&point, 1000.0, &NewtonSolver::default(), None).unwrap();
        assert_relative_eq!(solution.alpha, 971.311_204_569, max_relative = 1e-7);
        assert_eq!(solution.power_out, 0.0);
        assert_eq!(solution.device_voltage, -4.0);
    }

    #[test]
    fn test_illuminated_point_is_self_consistent() {
        let point = device().at(930.0, -4.0, 20.0);
        let solution = solve_point(&point, 1000.0, &NewtonSolver::default(), None).unwrap();
        assert_relative_eq!(solution.alpha, 644.20, max_relative = 1e-4);

        let params = SolverParams::default();
        let g = residual(&point, solution.alpha).unwrap();
        assert!(params.converged(solution.alpha, g), "g = {g}");
        let direct = absorption_at_bias(930.0, &point.device.material, solution.device_voltage).unwrap();
        assert_relative_eq!(solution.alpha, direct, max_relative = 1e-8);
        assert!(solution.power_out < point.power_in);
    }

    #[test]
    fn test_secant_matches_newton() {
        let point = device().at(930.0, -4.0, 40.0);
        let newton = solve_point(&point, 1000.0, &NewtonSolver::default(), None).unwrap();
        let secant = solve_point(&point, 1000.0, &SecantSolver::default(), None).unwrap();
        assert_relative_eq!(newton.alpha, secant.alpha, max_relative = 1e-7);
        assert_relative_eq!(newton.alpha, 408.24, max_relative = 1e-4);
    }

    #[test]
    fn test_seed_beyond_built_in_voltage_fails_with_point_context() {
        // At 100 µW the default seed lifts V_d past V_bi.
        let point = device().at(930.0, -4.0, 100.0);
        let err = solve_point(&point, 1000.0, &NewtonSolver::default(), None).unwrap_err();
        match err {
            KeldyshError::Convergence { point: p, reason } => {
                assert_eq!(p.power_in, 100.0);
                assert!(matches!(reason, ConvergenceFailure::DomainExit { iteration: 0, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nearby_seed_solves_high_power_point() {
        let point = device().at(930.0, -4.0, 100.0);
        let solution = solve_point(&point, 185.89, &NewtonSolver::default(), None).unwrap();
        assert_relative_eq!(solution.alpha, 166.96, max_relative = 1e-4);
        assert_relative_eq!(solution.power_out, 55.746, max_relative = 1e-4);
    }

    #[test]
    fn test_invalid_inputs_are_configuration_errors() {
        let point = device().at(930.0, -4.0, -5.0);
        let err = solve_point(&point, 1000.0, &NewtonSolver::default(), None).unwrap_err();
        assert!(matches!(err, KeldyshError::Configuration(_)));
        let point = device().at(930.0, -4.0, 5.0);
        let err = solve_point(&point, f64::NAN, &NewtonSolver::default(), None).unwrap_err();
        assert!(matches!(err, KeldyshError::Configuration(_)));
    }

    #[test]
    fn test_stats_count_work() {
        let mut stats = Stats::new();
        let point = device().at(930.0, -4.0, 10.0);
        solve_point(&point, 1000.0, &NewtonSolver::default(), Some(&mut stats)).unwrap();
        let failing = device().at(930.0, -4.0, 100.0);
        let _ = solve_point(&failing, 1000.0, &NewtonSolver::default(), Some(&mut stats));
        assert_eq!(stats.points_solved, 1);
        assert_eq!(stats.points_failed, 1);
        assert!(stats.residual_evaluations > stats.root_iterations);
    }

    #[test]
    fn test_negative_root_is_rejected() {
        struct NegativeRoot;
        impl RootFinder for NegativeRoot {
            fn find_root(
                &self,
                _residual: &Residual<'_>,
                _guess: f64,
            ) -> std::result::Result<RootReport, ConvergenceFailure> {
                Ok(RootReport {
                    root: -5.0,
                    residual: 0.0,
                    iterations: 1,
                    evaluations: 1,
                    backtracks: 0,
                })
            }
        }
        let mut stats = Stats::new();
        let point = device().at(930.0, -4.0, 10.0);
        let err = solve_point(&point, 100.0, &NegativeRoot, Some(&mut stats)).unwrap_err();
        match err {
            KeldyshError::Convergence { point: p, reason } => {
                assert_eq!(p.power_in, 10.0);
                assert_eq!(reason, ConvergenceFailure::NegativeAbsorption { alpha: -5.0 });
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stats.points_failed, 1);
    }
}
