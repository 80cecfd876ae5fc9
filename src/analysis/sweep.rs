//! Continuation sweeps over ordered operating points.
//!
//! Points are solved strictly in input order. With [`Continuation::Warm`]
//! each point is seeded with the last converged α, so a slowly varying
//! sweep walks along the solution branch instead of restarting from the
//! default guess every time.

use std::time::Instant;

use rayon::prelude::*;
use serde::Deserialize;

use crate::device::{DeviceConfig, OperatingPoint};
use crate::error::{KeldyshError, Result};
use crate::solver::{solve_point, RootMethod, SolverParams};
use crate::stats::Stats;

use super::{PointOutcome, SweepResult};

/// What to do when a point fails to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the sweep and return the failure.
    #[default]
    Abort,
    /// Record the failure and seed the next point with the last good α.
    CarryForward,
}

/// How each point is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Continuation {
    /// Previous converged α, the default guess before the first success.
    #[default]
    Warm,
    /// Default guess for every point.
    Cold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOptions {
    pub failure_policy: FailurePolicy,
    pub continuation: Continuation,
    /// Seed of the first point (cm⁻¹).
    pub default_guess: f64,
    pub method: RootMethod,
    pub params: SolverParams,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            continuation: Continuation::Warm,
            default_guess: 1000.0,
            method: RootMethod::Newton,
            params: SolverParams::default(),
        }
    }
}

/// Which operating-point coordinate varies along a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAxis {
    Power,
    Voltage,
    Wavelength,
    /// More than one coordinate varies together.
    Mixed,
    /// A single point.
    Fixed,
}

impl SweepAxis {
    pub fn name(self) -> &'static str {
        match self {
            SweepAxis::Power => "power",
            SweepAxis::Voltage => "voltage",
            SweepAxis::Wavelength => "wavelength",
            SweepAxis::Mixed => "mixed",
            SweepAxis::Fixed => "fixed",
        }
    }
}

/// Sweep coordinates. Arrays of length one broadcast against the others;
/// all longer arrays must share a length.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub wavelengths_nm: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
}

impl SweepPlan {
    pub fn new(wavelengths_nm: Vec<f64>, voltages: Vec<f64>, powers: Vec<f64>) -> Self {
        Self {
            wavelengths_nm,
            voltages,
            powers,
        }
    }

    pub fn power_sweep(wavelength_nm: f64, voltage: f64, powers: Vec<f64>) -> Self {
        Self::new(vec![wavelength_nm], vec![voltage], powers)
    }

    pub fn voltage_sweep(wavelength_nm: f64, voltages: Vec<f64>, power: f64) -> Self {
        Self::new(vec![wavelength_nm], voltages, vec![power])
    }

    pub fn wavelength_sweep(wavelengths_nm: Vec<f64>, voltage: f64, power: f64) -> Self {
        Self::new(wavelengths_nm, vec![voltage], vec![power])
    }

    fn axes(&self) -> [(&'static str, &[f64]); 3] {
        [
            ("wavelength", &self.wavelengths_nm),
            ("voltage", &self.voltages),
            ("power", &self.powers),
        ]
    }

    /// Number of points after broadcasting.
    pub fn point_count(&self) -> Result<usize> {
        let mut len = 1;
        for (name, values) in self.axes() {
            match values.len() {
                0 => {
                    return Err(KeldyshError::Configuration(format!(
                        "sweep {name} array is empty"
                    )))
                }
                1 => {}
                n if len == 1 => len = n,
                n if n == len => {}
                n => {
                    return Err(KeldyshError::Configuration(format!(
                        "sweep {name} array has {n} values, expected {len} to match the other axes"
                    )))
                }
            }
        }
        Ok(len)
    }

    pub fn axis(&self) -> SweepAxis {
        let varying: Vec<&str> = self
            .axes()
            .into_iter()
            .filter(|(_, v)| v.len() > 1)
            .map(|(name, _)| name)
            .collect();
        match varying.as_slice() {
            [] => SweepAxis::Fixed,
            ["wavelength"] => SweepAxis::Wavelength,
            ["voltage"] => SweepAxis::Voltage,
            ["power"] => SweepAxis::Power,
            _ => SweepAxis::Mixed,
        }
    }

    /// Expand into operating points of `device`, in sweep order.
    pub fn points(&self, device: &DeviceConfig) -> Result<Vec<OperatingPoint>> {
        let len = self.point_count()?;
        let at = |values: &[f64], i: usize| if values.len() == 1 { values[0] } else { values[i] };
        Ok((0..len)
            .map(|i| device.at(at(&self.wavelengths_nm, i), at(&self.voltages, i), at(&self.powers, i)))
            .collect())
    }
}

/// Solve `points` in order.
///
/// All points are validated before any solve; a rejected point is reported
/// with its index and inputs. Under [`FailurePolicy::Abort`] the first
/// convergence failure is returned as the error; under
/// [`FailurePolicy::CarryForward`] it is recorded and the sweep continues
/// from the last good α. An empty slice gives an empty result.
///
/// Warm starts only help when neighbouring points are close. Photocurrent
/// pushes the junction toward V_bi, so the default seed can leave the domain
/// at high power. Order power sweeps from low to high.
pub fn sweep(
    points: &[OperatingPoint],
    options: &SweepOptions,
    mut stats: Option<&mut Stats>,
) -> Result<SweepResult> {
    for (i, point) in points.iter().enumerate() {
        point.validate().map_err(|e| match e {
            KeldyshError::Configuration(msg) => {
                KeldyshError::Configuration(format!("point {i}: {msg}"))
            }
            other => other,
        })?;
    }
    let _span = tracing::info_span!("sweep", n_points = points.len()).entered();
    let t = Instant::now();

    let finder = options.method.finder(options.params);
    let mut warm_start: Option<f64> = None;
    let mut outcomes = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let guess = match options.continuation {
            Continuation::Warm => warm_start.unwrap_or(options.default_guess),
            Continuation::Cold => options.default_guess,
        };
        match solve_point(point, guess, finder.as_ref(), stats.as_deref_mut()) {
            Ok(solution) => {
                warm_start = Some(solution.alpha);
                outcomes.push(PointOutcome::Converged(solution));
            }
            Err(KeldyshError::Convergence { point, reason }) => match options.failure_policy {
                FailurePolicy::Abort => {
                    tracing::info!(index = i, %reason, "sweep aborted");
                    return Err(KeldyshError::Convergence { point, reason });
                }
                FailurePolicy::CarryForward => {
                    tracing::warn!(index = i, %reason, guess, "point failed, carrying last good guess forward");
                    outcomes.push(PointOutcome::Failed { point: *point, reason });
                }
            },
            Err(e) => return Err(e),
        }
    }

    let result = SweepResult { outcomes };
    tracing::info!(
        converged = result.len() - result.failures(),
        failed = result.failures(),
        "sweep finished"
    );
    if let Some(ref mut s) = stats {
        s.add_phase("Sweep", t.elapsed());
    }
    Ok(result)
}

/// Expand `plan` against `device` and sweep it.
pub fn sweep_plan(
    device: &DeviceConfig,
    plan: &SweepPlan,
    options: &SweepOptions,
    stats: Option<&mut Stats>,
) -> Result<SweepResult> {
    let points = plan.points(device)?;
    let _span = tracing::info_span!("sweep_plan", axis = plan.axis().name()).entered();
    sweep(&points, options, stats)
}

/// Run independent sweeps in parallel. Each sweep keeps its own warm start;
/// results are returned in input order.
pub fn sweep_many(sweeps: &[Vec<OperatingPoint>], options: &SweepOptions) -> Vec<Result<SweepResult>> {
    sweeps
        .par_iter()
        .map(|points| sweep(points, options, None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvergenceFailure;
    use approx::assert_relative_eq;

    fn powers(n: usize, max: f64) -> Vec<f64> {
        (0..n).map(|i| max * i as f64 / (n - 1) as f64).collect()
    }

    // ── Plans ──

    #[test]
    fn test_plan_broadcasts_single_values() {
        let plan = SweepPlan::power_sweep(930.0, -4.0, vec![0.0, 1.0, 2.0]);
        assert_eq!(plan.point_count().unwrap(), 3);
        assert_eq!(plan.axis(), SweepAxis::Power);
        let points = plan.points(&DeviceConfig::default()).unwrap();
        assert_eq!(points[2].power_in, 2.0);
        assert_eq!(points[2].wavelength_nm, 930.0);
        assert_eq!(points[1].applied_voltage, -4.0);
    }

    #[test]
    fn test_plan_rejects_mismatched_or_empty_axes() {
        let plan = SweepPlan::new(vec![920.0, 930.0], vec![-4.0], vec![1.0, 2.0, 3.0]);
        assert!(matches!(plan.point_count(), Err(KeldyshError::Configuration(_))));
        let empty = SweepPlan::new(vec![930.0], vec![], vec![1.0]);
        assert!(matches!(empty.point_count(), Err(KeldyshError::Configuration(_))));
    }

    #[test]
    fn test_plan_axis_classification() {
        assert_eq!(SweepPlan::new(vec![930.0], vec![-4.0], vec![1.0]).axis(), SweepAxis::Fixed);
        assert_eq!(SweepPlan::voltage_sweep(930.0, vec![-1.0, -2.0], 1.0).axis(), SweepAxis::Voltage);
        assert_eq!(
            SweepPlan::new(vec![920.0, 930.0], vec![-1.0, -2.0], vec![1.0]).axis(),
            SweepAxis::Mixed
        );
    }

    // ── Continuation ──

    #[test]
    fn test_warm_sweep_reaches_high_power() {
        let plan = SweepPlan::power_sweep(930.0, -4.0, powers(11, 100.0));
        let result = sweep_plan(&DeviceConfig::default(), &plan, &SweepOptions::default(), None).unwrap();
        assert_eq!(result.failures(), 0);
        let last = result.outcomes[10].solution().unwrap();
        assert_relative_eq!(last.alpha, 166.96, max_relative = 1e-4);
    }

    #[test]
    fn test_cold_sweep_aborts_where_default_seed_leaves_domain() {
        let plan = SweepPlan::power_sweep(930.0, -4.0, powers(11, 100.0));
        let options = SweepOptions {
            continuation: Continuation::Cold,
            ..SweepOptions::default()
        };
        let err = sweep_plan(&DeviceConfig::default(), &plan, &options, None).unwrap_err();
        match err {
            KeldyshError::Convergence { point, reason } => {
                assert_eq!(point.power_in, 80.0);
                assert!(matches!(reason, ConvergenceFailure::DomainExit { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_carry_forward_records_failures_in_order() {
        let plan = SweepPlan::power_sweep(930.0, -4.0, powers(11, 100.0));
        let options = SweepOptions {
            continuation: Continuation::Cold,
            failure_policy: FailurePolicy::CarryForward,
            ..SweepOptions::default()
        };
        let mut stats = Stats::new();
        let result = sweep_plan(&DeviceConfig::default(), &plan, &options, Some(&mut stats)).unwrap();
        assert_eq!(result.len(), 11);
        assert_eq!(result.failures(), 3);
        assert!(result.alphas()[..8].iter().all(Option::is_some));
        assert!(result.alphas()[8..].iter().all(Option::is_none));
        assert_eq!(result.outcomes[9].point().power_in, 90.0);
        assert_eq!(stats.points_failed, 3);
        assert!(result.clone().into_solutions().is_err());
    }

    #[test]
    fn test_empty_sweep_gives_empty_result() {
        let result = sweep(&[], &SweepOptions::default(), None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_point_error_names_index_and_inputs() {
        let mut points = SweepPlan::power_sweep(930.0, -4.0, powers(10, 90.0))
            .points(&DeviceConfig::default())
            .unwrap();
        points[6].power_in = -3.0;
        let options = SweepOptions {
            failure_policy: FailurePolicy::CarryForward,
            ..SweepOptions::default()
        };
        match sweep(&points, &options, None) {
            Err(KeldyshError::Configuration(msg)) => {
                assert!(msg.starts_with("point 6: incident power -3"), "{msg}");
                assert!(msg.contains("λ = 930 nm, V_app = -4 V, P_in = -3 µW, R = 0.1 MΩ"), "{msg}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_descending_power_sweep_fails_until_seed_is_in_domain() {
        let mut descending = powers(11, 100.0);
        descending.reverse();
        let plan = SweepPlan::power_sweep(930.0, -4.0, descending);
        let options = SweepOptions {
            failure_policy: FailurePolicy::CarryForward,
            ..SweepOptions::default()
        };
        let result = sweep_plan(&DeviceConfig::default(), &plan, &options, None).unwrap();
        let alphas = result.alphas();
        assert!(alphas[..3].iter().all(Option::is_none), "{alphas:?}");
        assert_relative_eq!(alphas[3].unwrap(), 239.904_065_3, max_relative = 1e-6);
        assert_relative_eq!(alphas[10].unwrap(), 971.311_204_57, max_relative = 1e-7);
    }

    #[test]
    fn test_parallel_sweeps_match_sequential() {
        let device = DeviceConfig::default();
        let sweeps: Vec<Vec<OperatingPoint>> = [920.0, 930.0, 940.0]
            .iter()
            .map(|&lam| {
                SweepPlan::power_sweep(lam, -4.0, powers(6, 50.0))
                    .points(&device)
                    .unwrap()
            })
            .collect();
        let options = SweepOptions::default();
        let parallel = sweep_many(&sweeps, &options);
        for (points, result) in sweeps.iter().zip(parallel) {
            let sequential = sweep(points, &options, None).unwrap();
            assert_eq!(result.unwrap(), sequential);
        }
    }
}
