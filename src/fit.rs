//! Model functions for least-squares fits of measured photodiode data.
//!
//! Each [`FitModel`] maps swept x data and a parameter vector onto the
//! quantity a measurement records, by running a continuation sweep through
//! the self-consistent solver. The minimizer that adjusts the parameters is
//! external and only seen through the [`Minimizer`] trait; this module does
//! the glue around it: argument checks, outlier removal, bounded retries.

use std::collections::BTreeMap;

use crate::analysis::{sweep, FailurePolicy, SweepOptions};
use crate::device::{DeviceConfig, OperatingPoint};
use crate::error::{KeldyshError, Result};
use crate::solver::PointSolution;

/// A model function `f(x; p)` evaluated on a whole x array at once.
pub trait FitModel {
    fn parameter_names(&self) -> &'static [&'static str];

    fn evaluate(&self, xdata: &[f64], params: &[f64]) -> Result<Vec<f64>>;
}

fn check_params(model: &dyn FitModel, params: &[f64]) -> Result<()> {
    let names = model.parameter_names();
    if params.len() != names.len() {
        return Err(KeldyshError::Configuration(format!(
            "expected {} parameters ({}), got {}",
            names.len(),
            names.join(", "),
            params.len()
        )));
    }
    Ok(())
}

/// Solve the points in order, failing on the first point that does not
/// converge.
fn solve_chain(points: &[OperatingPoint], options: &SweepOptions) -> Result<Vec<PointSolution>> {
    let options = SweepOptions {
        failure_policy: FailurePolicy::Abort,
        ..*options
    };
    sweep(points, &options, None)?.into_solutions()
}

/// Transmitted power against incident power, `norm · P_out(P_in)`.
///
/// Parameters: `eta`, `norm`. Coupling and parasitic absorption come from
/// the device.
#[derive(Debug, Clone)]
pub struct PowerTransmissionModel {
    pub device: DeviceConfig,
    pub wavelength_nm: f64,
    pub applied_voltage: f64,
    pub options: SweepOptions,
}

impl PowerTransmissionModel {
    pub fn new(device: DeviceConfig, wavelength_nm: f64, applied_voltage: f64) -> Self {
        Self {
            device,
            wavelength_nm,
            applied_voltage,
            options: SweepOptions::default(),
        }
    }
}

impl FitModel for PowerTransmissionModel {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["eta", "norm"]
    }

    fn evaluate(&self, xdata: &[f64], params: &[f64]) -> Result<Vec<f64>> {
        check_params(self, params)?;
        let device = DeviceConfig {
            responsivity_scale: params[0],
            ..self.device
        };
        let points: Vec<_> = xdata
            .iter()
            .map(|&p| device.at(self.wavelength_nm, self.applied_voltage, p))
            .collect();
        Ok(solve_chain(&points, &self.options)?
            .iter()
            .map(|s| params[1] * s.power_out)
            .collect())
    }
}

/// Photocurrent against incident power.
///
/// Parameters: `eta`, `gamma`, `alpha_0`.
#[derive(Debug, Clone)]
pub struct PhotocurrentModel {
    pub device: DeviceConfig,
    pub wavelength_nm: f64,
    pub applied_voltage: f64,
    pub options: SweepOptions,
}

impl PhotocurrentModel {
    pub fn new(device: DeviceConfig, wavelength_nm: f64, applied_voltage: f64) -> Self {
        Self {
            device,
            wavelength_nm,
            applied_voltage,
            options: SweepOptions::default(),
        }
    }
}

impl FitModel for PhotocurrentModel {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["eta", "gamma", "alpha_0"]
    }

    fn evaluate(&self, xdata: &[f64], params: &[f64]) -> Result<Vec<f64>> {
        check_params(self, params)?;
        let device = DeviceConfig {
            responsivity_scale: params[0],
            coupling: params[1],
            parasitic_absorption: params[2],
            ..self.device
        };
        let points: Vec<_> = xdata
            .iter()
            .map(|&p| device.at(self.wavelength_nm, self.applied_voltage, p))
            .collect();
        Ok(solve_chain(&points, &self.options)?
            .iter()
            .map(|s| s.photocurrent)
            .collect())
    }
}

/// Transmitted power against applied voltage, normalised to its maximum.
///
/// Parameters: `eta`, `alpha_0`.
#[derive(Debug, Clone)]
pub struct VoltageTransmissionModel {
    pub device: DeviceConfig,
    pub wavelength_nm: f64,
    pub power_in: f64,
    pub options: SweepOptions,
}

impl VoltageTransmissionModel {
    pub fn new(device: DeviceConfig, wavelength_nm: f64, power_in: f64) -> Self {
        Self {
            device,
            wavelength_nm,
            power_in,
            options: SweepOptions::default(),
        }
    }
}

impl FitModel for VoltageTransmissionModel {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["eta", "alpha_0"]
    }

    fn evaluate(&self, xdata: &[f64], params: &[f64]) -> Result<Vec<f64>> {
        check_params(self, params)?;
        let device = DeviceConfig {
            responsivity_scale: params[0],
            parasitic_absorption: params[1],
            ..self.device
        };
        let points: Vec<_> = xdata
            .iter()
            .map(|&v| device.at(self.wavelength_nm, v, self.power_in))
            .collect();
        let power_out: Vec<f64> = solve_chain(&points, &self.options)?
            .iter()
            .map(|s| s.power_out)
            .collect();
        let max = power_out.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return Err(KeldyshError::Configuration(
                "transmitted power is zero everywhere; cannot normalise".into(),
            ));
        }
        Ok(power_out.iter().map(|p| p / max).collect())
    }
}

/// Transmitted power against wavelength, `norm · P_out(λ)`.
///
/// Parameters: `eta`, `norm`.
#[derive(Debug, Clone)]
pub struct WavelengthTransmissionModel {
    pub device: DeviceConfig,
    pub applied_voltage: f64,
    pub power_in: f64,
    pub options: SweepOptions,
}

impl WavelengthTransmissionModel {
    pub fn new(device: DeviceConfig, applied_voltage: f64, power_in: f64) -> Self {
        Self {
            device,
            applied_voltage,
            power_in,
            options: SweepOptions::default(),
        }
    }
}

impl FitModel for WavelengthTransmissionModel {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["eta", "norm"]
    }

    fn evaluate(&self, xdata: &[f64], params: &[f64]) -> Result<Vec<f64>> {
        check_params(self, params)?;
        let device = DeviceConfig {
            responsivity_scale: params[0],
            ..self.device
        };
        let points: Vec<_> = xdata
            .iter()
            .map(|&lam| device.at(lam, self.applied_voltage, self.power_in))
            .collect();
        Ok(solve_chain(&points, &self.options)?
            .iter()
            .map(|s| params[1] * s.power_out)
            .collect())
    }
}

// ── Fitting contract ──

/// Measured data and starting parameters for one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitInput {
    pub xdata: Vec<f64>,
    pub ydata: Vec<f64>,
    pub yerror: Option<Vec<f64>>,
    pub initial_guesses: Vec<f64>,
}

/// Per-parameter `(lower, upper)` limits keyed by parameter name.
pub type Bounds = BTreeMap<String, (f64, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub parameters: Vec<f64>,
    pub parameter_errors: Vec<f64>,
    pub chi2: Option<f64>,
    pub ndof: Option<usize>,
    pub p_value: Option<f64>,
    pub success: bool,
}

/// Loss applied to each squared, error-normalised residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loss {
    #[default]
    Linear,
    /// `2 (sqrt(1 + z) - 1)`, less sensitive to outliers.
    SoftL1,
}

/// The least-squares problem handed to a [`Minimizer`].
pub struct LeastSquares<'a> {
    pub xdata: Vec<f64>,
    pub ydata: Vec<f64>,
    pub yerror: Option<Vec<f64>>,
    pub model: &'a dyn FitModel,
    pub initial_guesses: Vec<f64>,
    /// Limits per parameter, in [`FitModel::parameter_names`] order.
    pub limits: Vec<Option<(f64, f64)>>,
    pub loss: Loss,
}

impl LeastSquares<'_> {
    /// Summed loss of the normalised residuals at `params`.
    pub fn cost(&self, params: &[f64]) -> Result<f64> {
        let prediction = self.model.evaluate(&self.xdata, params)?;
        let cost = self
            .ydata
            .iter()
            .zip(&prediction)
            .enumerate()
            .map(|(i, (y, f))| {
                let sigma = self.yerror.as_ref().map_or(1.0, |e| e[i]);
                let z = ((y - f) / sigma).powi(2);
                match self.loss {
                    Loss::Linear => z,
                    Loss::SoftL1 => 2.0 * ((1.0 + z).sqrt() - 1.0),
                }
            })
            .sum();
        Ok(cost)
    }

    /// Data points minus parameters.
    pub fn ndof(&self) -> usize {
        self.ydata.len().saturating_sub(self.initial_guesses.len())
    }
}

/// An external least-squares minimizer.
pub trait Minimizer {
    fn minimize(&self, problem: &LeastSquares<'_>) -> Result<FitResult>;
}

/// Validate the fit, drop outliers and hand the problem to `minimizer`.
pub fn perform_fit(
    input: &FitInput,
    model: &dyn FitModel,
    minimizer: &dyn Minimizer,
    bounds: Option<&Bounds>,
    outliers: &[usize],
    loss: Loss,
) -> Result<FitResult> {
    let names = model.parameter_names();
    if input.initial_guesses.len() != names.len() {
        return Err(KeldyshError::Configuration(format!(
            "{} initial guesses for {} model parameters",
            input.initial_guesses.len(),
            names.len()
        )));
    }
    let n = input.xdata.len();
    if input.ydata.len() != n || input.yerror.as_ref().is_some_and(|e| e.len() != n) {
        return Err(KeldyshError::Configuration(
            "xdata, ydata and yerror must have equal lengths".into(),
        ));
    }
    if let Some(errors) = &input.yerror {
        if errors.iter().any(|&e| !(e.is_finite() && e > 0.0)) {
            return Err(KeldyshError::Configuration("y errors must be positive".into()));
        }
    }
    if let Some(&bad) = outliers.iter().find(|&&i| i >= n) {
        return Err(KeldyshError::Configuration(format!(
            "outlier index {bad} out of range for {n} data points"
        )));
    }

    let mut limits = vec![None; names.len()];
    for (name, &(lo, hi)) in bounds.into_iter().flatten() {
        let index = names.iter().position(|p| *p == name.as_str()).ok_or_else(|| {
            KeldyshError::Configuration(format!("bound on unknown parameter '{name}'"))
        })?;
        if lo > hi {
            return Err(KeldyshError::Configuration(format!(
                "bound on '{name}' has lower {lo} above upper {hi}"
            )));
        }
        limits[index] = Some((lo, hi));
    }

    let keep = |i: &usize| !outliers.contains(i);
    let select = |values: &[f64]| -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, &v)| v)
            .collect()
    };
    let problem = LeastSquares {
        xdata: select(input.xdata.as_slice()),
        ydata: select(input.ydata.as_slice()),
        yerror: input.yerror.as_deref().map(select),
        model,
        initial_guesses: input.initial_guesses.clone(),
        limits,
        loss,
    };
    tracing::debug!(
        points = problem.xdata.len(),
        dropped = outliers.len(),
        "handing fit to minimizer"
    );
    minimizer.minimize(&problem)
}

/// Repeat [`perform_fit`], re-seeding from the previous parameters, until a
/// round succeeds or `rounds` are used up; then fit once more from the
/// latest parameters and return that result.
pub fn perform_fit_rounds(
    input: &FitInput,
    model: &dyn FitModel,
    minimizer: &dyn Minimizer,
    bounds: Option<&Bounds>,
    outliers: &[usize],
    rounds: usize,
    loss: Loss,
) -> Result<FitResult> {
    let mut input = input.clone();
    let mut round = 0;
    let mut success = false;
    while round < rounds && !success {
        let result = perform_fit(&input, model, minimizer, bounds, outliers, loss)?;
        input.initial_guesses = result.parameters;
        success = result.success;
        round += 1;
        tracing::debug!(round, success, "fit round");
    }
    perform_fit(&input, model, minimizer, bounds, outliers, loss)
}
