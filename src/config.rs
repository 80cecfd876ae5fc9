//! TOML configuration deserialisation for sweep jobs.
//!
//! ```toml
//! [material]
//! composition = 0.0
//! temperature = 298.0
//!
//! [device]
//! load_resistance = 0.1      # MΩ
//! absorption_length = 3.5e-3 # cm
//!
//! [sweep]
//! wavelength_nm = 930.0
//! applied_voltage = -4.0
//! power_in = { range = [0.0, 100.0], points = 101 }
//!
//! [solver]
//! method = "newton"
//! failure_policy = "carry-forward"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::analysis::{Continuation, FailurePolicy, SweepOptions, SweepPlan};
use crate::device::DeviceConfig;
use crate::error::{KeldyshError, Result};
use crate::material::MaterialParams;
use crate::solver::{RootMethod, SolverParams};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub material: MaterialConfig,
    #[serde(default)]
    pub device: DeviceSection,
    pub sweep: SweepConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
    #[serde(default)]
    pub composition: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            composition: 0.0,
            temperature: default_temperature(),
        }
    }
}

fn default_temperature() -> f64 {
    298.0
}

/// Device parameters; unset fields take [`DeviceConfig::default`] values.
#[derive(Debug, Default, Deserialize)]
pub struct DeviceSection {
    pub load_resistance: Option<f64>,
    pub absorption_length: Option<f64>,
    pub responsivity_scale: Option<f64>,
    pub coupling: Option<f64>,
    pub parasitic_absorption: Option<f64>,
}

/// Values along one sweep coordinate: a scalar, an explicit list, or a
/// linear range including both ends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AxisSpec {
    Value(f64),
    List(Vec<f64>),
    Values { values: Vec<f64> },
    Range { range: [f64; 2], points: usize },
}

impl AxisSpec {
    pub fn values(&self) -> Result<Vec<f64>> {
        match self {
            AxisSpec::Value(v) => Ok(vec![*v]),
            AxisSpec::List(values) | AxisSpec::Values { values } => Ok(values.clone()),
            AxisSpec::Range { range: [start, stop], points } => match *points {
                0 => Err(KeldyshError::Configuration("range needs at least one point".into())),
                1 => Ok(vec![*start]),
                n => Ok((0..n)
                    .map(|i| start + (stop - start) * i as f64 / (n - 1) as f64)
                    .collect()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SweepConfig {
    pub wavelength_nm: AxisSpec,
    pub applied_voltage: AxisSpec,
    pub power_in: AxisSpec,
}

#[derive(Debug, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub method: RootMethod,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub continuation: Continuation,
    #[serde(default = "default_guess")]
    pub default_guess: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_backtracks")]
    pub max_backtracks: usize,
    #[serde(default = "default_derivative_step")]
    pub derivative_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: RootMethod::default(),
            failure_policy: FailurePolicy::default(),
            continuation: Continuation::default(),
            default_guess: default_guess(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            max_backtracks: default_max_backtracks(),
            derivative_step: default_derivative_step(),
        }
    }
}

fn default_guess() -> f64 {
    1000.0
}
fn default_max_iterations() -> usize {
    100
}
fn default_tolerance() -> f64 {
    1e-9
}
fn default_max_backtracks() -> usize {
    30
}
fn default_derivative_step() -> f64 {
    1e-6
}

impl JobConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validated device description.
    pub fn device(&self) -> Result<DeviceConfig> {
        let defaults = DeviceConfig::default();
        let d = &self.device;
        let device = DeviceConfig {
            material: MaterialParams::new(self.material.composition, self.material.temperature)?,
            load_resistance: d.load_resistance.unwrap_or(defaults.load_resistance),
            absorption_length: d.absorption_length.unwrap_or(defaults.absorption_length),
            responsivity_scale: d.responsivity_scale.unwrap_or(defaults.responsivity_scale),
            coupling: d.coupling.unwrap_or(defaults.coupling),
            parasitic_absorption: d.parasitic_absorption.unwrap_or(defaults.parasitic_absorption),
        };
        device.validate()?;
        Ok(device)
    }

    pub fn plan(&self) -> Result<SweepPlan> {
        let plan = SweepPlan::new(
            self.sweep.wavelength_nm.values()?,
            self.sweep.applied_voltage.values()?,
            self.sweep.power_in.values()?,
        );
        plan.point_count()?;
        Ok(plan)
    }

    pub fn sweep_options(&self) -> SweepOptions {
        let s = &self.solver;
        SweepOptions {
            failure_policy: s.failure_policy,
            continuation: s.continuation,
            default_guess: s.default_guess,
            method: s.method,
            params: SolverParams {
                max_iterations: s.max_iterations,
                tolerance: s.tolerance,
                max_backtracks: s.max_backtracks,
                derivative_step: s.derivative_step,
                ..SolverParams::default()
            },
        }
    }
}
