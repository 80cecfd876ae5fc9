//! Device configuration and operating points.
//!
//! Units follow the measurement setup: optical power in µW, load resistance
//! in MΩ (so µW · A/W · MΩ is volts), absorption length in cm, absorption
//! coefficients in cm⁻¹, wavelengths in nm.

use std::fmt;

use crate::error::{KeldyshError, Result};
use crate::material::MaterialParams;

/// Photon energy · wavelength in eV·µm; `λ[µm] / 1.24` is the ideal
/// responsivity in A/W.
const HC_EV_UM: f64 = 1.24;

/// Everything about the photodiode that stays fixed along a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceConfig {
    pub material: MaterialParams,
    /// Load resistance R (MΩ).
    pub load_resistance: f64,
    /// Absorption length L (cm).
    pub absorption_length: f64,
    /// Quantum-efficiency scale η of the responsivity.
    pub responsivity_scale: f64,
    /// Coupling γ of the Franz-Keldysh absorption to the absorbed power.
    pub coupling: f64,
    /// Field-independent parasitic absorption α0 (cm⁻¹).
    pub parasitic_absorption: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            material: MaterialParams::gaas(),
            load_resistance: 0.1,
            absorption_length: 3.5e-3,
            responsivity_scale: 1.0,
            coupling: 1.0,
            parasitic_absorption: 0.0,
        }
    }
}

impl DeviceConfig {
    /// Operating point of this device.
    pub fn at(&self, wavelength_nm: f64, applied_voltage: f64, power_in: f64) -> OperatingPoint {
        OperatingPoint {
            device: *self,
            wavelength_nm,
            applied_voltage,
            power_in,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.material.validate()?;
        non_negative("load resistance", self.load_resistance)?;
        non_negative("responsivity scale", self.responsivity_scale)?;
        non_negative("coupling", self.coupling)?;
        non_negative("parasitic absorption", self.parasitic_absorption)?;
        if !(self.absorption_length.is_finite() && self.absorption_length > 0.0) {
            return Err(KeldyshError::Configuration(format!(
                "absorption length {} cm must be positive",
                self.absorption_length
            )));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(KeldyshError::Configuration(format!(
            "{name} {value} must be finite and non-negative"
        )))
    }
}

/// One instance of the self-consistent absorption problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub device: DeviceConfig,
    pub wavelength_nm: f64,
    /// Applied bias V_app (V); negative is reverse bias.
    pub applied_voltage: f64,
    /// Incident optical power P_in (µW).
    pub power_in: f64,
}

impl OperatingPoint {
    /// Check the inputs; a rejection message ends with the full point.
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(|e| match e {
            KeldyshError::Configuration(msg) => {
                KeldyshError::Configuration(format!("{msg} at {self}"))
            }
            other => other,
        })
    }

    fn check(&self) -> Result<()> {
        self.device.validate()?;
        if !(self.wavelength_nm.is_finite() && self.wavelength_nm > 0.0) {
            return Err(KeldyshError::Configuration(format!(
                "wavelength {} nm must be positive",
                self.wavelength_nm
            )));
        }
        if !self.applied_voltage.is_finite() {
            return Err(KeldyshError::Configuration(format!(
                "applied voltage {} V is not finite",
                self.applied_voltage
            )));
        }
        non_negative("incident power", self.power_in)
    }

    /// Responsivity η λ[µm] / 1.24 (A/W).
    pub fn responsivity(&self) -> f64 {
        self.device.responsivity_scale / HC_EV_UM * (self.wavelength_nm / 1000.0)
    }

    /// Total attenuation exponent L (γα + α0).
    pub fn optical_depth(&self, alpha: f64) -> f64 {
        self.device.absorption_length * (self.device.coupling * alpha + self.device.parasitic_absorption)
    }

    /// Absorbed fraction 1 - exp(-L (γα + α0)).
    pub fn absorbed_fraction(&self, alpha: f64) -> f64 {
        -(-self.optical_depth(alpha)).exp_m1()
    }

    /// Voltage across the junction once the photocurrent drops over the load.
    pub fn device_voltage(&self, alpha: f64) -> f64 {
        self.applied_voltage + self.photocurrent(alpha) * self.device.load_resistance
    }

    /// Transmitted power P_in exp(-L (γα + α0)) (µW).
    pub fn output_power(&self, alpha: f64) -> f64 {
        self.power_in * (-self.optical_depth(alpha)).exp()
    }

    /// Photocurrent (µA).
    pub fn photocurrent(&self, alpha: f64) -> f64 {
        self.power_in * self.responsivity() * self.absorbed_fraction(alpha)
    }
}

impl fmt::Display for OperatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.device;
        write!(
            f,
            "λ = {} nm, V_app = {} V, P_in = {} µW, R = {} MΩ, L = {} cm, η = {}, γ = {}, α0 = {} cm⁻¹, x = {}, T = {} K",
            self.wavelength_nm,
            self.applied_voltage,
            self.power_in,
            d.load_resistance,
            d.absorption_length,
            d.responsivity_scale,
            d.coupling,
            d.parasitic_absorption,
            d.material.composition,
            d.material.temperature,
        )
    }
}
