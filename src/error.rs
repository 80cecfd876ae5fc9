use thiserror::Error;

use crate::device::OperatingPoint;

/// A model-layer input outside the physical domain of the formulas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("depletion radicand {radicand} is negative at V_d = {voltage} V")]
    NegativeRadicand { voltage: f64, radicand: f64 },

    #[error(
        "permittivity {permittivity} is not positive at {wavelength_nm} nm (x = {composition}, T = {temperature} K)"
    )]
    NegativePermittivity {
        wavelength_nm: f64,
        composition: f64,
        temperature: f64,
        permittivity: f64,
    },

    #[error("field magnitude {field} V/cm is negative or not finite")]
    InvalidField { field: f64 },

    #[error("wavelength {wavelength_nm} nm must be positive and finite")]
    InvalidWavelength { wavelength_nm: f64 },

    #[error("Airy kind {0} is not one of 0, 1, 2, 3")]
    InvalidAiryKind(i64),

    #[error("{quantity} evaluated to {value}")]
    NonFinite { quantity: &'static str, value: f64 },
}

/// Why a single fixed-point solve stopped without an answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvergenceFailure {
    #[error("no convergence after {iterations} iterations (residual {residual:e})")]
    MaxIterations { iterations: usize, residual: f64 },

    #[error("iterate left the physical domain at iteration {iteration}: {source}")]
    DomainExit {
        iteration: usize,
        #[source]
        source: DomainError,
    },

    #[error("converged to a negative absorption coefficient {alpha} cm^-1")]
    NegativeAbsorption { alpha: f64 },

    #[error("residual slope vanished at iteration {iteration}")]
    ZeroDerivative { iteration: usize },

    #[error("iteration {iteration} produced a non-finite iterate")]
    NonFinite { iteration: usize },
}

#[derive(Debug, Error)]
pub enum KeldyshError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Convergence failure at {point}: {reason}")]
    Convergence {
        point: Box<OperatingPoint>,
        reason: ConvergenceFailure,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeldyshError {
    pub fn convergence(point: &OperatingPoint, reason: ConvergenceFailure) -> Self {
        Self::Convergence {
            point: Box::new(*point),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeldyshError>;
