//! Material description shared by the dispersion and absorption models.

use crate::error::{KeldyshError, Result};

/// Al(x)Ga(1-x)As material parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Aluminium mole fraction x in [0, 1].
    pub composition: f64,
    /// Lattice temperature (K).
    pub temperature: f64,
}

impl MaterialParams {
    /// Validated constructor.
    pub fn new(composition: f64, temperature: f64) -> Result<Self> {
        let params = Self {
            composition,
            temperature,
        };
        params.validate()?;
        Ok(params)
    }

    /// Room-temperature GaAs.
    pub fn gaas() -> Self {
        Self {
            composition: 0.0,
            temperature: 298.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.composition) {
            return Err(KeldyshError::Configuration(format!(
                "composition x = {} is outside [0, 1]",
                self.composition
            )));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(KeldyshError::Configuration(format!(
                "temperature {} K must be positive",
                self.temperature
            )));
        }
        Ok(())
    }
}
