//! Field-dependent Franz-Keldysh absorption of GaAs.
//!
//! Follows Stillman, Wolfe, Bozler and Rossi, Appl. Phys. Lett. 28, 544
//! (1976): light- and heavy-hole transitions each contribute
//! `(1 + 1/m_h) (2μ)^{4/3} K(β)` with `K = Ai'² - β Ai²` and
//! `β = 1.1e5 (Eg - Eph) (2μ)^{1/3} F^{-2/3}`. The band sum is scaled by
//! `F^{1/3} · 1e4 / n` and an experimental coefficient.

use std::f64::consts::PI;

use crate::airy::fk_kernel;
use crate::dispersion::refractive_index;
use crate::error::DomainError;
use crate::material::MaterialParams;

/// Photon energy (eV) times wavelength (nm).
pub const HC_EV_NM: f64 = 1239.84;

const FK_COEFFICIENT: f64 = 0.58;
const BETA_SCALE: f64 = 1.1e5;
const ABSORPTION_SCALE: f64 = 1e4;

/// Effective-mass parameters of one valence band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleBand {
    /// Hole effective mass (units of m0).
    pub hole_mass: f64,
    /// Reduced electron-hole mass (units of m0).
    pub reduced_mass: f64,
}

pub const LIGHT_HOLE: HoleBand = HoleBand {
    hole_mass: 0.087,
    reduced_mass: 0.0377,
};

pub const HEAVY_HOLE: HoleBand = HoleBand {
    hole_mass: 0.45,
    reduced_mass: 0.0579,
};

impl HoleBand {
    fn weight(&self) -> f64 {
        (1.0 + 1.0 / self.hole_mass) * (2.0 * self.reduced_mass).powf(4.0 / 3.0)
    }

    /// β at unit field; multiply by `F^{-2/3}` for the kernel argument.
    fn unit_field_beta(&self, detuning_ev: f64) -> f64 {
        BETA_SCALE * detuning_ev * (2.0 * self.reduced_mass).cbrt()
    }

    /// `F^{1/3} (1 + 1/m_h)(2μ)^{4/3} K(β)`, or its F → 0 limit.
    fn contribution(&self, detuning_ev: f64, field: f64) -> Result<f64, DomainError> {
        let b = self.unit_field_beta(detuning_ev);
        if field == 0.0 {
            // K(β) → sqrt(-β)/π for β → -∞ and → 0 for β → +∞; the F^{1/3}
            // prefactor cancels the field dependence of sqrt(-β).
            let limit = if b < 0.0 { (-b).sqrt() / PI } else { 0.0 };
            return Ok(self.weight() * limit);
        }
        let beta = b * field.powf(-2.0 / 3.0);
        Ok(self.weight() * fk_kernel(beta)? * field.cbrt())
    }
}

/// Varshni band gap of GaAs (eV).
pub fn band_gap(temperature: f64) -> f64 {
    1.519 - 5.405e-4 * temperature * temperature / (temperature + 204.0)
}

/// Photon energy (eV) at a wavelength in nm.
pub fn photon_energy(wavelength_nm: f64) -> f64 {
    HC_EV_NM / wavelength_nm
}

/// Franz-Keldysh absorption coefficient (cm⁻¹).
///
/// `field` is the field magnitude in V/cm and must be finite and
/// non-negative. `field == 0` evaluates the closed-form zero-field limit:
/// zero below the gap, the square-root direct-gap edge above it.
pub fn absorption(
    wavelength_nm: f64,
    material: &MaterialParams,
    field: f64,
) -> Result<f64, DomainError> {
    if !(field.is_finite() && field >= 0.0) {
        return Err(DomainError::InvalidField { field });
    }
    let n = refractive_index(wavelength_nm, material)?;
    let detuning = band_gap(material.temperature) - photon_energy(wavelength_nm);

    let bands = LIGHT_HOLE.contribution(detuning, field)? + HEAVY_HOLE.contribution(detuning, field)?;
    let alpha = FK_COEFFICIENT * bands * ABSORPTION_SCALE / n;

    if !alpha.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "absorption",
            value: alpha,
        });
    }
    Ok(alpha)
}

/// Element-wise [`absorption`] over a wavelength slice at fixed field.
pub fn absorption_spectrum(
    wavelengths_nm: &[f64],
    material: &MaterialParams,
    field: f64,
) -> Result<Vec<f64>, DomainError> {
    wavelengths_nm
        .iter()
        .map(|&lam| absorption(lam, material, field))
        .collect()
}

/// Absorption at a junction voltage, through the bias-to-field mapping.
///
/// Voltages beyond the built-in voltage give a reversed field, which the
/// absorption model rejects.
pub fn absorption_at_bias(
    wavelength_nm: f64,
    material: &MaterialParams,
    junction_voltage: f64,
) -> Result<f64, DomainError> {
    let field = crate::field::field(junction_voltage)?;
    absorption(wavelength_nm, material, field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn al_gaas_03() -> MaterialParams {
        MaterialParams::new(0.3, 298.0).unwrap()
    }

    #[test]
    fn test_room_temperature_gap() {
        assert_relative_eq!(band_gap(298.0), 1.423_385_334_7, max_relative = 1e-10);
        assert_relative_eq!(photon_energy(930.0), 1.333_161_290_3, max_relative = 1e-10);
    }

    #[test]
    fn test_reference_value_below_gap() {
        let alpha = absorption(930.0, &MaterialParams::gaas(), 451_638.594_213_970_3).unwrap();
        assert_relative_eq!(alpha, 971.311_204_569, max_relative = 1e-7);
    }

    #[test]
    fn test_non_negative_over_field_and_wavelength_grid() {
        let gaas = MaterialParams::gaas();
        for lam in [880.0, 900.0, 930.0, 980.0, 1100.0] {
            for field in [0.0, 1.0, 1e2, 1e4, 5e4, 2e5, 1e6, 5e6] {
                let alpha = absorption(lam, &gaas, field).unwrap();
                assert!(alpha >= 0.0, "alpha({lam}, {field}) = {alpha}");
            }
        }
    }

    #[test]
    fn test_non_decreasing_in_field_below_gap() {
        let gaas = MaterialParams::gaas();
        for lam in [900.0, 930.0, 960.0] {
            let mut previous = 0.0;
            let mut field = 3e4;
            while field < 2e6 {
                let alpha = absorption(lam, &gaas, field).unwrap();
                assert!(alpha >= previous, "alpha decreased at {lam} nm, {field} V/cm");
                previous = alpha;
                field *= 1.25;
            }
        }
    }

    #[test]
    fn test_handles_above_gap_light() {
        // AlGaAs index stays valid at 850 nm while the GaAs gap lies below it.
        let alpha = absorption(850.0, &al_gaas_03(), 1e5).unwrap();
        assert!(alpha > 1e4, "alpha = {alpha}");
    }

    // ── Zero-field limit ──

    #[test]
    fn test_zero_field_is_zero_below_gap() {
        assert_eq!(absorption(930.0, &MaterialParams::gaas(), 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_field_limit_is_continuous_above_gap() {
        let material = al_gaas_03();
        let at_zero = absorption(850.0, &material, 0.0).unwrap();
        let tiny = absorption(850.0, &material, 1e-6).unwrap();
        assert_relative_eq!(at_zero, 13_114.493_68, max_relative = 1e-6);
        assert_relative_eq!(at_zero, tiny, max_relative = 1e-8);
    }

    #[test]
    fn test_rejects_negative_or_non_finite_field() {
        let gaas = MaterialParams::gaas();
        assert_eq!(
            absorption(930.0, &gaas, -1.0),
            Err(DomainError::InvalidField { field: -1.0 })
        );
        assert!(absorption(930.0, &gaas, f64::NAN).is_err());
        assert!(absorption(930.0, &gaas, f64::INFINITY).is_err());
    }

    #[test]
    fn test_index_domain_errors_propagate() {
        assert!(matches!(
            absorption(870.0, &MaterialParams::gaas(), 1e5),
            Err(DomainError::NegativePermittivity { .. })
        ));
    }

    #[test]
    fn test_spectrum_and_bias_helpers_agree_with_pointwise_model() {
        let gaas = MaterialParams::gaas();
        let lams = [920.0, 940.0];
        let spectrum = absorption_spectrum(&lams, &gaas, 2e5).unwrap();
        assert_eq!(spectrum[1], absorption(940.0, &gaas, 2e5).unwrap());

        let via_bias = absorption_at_bias(930.0, &gaas, -4.0).unwrap();
        let field = crate::field::field(-4.0).unwrap();
        assert_eq!(via_bias, absorption(930.0, &gaas, field).unwrap());
        assert!(matches!(
            absorption_at_bias(930.0, &gaas, 2.0),
            Err(DomainError::InvalidField { .. })
        ));
    }
}
