//! Refractive index of Al(x)Ga(1-x)As below the band gap.
//!
//! Gehrsitz et al., J. Appl. Phys. 87, 7825 (2000): a phonon-corrected Γ gap
//! feeds a Sellmeier-type expansion with one background term and three
//! resonance poles. Energies are wavenumbers in µm⁻¹ (E[eV] / 1.239856).

use crate::error::DomainError;
use crate::material::MaterialParams;

const EV_TO_INV_UM: f64 = 1.239_856;

/// Unrenormalised Γ gap of GaAs.
const E_GAMMA_0: f64 = 1.5192 / EV_TO_INV_UM;
/// Debye-like and TO phonon energies with their coupling strengths.
const E_DEBYE: f64 = 15.9e-3 / EV_TO_INV_UM;
const E_TO: f64 = 33.6e-3 / EV_TO_INV_UM;
const S_DEBYE: f64 = 1.8;
const S_TO: f64 = 1.1;
const K_BOLTZMANN: f64 = 0.086_170_8e-3 / EV_TO_INV_UM;

/// Resonance strengths and positions of the weak far-infrared poles.
const C2_GAAS: f64 = 1.55e-3;
const C2_ALAS: f64 = 2.61e-3;
const E22_GAAS: f64 = 0.724e-3;
const E22_ALAS: f64 = 1.331e-3;

/// Phonon-renormalised Γ gap of GaAs at temperature `t` (µm⁻¹).
fn gamma_gap(t: f64) -> f64 {
    let phonon = |energy: f64, strength: f64| {
        strength * energy * (1.0 - 1.0 / (energy / (2.0 * K_BOLTZMANN * t)).tanh())
    };
    E_GAMMA_0 + phonon(E_DEBYE, S_DEBYE) + phonon(E_TO, S_TO)
}

/// Relative permittivity ε(λ, x, T). May be non-positive near or above the gap.
pub fn permittivity(wavelength_nm: f64, material: &MaterialParams) -> Result<f64, DomainError> {
    if !(wavelength_nm.is_finite() && wavelength_nm > 0.0) {
        return Err(DomainError::InvalidWavelength { wavelength_nm });
    }
    let x = material.composition;
    let t = material.temperature;
    let e = 1000.0 / wavelength_nm;
    let e2 = e * e;

    // Table II, GaAs fit 2.
    let a0 = 5.9613 + 7.178e-4 * t - 0.953e-6 * t * t;
    let e12_gaas = 4.7171 - 3.237e-4 * t - 1.358e-6 * t * t;

    // Table IV composition polynomials.
    let a = a0 - 16.159 * x + 43.511 * x.powi(2) - 71.317 * x.powi(3) + 57.535 * x.powi(4)
        - 17.451 * x.powi(5);
    let c1 = 21.5647 + 113.74 * x - 122.5 * x.powi(2) + 108.401 * x.powi(3) - 47.318 * x.powi(4);
    let e12 = e12_gaas + 11.006 * x - 3.08 * x.powi(2);
    let inv_c0 = 50.535 - 150.7 * x - 62.209 * x.powi(2) + 797.16 * x.powi(3)
        - 1125.0 * x.powi(4)
        + 503.79 * x.powi(5);
    let e0 = gamma_gap(t) + 1.1308 * x + 0.1436 * x.powi(2);

    let far_ir = (1.0 - x) * C2_GAAS / (E22_GAAS - e2) + x * C2_ALAS / (E22_ALAS - e2);
    let eps = a + 1.0 / (inv_c0 * (e0 * e0 - e2)) + c1 / (e12 - e2) + far_ir;

    if !eps.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "permittivity",
            value: eps,
        });
    }
    Ok(eps)
}

/// Refractive index n = sqrt(ε). A non-positive ε (light at or above the
/// gap pole) is a domain error.
pub fn refractive_index(wavelength_nm: f64, material: &MaterialParams) -> Result<f64, DomainError> {
    let eps = permittivity(wavelength_nm, material)?;
    if eps <= 0.0 {
        return Err(DomainError::NegativePermittivity {
            wavelength_nm,
            composition: material.composition,
            temperature: material.temperature,
            permittivity: eps,
        });
    }
    Ok(eps.sqrt())
}

/// Element-wise [`refractive_index`] over a wavelength slice.
pub fn refractive_index_spectrum(
    wavelengths_nm: &[f64],
    material: &MaterialParams,
) -> Result<Vec<f64>, DomainError> {
    wavelengths_nm
        .iter()
        .map(|&lam| refractive_index(lam, material))
        .collect()
}
