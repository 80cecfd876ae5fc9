//! Junction voltage to internal electric field.
//!
//! The p-i-n stack is modelled as an intrinsic layer of 100 nm plus the
//! voltage-dependent depletion of the doped layers:
//! `w = 1e-7 · sqrt(1e4 + 795.5 · (V_bi - V_d))` cm. The radicand is formed
//! in nm² (795.5 nm²/V collects `2 ε_r ε_0 (N_A + N_D) / (q N_A N_D)` for
//! N_A = 1e25 m⁻³, N_D = 2e24 m⁻³) and rescaled afterwards.

use crate::error::DomainError;

/// Built-in voltage of the device family (V).
pub const V_BUILT_IN: f64 = 1.4;
/// Measured built-in voltages of the p-i-n stack.
pub const V_BI_300K: f64 = 1.406;
pub const V_BI_4K: f64 = 1.424;

/// Intrinsic-layer thickness squared (nm²).
const INTRINSIC_SQ_NM2: f64 = 1e4;
/// Depletion coefficient (nm²/V).
const DEPLETION_NM2_PER_V: f64 = 795.5;
const NM_TO_CM: f64 = 1e-7;

/// Doped-side depletion coefficient for N_D/N_A = 2 (nm²/V).
const PIN_DEPLETION_NM2_PER_V: f64 = 722.9;

/// Largest junction voltage with a real depletion width.
pub fn max_junction_voltage() -> f64 {
    V_BUILT_IN + INTRINSIC_SQ_NM2 / DEPLETION_NM2_PER_V
}

/// Depletion width (cm) at junction voltage `v_d`.
pub fn depletion_width(v_d: f64) -> Result<f64, DomainError> {
    if !v_d.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "junction voltage",
            value: v_d,
        });
    }
    let radicand = INTRINSIC_SQ_NM2 + DEPLETION_NM2_PER_V * (V_BUILT_IN - v_d);
    if radicand < 0.0 {
        return Err(DomainError::NegativeRadicand {
            voltage: v_d,
            radicand,
        });
    }
    Ok(NM_TO_CM * radicand.sqrt())
}

/// Signed internal field (V/cm), `-(v_d - V_bi) / w`.
///
/// Positive under reverse bias, exactly zero at `V_bi`, negative beyond it.
/// At the radicand boundary itself `w = 0`; that single point is rejected
/// as non-finite.
pub fn field(v_d: f64) -> Result<f64, DomainError> {
    let width = depletion_width(v_d)?;
    let f = (V_BUILT_IN - v_d) / width;
    if !f.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "field",
            value: f,
        });
    }
    Ok(f)
}

/// p- and n-side depletion widths (nm) of a p-i-n junction with intrinsic
/// thickness `d_i` (nm), assuming N_D/N_A = 2 so that `d_p = 2 d_n`.
pub fn pin_depletion_widths(d_i: f64, v_bi: f64, v_app: f64) -> Result<(f64, f64), DomainError> {
    let radicand = 4.0 * d_i * d_i + 12.0 * PIN_DEPLETION_NM2_PER_V * (v_bi - v_app);
    if !radicand.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "p-i-n depletion radicand",
            value: radicand,
        });
    }
    if radicand < 0.0 {
        return Err(DomainError::NegativeRadicand {
            voltage: v_app,
            radicand,
        });
    }
    let d_n = (-2.0 * d_i + radicand.sqrt()) / 6.0;
    Ok((2.0 * d_n, d_n))
}
