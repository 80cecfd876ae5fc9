//! Airy functions Ai, Ai', Bi, Bi' on the real line.
//!
//! Inside `[-SERIES_NEG_LIMIT, SERIES_POS_LIMIT]` the Maclaurin series
//! `Ai = c1 f - c2 g`, `Bi = sqrt(3) (c1 f + c2 g)` is summed directly.
//! Outside, the Poincaré expansions of DLMF §9.7 are truncated at their
//! smallest term. The crossover points balance series cancellation against
//! the asymptotic truncation error, which keeps the relative error near 1e-8
//! in the worst case and much smaller elsewhere.

use std::f64::consts::{FRAC_PI_4, PI};

use crate::error::DomainError;

/// Ai(0).
const C1: f64 = 0.355_028_053_887_817_24;
/// -Ai'(0).
const C2: f64 = 0.258_819_403_792_806_8;
const SQRT_3: f64 = 1.732_050_807_568_877_2;

const SERIES_POS_LIMIT: f64 = 5.8;
const SERIES_NEG_LIMIT: f64 = 7.0;
const MAX_SERIES_TERMS: usize = 200;
const ASYMPTOTIC_TERMS: usize = 40;

/// Beyond this phase the oscillatory parts of the kernel average out below
/// double precision.
const KERNEL_PHASE_LIMIT: f64 = 1e8;

/// One of the four Airy functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiryKind {
    Ai,
    AiPrime,
    Bi,
    BiPrime,
}

impl AiryKind {
    pub const ALL: [AiryKind; 4] = [
        AiryKind::Ai,
        AiryKind::AiPrime,
        AiryKind::Bi,
        AiryKind::BiPrime,
    ];
}

impl TryFrom<i64> for AiryKind {
    type Error = DomainError;

    /// Maps the conventional selector (0 = Ai, 1 = Ai', 2 = Bi, 3 = Bi').
    fn try_from(kind: i64) -> Result<Self, Self::Error> {
        match kind {
            0 => Ok(AiryKind::Ai),
            1 => Ok(AiryKind::AiPrime),
            2 => Ok(AiryKind::Bi),
            3 => Ok(AiryKind::BiPrime),
            other => Err(DomainError::InvalidAiryKind(other)),
        }
    }
}

impl From<AiryKind> for i64 {
    fn from(kind: AiryKind) -> Self {
        match kind {
            AiryKind::Ai => 0,
            AiryKind::AiPrime => 1,
            AiryKind::Bi => 2,
            AiryKind::BiPrime => 3,
        }
    }
}

/// All four Airy functions at one argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiryValues {
    pub ai: f64,
    pub ai_prime: f64,
    pub bi: f64,
    pub bi_prime: f64,
}

impl AiryValues {
    pub fn get(&self, kind: AiryKind) -> f64 {
        match kind {
            AiryKind::Ai => self.ai,
            AiryKind::AiPrime => self.ai_prime,
            AiryKind::Bi => self.bi,
            AiryKind::BiPrime => self.bi_prime,
        }
    }
}

/// Evaluate a single Airy function.
pub fn airy(kind: AiryKind, z: f64) -> Result<f64, DomainError> {
    airy_all(z).map(|values| values.get(kind))
}

/// Evaluate Ai, Ai', Bi and Bi' together.
///
/// Bi and Bi' overflow to `+inf` beyond z ≈ 104; Ai and Ai' underflow to 0.
pub fn airy_all(z: f64) -> Result<AiryValues, DomainError> {
    if !z.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "Airy argument",
            value: z,
        });
    }
    let values = if z > SERIES_POS_LIMIT {
        positive_asymptotic(z)
    } else if z < -SERIES_NEG_LIMIT {
        negative_asymptotic(-z)
    } else {
        maclaurin(z)
    };
    Ok(values)
}

/// `Ai'(z)^2 - z Ai(z)^2`, the Franz-Keldysh line-shape kernel.
///
/// Its derivative is `-Ai(z)^2`, so the kernel equals `∫_z^∞ Ai(t)^2 dt`:
/// non-negative and non-increasing. For large positive z both squares agree
/// to leading order; the difference is formed from the expansion
/// coefficients directly so nothing cancels.
pub fn fk_kernel(z: f64) -> Result<f64, DomainError> {
    if !z.is_finite() {
        return Err(DomainError::NonFinite {
            quantity: "Franz-Keldysh kernel argument",
            value: z,
        });
    }

    if z > SERIES_POS_LIMIT {
        let zeta = 2.0 / 3.0 * z.powf(1.5);
        if 2.0 * zeta > 745.0 {
            return Ok(0.0);
        }
        let (u, v) = asymptotic_coefficients();
        let mut diff = [0.0; ASYMPTOTIC_TERMS];
        let mut sum = [0.0; ASYMPTOTIC_TERMS];
        for k in 0..ASYMPTOTIC_TERMS {
            diff[k] = v[k] - u[k];
            sum[k] = v[k] + u[k];
        }
        let inv = 1.0 / zeta;
        let d = truncated_sum(&diff, 1, inv, -1.0);
        let s = truncated_sum(&sum, 0, inv, -1.0);
        return Ok(z.sqrt() * (-2.0 * zeta).exp() / (4.0 * PI) * d * s);
    }

    if z < -SERIES_NEG_LIMIT {
        let x = -z;
        let zeta = 2.0 / 3.0 * x.powf(1.5);
        if zeta > KERNEL_PHASE_LIMIT {
            return Ok(x.sqrt() / PI);
        }
        let sums = OscillatorySums::new(zeta);
        let (sin, cos) = (zeta - FRAC_PI_4).sin_cos();
        let ai_part = cos * sums.p + sin * sums.q;
        let ai_prime_part = sin * sums.r - cos * sums.s;
        return Ok(x.sqrt() / PI * (ai_prime_part * ai_prime_part + ai_part * ai_part));
    }

    let values = maclaurin(z);
    // The integral form bounds the kernel below by zero.
    Ok((values.ai_prime * values.ai_prime - z * values.ai * values.ai).max(0.0))
}

fn maclaurin(z: f64) -> AiryValues {
    let z3 = z * z * z;
    // f, g and their derivatives, each built from its own term recurrence.
    let (mut f, mut t) = (1.0, 1.0);
    let (mut g, mut s) = (z, z);
    let (mut fp, mut u) = (0.5 * z * z, 0.5 * z * z);
    let (mut gp, mut w) = (1.0, 1.0);

    for k in 0..MAX_SERIES_TERMS {
        let k3 = 3.0 * k as f64;
        t *= z3 / ((k3 + 2.0) * (k3 + 3.0));
        s *= z3 / ((k3 + 3.0) * (k3 + 4.0));
        u *= z3 / ((k3 + 3.0) * (k3 + 5.0));
        w *= z3 / ((k3 + 3.0) * (k3 + 1.0));
        f += t;
        g += s;
        fp += u;
        gp += w;

        let largest_term = t.abs().max(s.abs()).max(u.abs()).max(w.abs());
        let scale = f.abs().max(g.abs()).max(fp.abs()).max(gp.abs());
        if largest_term <= 0.1 * f64::EPSILON * scale {
            break;
        }
    }

    AiryValues {
        ai: C1 * f - C2 * g,
        ai_prime: C1 * fp - C2 * gp,
        bi: SQRT_3 * (C1 * f + C2 * g),
        bi_prime: SQRT_3 * (C1 * fp + C2 * gp),
    }
}

fn positive_asymptotic(z: f64) -> AiryValues {
    let (u, v) = asymptotic_coefficients();
    let zeta = 2.0 / 3.0 * z.powf(1.5);
    let inv = 1.0 / zeta;
    let quarter = z.powf(0.25);
    let sqrt_pi = PI.sqrt();
    let decay = (-zeta).exp();
    let growth = zeta.exp();

    AiryValues {
        ai: decay / (2.0 * sqrt_pi * quarter) * truncated_sum(&u, 0, inv, -1.0),
        ai_prime: -quarter * decay / (2.0 * sqrt_pi) * truncated_sum(&v, 0, inv, -1.0),
        bi: growth / (sqrt_pi * quarter) * truncated_sum(&u, 0, inv, 1.0),
        bi_prime: quarter * growth / sqrt_pi * truncated_sum(&v, 0, inv, 1.0),
    }
}

/// Expansions for `Ai(-x)`, `Bi(-x)` with `x > 0` (DLMF 9.7.9 - 9.7.12).
fn negative_asymptotic(x: f64) -> AiryValues {
    let zeta = 2.0 / 3.0 * x.powf(1.5);
    let sums = OscillatorySums::new(zeta);
    let quarter = x.powf(0.25);
    let sqrt_pi = PI.sqrt();
    let (sin, cos) = (zeta - FRAC_PI_4).sin_cos();

    AiryValues {
        ai: (cos * sums.p + sin * sums.q) / (sqrt_pi * quarter),
        ai_prime: quarter * (sin * sums.r - cos * sums.s) / sqrt_pi,
        bi: (cos * sums.q - sin * sums.p) / (sqrt_pi * quarter),
        bi_prime: quarter * (cos * sums.r + sin * sums.s) / sqrt_pi,
    }
}

/// Even/odd alternating sub-series of the u_k and v_k expansions.
struct OscillatorySums {
    p: f64,
    q: f64,
    r: f64,
    s: f64,
}

impl OscillatorySums {
    fn new(zeta: f64) -> Self {
        let (u, v) = asymptotic_coefficients();
        Self {
            p: alternating_subseries(&u, 0, zeta),
            q: alternating_subseries(&u, 1, zeta),
            r: alternating_subseries(&v, 0, zeta),
            s: alternating_subseries(&v, 1, zeta),
        }
    }
}

/// `Σ_k (-1)^k c_{2k+parity} ζ^{-(2k+parity)}`, truncated at its smallest term.
fn alternating_subseries(c: &[f64; ASYMPTOTIC_TERMS], parity: usize, zeta: f64) -> f64 {
    let inv = 1.0 / zeta;
    let inv_sq = inv * inv;
    let mut power = if parity == 1 { inv } else { 1.0 };
    let mut sign = 1.0;
    let mut sum = 0.0;
    let mut previous = f64::INFINITY;

    for index in (parity..ASYMPTOTIC_TERMS).step_by(2) {
        let term = sign * c[index] * power;
        if term.abs() > previous {
            break;
        }
        sum += term;
        if term.abs() <= f64::EPSILON * sum.abs() {
            break;
        }
        previous = term.abs();
        power *= inv_sq;
        sign = -sign;
    }
    sum
}

/// `Σ_{k>=first} (sign/ζ)^k c_k`, truncated at its smallest term.
fn truncated_sum(c: &[f64; ASYMPTOTIC_TERMS], first: usize, inv_zeta: f64, sign: f64) -> f64 {
    let ratio = sign * inv_zeta;
    let mut power = ratio.powi(first as i32);
    let mut sum = 0.0;
    let mut previous = f64::INFINITY;

    for &ck in &c[first..] {
        let term = ck * power;
        if term.abs() > previous {
            break;
        }
        sum += term;
        if term.abs() <= f64::EPSILON * sum.abs() {
            break;
        }
        previous = term.abs();
        power *= ratio;
    }
    sum
}

/// Coefficients u_k, v_k of DLMF 9.7.2.
fn asymptotic_coefficients() -> ([f64; ASYMPTOTIC_TERMS], [f64; ASYMPTOTIC_TERMS]) {
    let mut u = [0.0; ASYMPTOTIC_TERMS];
    let mut v = [0.0; ASYMPTOTIC_TERMS];
    u[0] = 1.0;
    v[0] = 1.0;
    for k in 1..ASYMPTOTIC_TERMS {
        let kf = k as f64;
        u[k] = u[k - 1] * (6.0 * kf - 5.0) * (6.0 * kf - 3.0) * (6.0 * kf - 1.0)
            / ((2.0 * kf - 1.0) * 216.0 * kf);
        v[k] = -(6.0 * kf + 1.0) / (6.0 * kf - 1.0) * u[k];
    }
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn check(z: f64, expected: [f64; 4], rel: f64) {
        let values = airy_all(z).unwrap();
        for (kind, want) in AiryKind::ALL.iter().zip(expected) {
            assert_relative_eq!(values.get(*kind), want, max_relative = rel);
        }
    }

    // ── Reference values (80-digit series) ──

    #[test]
    fn test_values_at_origin() {
        check(
            0.0,
            [
                3.550280538878172e-1,
                -2.588194037928068e-1,
                6.149266274460007e-1,
                4.482883573538264e-1,
            ],
            1e-14,
        );
    }

    #[test]
    fn test_values_in_series_region() {
        check(
            1.0,
            [
                1.352924163128814e-1,
                -1.591474412967932e-1,
                1.207423594952871,
                9.324359333927756e-1,
            ],
            1e-13,
        );
        check(
            -2.0,
            [
                2.274074282016856e-1,
                6.182590207416910e-1,
                -4.123025879563985e-1,
                2.787951669211695e-1,
            ],
            1e-12,
        );
        check(
            5.0,
            [
                1.083444281360744e-4,
                -2.474138908684625e-4,
                6.577920441711711e2,
                1.435819080217982e3,
            ],
            1e-8,
        );
    }

    #[test]
    fn test_values_in_positive_asymptotic_region() {
        check(
            8.0,
            [
                4.692207616099232e-8,
                -1.341439297906786e-7,
                1.199586004124460e6,
                3.354342312744539e6,
            ],
            1e-10,
        );
        check(
            10.0,
            [
                1.104753255289869e-10,
                -3.520633676738924e-10,
                4.556411535482252e8,
                1.429236134482866e9,
            ],
            1e-12,
        );
    }

    #[test]
    fn test_values_in_oscillatory_region() {
        check(
            -10.0,
            [
                4.024123848644319e-2,
                9.962650441327900e-1,
                -3.146798296438386e-1,
                1.194141133999092e-1,
            ],
            1e-9,
        );
        check(
            -20.0,
            [
                -1.764061270779847e-1,
                8.928628567364713e-1,
                -2.001393093226513e-1,
                -7.914290338395364e-1,
            ],
            1e-9,
        );
    }

    #[test]
    fn test_wronskian_holds_across_regions() {
        // Ai Bi' - Ai' Bi = 1/pi
        for z in [-30.0, -7.5, -6.5, -1.0, 0.5, 3.0, 5.5, 6.5] {
            let v = airy_all(z).unwrap();
            let w = v.ai * v.bi_prime - v.ai_prime * v.bi;
            assert_relative_eq!(w, 1.0 / PI, max_relative = 1e-7);
        }
    }

    // ── Selector ──

    #[test]
    fn test_selector_accepts_exactly_four_kinds() {
        for (i, kind) in AiryKind::ALL.iter().enumerate() {
            assert_eq!(AiryKind::try_from(i as i64).unwrap(), *kind);
            assert_eq!(i64::from(*kind), i as i64);
        }
        assert_eq!(
            AiryKind::try_from(4),
            Err(DomainError::InvalidAiryKind(4))
        );
        assert_eq!(
            AiryKind::try_from(-1),
            Err(DomainError::InvalidAiryKind(-1))
        );
    }

    #[test]
    fn test_rejects_non_finite_argument() {
        assert!(airy(AiryKind::Ai, f64::NAN).is_err());
        assert!(fk_kernel(f64::INFINITY).is_err());
    }

    // ── Kernel ──

    #[test]
    fn test_kernel_matches_reference_values() {
        assert_relative_eq!(fk_kernel(0.0).unwrap(), 6.698748377966399e-2, max_relative = 1e-13);
        assert_relative_eq!(fk_kernel(-2.0).unwrap(), 4.856724935310843e-1, max_relative = 1e-12);
        assert_relative_eq!(fk_kernel(6.0).unwrap(), 1.957541219525750e-11, max_relative = 1e-7);
        assert_relative_eq!(fk_kernel(10.0).unwrap(), 1.900639350526154e-21, max_relative = 1e-10);
        assert_relative_eq!(fk_kernel(-10.0).unwrap(), 1.008737610910138, max_relative = 1e-10);
    }

    #[test]
    fn test_kernel_is_non_negative_and_non_increasing() {
        let mut previous = f64::INFINITY;
        let mut z = -40.0;
        while z < 40.0 {
            let k = fk_kernel(z).unwrap();
            assert!(k >= 0.0, "kernel({z}) = {k}");
            assert!(k <= previous * (1.0 + 1e-6), "kernel increased at z = {z}");
            previous = k;
            z += 0.25;
        }
    }

    #[test]
    fn test_kernel_tends_to_sqrt_law_for_large_negative_argument() {
        let x = 1e18;
        assert_relative_eq!(fk_kernel(-x).unwrap(), x.sqrt() / PI, max_relative = 1e-12);
        assert_eq!(fk_kernel(1e6).unwrap(), 0.0);
    }
}
