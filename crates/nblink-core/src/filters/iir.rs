//! Butterworth IIR Bandpass
//!
//! Butterworth bandpass designed through the classical analog route:
//! prototype poles on the unit semicircle, lowpass-to-bandpass transform
//! around the prewarped band edges, then the bilinear transform into the
//! z-plane. The result is kept in rational `(b, a)` polynomial form and
//! run as a Direct Form II Transposed recursion over complex samples.
//!
//! Stability is checked by rooting the denominator with a companion-matrix
//! QR iteration. An unstable design is not rejected; [`IirBandpass::verify_and_mitigate`]
//! rescales the numerator, logs a warning, and reports both verdicts. The
//! rescale bounds the output energy but cannot move the poles, so the
//! post-mitigation report typically still shows `|p| >= 1`.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::filters::iir::IirBandpass;
//!
//! let filter = IirBandpass::design(2.11e9, 2.17e9, 5e9, 4);
//! assert!(filter.stability_report().is_stable);
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::Filter;

/// Pole-placement verdict for an IIR design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    /// Largest pole modulus.
    pub max_pole_modulus: f64,
    /// True iff every pole lies strictly inside the unit circle.
    pub is_stable: bool,
}

/// Verdicts before and after numerator rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityOutcome {
    pub before: StabilityReport,
    pub after: StabilityReport,
    /// True if the numerator was rescaled.
    pub mitigated: bool,
}

/// Butterworth bandpass in rational polynomial form.
#[derive(Debug, Clone)]
pub struct IirBandpass {
    /// Numerator coefficients of `z^{-k}`.
    b: Vec<f64>,
    /// Denominator coefficients of `z^{-k}`, normalized so `a[0] = 1`.
    a: Vec<f64>,
    /// Transposed direct form II state, length `max(len(b), len(a)) - 1`.
    state: Vec<Complex64>,
    /// Analog prototype order (half the digital order).
    prototype_order: usize,
    sample_rate: f64,
}

impl IirBandpass {
    /// Design a Butterworth bandpass of the given prototype order.
    ///
    /// The digital filter has order `2 * order`: each prototype pole maps
    /// to a conjugate pair around the band center, and the numerator
    /// carries `order` zeros at DC and `order` at Nyquist. Gain is
    /// normalized to unity at the (bilinear-warped) band center.
    pub fn design(low_hz: f64, high_hz: f64, sample_rate: f64, order: usize) -> Self {
        debug_assert!(low_hz < high_hz && high_hz < sample_rate / 2.0);

        let fs2 = 2.0 * sample_rate;
        // Prewarp the band edges so the bilinear transform lands them
        // exactly on the requested digital frequencies.
        let wl = fs2 * (PI * low_hz / sample_rate).tan();
        let wh = fs2 * (PI * high_hz / sample_rate).tan();
        let w0 = (wl * wh).sqrt();
        let bw = wh - wl;

        // Analog Butterworth prototype poles on the left unit semicircle.
        let prototype: Vec<Complex64> = (0..order)
            .map(|k| {
                let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
                Complex64::from_polar(1.0, theta)
            })
            .collect();

        // Lowpass-to-bandpass: each prototype pole p yields the two roots
        // of s^2 - p*bw*s + w0^2 = 0.
        let mut analog_poles = Vec::with_capacity(2 * order);
        for &p in &prototype {
            let pb = p * bw;
            let disc = (pb * pb - 4.0 * w0 * w0).sqrt();
            analog_poles.push((pb + disc) / 2.0);
            analog_poles.push((pb - disc) / 2.0);
        }

        // Bilinear transform into the z-plane.
        let digital_poles: Vec<Complex64> = analog_poles
            .iter()
            .map(|&s| (fs2 + s) / (fs2 - s))
            .collect();

        // Bandpass zeros: `order` at z = +1, `order` at z = -1.
        let mut digital_zeros = Vec::with_capacity(2 * order);
        digital_zeros.extend(std::iter::repeat(Complex64::new(1.0, 0.0)).take(order));
        digital_zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(order));

        let a = real_coefficients(&poly_from_roots(&digital_poles));
        let mut b = real_coefficients(&poly_from_roots(&digital_zeros));

        // Normalize to unity gain at the warped band center.
        let f_center = (sample_rate / PI) * (w0 / fs2).atan();
        let omega = 2.0 * PI * f_center / sample_rate;
        let gain = (eval_at_omega(&b, omega) / eval_at_omega(&a, omega)).norm();
        if gain > 1e-300 {
            for c in b.iter_mut() {
                *c /= gain;
            }
        }

        let state_len = b.len().max(a.len()) - 1;
        Self {
            b,
            a,
            state: vec![Complex64::new(0.0, 0.0); state_len],
            prototype_order: order,
            sample_rate,
        }
    }

    /// Create a filter from explicit `(b, a)` coefficients.
    ///
    /// `a[0]` must be nonzero; both polynomials are normalized by it.
    pub fn from_coefficients(
        b: Vec<f64>,
        a: Vec<f64>,
        sample_rate: f64,
    ) -> crate::types::LinkResult<Self> {
        if a.is_empty() || a[0].abs() < 1e-300 {
            return Err(crate::types::LinkError::InvalidParameter {
                name: "a",
                reason: "denominator must start with a nonzero coefficient".into(),
            });
        }
        let a0 = a[0];
        let b: Vec<f64> = b.iter().map(|&c| c / a0).collect();
        let a: Vec<f64> = a.iter().map(|&c| c / a0).collect();
        let order = (b.len().max(a.len()) - 1) / 2;
        let state_len = b.len().max(a.len()) - 1;
        Ok(Self {
            b,
            a,
            state: vec![Complex64::new(0.0, 0.0); state_len.max(1)],
            prototype_order: order.max(1),
            sample_rate,
        })
    }

    /// Numerator coefficients.
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients (`a[0] = 1`).
    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    /// Roots of the denominator polynomial.
    pub fn poles(&self) -> Vec<Complex64> {
        if self.a.len() < 2 {
            return vec![];
        }
        // Monic coefficients below the leading 1.
        find_polynomial_roots(&self.a[1..])
    }

    /// Check pole placement.
    pub fn stability_report(&self) -> StabilityReport {
        let max_pole_modulus = self
            .poles()
            .iter()
            .map(|p| p.norm())
            .fold(0.0_f64, f64::max);
        StabilityReport {
            max_pole_modulus,
            is_stable: max_pole_modulus < 1.0,
        }
    }

    /// Verify stability; if violated, rescale the numerator by
    /// `1 / (max_pole_modulus + margin)` and re-verify.
    ///
    /// The rescale reduces output energy but leaves the poles where they
    /// are, so the returned `after` report reflects the unchanged pole
    /// placement.
    pub fn verify_and_mitigate(&mut self, margin: f64) -> StabilityOutcome {
        let before = self.stability_report();
        if before.is_stable {
            return StabilityOutcome {
                before,
                after: before,
                mitigated: false,
            };
        }

        let scale = before.max_pole_modulus + margin;
        warn!(
            max_pole_modulus = before.max_pole_modulus,
            scale, "unstable IIR design; rescaling numerator"
        );
        for c in self.b.iter_mut() {
            *c /= scale;
        }

        let after = self.stability_report();
        StabilityOutcome {
            before,
            after,
            mitigated: true,
        }
    }

    /// Magnitude response at a frequency in Hz.
    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / self.sample_rate;
        (eval_at_omega(&self.b, omega) / eval_at_omega(&self.a, omega)).norm()
    }

    /// Magnitude response in decibels.
    pub fn magnitude_response_db(&self, freq_hz: f64) -> f64 {
        20.0 * self.magnitude_response(freq_hz).log10()
    }
}

impl Filter for IirBandpass {
    fn process(&mut self, input: Complex64) -> Complex64 {
        // Transposed direct form II. Missing coefficients read as zero
        // when the numerator and denominator lengths differ.
        let n = self.state.len() + 1;
        let b0 = self.b.first().copied().unwrap_or(0.0);
        let output = input * b0 + self.state[0];
        for i in 0..n - 2 {
            let bi = self.b.get(i + 1).copied().unwrap_or(0.0);
            let ai = self.a.get(i + 1).copied().unwrap_or(0.0);
            self.state[i] = input * bi + self.state[i + 1] - output * ai;
        }
        let bn = self.b.get(n - 1).copied().unwrap_or(0.0);
        let an = self.a.get(n - 1).copied().unwrap_or(0.0);
        self.state[n - 2] = input * bn - output * an;
        output
    }

    fn reset(&mut self) {
        self.state.fill(Complex64::new(0.0, 0.0));
    }

    fn group_delay(&self) -> f64 {
        // Coarse constant approximation; the true delay of a narrowband
        // Butterworth varies strongly across the passband.
        (2 * self.prototype_order) as f64
    }

    fn order(&self) -> usize {
        self.b.len().max(self.a.len()) - 1
    }
}

/// Expand `prod (z - r_i)` into descending-power coefficients, monic.
fn poly_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut poly = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        poly = next;
    }
    poly
}

/// Collapse conjugate-symmetric complex coefficients to their real parts.
fn real_coefficients(poly: &[Complex64]) -> Vec<f64> {
    poly.iter().map(|c| c.re).collect()
}

/// Evaluate `sum c_k e^{-j omega k}`.
fn eval_at_omega(coeffs: &[f64], omega: f64) -> Complex64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(k, &c)| Complex64::from_polar(1.0, -omega * k as f64) * c)
        .sum()
}

/// Roots of the monic polynomial `z^m + coeffs[0] z^{m-1} + ... + coeffs[m-1]`.
fn find_polynomial_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let m = coeffs.len();
    if m == 0 {
        return vec![];
    }
    if m == 1 {
        return vec![Complex64::new(-coeffs[0], 0.0)];
    }
    if m == 2 {
        // Quadratic formula for z^2 + a z + b.
        let a = coeffs[0];
        let b = coeffs[1];
        let disc = Complex64::new(a * a - 4.0 * b, 0.0).sqrt();
        let r1 = (-Complex64::new(a, 0.0) + disc) / 2.0;
        let r2 = (-Complex64::new(a, 0.0) - disc) / 2.0;
        return vec![r1, r2];
    }

    // Companion matrix eigenvalues for higher degrees.
    let mut companion = vec![vec![Complex64::new(0.0, 0.0); m]; m];
    for i in 1..m {
        companion[i][i - 1] = Complex64::new(1.0, 0.0);
    }
    for i in 0..m {
        companion[i][m - 1] = Complex64::new(-coeffs[m - 1 - i], 0.0);
    }

    eigenvalues_qr(&companion)
}

/// Shifted QR iteration with trailing-eigenvalue deflation.
///
/// Each converged eigenvalue is locked at the bottom of the active block
/// and the block shrinks by one, so a cluster of nearby eigenvalues (the
/// usual case for a narrowband denominator) cannot stall the iteration.
fn eigenvalues_qr(matrix: &[Vec<Complex64>]) -> Vec<Complex64> {
    let n = matrix.len();
    if n == 0 {
        return vec![];
    }

    let mut a: Vec<Vec<Complex64>> = matrix.to_vec();
    let mut eigs = vec![Complex64::new(0.0, 0.0); n];
    let mut m = n;
    let mut iters = 0usize;

    while m > 1 {
        // Deflate once the trailing subdiagonal entry has died.
        let off = a[m - 1][m - 2].norm();
        let local = a[m - 1][m - 1].norm() + a[m - 2][m - 2].norm();
        if off <= 1e-13 * local.max(1e-300) {
            eigs[m - 1] = a[m - 1][m - 1];
            m -= 1;
            iters = 0;
            continue;
        }
        if iters >= 200 {
            // No progress; settle for the diagonal of the rest.
            break;
        }

        // Wilkinson shift: the eigenvalue of the trailing 2x2 block
        // closer to its bottom-right entry.
        let p = a[m - 2][m - 2];
        let q = a[m - 2][m - 1];
        let r = a[m - 1][m - 2];
        let s = a[m - 1][m - 1];
        let half = (p - s) * 0.5;
        let disc = (half * half + q * r).sqrt();
        let e1 = (p + s) * 0.5 + disc;
        let e2 = (p + s) * 0.5 - disc;
        let mut shift = if (e1 - s).norm() < (e2 - s).norm() { e1 } else { e2 };
        if iters > 0 && iters % 20 == 0 {
            // Exceptional shift to break a symmetric stall.
            shift += Complex64::new(off, 0.0);
        }

        // One explicit QR step on the active leading block.
        let mut block: Vec<Vec<Complex64>> = (0..m).map(|i| a[i][..m].to_vec()).collect();
        for (i, row) in block.iter_mut().enumerate() {
            row[i] -= shift;
        }
        let (qm, rm) = qr_decompose(&block);
        let next = mat_mul(&rm, &qm);
        for i in 0..m {
            a[i][..m].copy_from_slice(&next[i]);
            a[i][i] += shift;
        }
        iters += 1;
    }

    for i in 0..m {
        eigs[i] = a[i][i];
    }
    eigs
}

/// QR decomposition via complex Givens rotations, `a = q * r`.
fn qr_decompose(a: &[Vec<Complex64>]) -> (Vec<Vec<Complex64>>, Vec<Vec<Complex64>>) {
    let n = a.len();
    let mut r: Vec<Vec<Complex64>> = a.to_vec();
    let mut q = vec![vec![Complex64::new(0.0, 0.0); n]; n];
    for i in 0..n {
        q[i][i] = Complex64::new(1.0, 0.0);
    }

    for j in 0..n - 1 {
        for i in (j + 1)..n {
            if r[i][j].norm() < 1e-30 {
                continue;
            }
            let a_val = r[j][j];
            let b_val = r[i][j];
            let rr = (a_val.norm_sqr() + b_val.norm_sqr()).sqrt();
            let c = a_val.norm() / rr;
            let s = if a_val.norm() > 1e-30 {
                b_val * a_val.conj() / (a_val.norm() * rr)
            } else {
                Complex64::new(1.0, 0.0)
            };

            for k in 0..n {
                let rj = r[j][k];
                let ri = r[i][k];
                r[j][k] = c * rj + s.conj() * ri;
                r[i][k] = -s * rj + c * ri;
            }

            // Accumulate q = G_1^H G_2^H ... so that a = q * r holds for
            // complex entries, not just real ones.
            for k in 0..n {
                let qj = q[k][j];
                let qi = q[k][i];
                q[k][j] = c * qj + s * qi;
                q[k][i] = -s.conj() * qj + c * qi;
            }
        }
    }

    (q, r)
}

fn mat_mul(a: &[Vec<Complex64>], b: &[Vec<Complex64>]) -> Vec<Vec<Complex64>> {
    let n = a.len();
    let mut c = vec![vec![Complex64::new(0.0, 0.0); n]; n];
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                c[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_design() -> IirBandpass {
        IirBandpass::design(2.11e9, 2.17e9, 5e9, 4)
    }

    #[test]
    fn test_polynomial_lengths() {
        let filter = reference_design();
        // Digital order 2 * 4 = 8 on each side.
        assert_eq!(filter.numerator().len(), 9);
        assert_eq!(filter.denominator().len(), 9);
        assert_relative_eq!(filter.denominator()[0], 1.0, epsilon = 1e-12);
        assert_eq!(filter.order(), 8);
    }

    #[test]
    fn test_reference_design_is_stable() {
        let filter = reference_design();
        let report = filter.stability_report();
        assert!(report.is_stable, "max |p| = {}", report.max_pole_modulus);
        assert!(report.max_pole_modulus > 0.9, "narrowband poles hug the circle");
    }

    #[test]
    fn test_unity_gain_at_center() {
        let filter = reference_design();
        let g = filter.magnitude_response(2.14e9);
        assert!((g - 1.0).abs() < 0.05, "center gain {g}");
    }

    #[test]
    fn test_band_edges_and_stopband() {
        let filter = reference_design();
        // Stopband rejection away from the band.
        assert!(filter.magnitude_response_db(1.0e9) < -40.0);
        assert!(filter.magnitude_response_db(2.45e9) < -30.0);
        // DC and Nyquist are exact zeros.
        assert!(filter.magnitude_response(0.0) < 1e-9);
        assert!(filter.magnitude_response(2.5e9) < 1e-9);
    }

    #[test]
    fn test_quadratic_roots() {
        // z^2 - 3z + 2 = (z - 1)(z - 2)
        let mut roots = find_polynomial_roots(&[-3.0, 2.0]);
        roots.sort_by(|a, b| a.re.partial_cmp(&b.re).unwrap());
        assert_relative_eq!(roots[0].re, 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1].re, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_companion_roots_match_construction() {
        // Build a monic quartic from known roots and recover them.
        let known = [
            Complex64::new(0.5, 0.4),
            Complex64::new(0.5, -0.4),
            Complex64::new(-0.3, 0.1),
            Complex64::new(-0.3, -0.1),
        ];
        let poly = poly_from_roots(&known);
        let coeffs: Vec<f64> = poly[1..].iter().map(|c| c.re).collect();
        let roots = find_polynomial_roots(&coeffs);
        for k in &known {
            let closest = roots.iter().map(|r| (r - k).norm()).fold(f64::MAX, f64::min);
            assert!(closest < 1e-6, "root {k} missing, nearest {closest}");
        }
    }

    #[test]
    fn test_octic_roots_near_unit_circle_recovered() {
        // Conjugate pairs hugging the unit circle, the shape a narrowband
        // bandpass denominator takes.
        let mut known = Vec::new();
        for &(radius, angle) in &[(0.96, 2.60), (0.97, 2.65), (0.98, 2.70), (0.99, 2.75)] {
            known.push(Complex64::from_polar(radius, angle));
            known.push(Complex64::from_polar(radius, -angle));
        }
        let poly = poly_from_roots(&known);
        let coeffs: Vec<f64> = poly[1..].iter().map(|c| c.re).collect();
        let roots = find_polynomial_roots(&coeffs);
        assert_eq!(roots.len(), 8);
        for k in &known {
            let closest = roots.iter().map(|r| (r - k).norm()).fold(f64::MAX, f64::min);
            assert!(closest < 1e-6, "root {k} missing, nearest {closest}");
        }
    }

    #[test]
    fn test_stability_verdict_matches_root_construction() {
        // Denominator built from roots strictly inside the unit circle.
        let inside = poly_from_roots(&[
            Complex64::new(0.5, 0.4),
            Complex64::new(0.5, -0.4),
            Complex64::new(-0.3, 0.1),
            Complex64::new(-0.3, -0.1),
        ]);
        let a: Vec<f64> = inside.iter().map(|c| c.re).collect();
        let filter = IirBandpass::from_coefficients(vec![1.0], a, 1e3).unwrap();
        let report = filter.stability_report();
        assert!(report.is_stable);
        assert_relative_eq!(report.max_pole_modulus, 0.41_f64.sqrt(), epsilon = 1e-8);

        // Same construction with one conjugate pair pushed outside.
        let outside = poly_from_roots(&[
            Complex64::from_polar(1.05, 2.7),
            Complex64::from_polar(1.05, -2.7),
            Complex64::new(0.5, 0.4),
            Complex64::new(0.5, -0.4),
        ]);
        let a: Vec<f64> = outside.iter().map(|c| c.re).collect();
        let filter = IirBandpass::from_coefficients(vec![1.0], a, 1e3).unwrap();
        let report = filter.stability_report();
        assert!(!report.is_stable);
        assert_relative_eq!(report.max_pole_modulus, 1.05, epsilon = 1e-8);
    }

    #[test]
    fn test_stable_design_not_mitigated() {
        let mut filter = reference_design();
        let b_before = filter.numerator().to_vec();
        let outcome = filter.verify_and_mitigate(0.1);
        assert!(!outcome.mitigated);
        assert_eq!(filter.numerator(), &b_before[..]);
    }

    #[test]
    fn test_unstable_design_rescaled() {
        // Single real pole at z = 2: y[n] = x[n] + 2 y[n-1].
        let mut filter = IirBandpass::from_coefficients(vec![1.0], vec![1.0, -2.0], 1e3).unwrap();
        let outcome = filter.verify_and_mitigate(0.1);
        assert!(!outcome.before.is_stable);
        assert!(outcome.mitigated);
        // Pole placement does not change.
        assert!(!outcome.after.is_stable);
        assert_relative_eq!(outcome.after.max_pole_modulus, 2.0, epsilon = 1e-9);
        // Numerator scaled by 1 / (2 + 0.1).
        assert_relative_eq!(filter.numerator()[0], 1.0 / 2.1, epsilon = 1e-12);
    }

    #[test]
    fn test_impulse_response_decays() {
        let mut filter = reference_design();
        let mut energy_head = 0.0;
        let mut energy_tail = 0.0;
        for n in 0..20_000 {
            let x = if n == 0 {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            };
            let y = filter.process(x);
            if n < 10_000 {
                energy_head += y.norm_sqr();
            } else {
                energy_tail += y.norm_sqr();
            }
        }
        assert!(energy_tail < energy_head * 1e-3);
    }

    #[test]
    fn test_in_band_tone_passes() {
        let mut filter = reference_design();
        let n = 20_000;
        let input: Vec<Complex64> = (0..n)
            .map(|i| Complex64::from_polar(1.0, 2.0 * PI * 2.14e9 * i as f64 / 5e9))
            .collect();
        let output = filter.process_block(&input);
        // Steady-state magnitude near unity.
        let tail: f64 = output[n - 2000..].iter().map(|c| c.norm()).sum::<f64>() / 2000.0;
        assert!((tail - 1.0).abs() < 0.1, "steady-state gain {tail}");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = reference_design();
        for i in 0..500 {
            filter.process(Complex64::from_polar(1.0, i as f64 * 0.1));
        }
        filter.reset();
        let quiet = filter.process(Complex64::new(0.0, 0.0));
        assert!(quiet.norm() < 1e-12);
    }
}
