//! Kaiser Windowed-Sinc FIR Bandpass
//!
//! The linear-phase reference branch. The bandpass is designed as the
//! difference of two windowed-sinc lowpass prototypes (LPF at the upper
//! edge minus LPF at the lower edge), each normalized to unity DC gain
//! before subtraction. With symmetric taps the group delay is exactly
//! `(N - 1) / 2` samples, which is what makes this branch the cleanest
//! of the four.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::filters::{FirBandpass, Filter, FirFilterOps};
//!
//! let filter = FirBandpass::design(2.11e9, 2.17e9, 5e9, 501, 8.0);
//! assert_eq!(filter.num_taps(), 501);
//! assert!(filter.is_linear_phase());
//! assert_eq!(filter.group_delay(), 250.0);
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;

use super::traits::{Filter, FirFilterOps};
use super::windows::kaiser_window;

/// FIR bandpass filter with a circular delay line.
#[derive(Debug, Clone)]
pub struct FirBandpass {
    coeffs: Vec<f64>,
    delay_line: Vec<Complex64>,
    delay_idx: usize,
}

impl FirBandpass {
    /// Create a filter from explicit tap coefficients.
    pub fn new(coeffs: Vec<f64>) -> Self {
        let len = coeffs.len();
        Self {
            coeffs,
            delay_line: vec![Complex64::new(0.0, 0.0); len],
            delay_idx: 0,
        }
    }

    /// Design a Kaiser windowed-sinc bandpass.
    ///
    /// `num_taps` is bumped to the next odd count if even, keeping the
    /// impulse response symmetric about a single center tap.
    pub fn design(
        low_hz: f64,
        high_hz: f64,
        sample_rate: f64,
        num_taps: usize,
        kaiser_beta: f64,
    ) -> Self {
        debug_assert!(low_hz < high_hz);
        let num_taps = if num_taps % 2 == 0 {
            num_taps + 1
        } else {
            num_taps
        };

        let lpf_high = design_lowpass_kaiser(high_hz, sample_rate, num_taps, kaiser_beta);
        let lpf_low = design_lowpass_kaiser(low_hz, sample_rate, num_taps, kaiser_beta);

        // Bandpass = LPF(high) - LPF(low)
        let coeffs: Vec<f64> = lpf_high
            .iter()
            .zip(lpf_low.iter())
            .map(|(h, l)| h - l)
            .collect();

        Self::new(coeffs)
    }
}

impl Filter for FirBandpass {
    fn process(&mut self, input: Complex64) -> Complex64 {
        self.delay_line[self.delay_idx] = input;

        let len = self.coeffs.len();
        let mut output = Complex64::new(0.0, 0.0);
        for i in 0..len {
            let delay_pos = (self.delay_idx + len - i) % len;
            output += self.delay_line[delay_pos] * self.coeffs[i];
        }

        self.delay_idx = (self.delay_idx + 1) % len;
        output
    }

    fn reset(&mut self) {
        self.delay_line.fill(Complex64::new(0.0, 0.0));
        self.delay_idx = 0;
    }

    fn group_delay(&self) -> f64 {
        (self.coeffs.len() - 1) as f64 / 2.0
    }

    fn order(&self) -> usize {
        self.coeffs.len() - 1
    }
}

impl FirFilterOps for FirBandpass {
    fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }
}

/// Windowed-sinc lowpass prototype, normalized to unity DC gain.
fn design_lowpass_kaiser(
    cutoff_hz: f64,
    sample_rate: f64,
    num_taps: usize,
    beta: f64,
) -> Vec<f64> {
    let fc = cutoff_hz / sample_rate;
    let mid = (num_taps - 1) as f64 / 2.0;

    let window = kaiser_window(num_taps, beta);
    let mut coeffs = Vec::with_capacity(num_taps);

    for i in 0..num_taps {
        let n = i as f64;
        let sinc = if (n - mid).abs() < 1e-10 {
            2.0 * PI * fc
        } else {
            (2.0 * PI * fc * (n - mid)).sin() / (n - mid)
        };
        coeffs.push(sinc * window[i]);
    }

    let sum: f64 = coeffs.iter().sum();
    if sum.abs() > 1e-10 {
        for c in coeffs.iter_mut() {
            *c /= sum;
        }
    }

    coeffs
}
