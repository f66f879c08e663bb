//! Core Filter Traits
//!
//! Every recovery filter implements [`Filter`], which gives the pipeline a
//! uniform streaming interface plus the group-delay figure the symbol
//! aligner needs. FIR-specific operations live in [`FirFilterOps`];
//! implementing it also provides [`FrequencyResponse`] via the DFT of the
//! tap vector.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Core trait for all digital filters.
///
/// Filters maintain internal state (delay lines, accumulators) that
/// persists between calls; `reset` clears it for a fresh record.
pub trait Filter: Send + Sync {
    /// Process a single complex sample.
    fn process(&mut self, input: Complex64) -> Complex64;

    /// Process a block of samples, returning filtered output.
    fn process_block(&mut self, input: &[Complex64]) -> Vec<Complex64> {
        input.iter().map(|&s| self.process(s)).collect()
    }

    /// Process samples in place.
    fn process_inplace(&mut self, samples: &mut [Complex64]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }

    /// Reset filter state (clear delay lines, accumulators).
    fn reset(&mut self);

    /// Group delay in samples, as used for symbol alignment.
    ///
    /// Exact (N-1)/2 for linear-phase FIR; a heuristic for IIR, where the
    /// true delay varies with frequency.
    fn group_delay(&self) -> f64;

    /// Filter order: taps - 1 for FIR, max(len(b), len(a)) - 1 for IIR.
    fn order(&self) -> usize;
}

/// FIR-specific operations.
pub trait FirFilterOps: Filter {
    /// The tap coefficients (impulse response).
    fn coefficients(&self) -> &[f64];

    /// Number of taps.
    fn num_taps(&self) -> usize {
        self.coefficients().len()
    }

    /// True if the taps are symmetric (linear phase).
    fn is_linear_phase(&self) -> bool {
        let coeffs = self.coefficients();
        let n = coeffs.len();
        for i in 0..n / 2 {
            if (coeffs[i] - coeffs[n - 1 - i]).abs() > 1e-10 {
                return false;
            }
        }
        true
    }
}

/// Frequency response analysis.
pub trait FrequencyResponse {
    /// Magnitude response at a frequency (linear scale).
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64;

    /// Magnitude response in decibels.
    fn magnitude_response_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.magnitude_response(freq_hz, sample_rate).log10()
    }
}

/// Any FIR filter gets its response from the DFT of its taps.
impl<T: FirFilterOps + ?Sized> FrequencyResponse for T {
    fn magnitude_response(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let coeffs = self.coefficients();
        let omega = 2.0 * PI * freq_hz / sample_rate;

        // H(e^jω) = Σ h[n] · e^(-jωn)
        let mut real = 0.0;
        let mut imag = 0.0;
        for (n, &h) in coeffs.iter().enumerate() {
            let phase = omega * n as f64;
            real += h * phase.cos();
            imag -= h * phase.sin();
        }

        (real * real + imag * imag).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ThreeTap {
        coeffs: Vec<f64>,
        delay_line: Vec<Complex64>,
        delay_idx: usize,
    }

    impl ThreeTap {
        fn new(coeffs: Vec<f64>) -> Self {
            let len = coeffs.len();
            Self {
                coeffs,
                delay_line: vec![Complex64::new(0.0, 0.0); len],
                delay_idx: 0,
            }
        }
    }

    impl Filter for ThreeTap {
        fn process(&mut self, input: Complex64) -> Complex64 {
            self.delay_line[self.delay_idx] = input;
            let len = self.coeffs.len();
            let mut output = Complex64::new(0.0, 0.0);
            for i in 0..len {
                let pos = (self.delay_idx + len - i) % len;
                output += self.delay_line[pos] * self.coeffs[i];
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

    impl FirFilterOps for ThreeTap {
        fn coefficients(&self) -> &[f64] {
            &self.coeffs
        }
    }

    #[test]
    fn test_dc_settles_to_coefficient_sum() {
        let mut filter = ThreeTap::new(vec![0.25, 0.5, 0.25]);
        let input = Complex64::new(1.0, 0.0);
        let _ = filter.process(input);
        let _ = filter.process(input);
        let output = filter.process(input);
        assert!((output.re - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_linear_phase_detection() {
        let symmetric = ThreeTap::new(vec![0.1, 0.2, 0.4, 0.2, 0.1]);
        assert!(symmetric.is_linear_phase());
        let asymmetric = ThreeTap::new(vec![0.1, 0.2, 0.4, 0.3]);
        assert!(!asymmetric.is_linear_phase());
    }

    #[test]
    fn test_dc_magnitude_is_tap_sum() {
        let filter = ThreeTap::new(vec![0.25, 0.5, 0.25]);
        let dc = filter.magnitude_response(0.0, 1000.0);
        assert!((dc - 1.0).abs() < 0.01);
        assert!(filter.magnitude_response(400.0, 1000.0) < dc);
    }
}
