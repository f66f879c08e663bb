//! Core types for narrowband link simulation
//!
//! Signals are complex I/Q (In-phase/Quadrature) sample sequences. The
//! [`Waveform`] type pairs a sample buffer with its sample rate and enforces
//! its length at construction, so the transmit, channel, and filter stages
//! can rely on matching record lengths instead of re-slicing at use sites.

use num_complex::Complex64;
use thiserror::Error;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors raised by precondition violations.
///
/// Numerical-instability conditions are deliberately *not* represented here:
/// they are advisory diagnostics (see the filter modules) and never abort a
/// run.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("bit sequence length {0} is odd; QPSK consumes bits in pairs")]
    OddBitCount(usize),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("signal length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("empty signal")]
    EmptySignal,
}

/// A complex sample record tied to its sample rate.
///
/// Construction fails on an empty buffer or a non-positive sample rate;
/// [`Waveform::with_expected_len`] additionally pins the record length so
/// that `symbols × samples_per_symbol` invariants are checked where the
/// buffer is produced, not where it is consumed.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<IQSample>,
    sample_rate: f64,
}

impl Waveform {
    /// Create a waveform from samples and a sample rate in Hz.
    pub fn new(samples: Vec<IQSample>, sample_rate: f64) -> LinkResult<Self> {
        if samples.is_empty() {
            return Err(LinkError::EmptySignal);
        }
        if !(sample_rate > 0.0) {
            return Err(LinkError::InvalidParameter {
                name: "sample_rate",
                reason: format!("must be positive, got {sample_rate}"),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a waveform whose length must equal `expected`.
    pub fn with_expected_len(
        samples: Vec<IQSample>,
        sample_rate: f64,
        expected: usize,
    ) -> LinkResult<Self> {
        if samples.len() != expected {
            return Err(LinkError::LengthMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Self::new(samples, sample_rate)
    }

    /// The sample buffer.
    pub fn samples(&self) -> &[IQSample] {
        &self.samples
    }

    /// Number of samples in the record.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: empty waveforms cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Record duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Consume the waveform, returning the sample buffer.
    pub fn into_samples(self) -> Vec<IQSample> {
        self.samples
    }
}

/// Helper functions for working with complex sample records
pub mod complex_ops {
    use super::*;
    use std::f64::consts::PI;

    /// Average power (mean squared magnitude) of a record.
    pub fn average_power(samples: &[IQSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64
    }

    /// Sample variance of a complex record: `E[|x|²] − |E[x]|²`.
    ///
    /// Used as the signal-power estimate in the LMS step-size bound.
    pub fn sample_variance(samples: &[IQSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().copied().sum::<Complex>() / n;
        average_power(samples) - mean.norm_sqr()
    }

    /// Complex exponential `e^(j·2π·f·t)` at `t = sample_idx / sample_rate`.
    ///
    /// The fundamental building block for carrier generation; both the
    /// up-converter and the demodulator derive their phase from the absolute
    /// sample index through this function, so the two stay phase-aligned.
    #[inline]
    pub fn cis(frequency: f64, sample_idx: usize, sample_rate: f64) -> Complex {
        let phase = 2.0 * PI * frequency * sample_idx as f64 / sample_rate;
        Complex::new(phase.cos(), phase.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_waveform_rejects_empty() {
        assert!(matches!(
            Waveform::new(vec![], 1e6),
            Err(LinkError::EmptySignal)
        ));
    }

    #[test]
    fn test_waveform_rejects_bad_rate() {
        let samples = vec![Complex::new(1.0, 0.0)];
        assert!(Waveform::new(samples.clone(), 0.0).is_err());
        assert!(Waveform::new(samples, -1.0).is_err());
    }

    #[test]
    fn test_waveform_expected_len() {
        let samples = vec![Complex::new(1.0, 0.0); 10];
        assert!(Waveform::with_expected_len(samples.clone(), 1e6, 10).is_ok());
        let err = Waveform::with_expected_len(samples, 1e6, 12);
        assert!(matches!(
            err,
            Err(LinkError::LengthMismatch {
                expected: 12,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_average_power_unit_circle() {
        let samples = vec![
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 1.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.0, -1.0),
        ];
        assert_relative_eq!(complex_ops::average_power(&samples), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_variance_removes_mean() {
        // Constant record has zero variance regardless of magnitude.
        let samples = vec![Complex::new(3.0, -4.0); 64];
        assert_relative_eq!(complex_ops::sample_variance(&samples), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cis_is_unit_magnitude() {
        for i in 0..100 {
            let c = complex_ops::cis(2.14e9, i, 5e9);
            assert_relative_eq!(c.norm(), 1.0, epsilon = 1e-12);
        }
    }
}
