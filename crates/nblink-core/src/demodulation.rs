//! QPSK Demodulator
//!
//! Recovers bits from a filtered record: skip the filter's group delay,
//! counter-rotate the carrier off each sample (phase from the absolute
//! sample index, so transmitter and receiver stay coherent), average the
//! middle half of each symbol window, and decide by phase quadrant.
//!
//! Averaging only the middle half of each window keeps symbol-transition
//! samples and residual misalignment out of the estimate. Windows that
//! run past the end of the record are dropped rather than padded, so a
//! large delay degrades gracefully into fewer decoded bits.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::demodulation::Demodulator;
//! use nblink_core::signal_source::WaveformSynthesizer;
//! use nblink_core::symbol_mapping::QpskMapper;
//!
//! let bits = vec![0, 1, 1, 0];
//! let symbols = QpskMapper::new().map(&bits).unwrap();
//! let tx = WaveformSynthesizer::new(2.14e9, 5e9, 100)
//!     .synthesize(&symbols)
//!     .unwrap();
//! let demod = Demodulator::new(2.14e9, 5e9, 100);
//! assert_eq!(demod.demodulate(tx.samples(), 0, 4), bits);
//! ```

use crate::symbol_mapping::QpskMapper;
use crate::types::{complex_ops, Complex, IQSample};

/// Delay-compensating QPSK demodulator.
#[derive(Debug, Clone)]
pub struct Demodulator {
    carrier_freq: f64,
    sample_rate: f64,
    samples_per_symbol: usize,
    mapper: QpskMapper,
}

impl Demodulator {
    /// Create a demodulator matched to the transmitter's carrier and
    /// symbol timing.
    pub fn new(carrier_freq: f64, sample_rate: f64, samples_per_symbol: usize) -> Self {
        Self {
            carrier_freq,
            sample_rate,
            samples_per_symbol,
            mapper: QpskMapper::new(),
        }
    }

    /// Baseband symbol estimates after skipping `delay` samples.
    ///
    /// A delay at or past the end of the record is clamped to the last
    /// sample, which yields zero complete windows and an empty estimate
    /// vector. One estimate is produced per complete symbol window.
    pub fn symbol_estimates(&self, signal: &[IQSample], delay: usize) -> Vec<Complex> {
        if signal.is_empty() {
            return vec![];
        }
        let delay = delay.min(signal.len() - 1);
        let sps = self.samples_per_symbol;
        let available = signal.len() - delay;
        let num_symbols = available / sps;

        let lo = sps / 4;
        let hi = 3 * sps / 4;
        let window = (hi - lo).max(1) as f64;

        let mut estimates = Vec::with_capacity(num_symbols);
        for sym in 0..num_symbols {
            let base = sym * sps;
            let mut acc = Complex::new(0.0, 0.0);
            for k in lo..hi {
                let n = delay + base + k;
                acc += signal[n] * complex_ops::cis(-self.carrier_freq, n, self.sample_rate);
            }
            estimates.push(acc / window);
        }
        estimates
    }

    /// Demodulate to bits, at most `num_bits` of them.
    ///
    /// Fewer bits come back when the delay leaves too few complete symbol
    /// windows in the record.
    pub fn demodulate(&self, signal: &[IQSample], delay: usize, num_bits: usize) -> Vec<u8> {
        let estimates = self.symbol_estimates(signal, delay);
        let mut bits = self.mapper.demap(&estimates);
        bits.truncate(num_bits);
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_source::WaveformSynthesizer;
    use crate::symbol_mapping::QpskMapper;
    use approx::assert_relative_eq;

    fn transmit(bits: &[u8]) -> Vec<IQSample> {
        let symbols = QpskMapper::new().map(bits).unwrap();
        WaveformSynthesizer::new(2.14e9, 5e9, 100)
            .synthesize(&symbols)
            .unwrap()
            .into_samples()
    }

    #[test]
    fn test_zero_delay_round_trip() {
        let bits = vec![0, 0, 0, 1, 1, 0, 1, 1, 0, 1];
        let tx = transmit(&bits);
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        assert_eq!(demod.demodulate(&tx, 0, bits.len()), bits);
    }

    #[test]
    fn test_estimates_sit_on_constellation() {
        let bits = vec![1, 0, 0, 1];
        let tx = transmit(&bits);
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        let estimates = demod.symbol_estimates(&tx, 0);
        let expected = QpskMapper::new().map(&bits).unwrap();
        assert_eq!(estimates.len(), 2);
        for (e, x) in estimates.iter().zip(expected.iter()) {
            assert_relative_eq!(e.re, x.re, epsilon = 1e-9);
            assert_relative_eq!(e.im, x.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_large_delay_truncates_output() {
        let bits = vec![0, 1, 1, 0, 1, 1];
        let tx = transmit(&bits); // 300 samples
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        // 120 samples of delay leave one complete window of 100.
        let decoded = demod.demodulate(&tx, 120, bits.len());
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_delay_past_end_clamped() {
        let bits = vec![0, 1];
        let tx = transmit(&bits);
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        let decoded = demod.demodulate(&tx, 10_000, bits.len());
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_empty_signal() {
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        assert!(demod.demodulate(&[], 0, 8).is_empty());
        assert!(demod.symbol_estimates(&[], 0).is_empty());
    }

    #[test]
    fn test_attenuated_signal_still_decodes() {
        // Magnitude does not matter to quadrant decisions.
        let bits = vec![1, 1, 0, 0, 1, 0];
        let tx: Vec<IQSample> = transmit(&bits).iter().map(|&s| s * 0.05).collect();
        let demod = Demodulator::new(2.14e9, 5e9, 100);
        assert_eq!(demod.demodulate(&tx, 0, bits.len()), bits);
    }
}
