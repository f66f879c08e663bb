//! Link Parameters and Configuration
//!
//! Defines the configurable parameters for a simulation run: the sample-rate
//! and carrier plan, the record size, and one parameter block per recovery
//! filter. A [`LinkParams`] value is the single source of truth for a run:
//! every pipeline stage derives its dimensions from it instead of sharing
//! module-level arrays.
//!
//! ## Defaults
//!
//! The defaults reproduce the reference experiment: a 5 GHz sample rate,
//! a 2.14 GHz carrier inside a 2.11–2.17 GHz passband, 200 bits at
//! 100 samples per symbol (a 10 000-sample record), seed 42.

use serde::{Deserialize, Serialize};

use crate::types::{LinkError, LinkResult};

/// FIR bandpass design parameters (Kaiser windowed sinc).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FirParams {
    /// Number of taps. Forced odd at design time for linear phase.
    pub num_taps: usize,
    /// Kaiser window shape parameter β (side-lobe control).
    pub kaiser_beta: f64,
}

impl Default for FirParams {
    fn default() -> Self {
        Self {
            num_taps: 501,
            kaiser_beta: 8.0,
        }
    }
}

/// IIR bandpass design parameters (Butterworth prototype).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IirParams {
    /// Butterworth prototype order. The bandpass transform doubles it.
    pub order: usize,
}

impl Default for IirParams {
    fn default() -> Self {
        Self { order: 4 }
    }
}

/// LMS adaptive filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsParams {
    /// Number of complex weights.
    pub num_taps: usize,
    /// Step size µ. Checked (not enforced) against `1/(N·P̂x)` at run time.
    pub step_size: f64,
}

impl Default for LmsParams {
    fn default() -> Self {
        Self {
            num_taps: 64,
            step_size: 0.005,
        }
    }
}

/// RLS adaptive filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RlsParams {
    /// Number of complex weights.
    pub num_taps: usize,
    /// Forgetting factor λ. Valid range (0, 1]; checked at run time.
    pub forgetting: f64,
    /// Regularization δ; the inverse correlation matrix starts as `I/δ`.
    pub delta: f64,
}

impl Default for RlsParams {
    fn default() -> Self {
        Self {
            num_taps: 64,
            forgetting: 0.999,
            delta: 0.01,
        }
    }
}

/// Propagation channel parameters.
///
/// The impulse response is fixed at two taps: an attenuated direct path and
/// a weaker echo at `echo_delay` samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelParams {
    /// Direct path gain.
    pub direct_gain: f64,
    /// Echo path gain.
    pub echo_gain: f64,
    /// Echo delay in samples.
    pub echo_delay: usize,
    /// Narrowband interferer frequency in Hz.
    pub interferer_freq_hz: f64,
    /// Interferer amplitude (constant envelope).
    pub interferer_amplitude: f64,
    /// Standard deviation of the complex Gaussian noise, per component.
    pub noise_sigma: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            direct_gain: 0.9,
            echo_gain: 0.1,
            // 0.1 µs echo at the 5 GHz reference sample rate.
            echo_delay: 500,
            interferer_freq_hz: 2.15e9,
            interferer_amplitude: 0.3,
            noise_sigma: 0.1,
        }
    }
}

/// Complete parameter set for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkParams {
    /// System sample rate in Hz.
    pub sample_rate: f64,
    /// Carrier (center) frequency in Hz.
    pub f_center: f64,
    /// Lower passband edge in Hz.
    pub f_low: f64,
    /// Upper passband edge in Hz.
    pub f_high: f64,
    /// Number of source bits. Must be even and positive.
    pub num_bits: usize,
    /// Samples per QPSK symbol (zero-order-hold pulse length).
    pub samples_per_symbol: usize,
    /// Run seed. Every randomized component derives its stream from this.
    pub seed: u64,
    pub fir: FirParams,
    pub iir: IirParams,
    pub lms: LmsParams,
    pub rls: RlsParams,
    pub channel: ChannelParams,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            sample_rate: 5e9,
            f_center: 2.14e9,
            f_low: 2.11e9,
            f_high: 2.17e9,
            num_bits: 200,
            samples_per_symbol: 100,
            seed: 42,
            fir: FirParams::default(),
            iir: IirParams::default(),
            lms: LmsParams::default(),
            rls: RlsParams::default(),
            channel: ChannelParams::default(),
        }
    }
}

impl LinkParams {
    /// Start building a parameter set from the defaults.
    pub fn builder() -> LinkParamsBuilder {
        LinkParamsBuilder {
            params: Self::default(),
        }
    }

    /// Number of QPSK symbols in the record.
    pub fn num_symbols(&self) -> usize {
        self.num_bits / 2
    }

    /// Total record length in samples.
    pub fn num_samples(&self) -> usize {
        self.num_symbols() * self.samples_per_symbol
    }

    /// Symbol rate in Hz.
    pub fn symbol_rate(&self) -> f64 {
        self.sample_rate / self.samples_per_symbol as f64
    }

    /// Check the precondition class of errors.
    ///
    /// Numerical tuning (LMS µ, RLS λ) is intentionally *not* validated
    /// here: out-of-range values are non-fatal and reported by the adaptive
    /// filters as they run.
    pub fn validate(&self) -> LinkResult<()> {
        if self.num_bits == 0 {
            return Err(LinkError::InvalidParameter {
                name: "num_bits",
                reason: "must be positive".into(),
            });
        }
        if self.num_bits % 2 != 0 {
            return Err(LinkError::OddBitCount(self.num_bits));
        }
        if self.samples_per_symbol < 4 {
            return Err(LinkError::InvalidParameter {
                name: "samples_per_symbol",
                reason: format!(
                    "must be at least 4 for mid-symbol averaging, got {}",
                    self.samples_per_symbol
                ),
            });
        }
        if !(self.sample_rate > 0.0) {
            return Err(LinkError::InvalidParameter {
                name: "sample_rate",
                reason: format!("must be positive, got {}", self.sample_rate),
            });
        }
        if !(0.0 < self.f_low && self.f_low < self.f_center && self.f_center < self.f_high) {
            return Err(LinkError::InvalidParameter {
                name: "f_center",
                reason: format!(
                    "band edges must satisfy 0 < f_low < f_center < f_high, got \
                     {} / {} / {}",
                    self.f_low, self.f_center, self.f_high
                ),
            });
        }
        if self.f_high >= self.sample_rate / 2.0 {
            return Err(LinkError::InvalidParameter {
                name: "f_high",
                reason: format!(
                    "{} exceeds the Nyquist frequency {}",
                    self.f_high,
                    self.sample_rate / 2.0
                ),
            });
        }
        if self.fir.num_taps < 3 {
            return Err(LinkError::InvalidParameter {
                name: "fir.num_taps",
                reason: "need at least 3 taps for a bandpass".into(),
            });
        }
        if self.iir.order == 0 || self.iir.order > 10 {
            return Err(LinkError::InvalidParameter {
                name: "iir.order",
                reason: format!("must be 1-10, got {}", self.iir.order),
            });
        }
        if self.lms.num_taps == 0 || self.rls.num_taps == 0 {
            return Err(LinkError::InvalidParameter {
                name: "num_taps",
                reason: "adaptive filters need at least one tap".into(),
            });
        }
        Ok(())
    }
}

/// Builder for [`LinkParams`].
#[derive(Debug, Clone)]
pub struct LinkParamsBuilder {
    params: LinkParams,
}

impl LinkParamsBuilder {
    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.params.sample_rate = hz;
        self
    }

    pub fn carrier(mut self, f_center: f64, f_low: f64, f_high: f64) -> Self {
        self.params.f_center = f_center;
        self.params.f_low = f_low;
        self.params.f_high = f_high;
        self
    }

    pub fn num_bits(mut self, n: usize) -> Self {
        self.params.num_bits = n;
        self
    }

    pub fn samples_per_symbol(mut self, n: usize) -> Self {
        self.params.samples_per_symbol = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn fir(mut self, fir: FirParams) -> Self {
        self.params.fir = fir;
        self
    }

    pub fn iir(mut self, iir: IirParams) -> Self {
        self.params.iir = iir;
        self
    }

    pub fn lms(mut self, lms: LmsParams) -> Self {
        self.params.lms = lms;
        self
    }

    pub fn rls(mut self, rls: RlsParams) -> Self {
        self.params.rls = rls;
        self
    }

    pub fn channel(mut self, channel: ChannelParams) -> Self {
        self.params.channel = channel;
        self
    }

    /// Validate and return the parameter set.
    pub fn build(self) -> LinkResult<LinkParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = LinkParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.num_symbols(), 100);
        assert_eq!(params.num_samples(), 10_000);
    }

    #[test]
    fn test_odd_bits_rejected() {
        let err = LinkParams::builder().num_bits(201).build();
        assert!(matches!(err, Err(LinkError::OddBitCount(201))));
    }

    #[test]
    fn test_band_edges_checked() {
        let err = LinkParams::builder().carrier(2.0e9, 2.1e9, 2.2e9).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_nyquist_checked() {
        let err = LinkParams::builder()
            .sample_rate(4e9)
            .carrier(2.14e9, 2.11e9, 2.17e9)
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_builder_roundtrip() {
        let params = LinkParams::builder()
            .num_bits(64)
            .samples_per_symbol(16)
            .seed(7)
            .build()
            .unwrap();
        assert_eq!(params.num_bits, 64);
        assert_eq!(params.num_samples(), 32 * 16);
        assert_eq!(params.seed, 7);
    }

    #[test]
    fn test_bad_tuning_is_not_a_precondition() {
        // Out-of-range λ / µ are advisory, handled by the filters themselves.
        let params = LinkParams::builder()
            .lms(LmsParams {
                num_taps: 64,
                step_size: 10.0,
            })
            .rls(RlsParams {
                num_taps: 64,
                forgetting: 1.5,
                delta: 0.01,
            })
            .build();
        assert!(params.is_ok());
    }
}
