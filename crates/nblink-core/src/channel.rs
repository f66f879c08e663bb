//! Channel Model — multipath, narrowband interference, AWGN
//!
//! Applies three impairments to the transmit record, in order:
//!
//! 1. Two-ray multipath: an attenuated direct path plus a weaker echo
//!    `echo_delay` samples behind it.
//! 2. A constant-envelope complex tone near (or inside) the signal band.
//! 3. Complex additive white Gaussian noise, independent per component.
//!
//! Noise is drawn from a seeded stream (see [`crate::rng`]), so two
//! channels built from the same configuration produce identical output
//! for identical input.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::channel::{Channel, ChannelConfig};
//! use nblink_core::types::Complex;
//!
//! let mut ch = Channel::new(ChannelConfig::default(), 5e9, 42);
//! let tx = vec![Complex::new(1.0, 0.0); 1000];
//! let rx = ch.process_block(&tx);
//! assert_eq!(rx.len(), 1000);
//! ```

use crate::params::ChannelParams;
use crate::rng::Xoshiro256StarStar;
use crate::types::{complex_ops, IQSample};

/// Channel impairment configuration.
///
/// Re-exported view of [`ChannelParams`] so the channel can be driven
/// directly in tests without a full [`crate::params::LinkParams`].
pub type ChannelConfig = ChannelParams;

/// Offset mixed into the run seed so the channel's noise stream never
/// collides with the bit source's stream.
const NOISE_STREAM_SALT: u64 = 0x9e3779b97f4a7c15;

/// Streaming channel model.
#[derive(Debug, Clone)]
pub struct Channel {
    config: ChannelConfig,
    sample_rate: f64,
    seed: u64,
    /// Delay line for the echo path, length `echo_delay`: reading a slot
    /// before overwriting it yields exactly `echo_delay` samples of lag.
    delay_line: Vec<IQSample>,
    delay_idx: usize,
    /// Absolute sample counter; drives the interferer phase.
    sample_idx: usize,
    rng: Xoshiro256StarStar,
}

impl Channel {
    /// Create a channel from its configuration, the system sample rate,
    /// and the run seed.
    pub fn new(config: ChannelConfig, sample_rate: f64, seed: u64) -> Self {
        let delay_len = config.echo_delay;
        Self {
            config,
            sample_rate,
            seed,
            delay_line: vec![IQSample::new(0.0, 0.0); delay_len],
            delay_idx: 0,
            sample_idx: 0,
            rng: Xoshiro256StarStar::new(seed ^ NOISE_STREAM_SALT),
        }
    }

    /// The impairment configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Process one sample through the channel.
    pub fn process(&mut self, input: IQSample) -> IQSample {
        // Multipath: read the echo tap before overwriting the slot. A
        // zero-sample delay degenerates to a second direct path.
        let echoed = if self.delay_line.is_empty() {
            input
        } else {
            let tap = self.delay_line[self.delay_idx];
            self.delay_line[self.delay_idx] = input;
            self.delay_idx = (self.delay_idx + 1) % self.delay_line.len();
            tap
        };

        let mut out = input * self.config.direct_gain + echoed * self.config.echo_gain;

        // Narrowband interferer, phase from the absolute sample index.
        if self.config.interferer_amplitude != 0.0 {
            out += complex_ops::cis(
                self.config.interferer_freq_hz,
                self.sample_idx,
                self.sample_rate,
            ) * self.config.interferer_amplitude;
        }
        self.sample_idx += 1;

        // Complex AWGN.
        if self.config.noise_sigma > 0.0 {
            let (n_re, n_im) = self.rng.gaussian_pair();
            out += IQSample::new(
                n_re * self.config.noise_sigma,
                n_im * self.config.noise_sigma,
            );
        }

        out
    }

    /// Process a block of samples.
    pub fn process_block(&mut self, input: &[IQSample]) -> Vec<IQSample> {
        input.iter().map(|&x| self.process(x)).collect()
    }

    /// Reset the delay line, sample counter, and noise stream.
    pub fn reset(&mut self) {
        self.delay_line.fill(IQSample::new(0.0, 0.0));
        self.delay_idx = 0;
        self.sample_idx = 0;
        self.rng = Xoshiro256StarStar::new(self.seed ^ NOISE_STREAM_SALT);
    }
}
