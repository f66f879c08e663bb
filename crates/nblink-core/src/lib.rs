//! # Narrowband QPSK Link Simulation
//!
//! This crate simulates a narrowband QPSK digital radio link end to end
//! and compares four receive-side recovery strategies on the same
//! impaired record:
//!
//! - **FIR**: Kaiser windowed-sinc bandpass, linear phase
//! - **IIR**: Butterworth bandpass in rational `(b, a)` form
//! - **LMS**: least-mean-squares equalizer trained against the clean
//!   transmit waveform
//! - **RLS**: recursive-least-squares equalizer, same reference
//!
//! ## Signal Flow
//!
//! ```text
//! TX: Bits → Gray QPSK map → ZOH pulse → carrier up-convert → I/Q
//! CH: multipath (direct + echo) + narrowband interferer + AWGN
//! RX: filter branch → delay skip → down-convert → window average
//!     → quadrant decision → bits → BER vs. TX
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use nblink_core::params::LinkParams;
//! use nblink_core::simulation::LinkSimulation;
//!
//! let params = LinkParams::builder()
//!     .num_bits(200)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let report = LinkSimulation::new(params).run().unwrap();
//! for branch in report.branches() {
//!     println!("{}: BER {:.4}", branch.kind.name(), branch.ber.ber());
//! }
//! ```

pub mod ber_tool;
pub mod bit_source;
pub mod channel;
pub mod demodulation;
pub mod filters;
pub mod logging;
pub mod params;
pub mod rng;
pub mod signal_source;
pub mod simulation;
pub mod symbol_mapping;
pub mod types;

pub use params::LinkParams;
pub use simulation::{BranchKind, BranchReport, LinkReport, LinkSimulation};
pub use types::{Complex, IQSample, LinkError, LinkResult, Waveform};

/// Commonly used items.
pub mod prelude {
    pub use crate::ber_tool::BerReport;
    pub use crate::channel::{Channel, ChannelConfig};
    pub use crate::demodulation::Demodulator;
    pub use crate::filters::{Filter, FirBandpass, FirFilterOps, IirBandpass, LmsFilter, RlsFilter};
    pub use crate::params::LinkParams;
    pub use crate::signal_source::WaveformSynthesizer;
    pub use crate::simulation::{BranchKind, LinkReport, LinkSimulation};
    pub use crate::symbol_mapping::QpskMapper;
    pub use crate::types::{Complex, IQSample, LinkError, LinkResult, Waveform};
}
