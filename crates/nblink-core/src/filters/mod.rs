//! Recovery Filters
//!
//! The four filter branches the simulator compares:
//!
//! - [`fir::FirBandpass`] — Kaiser windowed-sinc bandpass, linear phase
//! - [`iir::IirBandpass`] — Butterworth bandpass in rational (b, a) form
//! - [`adaptive::LmsFilter`] — least mean squares, trained against the
//!   clean transmit record
//! - [`adaptive::RlsFilter`] — recursive least squares, same reference
//!
//! All four implement [`traits::Filter`], so the pipeline treats them
//! uniformly; the adaptive pair additionally exposes its batch training
//! entry points.

pub mod adaptive;
pub mod fir;
pub mod iir;
pub mod traits;
pub mod windows;

pub use adaptive::{LmsFilter, RlsFilter, TuningVerdict};
pub use fir::FirBandpass;
pub use iir::{IirBandpass, StabilityReport};
pub use traits::{Filter, FirFilterOps, FrequencyResponse};
