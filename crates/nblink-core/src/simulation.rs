//! End-to-End Link Simulation
//!
//! Wires the pipeline together: bit source, QPSK mapping, waveform
//! synthesis, channel, then the four recovery branches in parallel, each
//! followed by delay-compensated demodulation and BER scoring against the
//! transmitted bits.
//!
//! The four branches are data-independent (each consumes the same received
//! record), so they run under a pair of nested `rayon::join` calls. Every
//! recurrence inside a branch stays strictly sequential.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nblink_core::params::LinkParams;
//! use nblink_core::simulation::LinkSimulation;
//!
//! let report = LinkSimulation::new(LinkParams::default()).run().unwrap();
//! assert_eq!(report.fir.ber.ber(), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ber_tool::{self, BerReport};
use crate::bit_source::BitSource;
use crate::channel::Channel;
use crate::demodulation::Demodulator;
use crate::filters::adaptive::{LmsFilter, RlsFilter, TuningVerdict};
use crate::filters::fir::FirBandpass;
use crate::filters::iir::{IirBandpass, StabilityOutcome};
use crate::filters::traits::{Filter, FirFilterOps};
use crate::params::LinkParams;
use crate::signal_source::WaveformSynthesizer;
use crate::symbol_mapping::QpskMapper;
use crate::types::{Complex, IQSample, LinkResult};

/// Which recovery branch a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    Fir,
    Iir,
    Lms,
    Rls,
}

impl BranchKind {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            BranchKind::Fir => "FIR",
            BranchKind::Iir => "IIR",
            BranchKind::Lms => "LMS",
            BranchKind::Rls => "RLS",
        }
    }
}

/// Per-branch recovery result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchReport {
    pub kind: BranchKind,
    /// Delay compensation applied before symbol alignment, in samples.
    pub delay: usize,
    /// Filter output record, same length as the received signal.
    pub filtered: Vec<IQSample>,
    /// Baseband symbol estimates (one per decoded symbol), for
    /// constellation inspection.
    pub symbols: Vec<Complex>,
    /// Decoded bits, possibly fewer than transmitted.
    pub decoded: Vec<u8>,
    /// Score against the transmitted bits.
    pub ber: BerReport,
}

/// Complete result of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkReport {
    /// The transmitted reference bits.
    pub tx_bits: Vec<u8>,
    pub fir: BranchReport,
    pub iir: BranchReport,
    pub lms: BranchReport,
    pub rls: BranchReport,
    /// FIR design actually used.
    pub fir_taps: Vec<f64>,
    /// IIR design actually used (post-mitigation numerator).
    pub iir_numerator: Vec<f64>,
    pub iir_denominator: Vec<f64>,
    /// Pole verdicts before and after numerator rescaling.
    pub iir_stability: StabilityOutcome,
    /// Final adaptive weights after the training pass.
    pub lms_weights: Vec<Complex>,
    pub rls_weights: Vec<Complex>,
    pub lms_verdict: TuningVerdict,
    pub rls_verdict: TuningVerdict,
}

impl LinkReport {
    /// All four branch reports, FIR first.
    pub fn branches(&self) -> [&BranchReport; 4] {
        [&self.fir, &self.iir, &self.lms, &self.rls]
    }

    /// The branch with the lowest BER (ties go to the earlier branch in
    /// FIR, IIR, LMS, RLS order).
    pub fn best_branch(&self) -> BranchKind {
        let mut best = &self.fir;
        for candidate in self.branches() {
            if candidate.ber.ber() < best.ber.ber() {
                best = candidate;
            }
        }
        best.kind
    }
}

/// One configured simulation run.
#[derive(Debug, Clone)]
pub struct LinkSimulation {
    params: LinkParams,
}

impl LinkSimulation {
    /// Create a simulation from a parameter set.
    pub fn new(params: LinkParams) -> Self {
        Self { params }
    }

    /// The parameter set.
    pub fn params(&self) -> &LinkParams {
        &self.params
    }

    /// Run the full pipeline.
    pub fn run(&self) -> LinkResult<LinkReport> {
        let p = &self.params;
        p.validate()?;

        info!(
            num_bits = p.num_bits,
            samples = p.num_samples(),
            seed = p.seed,
            "starting link simulation"
        );

        // Transmit side.
        let tx_bits = BitSource::new(p.seed).generate(p.num_bits);
        let mapper = QpskMapper::new();
        let symbols = mapper.map(&tx_bits)?;
        let synth = WaveformSynthesizer::new(p.f_center, p.sample_rate, p.samples_per_symbol);
        let tx = synth.synthesize(&symbols)?;

        // Channel.
        let mut channel = Channel::new(p.channel, p.sample_rate, p.seed);
        let rx = channel.process_block(tx.samples());
        debug!(rx_len = rx.len(), "channel output ready");

        let demod = Demodulator::new(p.f_center, p.sample_rate, p.samples_per_symbol);

        // The four branches share the received record read-only.
        let rx_ref: &[IQSample] = &rx;
        let tx_ref: &[IQSample] = tx.samples();
        let bits_ref: &[u8] = &tx_bits;

        let fir_task = || {
            let mut filter =
                FirBandpass::design(p.f_low, p.f_high, p.sample_rate, p.fir.num_taps, p.fir.kaiser_beta);
            let taps = filter.coefficients().to_vec();
            let filtered = filter.process_block(rx_ref);
            let delay = filter.group_delay() as usize;
            let branch = score_branch(BranchKind::Fir, &demod, filtered, delay, bits_ref);
            (branch, taps)
        };

        let iir_task = || {
            let mut filter = IirBandpass::design(p.f_low, p.f_high, p.sample_rate, p.iir.order);
            let stability = filter.verify_and_mitigate(0.1);
            let numerator = filter.numerator().to_vec();
            let denominator = filter.denominator().to_vec();
            let filtered = filter.process_block(rx_ref);
            let delay = filter.group_delay() as usize;
            let branch = score_branch(BranchKind::Iir, &demod, filtered, delay, bits_ref);
            (branch, stability, numerator, denominator)
        };

        let lms_task = || {
            let mut filter = LmsFilter::new(p.lms.num_taps, p.lms.step_size);
            let (filtered, verdict) = filter.train(rx_ref, tx_ref);
            let delay = filter.num_taps() / 2;
            let branch = score_branch(BranchKind::Lms, &demod, filtered, delay, bits_ref);
            (branch, filter.weights().to_vec(), verdict)
        };

        let rls_task = || {
            let mut filter = RlsFilter::new(p.rls.num_taps, p.rls.forgetting, p.rls.delta);
            let (filtered, verdict) = filter.train(rx_ref, tx_ref);
            let delay = filter.num_taps() / 2;
            let branch = score_branch(BranchKind::Rls, &demod, filtered, delay, bits_ref);
            (branch, filter.weights().to_vec(), verdict)
        };

        let ((fir_out, iir_out), (lms_out, rls_out)) = rayon::join(
            || rayon::join(fir_task, iir_task),
            || rayon::join(lms_task, rls_task),
        );

        let (fir, fir_taps) = fir_out;
        let (iir, iir_stability, iir_numerator, iir_denominator) = iir_out;
        let (lms, lms_weights, lms_verdict) = lms_out;
        let (rls, rls_weights, rls_verdict) = rls_out;

        for branch in [&fir, &iir, &lms, &rls] {
            info!(
                branch = branch.kind.name(),
                compared = branch.ber.compared_bits,
                errors = branch.ber.error_bits,
                ber = branch.ber.ber(),
                "branch scored"
            );
        }

        Ok(LinkReport {
            tx_bits,
            fir,
            iir,
            lms,
            rls,
            fir_taps,
            iir_numerator,
            iir_denominator,
            iir_stability,
            lms_weights,
            rls_weights,
            lms_verdict,
            rls_verdict,
        })
    }
}

fn score_branch(
    kind: BranchKind,
    demod: &Demodulator,
    filtered: Vec<IQSample>,
    delay: usize,
    tx_bits: &[u8],
) -> BranchReport {
    let symbols = demod.symbol_estimates(&filtered, delay);
    let mut decoded = QpskMapper::new().demap(&symbols);
    decoded.truncate(tx_bits.len());
    let ber = ber_tool::measure(tx_bits, &decoded);
    BranchReport {
        kind,
        delay,
        filtered,
        symbols,
        decoded,
        ber,
    }
}
