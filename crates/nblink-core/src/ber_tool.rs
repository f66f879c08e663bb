//! Bit Error Rate Measurement
//!
//! Scores a decoded bit sequence against the transmitted reference. The
//! two sequences may differ in length (a delayed branch decodes fewer
//! bits); comparison runs over the overlap and the report carries the
//! compared count so a short decode is visible, not hidden by the ratio.

use serde::{Deserialize, Serialize};

/// Result of one BER measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BerReport {
    /// Number of bit positions compared (the overlap length).
    pub compared_bits: usize,
    /// Number of positions that disagreed.
    pub error_bits: usize,
}

impl BerReport {
    /// Bit error rate over the compared positions; 0 when nothing was
    /// compared.
    pub fn ber(&self) -> f64 {
        if self.compared_bits == 0 {
            return 0.0;
        }
        self.error_bits as f64 / self.compared_bits as f64
    }

    /// True when every compared bit matched and the full reference was
    /// covered.
    pub fn is_error_free(&self, reference_len: usize) -> bool {
        self.error_bits == 0 && self.compared_bits == reference_len
    }
}

/// Compare a decoded sequence against the reference over their overlap.
pub fn measure(reference: &[u8], decoded: &[u8]) -> BerReport {
    let compared_bits = reference.len().min(decoded.len());
    let error_bits = reference
        .iter()
        .zip(decoded.iter())
        .filter(|(a, b)| a != b)
        .count();
    BerReport {
        compared_bits,
        error_bits,
    }
}
