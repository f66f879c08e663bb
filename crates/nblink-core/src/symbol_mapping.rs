//! QPSK Symbol Mapper / Demapper
//!
//! Maps bit pairs to Gray-coded unit-energy QPSK constellation points and
//! maps noisy symbol estimates back to bits by phase-quadrant decision.
//! Gray coding means adjacent constellation points differ in exactly one
//! bit, so a single quadrant error costs one bit, not two.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::symbol_mapping::QpskMapper;
//!
//! let mapper = QpskMapper::new();
//! let bits = vec![0, 0, 0, 1, 1, 0, 1, 1];
//! let symbols = mapper.map(&bits).unwrap();
//! assert_eq!(symbols.len(), 4);
//! assert_eq!(mapper.demap(&symbols), bits);
//! ```

use std::f64::consts::FRAC_1_SQRT_2;
use std::f64::consts::PI;

use crate::types::{Complex, LinkError, LinkResult};

/// Gray-coded QPSK mapper with unit-energy constellation.
///
/// Dibit convention: the first bit of each pair is the high bit, so the
/// symbol index is `bits[2i] << 1 | bits[2i+1]`.
#[derive(Debug, Clone)]
pub struct QpskMapper {
    constellation: [Complex; 4],
}

impl Default for QpskMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl QpskMapper {
    /// Create a mapper. The constellation is fixed:
    ///
    /// | dibit | point           |
    /// |-------|-----------------|
    /// | 00    | `( 1 + j)/√2`   |
    /// | 01    | `(-1 + j)/√2`   |
    /// | 10    | `( 1 - j)/√2`   |
    /// | 11    | `(-1 - j)/√2`   |
    pub fn new() -> Self {
        let s = FRAC_1_SQRT_2;
        Self {
            constellation: [
                Complex::new(s, s),
                Complex::new(-s, s),
                Complex::new(s, -s),
                Complex::new(-s, -s),
            ],
        }
    }

    /// The four constellation points, indexed by dibit value.
    pub fn constellation(&self) -> &[Complex; 4] {
        &self.constellation
    }

    /// Map a bit sequence to symbols, two bits per symbol.
    ///
    /// Fails if the bit count is odd; QPSK has no half symbols.
    pub fn map(&self, bits: &[u8]) -> LinkResult<Vec<Complex>> {
        if bits.len() % 2 != 0 {
            return Err(LinkError::OddBitCount(bits.len()));
        }
        Ok(bits
            .chunks_exact(2)
            .map(|pair| {
                let idx = ((pair[0] & 1) << 1) | (pair[1] & 1);
                self.constellation[idx as usize]
            })
            .collect())
    }

    /// Decide the dibit for a single (possibly noisy) symbol estimate.
    ///
    /// Decision regions are phase quadrants centered on the constellation
    /// points, so every ideal point sits 45 degrees from the nearest
    /// boundary. Regions are half-open counter-clockwise: an estimate
    /// exactly on a boundary falls into the next region.
    pub fn decide(&self, symbol: Complex) -> [u8; 2] {
        let angle = symbol.arg();
        if (0.0..PI / 2.0).contains(&angle) {
            [0, 0]
        } else if (PI / 2.0..PI).contains(&angle) {
            [0, 1]
        } else if (-PI / 2.0..0.0).contains(&angle) {
            [1, 0]
        } else {
            [1, 1]
        }
    }

    /// Demap symbol estimates back to bits, two per symbol.
    pub fn demap(&self, symbols: &[Complex]) -> Vec<u8> {
        let mut bits = Vec::with_capacity(symbols.len() * 2);
        for &s in symbols {
            let pair = self.decide(s);
            bits.push(pair[0]);
            bits.push(pair[1]);
        }
        bits
    }
}
