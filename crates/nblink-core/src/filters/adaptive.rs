//! Adaptive Filters (LMS / RLS)
//!
//! The two training-based recovery branches. Both are trained against the
//! clean transmit record over the whole received record in one pass:
//! at each step the regressor is the most-recent `num_taps` received
//! samples, the error is measured against the transmit sample, and the
//! weights update in place. The first `num_taps` output samples are zero
//! while the regressor window fills.
//!
//! Output convention: `y = sum conj(w_i) * x[n-1-i]`.
//!
//! Tuning is advisory, not enforced: an LMS step size above the
//! `1 / (N * P_x)` bound or an RLS forgetting factor outside `(0, 1]`
//! produces a logged warning and a [`TuningVerdict`], never an error.
//!
//! ## Example
//!
//! ```rust
//! use nblink_core::filters::adaptive::LmsFilter;
//! use num_complex::Complex64;
//!
//! let mut lms = LmsFilter::new(8, 0.05);
//! let x = vec![Complex64::new(1.0, 0.0); 100];
//! let (y, verdict) = lms.train(&x, &x);
//! assert_eq!(y.len(), 100);
//! assert!(verdict.is_ok());
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::traits::Filter;
use crate::types::complex_ops;

/// Advisory tuning check result for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TuningVerdict {
    /// Parameters inside their convergence region.
    WithinBounds,
    /// LMS step size at or above the mean-square convergence bound.
    StepSizeTooLarge { step_size: f64, bound: f64 },
    /// RLS forgetting factor outside `(0, 1]`.
    ForgettingOutOfRange { forgetting: f64 },
}

impl TuningVerdict {
    /// True when no bound was violated.
    pub fn is_ok(&self) -> bool {
        matches!(self, TuningVerdict::WithinBounds)
    }
}

/// LMS (Least Mean Squares) adaptive filter.
///
/// Update rule: `w_i += mu * conj(e) * x[n-1-i]`. Mean-square convergence
/// requires `0 < mu < 1 / (N * P_x)` with `P_x` the input power.
#[derive(Debug, Clone)]
pub struct LmsFilter {
    weights: Vec<Complex64>,
    /// Delay line for streaming (filter-only) use.
    buffer: Vec<Complex64>,
    write_idx: usize,
    mu: f64,
}

impl LmsFilter {
    /// Create an LMS filter with zeroed weights.
    pub fn new(num_taps: usize, mu: f64) -> Self {
        let n = num_taps.max(1);
        Self {
            weights: vec![Complex64::new(0.0, 0.0); n],
            buffer: vec![Complex64::new(0.0, 0.0); n],
            write_idx: 0,
            mu,
        }
    }

    /// Train over a full record against a reference.
    ///
    /// Returns the filter output (zeros over the first `num_taps` samples)
    /// and the step-size verdict. Training always runs to completion; a
    /// violated bound only changes the verdict.
    pub fn train(
        &mut self,
        input: &[Complex64],
        desired: &[Complex64],
    ) -> (Vec<Complex64>, TuningVerdict) {
        let n = self.weights.len();
        let len = input.len().min(desired.len());
        let mut output = vec![Complex64::new(0.0, 0.0); len];

        let power = complex_ops::sample_variance(input);
        let bound = if power > 0.0 { 1.0 / (n as f64 * power) } else { f64::INFINITY };
        let verdict = if self.mu <= 0.0 || self.mu >= bound {
            warn!(
                step_size = self.mu,
                bound, "LMS step size outside convergence bound"
            );
            TuningVerdict::StepSizeTooLarge {
                step_size: self.mu,
                bound,
            }
        } else {
            TuningVerdict::WithinBounds
        };

        for idx in n..len {
            let mut y = Complex64::new(0.0, 0.0);
            for i in 0..n {
                y += self.weights[i].conj() * input[idx - 1 - i];
            }
            let error = desired[idx] - y;
            let e_conj = error.conj();
            for i in 0..n {
                self.weights[i] += self.mu * e_conj * input[idx - 1 - i];
            }
            output[idx] = y;
        }

        (output, verdict)
    }

    /// Current weights.
    pub fn weights(&self) -> &[Complex64] {
        &self.weights
    }

    /// Number of taps.
    pub fn num_taps(&self) -> usize {
        self.weights.len()
    }
}

impl Filter for LmsFilter {
    /// Filter-only mode using the current weights; no adaptation.
    fn process(&mut self, input: Complex64) -> Complex64 {
        let n = self.weights.len();
        self.buffer[self.write_idx] = input;
        self.write_idx = (self.write_idx + 1) % n;
        let mut output = Complex64::new(0.0, 0.0);
        for i in 0..n {
            let buf_idx = (self.write_idx + n - 1 - i) % n;
            output += self.weights[i].conj() * self.buffer[buf_idx];
        }
        output
    }

    fn reset(&mut self) {
        self.weights.fill(Complex64::new(0.0, 0.0));
        self.buffer.fill(Complex64::new(0.0, 0.0));
        self.write_idx = 0;
    }

    fn group_delay(&self) -> f64 {
        (self.weights.len() / 2) as f64
    }

    fn order(&self) -> usize {
        self.weights.len()
    }
}

/// RLS (Recursive Least Squares) adaptive filter.
///
/// Per sample, with `P` the inverse correlation matrix:
/// ```text
/// k = P x / (lambda + x^H P x)
/// w += k * conj(e)
/// P = (P - k (x^H P)) / lambda
/// ```
/// `P` starts as `I / delta` and stays Hermitian throughout.
#[derive(Debug, Clone)]
pub struct RlsFilter {
    weights: Vec<Complex64>,
    buffer: Vec<Complex64>,
    write_idx: usize,
    lambda: f64,
    delta: f64,
    /// Flattened N x N inverse correlation matrix.
    p_matrix: Vec<Complex64>,
    n: usize,
}

impl RlsFilter {
    /// Create an RLS filter.
    ///
    /// `delta` regularizes the initial inverse correlation matrix:
    /// `P(0) = I / delta`, so a small `delta` means fast initial steps.
    pub fn new(num_taps: usize, lambda: f64, delta: f64) -> Self {
        let n = num_taps.max(1);
        let mut p_matrix = vec![Complex64::new(0.0, 0.0); n * n];
        for i in 0..n {
            p_matrix[i * n + i] = Complex64::new(1.0 / delta, 0.0);
        }
        Self {
            weights: vec![Complex64::new(0.0, 0.0); n],
            buffer: vec![Complex64::new(0.0, 0.0); n],
            write_idx: 0,
            lambda,
            delta,
            p_matrix,
            n,
        }
    }

    /// Train over a full record against a reference.
    ///
    /// Same output contract as [`LmsFilter::train`].
    pub fn train(
        &mut self,
        input: &[Complex64],
        desired: &[Complex64],
    ) -> (Vec<Complex64>, TuningVerdict) {
        let n = self.n;
        let len = input.len().min(desired.len());
        let mut output = vec![Complex64::new(0.0, 0.0); len];

        let verdict = if self.lambda <= 0.0 || self.lambda > 1.0 {
            warn!(forgetting = self.lambda, "RLS forgetting factor outside (0, 1]");
            TuningVerdict::ForgettingOutOfRange {
                forgetting: self.lambda,
            }
        } else {
            TuningVerdict::WithinBounds
        };

        let mut px = vec![Complex64::new(0.0, 0.0); n];
        let mut xhp = vec![Complex64::new(0.0, 0.0); n];
        let mut k = vec![Complex64::new(0.0, 0.0); n];

        for idx in n..len {
            // Most-recent-first regressor.
            let x = &input[idx - n..idx];
            let x_at = |i: usize| x[n - 1 - i];

            let mut y = Complex64::new(0.0, 0.0);
            for i in 0..n {
                y += self.weights[i].conj() * x_at(i);
            }
            let error = desired[idx] - y;

            // px = P x, xhp = x^H P, xhpx = x^H P x
            let mut xhpx = Complex64::new(0.0, 0.0);
            for i in 0..n {
                let mut acc = Complex64::new(0.0, 0.0);
                let mut acc_h = Complex64::new(0.0, 0.0);
                for j in 0..n {
                    acc += self.p_matrix[i * n + j] * x_at(j);
                    acc_h += x_at(j).conj() * self.p_matrix[j * n + i];
                }
                px[i] = acc;
                xhp[i] = acc_h;
                xhpx += x_at(i).conj() * acc;
            }

            let denom = Complex64::new(self.lambda, 0.0) + xhpx;
            for i in 0..n {
                k[i] = px[i] / denom;
            }

            let e_conj = error.conj();
            for i in 0..n {
                self.weights[i] += k[i] * e_conj;
            }

            // P = (P - k (x^H P)) / lambda
            let inv_lambda = 1.0 / self.lambda;
            for i in 0..n {
                for j in 0..n {
                    self.p_matrix[i * n + j] =
                        (self.p_matrix[i * n + j] - k[i] * xhp[j]) * inv_lambda;
                }
            }

            output[idx] = y;
        }

        (output, verdict)
    }

    /// Current weights.
    pub fn weights(&self) -> &[Complex64] {
        &self.weights
    }

    /// Number of taps.
    pub fn num_taps(&self) -> usize {
        self.n
    }

    /// The flattened inverse correlation matrix (row-major N x N).
    pub fn p_matrix(&self) -> &[Complex64] {
        &self.p_matrix
    }
}

impl Filter for RlsFilter {
    /// Filter-only mode using the current weights; no adaptation.
    fn process(&mut self, input: Complex64) -> Complex64 {
        let n = self.n;
        self.buffer[self.write_idx] = input;
        self.write_idx = (self.write_idx + 1) % n;
        let mut output = Complex64::new(0.0, 0.0);
        for i in 0..n {
            let buf_idx = (self.write_idx + n - 1 - i) % n;
            output += self.weights[i].conj() * self.buffer[buf_idx];
        }
        output
    }

    fn reset(&mut self) {
        self.weights.fill(Complex64::new(0.0, 0.0));
        self.buffer.fill(Complex64::new(0.0, 0.0));
        self.write_idx = 0;
        self.p_matrix.fill(Complex64::new(0.0, 0.0));
        for i in 0..self.n {
            self.p_matrix[i * self.n + i] = Complex64::new(1.0 / self.delta, 0.0);
        }
    }

    fn group_delay(&self) -> f64 {
        (self.n / 2) as f64
    }

    fn order(&self) -> usize {
        self.n
    }
}
