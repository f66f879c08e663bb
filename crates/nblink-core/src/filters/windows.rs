//! Window Functions for FIR Design
//!
//! Only the Kaiser family is needed here: its β parameter trades main-lobe
//! width against side-lobe level, which is the control the bandpass design
//! exposes. β = 0 degenerates to rectangular; β ≈ 8.6 resembles Blackman.

/// Generate a Kaiser window with shape parameter β.
pub fn kaiser_window(length: usize, beta: f64) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }

    let half = (length - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(beta);

    (0..length)
        .map(|n| {
            let x = (n as f64 - half) / half;
            let arg = beta * (1.0 - x * x).sqrt();
            bessel_i0(arg) / i0_beta
        })
        .collect()
}

/// Modified Bessel function of the first kind, order 0.
///
/// Abramowitz & Stegun polynomial approximations, split at |x| = 3.75.
fn bessel_i0(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        return 1.0;
    }

    let ax = x.abs();

    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377))))))))
    }
}
