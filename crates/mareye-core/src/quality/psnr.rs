//! Peak Signal-to-Noise Ratio on 8-bit grayscale planes.
//!
//! The denominator carries a machine-epsilon term so the metric is defined
//! for identical inputs: zero error gives `20 * log10(255 / eps)`, about
//! 361.2 dB, instead of infinity.

use ndarray::{Array2, Zip};

use crate::consts::MAX_PIXEL;

/// Mean squared error between two planes of equal shape.
pub fn mse(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    let n = a.len();
    if n == 0 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    Zip::from(a).and(b).for_each(|&x, &y| {
        let d = x as f64 - y as f64;
        sum += d * d;
    });
    sum / n as f64
}

/// PSNR (dB) for a given mean squared error.
pub fn psnr_from_mse(mse: f64) -> f64 {
    20.0 * (MAX_PIXEL / (mse.sqrt() + f64::EPSILON)).log10()
}

/// PSNR (dB) between two grayscale planes of equal shape.
pub fn psnr(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    psnr_from_mse(mse(a, b))
}
