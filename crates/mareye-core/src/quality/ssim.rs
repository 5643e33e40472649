//! Structural Similarity Index on 8-bit grayscale planes.
//!
//! Local statistics use an 11x11 Gaussian window (sigma 1.5) with reflect-101
//! borders. The score is the mean of the SSIM map, clamped to [0, 1].

use ndarray::{Array2, Zip};

use crate::consts::{SSIM_C1, SSIM_C2, SSIM_SIGMA, SSIM_WINDOW};
use crate::filters::gaussian_blur::gaussian_blur_sized;

/// Mean SSIM between two grayscale planes of equal shape.
pub fn ssim(a: &Array2<f32>, b: &Array2<f32>) -> f64 {
    let map = ssim_map(a, b);
    let n = map.len();
    if n == 0 {
        return 0.0;
    }
    let mean = map.iter().sum::<f64>() / n as f64;
    mean.clamp(0.0, 1.0)
}

/// Per-pixel SSIM map (unclamped).
pub fn ssim_map(a: &Array2<f32>, b: &Array2<f32>) -> Array2<f64> {
    let blur = |data: &Array2<f32>| gaussian_blur_sized(data, SSIM_SIGMA, SSIM_WINDOW);

    let mu_a = blur(a);
    let mu_b = blur(b);
    let a_sq = blur(&(a * a));
    let b_sq = blur(&(b * b));
    let ab = blur(&(a * b));

    let mut map = Array2::<f64>::zeros(a.dim());
    Zip::from(&mut map)
        .and(&mu_a)
        .and(&mu_b)
        .and(&a_sq)
        .and(&b_sq)
        .and(&ab)
        .for_each(|out, &ma, &mb, &saa, &sbb, &sab| {
            let (ma, mb) = (ma as f64, mb as f64);
            let var_a = saa as f64 - ma * ma;
            let var_b = sbb as f64 - mb * mb;
            let cov = sab as f64 - ma * mb;
            let num = (2.0 * ma * mb + SSIM_C1) * (2.0 * cov + SSIM_C2);
            let den = (ma * ma + mb * mb + SSIM_C1) * (var_a + var_b + SSIM_C2);
            *out = num / den;
        });
    map
}
