use ndarray::Array2;

use super::{build_rows, reflect101};

/// Gaussian blur with the kernel radius derived from sigma (`ceil(3 * sigma)`).
pub fn gaussian_blur_array(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as usize;
    gaussian_blur_sized(data, sigma, 2 * radius + 1)
}

/// Gaussian blur with an explicit (odd) kernel size, separable, reflect-101
/// borders.
pub fn gaussian_blur_sized(data: &Array2<f32>, sigma: f32, ksize: usize) -> Array2<f32> {
    let kernel = gaussian_kernel(sigma, ksize / 2);
    let row_pass = convolve_rows(data, &kernel);
    convolve_cols(&row_pass, &kernel)
}

/// Normalized 1-D Gaussian of length `2 * radius + 1`.
pub fn gaussian_kernel(sigma: f32, radius: usize) -> Vec<f32> {
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

fn convolve_rows(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;

    build_rows(h, w, |row| {
        (0..w)
            .map(|col| {
                let mut sum = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let src_col = reflect101(col as isize + ki as isize - radius as isize, w);
                    sum += data[[row, src_col]] * kv;
                }
                sum
            })
            .collect()
    })
}

fn convolve_cols(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;

    build_rows(h, w, |row| {
        (0..w)
            .map(|col| {
                let mut sum = 0.0f32;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let src_row = reflect101(row as isize + ki as isize - radius as isize, h);
                    sum += data[[src_row, col]] * kv;
                }
                sum
            })
            .collect()
    })
}
