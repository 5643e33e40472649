use ndarray::Array2;

use crate::filters::convolve::{filter3x3, LAPLACIAN_KERNEL};

/// Population variance of the Laplacian response, higher means sharper.
///
/// Convolves with the 3x3 Laplacian kernel over the whole plane
/// (reflect-101 borders):
///   0  1  0
///   1 -4  1
///   0  1  0
/// The response is not normalized.
pub fn laplacian_variance_array(data: &Array2<f32>) -> f64 {
    let n = data.len();
    if n == 0 {
        return 0.0;
    }

    let response = filter3x3(data, &LAPLACIAN_KERNEL);

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &lap in response.iter() {
        let lap = lap as f64;
        sum += lap;
        sum_sq += lap * lap;
    }

    let count = n as f64;
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}
