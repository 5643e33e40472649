pub mod bilateral;
pub mod clahe;
pub mod convolve;
pub mod gaussian_blur;
pub mod high_pass;
pub mod levels;
pub mod unsharp_mask;

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Mirror an out-of-range index back into `0..n` without repeating the edge
/// pixel (`dcb|abcd|cba`).
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i as usize
}

/// Build an `h x w` array one row at a time, in parallel for large images.
///
/// `row_fn(row)` must return exactly `w` values.
pub(crate) fn build_rows<F>(h: usize, w: usize, row_fn: F) -> Array2<f32>
where
    F: Fn(usize) -> Vec<f32> + Sync + Send,
{
    let rows: Vec<Vec<f32>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(&row_fn).collect()
    } else {
        (0..h).map(&row_fn).collect()
    };

    let mut result = Array2::<f32>::zeros((h, w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().take(w).enumerate() {
            result[[row, col]] = val;
        }
    }
    result
}
