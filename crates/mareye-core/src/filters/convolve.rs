use ndarray::Array2;

use super::{build_rows, reflect101};

/// 3x3 Laplacian kernel (4-neighbour).
pub const LAPLACIAN_KERNEL: [[f32; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// Correlate a plane with a 3x3 kernel, reflect-101 borders. Output is not
/// clamped.
pub fn filter3x3(data: &Array2<f32>, kernel: &[[f32; 3]; 3]) -> Array2<f32> {
    let (h, w) = data.dim();

    build_rows(h, w, |row| {
        (0..w)
            .map(|col| {
                let mut sum = 0.0f32;
                for (ky, krow) in kernel.iter().enumerate() {
                    let src_row = reflect101(row as isize + ky as isize - 1, h);
                    for (kx, &kv) in krow.iter().enumerate() {
                        if kv == 0.0 {
                            continue;
                        }
                        let src_col = reflect101(col as isize + kx as isize - 1, w);
                        sum += data[[src_row, src_col]] * kv;
                    }
                }
                sum
            })
            .collect()
    })
}
