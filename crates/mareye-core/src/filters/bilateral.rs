use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BILATERAL_DIAMETER, DEFAULT_BILATERAL_SIGMA, PARALLEL_PIXEL_THRESHOLD};
use crate::frame::ColorPlanes;

use super::reflect101;

/// Edge-preserving bilateral smoothing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralParams {
    /// Neighbourhood diameter in pixels. 0 derives it from `sigma_space`.
    pub diameter: usize,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for BilateralParams {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_BILATERAL_DIAMETER,
            sigma_color: DEFAULT_BILATERAL_SIGMA,
            sigma_space: DEFAULT_BILATERAL_SIGMA,
        }
    }
}

struct Offset {
    dy: isize,
    dx: isize,
    weight: f32,
}

/// Bilateral filter over a color image.
///
/// The range weight uses the L1 distance summed over the three channels, so
/// all channels of a pixel share one weight. Neighbourhood is a disc of
/// radius `diameter / 2`, reflect-101 at the borders.
pub fn bilateral_filter(planes: &ColorPlanes, params: &BilateralParams) -> ColorPlanes {
    let (h, w) = planes.dim();
    let sigma_color = if params.sigma_color > 0.0 { params.sigma_color } else { 1.0 };
    let sigma_space = if params.sigma_space > 0.0 { params.sigma_space } else { 1.0 };
    let radius = if params.diameter > 0 {
        params.diameter / 2
    } else {
        (sigma_space * 1.5).round() as usize
    }
    .max(1) as isize;

    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dy * dy + dx * dx) as f32;
            if r2.sqrt() > radius as f32 {
                continue;
            }
            offsets.push(Offset {
                dy,
                dx,
                weight: (r2 * space_coeff).exp(),
            });
        }
    }

    let color_weights: Vec<f32> = (0..=3 * 255)
        .map(|d| {
            let d = d as f32;
            (d * d * color_coeff).exp()
        })
        .collect();

    let filter_row = |row: usize| -> Vec<[f32; 3]> {
        (0..w)
            .map(|col| {
                let center = [
                    planes.red[[row, col]],
                    planes.green[[row, col]],
                    planes.blue[[row, col]],
                ];
                let mut sum = [0.0f32; 3];
                let mut wsum = 0.0f32;
                for off in &offsets {
                    let r = reflect101(row as isize + off.dy, h);
                    let c = reflect101(col as isize + off.dx, w);
                    let px = [planes.red[[r, c]], planes.green[[r, c]], planes.blue[[r, c]]];
                    let dist = (px[0] - center[0]).abs()
                        + (px[1] - center[1]).abs()
                        + (px[2] - center[2]).abs();
                    let idx = (dist.round() as usize).min(color_weights.len() - 1);
                    let weight = off.weight * color_weights[idx];
                    for ch in 0..3 {
                        sum[ch] += px[ch] * weight;
                    }
                    wsum += weight;
                }
                [sum[0] / wsum, sum[1] / wsum, sum[2] / wsum]
            })
            .collect()
    };

    let rows: Vec<Vec<[f32; 3]>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(filter_row).collect()
    } else {
        (0..h).map(filter_row).collect()
    };

    let mut out = ColorPlanes {
        red: Array2::zeros((h, w)),
        green: Array2::zeros((h, w)),
        blue: Array2::zeros((h, w)),
    };
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, [r, g, b]) in row_data.into_iter().enumerate() {
            out.red[[row, col]] = r;
            out.green[[row, col]] = g;
            out.blue[[row, col]] = b;
        }
    }
    out
}
