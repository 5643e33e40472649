use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CLAHE_TILE_GRID, HISTOGRAM_BINS, IMAGE_CLAHE_CLIP_LIMIT};

use super::build_rows;

/// Contrast-Limited Adaptive Histogram Equalization parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheParams {
    /// Histogram clip limit, relative to a uniform histogram. `<= 0` disables
    /// clipping (plain adaptive equalization).
    pub clip_limit: f32,
    /// Number of tiles along each axis.
    pub tile_grid: usize,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: IMAGE_CLAHE_CLIP_LIMIT,
            tile_grid: DEFAULT_CLAHE_TILE_GRID,
        }
    }
}

/// Equalize a single 8-bit plane (values are whole levels in 0..=255).
///
/// Each tile gets its own clipped-histogram lookup table; the excess above
/// the clip limit is spread evenly over all bins. Output pixels blend the
/// LUTs of the four nearest tile centers bilinearly.
pub fn clahe(data: &Array2<f32>, params: &ClaheParams) -> Array2<f32> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return data.clone();
    }

    let tiles_x = params.tile_grid.clamp(1, w);
    let tiles_y = params.tile_grid.clamp(1, h);
    let x_bounds = tile_bounds(w, tiles_x);
    let y_bounds = tile_bounds(h, tiles_y);

    let mut luts = Vec::with_capacity(tiles_x * tiles_y);
    for &(y0, y1) in &y_bounds {
        for &(x0, x1) in &x_bounds {
            luts.push(tile_lut(data, y0..y1, x0..x1, params.clip_limit));
        }
    }

    let x_interp = interpolation_table(&x_bounds, w);
    let y_interp = interpolation_table(&y_bounds, h);

    build_rows(h, w, |row| {
        let (ty1, ty2, wy) = y_interp[row];
        (0..w)
            .map(|col| {
                let (tx1, tx2, wx) = x_interp[col];
                let level = level_index(data[[row, col]]);
                let top = luts[ty1 * tiles_x + tx1][level] * (1.0 - wx)
                    + luts[ty1 * tiles_x + tx2][level] * wx;
                let bottom = luts[ty2 * tiles_x + tx1][level] * (1.0 - wx)
                    + luts[ty2 * tiles_x + tx2][level] * wx;
                (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0)
            })
            .collect()
    })
}

/// Split `0..len` into `tiles` contiguous, non-empty ranges.
fn tile_bounds(len: usize, tiles: usize) -> Vec<(usize, usize)> {
    (0..tiles)
        .map(|t| (t * len / tiles, (t + 1) * len / tiles))
        .collect()
}

/// For each coordinate, the two neighbouring tiles and the weight of the
/// second one.
fn interpolation_table(bounds: &[(usize, usize)], len: usize) -> Vec<(usize, usize, f32)> {
    let centers: Vec<f32> = bounds
        .iter()
        .map(|&(a, b)| (a + b) as f32 / 2.0 - 0.5)
        .collect();
    let last = centers.len() - 1;

    (0..len)
        .map(|i| {
            let x = i as f32;
            if x <= centers[0] {
                return (0, 0, 0.0);
            }
            if x >= centers[last] {
                return (last, last, 0.0);
            }
            let t = centers.iter().rposition(|&c| c <= x).unwrap_or(0).min(last - 1);
            let span = centers[t + 1] - centers[t];
            (t, t + 1, (x - centers[t]) / span)
        })
        .collect()
}

fn tile_lut(
    data: &Array2<f32>,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
    clip_limit: f32,
) -> Vec<f32> {
    let mut hist = vec![0.0f64; HISTOGRAM_BINS];
    for row in rows.clone() {
        for col in cols.clone() {
            hist[level_index(data[[row, col]])] += 1.0;
        }
    }
    let pixels = (rows.len() * cols.len()) as f64;

    if clip_limit > 0.0 {
        let limit = (clip_limit as f64 * pixels / HISTOGRAM_BINS as f64).max(1.0);
        let mut excess = 0.0;
        for bin in hist.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }
        let share = excess / HISTOGRAM_BINS as f64;
        for bin in hist.iter_mut() {
            *bin += share;
        }
    }

    let scale = (HISTOGRAM_BINS - 1) as f64 / pixels;
    let mut cdf = 0.0;
    hist.iter()
        .map(|&count| {
            cdf += count;
            (cdf * scale).round().clamp(0.0, 255.0) as f32
        })
        .collect()
}

fn level_index(v: f32) -> usize {
    v.round().clamp(0.0, 255.0) as usize
}
