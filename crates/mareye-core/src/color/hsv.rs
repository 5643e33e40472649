use ndarray::Array2;

use crate::frame::Frame;

/// HSV saturation of every pixel, 8-bit convention: `255 * (max - min) / max`,
/// rounded, and 0 for black pixels.
pub fn saturation(frame: &Frame) -> Array2<f32> {
    let data = frame.data();
    Array2::from_shape_fn((frame.height(), frame.width()), |(row, col)| {
        let px = [data[[row, col, 0]], data[[row, col, 1]], data[[row, col, 2]]];
        pixel_saturation(px) as f32
    })
}

/// Mean HSV saturation normalized to [0, 1].
pub fn mean_saturation(frame: &Frame) -> f64 {
    let s = saturation(frame);
    let n = s.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    s.iter().map(|&v| v as f64).sum::<f64>() / n / 255.0
}

fn pixel_saturation(px: [u8; 3]) -> u8 {
    let max = px.iter().copied().max().unwrap_or(0);
    let min = px.iter().copied().min().unwrap_or(0);
    if max == 0 {
        return 0;
    }
    let s = 255.0 * f32::from(max - min) / f32::from(max);
    s.round() as u8
}
