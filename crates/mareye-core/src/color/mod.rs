pub mod hsv;
pub mod lab;

use ndarray::Array2;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::frame::Frame;

/// Grayscale version of a frame using ITU-R BT.601 weights.
///
/// Values are rounded to whole 8-bit levels (0..=255) so that metrics see the
/// same quantized grayscale an 8-bit decoder would produce.
pub fn luminance(frame: &Frame) -> Array2<f32> {
    let [r, g, b] = frame.order().rgb_indices();
    let data = frame.data();
    Array2::from_shape_fn((frame.height(), frame.width()), |(row, col)| {
        let y = LUMINANCE_R * data[[row, col, r]] as f32
            + LUMINANCE_G * data[[row, col, g]] as f32
            + LUMINANCE_B * data[[row, col, b]] as f32;
        y.round()
    })
}
