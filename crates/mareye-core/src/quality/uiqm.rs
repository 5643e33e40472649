//! Underwater image quality score.
//!
//! This is a simplified, ad hoc measure and NOT the published UIQM of Panetta
//! et al. (no UICM/UISM/UIConM decomposition). Absolute values are only
//! comparable with other scores from this function:
//!
//! ```text
//! uiqm = 100 * contrast + 50 * saturation + sharpness / 100 + 25 * colorfulness
//! ```
//!
//! - contrast: population std-dev of all channel values, scaled to [0, 1]
//! - saturation: mean HSV saturation in [0, 1]
//! - sharpness: Laplacian variance of the grayscale image (0..255 scale)
//! - colorfulness: `sqrt(var R + var G + var B) / 255`

use ndarray::ArrayView2;

use crate::color::hsv::mean_saturation;
use crate::color::luminance;
use crate::consts::{
    MAX_PIXEL, UIQM_COLORFULNESS_WEIGHT, UIQM_CONTRAST_WEIGHT, UIQM_SATURATION_WEIGHT,
    UIQM_SHARPNESS_DIVISOR,
};
use crate::frame::Frame;
use crate::quality::laplacian::laplacian_variance_array;

/// The four terms of the score, before weighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UiqmComponents {
    pub contrast: f64,
    pub saturation: f64,
    pub sharpness: f64,
    pub colorfulness: f64,
}

impl UiqmComponents {
    pub fn measure(frame: &Frame) -> Self {
        let (_, contrast_var) = mean_and_variance(frame.data().iter().copied());
        let contrast = contrast_var.sqrt() / MAX_PIXEL;

        let saturation = mean_saturation(frame);
        let sharpness = laplacian_variance_array(&luminance(frame));

        let channel_var: f64 = (0..3)
            .map(|c| channel_variance(frame.channel(c)))
            .sum();
        let colorfulness = channel_var.sqrt() / MAX_PIXEL;

        Self {
            contrast,
            saturation,
            sharpness,
            colorfulness,
        }
    }

    pub fn score(&self) -> f64 {
        UIQM_CONTRAST_WEIGHT * self.contrast
            + UIQM_SATURATION_WEIGHT * self.saturation
            + self.sharpness / UIQM_SHARPNESS_DIVISOR
            + UIQM_COLORFULNESS_WEIGHT * self.colorfulness
    }
}

/// Underwater quality score of a single frame.
pub fn uiqm(frame: &Frame) -> f64 {
    UiqmComponents::measure(frame).score()
}

fn channel_variance(channel: ArrayView2<'_, u8>) -> f64 {
    mean_and_variance(channel.iter().copied()).1
}

fn mean_and_variance(values: impl Iterator<Item = u8>) -> (f64, f64) {
    let mut n = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for v in values {
        let v = v as f64;
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    (mean, (sum_sq / n as f64 - mean * mean).max(0.0))
}
