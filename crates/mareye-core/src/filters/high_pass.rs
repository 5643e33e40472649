use crate::consts::HIGH_PASS_KERNEL;
use crate::filters::convolve::filter3x3;
use crate::frame::ColorPlanes;

/// Sharpen with the 3x3 high-pass kernel and blend the result with the input:
/// `(1 - blend) * x + blend * sharpened`.
///
/// The sharpened copy is saturated to 8-bit before blending.
pub fn high_pass_blend(planes: &ColorPlanes, blend: f32) -> ColorPlanes {
    planes.map(|plane| {
        let sharpened = filter3x3(plane, &HIGH_PASS_KERNEL);
        ndarray::Zip::from(plane)
            .and(&sharpened)
            .map_collect(|&orig, &sharp| {
                let sharp = sharp.round().clamp(0.0, 255.0);
                orig * (1.0 - blend) + sharp * blend
            })
    })
}
