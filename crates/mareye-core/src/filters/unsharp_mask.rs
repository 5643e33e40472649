use crate::filters::gaussian_blur::gaussian_blur_array;
use crate::frame::ColorPlanes;

/// Apply unsharp mask sharpening to every color plane.
///
/// `sigma`: Gaussian blur sigma for the blurred copy.
/// `amount`: fraction of the difference added back (0.5 gives `1.5x - 0.5 blur`).
/// `threshold`: minimum absolute difference (0..255 scale) to sharpen.
pub fn unsharp_mask(planes: &ColorPlanes, sigma: f32, amount: f32, threshold: f32) -> ColorPlanes {
    planes.map(|plane| {
        let blurred = gaussian_blur_array(plane, sigma);
        ndarray::Zip::from(plane)
            .and(&blurred)
            .map_collect(|&orig, &blur| {
                let diff = orig - blur;
                if diff.abs() > threshold {
                    (orig + diff * amount).clamp(0.0, 255.0)
                } else {
                    orig
                }
            })
    })
}
