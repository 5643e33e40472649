use crate::frame::Frame;

/// 8-bit lookup table for `output = 255 * (input / 255)^(1/gamma)`.
///
/// Entries are truncated toward zero, not rounded. gamma > 1.0 brightens
/// midtones, gamma < 1.0 darkens them.
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv_gamma = 1.0 / gamma as f64;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = (i as f64 / 255.0).powf(inv_gamma) * 255.0;
        *entry = v.clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Apply gamma correction to all channels of an 8-bit frame.
pub fn gamma_correct(frame: &Frame, gamma: f32) -> Frame {
    let lut = gamma_lut(gamma);
    frame.map_pixels(|v| lut[v as usize])
}
