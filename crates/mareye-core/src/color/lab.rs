//! 8-bit CIE L\*a\*b\* conversion (sRGB primaries, D65 white point).
//!
//! Encoding follows the common 8-bit convention: `L` is rescaled from
//! 0..=100 to 0..=255, `a` and `b` are offset by 128. All three channels are
//! quantized to whole levels on the way in, exactly like an 8-bit Lab image.

use ndarray::{Array2, Zip};

use crate::frame::{saturate_u8, ColorPlanes};

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const LAB_EPSILON: f32 = 0.008_856;
const LAB_KAPPA: f32 = 903.3;

/// L\*a\*b\* planes, each holding whole 8-bit levels as `f32`.
#[derive(Clone, Debug)]
pub struct LabPlanes {
    pub l: Array2<f32>,
    pub a: Array2<f32>,
    pub b: Array2<f32>,
}

pub fn rgb_to_lab(planes: &ColorPlanes) -> LabPlanes {
    let lut = srgb_linear_lut();
    let dim = planes.dim();
    let mut l = Array2::<f32>::zeros(dim);
    let mut a = Array2::<f32>::zeros(dim);
    let mut b = Array2::<f32>::zeros(dim);

    Zip::from(&mut l)
        .and(&mut a)
        .and(&mut b)
        .and(&planes.red)
        .and(&planes.green)
        .and(&planes.blue)
        .for_each(|l, a, b, &r, &g, &bl| {
            let [lv, av, bv] = pixel_to_lab(
                lut[saturate_u8(r) as usize],
                lut[saturate_u8(g) as usize],
                lut[saturate_u8(bl) as usize],
            );
            *l = saturate_u8(lv * 255.0 / 100.0) as f32;
            *a = saturate_u8(av + 128.0) as f32;
            *b = saturate_u8(bv + 128.0) as f32;
        });

    LabPlanes { l, a, b }
}

/// Convert back to RGB planes on the 0..=255 scale (not yet quantized).
pub fn lab_to_rgb(lab: &LabPlanes) -> ColorPlanes {
    let dim = lab.l.dim();
    let mut red = Array2::<f32>::zeros(dim);
    let mut green = Array2::<f32>::zeros(dim);
    let mut blue = Array2::<f32>::zeros(dim);

    Zip::from(&mut red)
        .and(&mut green)
        .and(&mut blue)
        .and(&lab.l)
        .and(&lab.a)
        .and(&lab.b)
        .for_each(|r, g, b, &l8, &a8, &b8| {
            let [rv, gv, bv] = lab_to_pixel(l8 * 100.0 / 255.0, a8 - 128.0, b8 - 128.0);
            *r = rv * 255.0;
            *g = gv * 255.0;
            *b = bv * 255.0;
        });

    ColorPlanes { red, green, blue }
}

/// Linear-light RGB (0..=1) to unscaled L\*a\*b\*.
fn pixel_to_lab(r: f32, g: f32, b: f32) -> [f32; 3] {
    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        LAB_KAPPA * y
    };
    [l, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Unscaled L\*a\*b\* to gamma-encoded RGB in 0..=1.
fn lab_to_pixel(l: f32, a: f32, b: f32) -> [f32; 3] {
    let y = if l > LAB_KAPPA * LAB_EPSILON {
        ((l + 16.0) / 116.0).powi(3)
    } else {
        l / LAB_KAPPA
    };
    let fy = if y > LAB_EPSILON {
        y.cbrt()
    } else {
        7.787 * y + 16.0 / 116.0
    };
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - b / 200.0) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl)]
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cube = f * f * f;
    if cube > LAB_EPSILON {
        cube
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB decoding table for every 8-bit level.
fn srgb_linear_lut() -> [f32; 256] {
    let mut lut = [0.0f32; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        let c = i as f32 / 255.0;
        *v = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    lut
}
