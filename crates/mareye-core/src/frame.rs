use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{MarEyeError, Result};

/// Interleaved channel order of a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

impl ColorOrder {
    /// Interleaved index of red, green and blue, in that order.
    pub fn rgb_indices(self) -> [usize; 3] {
        match self {
            Self::Rgb => [0, 1, 2],
            Self::Bgr => [2, 1, 0],
        }
    }
}

/// A decoded 8-bit, 3-channel image or video frame.
///
/// Shape is `(height, width, 3)` in standard (row-major) layout. A frame is
/// never modified after construction; every operator produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Array3<u8>,
    order: ColorOrder,
}

impl Frame {
    pub fn new(data: Array3<u8>, order: ColorOrder) -> Result<Self> {
        let (h, w, c) = data.dim();
        if c != COLOR_CHANNEL_COUNT {
            return Err(MarEyeError::InvalidFrame(format!(
                "expected {COLOR_CHANNEL_COUNT} channels, got {c}"
            )));
        }
        if h == 0 || w == 0 {
            return Err(MarEyeError::InvalidDimensions {
                width: w as u32,
                height: h as u32,
            });
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, order })
    }

    /// Build a frame from tightly packed interleaved bytes.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>, order: ColorOrder) -> Result<Self> {
        let expected = width as usize * height as usize * COLOR_CHANNEL_COUNT;
        if bytes.len() != expected {
            return Err(MarEyeError::InvalidFrame(format!(
                "buffer holds {} bytes, {width}x{height} needs {expected}",
                bytes.len()
            )));
        }
        let data = Array3::from_shape_vec(
            (height as usize, width as usize, COLOR_CHANNEL_COUNT),
            bytes,
        )
        .map_err(|e| MarEyeError::InvalidFrame(e.to_string()))?;
        Self::new(data, order)
    }

    /// A frame where every pixel has the same red, green and blue value.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], order: ColorOrder) -> Result<Self> {
        let idx = order.rgb_indices();
        let mut pixel = [0u8; 3];
        for (i, &v) in rgb.iter().enumerate() {
            pixel[idx[i]] = v;
        }
        let data = Array3::from_shape_fn(
            (height as usize, width as usize, COLOR_CHANNEL_COUNT),
            |(_, _, c)| pixel[c],
        );
        Self::new(data, order)
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn order(&self) -> ColorOrder {
        self.order
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// Interleaved pixel bytes in the frame's channel order.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice().unwrap_or_default()
    }

    pub fn same_dimensions(&self, other: &Frame) -> bool {
        self.data.dim() == other.data.dim()
    }

    /// View of a single interleaved channel (by storage index, not color).
    pub fn channel(&self, index: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(2), index)
    }

    /// Red, green and blue planes as `f32` on the 0..=255 scale.
    pub fn planes(&self) -> ColorPlanes {
        let [r, g, b] = self.order.rgb_indices();
        ColorPlanes {
            red: self.channel(r).mapv(f32::from),
            green: self.channel(g).mapv(f32::from),
            blue: self.channel(b).mapv(f32::from),
        }
    }

    /// Apply a per-byte mapping (e.g. a lookup table) to every channel.
    pub fn map_pixels<F>(&self, f: F) -> Frame
    where
        F: Fn(u8) -> u8,
    {
        Frame {
            data: self.data.mapv(f),
            order: self.order,
        }
    }

    /// Reinterleave in another channel order. Pixel colors are unchanged.
    pub fn to_order(&self, order: ColorOrder) -> Frame {
        if order == self.order {
            return self.clone();
        }
        let mut data = self.data.clone();
        data.invert_axis(Axis(2));
        Frame {
            data: data.as_standard_layout().into_owned(),
            order,
        }
    }

    /// Bilinear resize to `width` x `height`, keeping the channel order.
    pub fn resize(&self, width: u32, height: u32) -> Result<Frame> {
        if width as usize == self.width() && height as usize == self.height() {
            return Ok(self.clone());
        }
        let resized = imageops::resize(&self.as_image_buffer()?, width, height, FilterType::Triangle);
        Frame::from_raw(width, height, resized.into_raw(), self.order)
    }

    /// Convert to an `image` RGB buffer for encoding.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        self.to_order(ColorOrder::Rgb).as_image_buffer()
    }

    pub fn from_rgb_image(img: &RgbImage) -> Result<Frame> {
        let (w, h) = img.dimensions();
        Frame::from_raw(w, h, img.as_raw().clone(), ColorOrder::Rgb)
    }

    /// Channel-agnostic packing into an `image` buffer (channel order preserved).
    fn as_image_buffer(&self) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>> {
        ImageBuffer::from_raw(
            self.width() as u32,
            self.height() as u32,
            self.as_bytes().to_vec(),
        )
        .ok_or_else(|| MarEyeError::InvalidFrame("buffer size does not match dimensions".into()))
    }
}

/// Planar working copy of a frame: one `f32` array per color, 0..=255 scale.
#[derive(Clone, Debug)]
pub struct ColorPlanes {
    pub red: Array2<f32>,
    pub green: Array2<f32>,
    pub blue: Array2<f32>,
}

impl ColorPlanes {
    pub fn dim(&self) -> (usize, usize) {
        self.red.dim()
    }

    /// Quantize back to an 8-bit frame (round, then saturate to 0..=255).
    pub fn to_frame(&self, order: ColorOrder) -> Result<Frame> {
        let frame = self.interleave(order);
        Frame::new(frame.data, order)
    }

    /// Round and saturate every value, staying in planar form.
    pub fn quantized(&self) -> ColorPlanes {
        self.map(|plane| plane.mapv(|v| f32::from(saturate_u8(v))))
    }

    /// Quantize planes that came from a valid frame (shape already checked).
    pub(crate) fn interleave(&self, order: ColorOrder) -> Frame {
        let (h, w) = self.dim();
        let idx = order.rgb_indices();
        let planes = [&self.red, &self.green, &self.blue];
        let mut data = Array3::<u8>::zeros((h, w, COLOR_CHANNEL_COUNT));
        for (color, plane) in planes.iter().enumerate() {
            let mut channel = data.index_axis_mut(Axis(2), idx[color]);
            ndarray::Zip::from(&mut channel)
                .and(*plane)
                .for_each(|dst, &v| *dst = saturate_u8(v));
        }
        Frame { data, order }
    }

    /// Apply a processing function to each color plane independently.
    pub fn map<F>(&self, mut process_fn: F) -> ColorPlanes
    where
        F: FnMut(&Array2<f32>) -> Array2<f32>,
    {
        ColorPlanes {
            red: process_fn(&self.red),
            green: process_fn(&self.green),
            blue: process_fn(&self.blue),
        }
    }
}

/// Round to nearest and clamp into the 8-bit range.
pub fn saturate_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// Header information of a video source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frame count advertised by the container, if any.
    pub frame_count: Option<u64>,
}
