//! Neural enhancement behind a fixed tensor contract.
//!
//! The model is opaque: it takes `[1, 3, S, S]` RGB in [0, 1] and returns
//! `[1, 3, H, W]` RGB in [0, 1]. Any failure on a unit falls back to the
//! classical operator for that unit only.

use std::path::Path;

use ndarray::{Array3, Array4};
use tracing::{info, warn};

use crate::consts::NEURAL_INPUT_SIZE;
use crate::error::{MarEyeError, Result};
use crate::frame::{ColorOrder, Frame};

use super::classical::{enhance, EnhanceParams};
use super::{EnhancementMethod, FrameEnhancer};

/// An opaque inference model.
pub trait InferenceSession {
    /// Run one forward pass on an NCHW tensor.
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>>;
}

/// Loads sessions from a model file.
pub trait SessionLoader {
    fn load(&self, model: &Path) -> Result<Box<dyn InferenceSession>>;
}

/// Loads ONNX models with ONNX Runtime when built with the `onnx` feature;
/// otherwise every load fails (and the caller falls back to classical).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSessionLoader;

impl SessionLoader for DefaultSessionLoader {
    fn load(&self, model: &Path) -> Result<Box<dyn InferenceSession>> {
        if !model.is_file() {
            return Err(MarEyeError::Inference(format!(
                "model not found: {}",
                model.display()
            )));
        }

        #[cfg(feature = "onnx")]
        {
            let session = super::onnx::OrtSession::from_file(model)?;
            Ok(Box::new(session))
        }

        #[cfg(not(feature = "onnx"))]
        {
            Err(MarEyeError::Inference(
                "built without ONNX Runtime support (enable the `onnx` feature)".into(),
            ))
        }
    }
}

/// RGB, resized to `size x size`, scaled to [0, 1], NCHW with batch 1.
pub fn preprocess(frame: &Frame, size: u32) -> Result<Array4<f32>> {
    let rgb = frame.to_order(ColorOrder::Rgb).resize(size, size)?;
    let data = rgb.data();
    let side = size as usize;
    Ok(Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        f32::from(data[[y, x, c]]) / 255.0
    }))
}

/// Inverse of [`preprocess`]: validate `[1, 3, H, W]`, scale to 8 bits
/// (clamped, truncated), resize to `width x height` and restore `order`.
pub fn postprocess(output: &Array4<f32>, width: u32, height: u32, order: ColorOrder) -> Result<Frame> {
    let (n, c, h, w) = output.dim();
    if n != 1 || c != 3 || h == 0 || w == 0 {
        return Err(MarEyeError::Inference(format!(
            "unexpected output shape [{n}, {c}, {h}, {w}], expected [1, 3, H, W]"
        )));
    }

    let hwc = Array3::from_shape_fn((h, w, 3), |(y, x, ch)| {
        (output[[0, ch, y, x]] * 255.0).clamp(0.0, 255.0) as u8
    });
    let frame = Frame::new(hwc, ColorOrder::Rgb)?.resize(width, height)?;
    Ok(frame.to_order(order))
}

/// [`FrameEnhancer`] that runs a neural session per unit.
pub struct NeuralEnhancer {
    session: Box<dyn InferenceSession>,
    fallback: EnhanceParams,
    input_size: u32,
    fallback_frames: usize,
}

impl NeuralEnhancer {
    pub fn new(session: Box<dyn InferenceSession>, fallback: EnhanceParams) -> Self {
        Self {
            session,
            fallback,
            input_size: NEURAL_INPUT_SIZE,
            fallback_frames: 0,
        }
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(1);
        self
    }

    /// Run the model on one frame. Output has the frame's dimensions and
    /// channel order.
    pub fn enhance_tensor(&mut self, frame: &Frame) -> Result<Frame> {
        let input = preprocess(frame, self.input_size)?;
        let output = self.session.run(input)?;
        postprocess(
            &output,
            frame.width() as u32,
            frame.height() as u32,
            frame.order(),
        )
    }
}

impl FrameEnhancer for NeuralEnhancer {
    fn enhance(&mut self, frame: &Frame) -> Frame {
        match self.enhance_tensor(frame) {
            Ok(enhanced) => enhanced,
            Err(e) => {
                self.fallback_frames += 1;
                warn!("Neural enhancement failed, using classical for this frame: {e}");
                enhance(frame, &self.fallback)
            }
        }
    }

    fn method(&self) -> EnhancementMethod {
        EnhancementMethod::NeuralModel
    }

    fn fallback_count(&self) -> usize {
        self.fallback_frames
    }
}

/// Build the enhancer for a run: neural when a model is given and loads,
/// classical otherwise.
pub fn select_enhancer(
    model: Option<&Path>,
    loader: &dyn SessionLoader,
    params: &EnhanceParams,
    input_size: u32,
) -> Box<dyn FrameEnhancer> {
    use super::classical::ClassicalEnhancer;

    let Some(model) = model else {
        return Box::new(ClassicalEnhancer::new(params.clone()));
    };

    match loader.load(model) {
        Ok(session) => {
            info!("Loaded enhancement model {}", model.display());
            Box::new(NeuralEnhancer::new(session, params.clone()).with_input_size(input_size))
        }
        Err(e) => {
            warn!("Could not load model, using classical enhancement: {e}");
            Box::new(ClassicalEnhancer::as_fallback(params.clone()))
        }
    }
}
