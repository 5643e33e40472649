pub mod classical;
pub mod neural;
#[cfg(feature = "onnx")]
pub mod onnx;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Which operator produced an enhanced artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementMethod {
    Classical,
    NeuralModel,
    /// Classical output used in place of the neural model, either because the
    /// model could not be loaded or because the quality fallback replaced it.
    ClassicalFallback,
}

impl std::fmt::Display for EnhancementMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classical => write!(f, "classical"),
            Self::NeuralModel => write!(f, "neural_model"),
            Self::ClassicalFallback => write!(f, "classical_fallback"),
        }
    }
}

/// A per-unit enhancement operator (one image or one video frame).
///
/// Implementations never fail: any internal error must be recovered before
/// returning, so a run always yields a frame of the input's dimensions.
pub trait FrameEnhancer {
    fn enhance(&mut self, frame: &Frame) -> Frame;

    fn method(&self) -> EnhancementMethod;

    /// Number of units for which a fallback operator had to be used.
    fn fallback_count(&self) -> usize {
        0
    }
}
