use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::lab::{lab_to_rgb, rgb_to_lab};
use crate::consts::{
    DEFAULT_GAMMA, DEFAULT_HIGH_PASS_BLEND, DEFAULT_UNSHARP_AMOUNT, DEFAULT_UNSHARP_SIGMA,
    VIDEO_CLAHE_CLIP_LIMIT,
};
use crate::filters::bilateral::{bilateral_filter, BilateralParams};
use crate::filters::clahe::{clahe, ClaheParams};
use crate::filters::high_pass::high_pass_blend;
use crate::filters::levels::gamma_correct;
use crate::filters::unsharp_mask::unsharp_mask;
use crate::frame::Frame;

use super::{EnhancementMethod, FrameEnhancer};

/// Tunable parameters of the classical operator.
///
/// Missing optional stages (`denoise`, `gamma`) are skipped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhanceParams {
    #[serde(default)]
    pub clahe: ClaheParams,
    #[serde(default)]
    pub denoise: Option<BilateralParams>,
    #[serde(default)]
    pub sharpen: SharpenMethod,
    #[serde(default)]
    pub gamma: Option<f32>,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Preset::Image.params()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SharpenMethod {
    /// `x + amount * (x - gaussian_blur(x, sigma))`.
    UnsharpMask {
        sigma: f32,
        amount: f32,
        #[serde(default)]
        threshold: f32,
    },
    /// 3x3 high-pass kernel, blended with the input.
    HighPassBlend { blend: f32 },
}

impl Default for SharpenMethod {
    fn default() -> Self {
        Self::UnsharpMask {
            sigma: DEFAULT_UNSHARP_SIGMA,
            amount: DEFAULT_UNSHARP_AMOUNT,
            threshold: 0.0,
        }
    }
}

/// Named parameter sets for stills and video frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Image,
    Video,
}

impl Preset {
    pub fn params(self) -> EnhanceParams {
        match self {
            Self::Image => EnhanceParams {
                clahe: ClaheParams::default(),
                denoise: Some(BilateralParams::default()),
                sharpen: SharpenMethod::default(),
                gamma: Some(DEFAULT_GAMMA),
            },
            Self::Video => EnhanceParams {
                clahe: ClaheParams {
                    clip_limit: VIDEO_CLAHE_CLIP_LIMIT,
                    ..ClaheParams::default()
                },
                denoise: None,
                sharpen: SharpenMethod::HighPassBlend {
                    blend: DEFAULT_HIGH_PASS_BLEND,
                },
                gamma: None,
            },
        }
    }
}

/// Deterministic classical enhancement.
///
/// 1. L\*a\*b\* conversion, CLAHE on L only
/// 2. back to RGB
/// 3. optional bilateral denoise
/// 4. sharpening
/// 5. optional gamma LUT
///
/// Every stage quantizes to 8 bits, so equal inputs give byte-identical
/// outputs.
pub fn enhance(frame: &Frame, params: &EnhanceParams) -> Frame {
    let mut lab = rgb_to_lab(&frame.planes());
    lab.l = clahe(&lab.l, &params.clahe);
    let mut planes = lab_to_rgb(&lab).quantized();

    if let Some(bilateral) = &params.denoise {
        planes = bilateral_filter(&planes, bilateral).quantized();
    }

    planes = match &params.sharpen {
        SharpenMethod::UnsharpMask {
            sigma,
            amount,
            threshold,
        } => unsharp_mask(&planes, *sigma, *amount, *threshold),
        SharpenMethod::HighPassBlend { blend } => high_pass_blend(&planes, *blend),
    };

    let sharpened = planes.interleave(frame.order());
    match params.gamma {
        Some(gamma) => gamma_correct(&sharpened, gamma),
        None => sharpened,
    }
}

/// [`FrameEnhancer`] running the classical operator with fixed parameters.
#[derive(Clone, Debug)]
pub struct ClassicalEnhancer {
    params: EnhanceParams,
    method: EnhancementMethod,
}

impl ClassicalEnhancer {
    pub fn new(params: EnhanceParams) -> Self {
        debug!(?params, "Classical enhancer");
        Self {
            params,
            method: EnhancementMethod::Classical,
        }
    }

    /// Same operator, reported as a stand-in for the neural model.
    pub fn as_fallback(params: EnhanceParams) -> Self {
        Self {
            params,
            method: EnhancementMethod::ClassicalFallback,
        }
    }

    pub fn params(&self) -> &EnhanceParams {
        &self.params
    }
}

impl FrameEnhancer for ClassicalEnhancer {
    fn enhance(&mut self, frame: &Frame) -> Frame {
        enhance(frame, &self.params)
    }

    fn method(&self) -> EnhancementMethod {
        self.method
    }
}
