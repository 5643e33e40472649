use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::NEURAL_INPUT_SIZE;
use crate::enhance::classical::{EnhanceParams, Preset};
use crate::error::{MarEyeError, Result};
use crate::video::codec::{default_candidates, CodecCandidate};

/// Engine configuration, loadable from TOML. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    pub image: ImageConfig,
    pub video: VideoConfig,
    pub neural: NeuralConfig,
}

impl EnhanceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MarEyeError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MarEyeError::Config(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub params: EnhanceParams,
    /// Re-run classical enhancement when UIQM gets worse.
    pub quality_fallback: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            params: Preset::Image.params(),
            quality_fallback: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub params: EnhanceParams,
    /// Tried in order; the first one that opens is used.
    pub codecs: Vec<CodecCandidate>,
    /// Convert browser-incompatible output to H.264 after the run.
    pub transcode: bool,
    /// Re-run classical enhancement when mean UIQM gets worse.
    pub quality_fallback: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            params: Preset::Video.params(),
            codecs: default_candidates(),
            transcode: true,
            quality_fallback: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    /// Square side of the model input tensor.
    pub input_size: u32,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            input_size: NEURAL_INPUT_SIZE,
        }
    }
}
