use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::enhance::EnhancementMethod;
use crate::quality::assessment::QualityAssessment;
use crate::quality::Metrics;

use super::fallback::Evaluated;

/// Result of enhancing one still image.
#[derive(Clone, Debug, Serialize)]
pub struct ImageReport {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub enhancement_method: EnhancementMethod,
    /// The neural model failed on this image and classical output was used.
    pub neural_fallback_used: bool,
    pub quality_fallback_applied: bool,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Result of enhancing one video.
#[derive(Clone, Debug, Serialize)]
pub struct VideoReport {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub frames_processed: u64,
    pub fps: u32,
    /// Seconds of output, `frames_processed / fps`.
    pub duration: f64,
    pub codec_used: String,
    /// Bytes of the final artifact.
    pub output_size: u64,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub enhancement_method: EnhancementMethod,
    pub neural_fallback_frames: usize,
    pub quality_fallback_applied: bool,
}

impl Evaluated for ImageReport {
    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn artifact(&self) -> Option<&Path> {
        Some(&self.output_path)
    }
}

impl Evaluated for VideoReport {
    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn artifact(&self) -> Option<&Path> {
        Some(&self.output_path)
    }
}

/// Analytics record for one processed artifact, written as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct DetailedReport {
    pub name: String,
    pub original: PathBuf,
    pub enhanced: PathBuf,
    pub metrics: Metrics,
    pub assessment: QualityAssessment,
}

impl DetailedReport {
    pub fn new(original: &Path, enhanced: &Path, metrics: Metrics) -> Self {
        let name = original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            original: original.to_path_buf(),
            enhanced: enhanced.to_path_buf(),
            assessment: QualityAssessment::from_metrics(&metrics),
            metrics,
        }
    }
}
