pub mod assessment;
pub mod laplacian;
pub mod psnr;
pub mod ssim;
pub mod uiqm;

use serde::Serialize;

use crate::color::luminance;
use crate::error::{MarEyeError, Result};
use crate::frame::Frame;

/// Metrics for a single (original, enhanced) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameMetrics {
    pub psnr: f64,
    pub ssim: f64,
    pub uiqm_original: f64,
    pub uiqm_enhanced: f64,
}

impl FrameMetrics {
    pub fn uiqm_improvement(&self) -> f64 {
        self.uiqm_enhanced - self.uiqm_original
    }
}

/// Final metrics of an enhancement run.
///
/// For video every field except `processing_time` is a mean over all
/// processed frames. `uiqm_improvement` is always derived from the two UIQM
/// fields, so it cannot disagree with them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Metrics {
    psnr: f64,
    ssim: f64,
    uiqm_original: f64,
    uiqm_enhanced: f64,
    uiqm_improvement: f64,
    /// Wall-clock seconds.
    processing_time: f64,
}

impl Metrics {
    pub fn new(
        psnr: f64,
        ssim: f64,
        uiqm_original: f64,
        uiqm_enhanced: f64,
        processing_time: f64,
    ) -> Self {
        Self {
            psnr,
            ssim: ssim.clamp(0.0, 1.0),
            uiqm_original,
            uiqm_enhanced,
            uiqm_improvement: uiqm_enhanced - uiqm_original,
            processing_time,
        }
    }

    pub fn from_frame(frame: &FrameMetrics, processing_time: f64) -> Self {
        Self::new(
            frame.psnr,
            frame.ssim,
            frame.uiqm_original,
            frame.uiqm_enhanced,
            processing_time,
        )
    }

    pub fn psnr(&self) -> f64 {
        self.psnr
    }

    pub fn ssim(&self) -> f64 {
        self.ssim
    }

    pub fn uiqm_original(&self) -> f64 {
        self.uiqm_original
    }

    pub fn uiqm_enhanced(&self) -> f64 {
        self.uiqm_enhanced
    }

    pub fn uiqm_improvement(&self) -> f64 {
        self.uiqm_improvement
    }

    pub fn processing_time(&self) -> f64 {
        self.processing_time
    }
}

/// Compute PSNR, SSIM and both UIQM scores for an (original, enhanced) pair.
///
/// PSNR and SSIM run on BT.601 grayscale. Frames must have equal dimensions.
pub fn compute_metrics(original: &Frame, enhanced: &Frame) -> Result<FrameMetrics> {
    if !original.same_dimensions(enhanced) {
        return Err(MarEyeError::MetricComputation(format!(
            "dimension mismatch: {}x{} vs {}x{}",
            original.width(),
            original.height(),
            enhanced.width(),
            enhanced.height()
        )));
    }

    let gray_original = luminance(original);
    let gray_enhanced = luminance(enhanced);

    Ok(FrameMetrics {
        psnr: psnr::psnr(&gray_original, &gray_enhanced),
        ssim: ssim::ssim(&gray_original, &gray_enhanced),
        uiqm_original: uiqm::uiqm(original),
        uiqm_enhanced: uiqm::uiqm(enhanced),
    })
}

/// Running sums of per-frame metrics, finalized into means.
#[derive(Clone, Debug, Default)]
pub struct MetricsAccumulator {
    count: u64,
    psnr: f64,
    ssim: f64,
    uiqm_original: f64,
    uiqm_enhanced: f64,
}

impl MetricsAccumulator {
    pub fn add(&mut self, frame: &FrameMetrics) {
        self.count += 1;
        self.psnr += frame.psnr;
        self.ssim += frame.ssim;
        self.uiqm_original += frame.uiqm_original;
        self.uiqm_enhanced += frame.uiqm_enhanced;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Means over all added frames, or `None` when nothing was added.
    pub fn finish(&self, processing_time: f64) -> Option<Metrics> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Metrics::new(
            self.psnr / n,
            self.ssim / n,
            self.uiqm_original / n,
            self.uiqm_enhanced / n,
            processing_time,
        ))
    }
}
