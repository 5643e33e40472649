use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::enhance::classical::ClassicalEnhancer;
use crate::enhance::neural::{select_enhancer, DefaultSessionLoader, SessionLoader};
use crate::enhance::{EnhancementMethod, FrameEnhancer};
use crate::error::Result;
use crate::io::{load_frame, save_frame};
use crate::quality::{compute_metrics, Metrics};
use crate::video::driver::{run_video, RunOptions};
use crate::video::ffmpeg::FfmpegBackend;
use crate::video::transcode::make_browser_compatible;
use crate::video::VideoBackend;

use super::config::EnhanceConfig;
use super::fallback::ensure_improvement;
use super::report::{ImageReport, VideoReport};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// Input and output of one video run.
#[derive(Clone, Copy, Debug)]
pub struct VideoJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    /// Optional neural model; classical enhancement when `None`.
    pub model: Option<&'a Path>,
}

/// Enhance a still image and write the result to `output`.
pub fn enhance_image(
    input: &Path,
    output: &Path,
    model: Option<&Path>,
    config: &EnhanceConfig,
) -> Result<ImageReport> {
    enhance_image_with(input, output, model, config, &DefaultSessionLoader)
}

/// [`enhance_image`] with an explicit session loader.
pub fn enhance_image_with(
    input: &Path,
    output: &Path,
    model: Option<&Path>,
    config: &EnhanceConfig,
    loader: &dyn SessionLoader,
) -> Result<ImageReport> {
    let params = &config.image.params;
    let mut enhancer = select_enhancer(model, loader, params, config.neural.input_size);
    let first = run_image(input, output, enhancer.as_mut())?;

    if !config.image.quality_fallback || first.enhancement_method != EnhancementMethod::NeuralModel
    {
        return Ok(first);
    }

    let outcome = ensure_improvement(first, || {
        let mut classical = ClassicalEnhancer::as_fallback(params.clone());
        run_image(input, output, &mut classical)
    })?;
    let retried = outcome.retried();
    let mut report = outcome.result;
    report.quality_fallback_applied = retried;
    Ok(report)
}

fn run_image(input: &Path, output: &Path, enhancer: &mut dyn FrameEnhancer) -> Result<ImageReport> {
    let start = Instant::now();
    let original = load_frame(input)?;
    info!(
        width = original.width(),
        height = original.height(),
        method = %enhancer.method(),
        "Enhancing image"
    );

    let enhanced = enhancer.enhance(&original);
    save_frame(&enhanced, output)?;
    let frame_metrics = compute_metrics(&original, &enhanced)?;

    Ok(ImageReport {
        metrics: Metrics::from_frame(&frame_metrics, start.elapsed().as_secs_f64()),
        enhancement_method: enhancer.method(),
        neural_fallback_used: enhancer.fallback_count() > 0,
        quality_fallback_applied: false,
        output_path: output.to_path_buf(),
        width: enhanced.width() as u32,
        height: enhanced.height() as u32,
    })
}

/// Enhance a video with the `ffmpeg` backend.
pub fn enhance_video(
    input: &Path,
    output: &Path,
    model: Option<&Path>,
    config: &EnhanceConfig,
) -> Result<VideoReport> {
    let job = VideoJob {
        input,
        output,
        model,
    };
    enhance_video_reported(
        &job,
        config,
        &FfmpegBackend::default(),
        &DefaultSessionLoader,
        Arc::new(NoOpReporter),
        None,
    )
}

/// Enhance a video with explicit backend, loader, progress reporting and
/// cooperative cancellation.
pub fn enhance_video_reported(
    job: &VideoJob<'_>,
    config: &EnhanceConfig,
    backend: &dyn VideoBackend,
    loader: &dyn SessionLoader,
    reporter: Arc<dyn ProgressReporter>,
    cancel: Option<&AtomicBool>,
) -> Result<VideoReport> {
    let params = &config.video.params;
    let mut enhancer = select_enhancer(job.model, loader, params, config.neural.input_size);
    let first = run_video_once(job, config, backend, enhancer.as_mut(), reporter.as_ref(), cancel)?;

    if !config.video.quality_fallback || first.enhancement_method != EnhancementMethod::NeuralModel
    {
        return Ok(first);
    }

    let outcome = ensure_improvement(first, || {
        reporter.begin_stage(PipelineStage::QualityFallback, None);
        reporter.finish_stage();
        let mut classical = ClassicalEnhancer::as_fallback(params.clone());
        run_video_once(job, config, backend, &mut classical, reporter.as_ref(), cancel)
    })?;
    let retried = outcome.retried();
    let mut report = outcome.result;
    report.quality_fallback_applied = retried;
    Ok(report)
}

fn run_video_once(
    job: &VideoJob<'_>,
    config: &EnhanceConfig,
    backend: &dyn VideoBackend,
    enhancer: &mut dyn FrameEnhancer,
    reporter: &dyn ProgressReporter,
    cancel: Option<&AtomicBool>,
) -> Result<VideoReport> {
    reporter.begin_stage(PipelineStage::Loading, None);
    let mut source = backend.open_source(job.input)?;
    reporter.finish_stage();

    let options = RunOptions { reporter, cancel };
    let run = run_video(
        source.as_mut(),
        job.output,
        enhancer,
        backend,
        &config.video.codecs,
        &options,
    )?;
    drop(source);

    let (output_path, codec_used) = if config.video.transcode {
        reporter.begin_stage(PipelineStage::Transcoding, None);
        let converted = make_browser_compatible(backend, job.output, &run.codec_used);
        reporter.finish_stage();
        converted
    } else {
        (job.output.to_path_buf(), run.codec_used.clone())
    };
    let output_size = std::fs::metadata(&output_path)
        .map(|m| m.len())
        .unwrap_or(run.output_size);

    Ok(VideoReport {
        metrics: run.metrics,
        frames_processed: run.frame_count,
        fps: run.fps,
        duration: run.duration,
        codec_used,
        output_size,
        output_path,
        width: run.width,
        height: run.height,
        enhancement_method: enhancer.method(),
        neural_fallback_frames: enhancer.fallback_count(),
        quality_fallback_applied: false,
    })
}
