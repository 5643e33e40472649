use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::enhance::FrameEnhancer;
use crate::error::{MarEyeError, Result};
use crate::pipeline::types::{NoOpReporter, PipelineStage, ProgressReporter};
use crate::quality::{compute_metrics, Metrics, MetricsAccumulator};

use super::codec::{open_writer, CodecCandidate};
use super::{SinkFactory, VideoSink, VideoSource};

/// Optional hooks for a video run.
pub struct RunOptions<'a> {
    pub reporter: &'a dyn ProgressReporter,
    /// Checked between frames; when set the run stops with `Cancelled`.
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for RunOptions<'_> {
    fn default() -> Self {
        Self {
            reporter: &NoOpReporter,
            cancel: None,
        }
    }
}

/// Mutable state of a run, updated once per frame.
#[derive(Debug)]
pub struct VideoRunState {
    pub frame_count: u64,
    pub metrics: MetricsAccumulator,
    pub codec: String,
    pub width: u32,
    pub height: u32,
}

impl VideoRunState {
    fn new(codec: String, width: u32, height: u32) -> Self {
        Self {
            frame_count: 0,
            metrics: MetricsAccumulator::default(),
            codec,
            width,
            height,
        }
    }
}

/// Result of a completed video run.
#[derive(Clone, Debug)]
pub struct VideoRun {
    /// Per-frame means; `processing_time` is total wall-clock.
    pub metrics: Metrics,
    pub frame_count: u64,
    pub fps: u32,
    /// `frame_count / fps`, 0 when the source reports no frame rate.
    pub duration: f64,
    pub codec_used: String,
    pub width: u32,
    pub height: u32,
    /// Size of the written file in bytes.
    pub output_size: u64,
}

/// Largest even dimensions not exceeding the input.
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width - width % 2, height - height % 2)
}

/// Decode, enhance, encode and measure every frame of `source`.
///
/// Frames are resized to the (even) output dimensions before enhancement,
/// and metrics compare the resized frame with its enhanced version. Any
/// read, write or metric failure aborts the run and removes the partial
/// output.
pub fn run_video<F: SinkFactory + ?Sized>(
    source: &mut dyn VideoSource,
    output: &Path,
    enhancer: &mut dyn FrameEnhancer,
    sinks: &F,
    codecs: &[CodecCandidate],
    options: &RunOptions<'_>,
) -> Result<VideoRun> {
    let start = Instant::now();
    let info = source.info().clone();
    let fps = if info.fps.is_finite() && info.fps > 0.0 {
        info.fps as u32
    } else {
        0
    };
    let (width, height) = even_dimensions(info.width, info.height);
    if width == 0 || height == 0 {
        return Err(MarEyeError::InvalidDimensions {
            width: info.width,
            height: info.height,
        });
    }
    info!(
        width = info.width,
        height = info.height,
        fps,
        output_width = width,
        output_height = height,
        "Processing video"
    );

    let (mut sink, codec) = open_writer(sinks, output, fps, width, height, codecs)?;
    let mut state = VideoRunState::new(codec, width, height);

    let total = info.frame_count.map(|n| n as usize);
    options.reporter.begin_stage(PipelineStage::Enhancing, total);
    let processed = process_frames(source, sink.as_mut(), enhancer, &mut state, options);
    options.reporter.finish_stage();

    if let Err(e) = processed {
        drop(sink);
        remove_partial(output);
        return Err(e);
    }
    if let Err(e) = sink.finish() {
        remove_partial(output);
        return Err(e);
    }

    if state.frame_count == 0 {
        remove_partial(output);
        return Err(MarEyeError::NoFramesProcessed);
    }

    let output_size = match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => meta.len(),
        _ => return Err(MarEyeError::OutputMissing(output.display().to_string())),
    };

    let elapsed = start.elapsed().as_secs_f64();
    let metrics = state
        .metrics
        .finish(elapsed)
        .ok_or(MarEyeError::NoFramesProcessed)?;
    let duration = if fps > 0 {
        state.frame_count as f64 / fps as f64
    } else {
        0.0
    };

    info!(
        frames = state.frame_count,
        seconds = elapsed,
        codec = %state.codec,
        "Video run complete"
    );

    Ok(VideoRun {
        metrics,
        frame_count: state.frame_count,
        fps,
        duration,
        codec_used: state.codec,
        width: state.width,
        height: state.height,
        output_size,
    })
}

fn process_frames(
    source: &mut dyn VideoSource,
    sink: &mut dyn VideoSink,
    enhancer: &mut dyn FrameEnhancer,
    state: &mut VideoRunState,
    options: &RunOptions<'_>,
) -> Result<()> {
    loop {
        if options
            .cancel
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            info!("Cancelled after {} frames", state.frame_count);
            return Err(MarEyeError::Cancelled);
        }

        let Some(frame) = source.read_frame()? else {
            return Ok(());
        };

        let frame = frame.resize(state.width, state.height)?;
        let enhanced = enhancer.enhance(&frame);
        sink.write_frame(&enhanced)?;

        let frame_metrics = compute_metrics(&frame, &enhanced)?;
        state.metrics.add(&frame_metrics);
        state.frame_count += 1;

        debug!(
            "Frame {}: psnr {:.2}, ssim {:.4}",
            state.frame_count, frame_metrics.psnr, frame_metrics.ssim
        );
        options.reporter.advance(state.frame_count as usize);
    }
}

fn remove_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            warn!("Could not remove partial output {}: {e}", output.display());
        }
    }
}
