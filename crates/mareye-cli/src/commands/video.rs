use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use mareye_core::enhance::neural::DefaultSessionLoader;
use mareye_core::pipeline::{enhance_video_reported, VideoJob};
use mareye_core::video::ffmpeg::FfmpegBackend;
use tracing::debug;

use super::{load_config, print_json};
use crate::progress::BarReporter;
use crate::summary::print_video_summary;

#[derive(Args)]
pub struct VideoArgs {
    /// Input video (anything ffmpeg can decode)
    pub input: PathBuf,

    /// Output video
    pub output: PathBuf,

    /// ONNX enhancement model; classical enhancement when omitted
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep the negotiated codec instead of converting to H.264
    #[arg(long)]
    pub no_transcode: bool,
}

pub fn run(args: &VideoArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.no_transcode {
        config.video.transcode = false;
    }

    let job = VideoJob {
        input: &args.input,
        output: &args.output,
        model: args.model.as_deref(),
    };
    let reporter = Arc::new(BarReporter::new());
    debug!(
        transcode = config.video.transcode,
        codecs = config.video.codecs.len(),
        "Starting video run"
    );

    let result = enhance_video_reported(
        &job,
        &config,
        &FfmpegBackend::default(),
        &DefaultSessionLoader,
        reporter.clone(),
        None,
    );
    reporter.finish();
    let report = result.with_context(|| format!("Failed to enhance {}", args.input.display()))?;

    print_video_summary(&report);
    print_json(&report)
}
