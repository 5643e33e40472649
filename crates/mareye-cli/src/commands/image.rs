use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mareye_core::pipeline::enhance_image;
use mareye_core::pipeline::report::DetailedReport;
use tracing::info;

use super::{load_config, print_json};
use crate::summary::print_image_summary;

#[derive(Args)]
pub struct ImageArgs {
    /// Input image (PNG, JPEG, TIFF, BMP)
    pub input: PathBuf,

    /// Output image; format follows the extension
    pub output: PathBuf,

    /// ONNX enhancement model; classical enhancement when omitted
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write a detailed analytics report (JSON) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn run(args: &ImageArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let report = enhance_image(&args.input, &args.output, args.model.as_deref(), &config)
        .with_context(|| format!("Failed to enhance {}", args.input.display()))?;

    if let Some(ref path) = args.report {
        let detailed = DetailedReport::new(&args.input, &report.output_path, report.metrics);
        std::fs::write(path, serde_json::to_string_pretty(&detailed)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Wrote report to {}", path.display());
    }

    print_image_summary(&report);
    print_json(&report)
}
