use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use mareye_core::io::load_frame;
use mareye_core::pipeline::report::DetailedReport;
use mareye_core::quality::{compute_metrics, Metrics};

use super::print_json;
use crate::summary::print_metrics_summary;

#[derive(Args)]
pub struct MetricsArgs {
    /// Original image
    pub original: PathBuf,

    /// Enhanced image (same dimensions)
    pub enhanced: PathBuf,
}

pub fn run(args: &MetricsArgs) -> Result<()> {
    let start = Instant::now();
    let original = load_frame(&args.original)
        .with_context(|| format!("Failed to load {}", args.original.display()))?;
    let enhanced = load_frame(&args.enhanced)
        .with_context(|| format!("Failed to load {}", args.enhanced.display()))?;

    let frame_metrics = compute_metrics(&original, &enhanced)?;
    let metrics = Metrics::from_frame(&frame_metrics, start.elapsed().as_secs_f64());
    let report = DetailedReport::new(&args.original, &args.enhanced, metrics);

    print_metrics_summary(&report);
    print_json(&report)
}
