use console::{Style, Term};
use mareye_core::pipeline::report::{DetailedReport, ImageReport, VideoReport};
use mareye_core::quality::assessment::QualityAssessment;
use mareye_core::quality::Metrics;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

/// Human summaries go to stderr, and only for an interactive terminal, so
/// stdout stays a single JSON object.
fn interactive() -> bool {
    Term::stderr().is_term()
}

pub fn print_image_summary(report: &ImageReport) {
    if !interactive() {
        return;
    }
    let s = Styles::new();

    print_title(&s, "MarEye Image");
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(report.output_path.display())
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", report.width, report.height))
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(report.enhancement_method)
    );
    if report.neural_fallback_used {
        eprintln!(
            "  {:<14}{}",
            s.label.apply_to("Fallback"),
            s.disabled.apply_to("model failed, classical used")
        );
    }
    eprintln!();
    print_metrics_section(&s, &report.metrics);
}

pub fn print_video_summary(report: &VideoReport) {
    if !interactive() {
        return;
    }
    let s = Styles::new();

    print_title(&s, "MarEye Video");
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(report.output_path.display())
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} @ {} fps ({:.1}s)",
            report.frames_processed, report.fps, report.duration
        ))
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{}x{}", report.width, report.height))
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Codec"),
        s.method.apply_to(&report.codec_used)
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(report.enhancement_method)
    );
    if report.neural_fallback_frames > 0 {
        eprintln!(
            "  {:<14}{}",
            s.label.apply_to("Fallback"),
            s.disabled.apply_to(format!(
                "{} frame(s) used classical",
                report.neural_fallback_frames
            ))
        );
    }
    if report.quality_fallback_applied {
        eprintln!(
            "  {:<14}{}",
            s.label.apply_to("Re-run"),
            s.disabled.apply_to("quality dropped, classical output kept")
        );
    }
    eprintln!();
    print_metrics_section(&s, &report.metrics);
}

pub fn print_metrics_summary(report: &DetailedReport) {
    if !interactive() {
        return;
    }
    let s = Styles::new();

    print_title(&s, "MarEye Metrics");
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Original"),
        s.path.apply_to(report.original.display())
    );
    eprintln!(
        "  {:<14}{}",
        s.label.apply_to("Enhanced"),
        s.path.apply_to(report.enhanced.display())
    );
    eprintln!();
    print_metrics_section(&s, &report.metrics);
}

fn print_title(s: &Styles, title: &str) {
    eprintln!();
    eprintln!("  {}", s.title.apply_to(title));
    eprintln!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    eprintln!();
}

fn print_metrics_section(s: &Styles, metrics: &Metrics) {
    let grade = QualityAssessment::from_metrics(metrics);

    eprintln!("  {}", s.header.apply_to("Quality"));
    eprintln!(
        "    {:<14}{} {}",
        s.label.apply_to("PSNR"),
        s.value.apply_to(format!("{:.2} dB", metrics.psnr())),
        s.label.apply_to(grade.psnr)
    );
    eprintln!(
        "    {:<14}{} {}",
        s.label.apply_to("SSIM"),
        s.value.apply_to(format!("{:.4}", metrics.ssim())),
        s.label.apply_to(grade.ssim)
    );
    eprintln!(
        "    {:<14}{} -> {}",
        s.label.apply_to("UIQM"),
        s.value.apply_to(format!("{:.2}", metrics.uiqm_original())),
        s.value.apply_to(format!("{:.2}", metrics.uiqm_enhanced()))
    );
    eprintln!(
        "    {:<14}{} {}",
        s.label.apply_to("Improvement"),
        s.value.apply_to(format!("{:+.2}", metrics.uiqm_improvement())),
        s.method.apply_to(grade.uiqm)
    );
    eprintln!(
        "    {:<14}{}",
        s.label.apply_to("Time"),
        s.value.apply_to(format!("{:.2}s", metrics.processing_time()))
    );
    eprintln!("    {}", s.method.apply_to(grade.overall));
    eprintln!();
}
