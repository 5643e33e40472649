/// Processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Loading,
    Enhancing,
    Transcoding,
    QualityFallback,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading input"),
            Self::Enhancing => write!(f, "Enhancing"),
            Self::Transcoding => write!(f, "Transcoding to H.264"),
            Self::QualityFallback => write!(f, "Re-running classical enhancement"),
        }
    }
}

/// Thread-safe progress reporting for enhancement runs.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when the unreported entry points delegate.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
