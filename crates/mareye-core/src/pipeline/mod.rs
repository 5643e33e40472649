pub mod config;
pub mod fallback;
mod orchestrator;
pub mod report;
pub mod types;

pub use orchestrator::{
    enhance_image, enhance_image_with, enhance_video, enhance_video_reported, VideoJob,
};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter};
