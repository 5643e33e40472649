use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarEyeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Could not read/open input: {0}")]
    InputOpen(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Metric computation failed: {0}")]
    MetricComputation(String),

    #[error("Could not create output video with any codec (tried: {})", tried.join(", "))]
    OutputCodec { tried: Vec<String> },

    #[error("No frames were processed")]
    NoFramesProcessed,

    #[error("Output file was not created: {0}")]
    OutputMissing(String),

    #[error("Video error: {0}")]
    Video(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MarEyeError>;
