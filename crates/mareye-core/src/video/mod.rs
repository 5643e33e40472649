pub mod codec;
pub mod driver;
pub mod ffmpeg;
pub mod transcode;

use std::path::Path;

use crate::error::Result;
use crate::frame::{Frame, VideoInfo};

use self::codec::CodecCandidate;

/// Sequential frame decoder.
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame encoder writing one output file.
pub trait VideoSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the output.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Opens an encoder for one codec candidate.
pub trait SinkFactory {
    fn open_sink(
        &self,
        path: &Path,
        fps: u32,
        width: u32,
        height: u32,
        codec: &CodecCandidate,
    ) -> Result<Box<dyn VideoSink>>;
}

/// Everything a video run needs from the outside world.
pub trait VideoBackend: SinkFactory {
    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>>;

    /// Re-encode `input` as browser-playable H.264 into `output`.
    fn transcode_h264(&self, input: &Path, output: &Path) -> Result<()>;
}
