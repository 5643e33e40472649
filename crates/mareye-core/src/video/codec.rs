use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MarEyeError, Result};

use super::{SinkFactory, VideoSink};

/// One entry of the ordered codec preference list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecCandidate {
    /// Label reported as `codec_used`.
    pub name: String,
    /// Four-character code written into the container.
    pub fourcc: String,
    /// Encoder used to produce the stream.
    pub encoder: String,
}

impl CodecCandidate {
    pub fn new(name: &str, fourcc: &str, encoder: &str) -> Self {
        Self {
            name: name.to_string(),
            fourcc: fourcc.to_string(),
            encoder: encoder.to_string(),
        }
    }
}

/// mp4v, then MJPG, then XVID.
pub fn default_candidates() -> Vec<CodecCandidate> {
    vec![
        CodecCandidate::new("mp4v", "mp4v", "mpeg4"),
        CodecCandidate::new("MJPG", "MJPG", "mjpeg"),
        CodecCandidate::new("XVID", "XVID", "libxvid"),
    ]
}

/// Codecs browsers cannot play back inline.
pub fn is_browser_incompatible(codec: &str) -> bool {
    matches!(codec, "mp4v" | "MPEG-4")
}

/// Open the first candidate that works. Returns the sink and the codec name.
///
/// When every candidate fails, any partially created file at `path` is
/// removed and [`MarEyeError::OutputCodec`] lists what was tried.
pub fn open_writer<F: SinkFactory + ?Sized>(
    factory: &F,
    path: &Path,
    fps: u32,
    width: u32,
    height: u32,
    candidates: &[CodecCandidate],
) -> Result<(Box<dyn VideoSink>, String)> {
    let mut tried = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match factory.open_sink(path, fps, width, height, candidate) {
            Ok(sink) => {
                info!("Opened output {} with codec {}", path.display(), candidate.name);
                return Ok((sink, candidate.name.clone()));
            }
            Err(e) => {
                debug!("Codec {} failed: {e}", candidate.name);
                tried.push(candidate.name.clone());
            }
        }
    }

    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {}: {e}", path.display());
        }
    }
    Err(MarEyeError::OutputCodec { tried })
}
