use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::MarEyeError;

use super::codec::is_browser_incompatible;
use super::VideoBackend;

/// Codec label reported after a successful transcode.
pub const H264_CODEC_NAME: &str = "H.264";

/// `<dir>/<stem>_h264.<ext>` next to `output`.
pub fn h264_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_h264.{}", ext.to_string_lossy()),
        None => format!("{stem}_h264"),
    };
    output.with_file_name(name)
}

/// Best-effort conversion of a browser-incompatible output to H.264.
///
/// Returns the final artifact path and codec label. On success the original
/// file is deleted; on failure it is kept and the codec label is unchanged.
pub fn make_browser_compatible(
    backend: &dyn VideoBackend,
    output: &Path,
    codec_used: &str,
) -> (PathBuf, String) {
    if !is_browser_incompatible(codec_used) {
        return (output.to_path_buf(), codec_used.to_string());
    }

    let target = h264_path(output);
    let produced = backend
        .transcode_h264(output, &target)
        .and_then(|()| match std::fs::metadata(&target) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(MarEyeError::Transcode(format!(
                "{} is missing or empty",
                target.display()
            ))),
        });

    match produced {
        Ok(()) => {
            if let Err(e) = std::fs::remove_file(output) {
                warn!("Could not remove {} after transcode: {e}", output.display());
            }
            info!("Transcoded to H.264: {}", target.display());
            (target, H264_CODEC_NAME.to_string())
        }
        Err(e) => {
            warn!("H.264 transcode failed, keeping {}: {e}", output.display());
            if target.exists() {
                if let Err(e) = std::fs::remove_file(&target) {
                    warn!("Could not remove {}: {e}", target.display());
                }
            }
            (output.to_path_buf(), codec_used.to_string())
        }
    }
}
