use std::path::Path;

use image::ImageFormat;

use crate::error::{MarEyeError, Result};
use crate::frame::Frame;

/// Load an image file as an 8-bit RGB frame.
///
/// A missing or undecodable file is an [`MarEyeError::InputOpen`].
pub fn load_frame(path: &Path) -> Result<Frame> {
    if !path.is_file() {
        return Err(MarEyeError::InputOpen(path.display().to_string()));
    }
    let img = image::open(path)
        .map_err(|e| MarEyeError::InputOpen(format!("{}: {e}", path.display())))?;
    Frame::from_rgb_image(&img.to_rgb8())
}

/// Save a frame, choosing the format from the file extension (PNG when the
/// extension is missing or unknown).
pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    frame.to_rgb_image()?.save_with_format(path, format)?;
    Ok(())
}
