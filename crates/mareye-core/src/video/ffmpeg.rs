//! Video I/O through the `ffmpeg` / `ffprobe` executables.
//!
//! Frames travel as raw `bgr24` over pipes, so the engine never links a
//! codec library.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{MarEyeError, Result};
use crate::frame::{ColorOrder, Frame, VideoInfo};

use super::codec::CodecCandidate;
use super::{SinkFactory, VideoBackend, VideoSink, VideoSource};

/// [`VideoBackend`] driving external `ffmpeg` and `ffprobe` processes.
#[derive(Debug)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    encoders: OnceLock<String>,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            encoders: OnceLock::new(),
        }
    }

    /// Read stream geometry and frame rate with `ffprobe`.
    pub fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| MarEyeError::InputOpen(format!("ffprobe failed to start: {e}")))?;

        if !output.status.success() {
            return Err(MarEyeError::InputOpen(format!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_probe(&String::from_utf8_lossy(&output.stdout))
    }

    fn has_encoder(&self, encoder: &str) -> bool {
        let listing = self.encoders.get_or_init(|| {
            Command::new(&self.ffmpeg)
                .args(["-hide_banner", "-encoders"])
                .stderr(Stdio::null())
                .output()
                .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
                .unwrap_or_default()
        });
        listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(encoder))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Parse `ffprobe -of json` output for the first video stream.
///
/// Dimensions are the coded ones; rotation metadata is ignored because the
/// decoder runs with autorotation off.
pub fn parse_probe(json: &str) -> Result<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| MarEyeError::InputOpen(format!("unreadable ffprobe output: {e}")))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| MarEyeError::InputOpen("no video stream".into()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MarEyeError::InputOpen("video stream has no dimensions".into())),
    };

    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    Ok(VideoInfo {
        width,
        height,
        fps,
        frame_count: stream.nb_frames.and_then(|n| n.parse().ok()),
    })
}

/// Parse `"num/den"` or a plain number. `None` for a zero denominator.
pub fn parse_frame_rate(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den != 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => s.parse().ok(),
    }
}

/// Drain a child's stderr on a thread so a chatty process never blocks on
/// a full pipe.
fn collect_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut buf) {
            debug!("stderr read failed: {e}");
        }
        String::from_utf8_lossy(&buf).trim().to_string()
    }))
}

fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn exit_message(process: &str, status: ExitStatus, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("{process} exited with {status}")
    } else {
        format!("{process} exited with {status}: {stderr}")
    }
}

struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    path: PathBuf,
    info: VideoInfo,
    frame_bytes: usize,
    frames_read: u64,
}

impl FfmpegSource {
    /// Stdout hit EOF: a clean end only if the decoder exited successfully.
    fn end_of_stream(&mut self) -> Result<()> {
        let status = self.child.wait()?;
        if status.success() {
            return Ok(());
        }
        let message = exit_message("decoder", status, &join_stderr(self.stderr.take()));
        if self.frames_read == 0 {
            Err(MarEyeError::InputOpen(format!(
                "{}: {message}",
                self.path.display()
            )))
        } else {
            Err(MarEyeError::Video(format!(
                "{message} after {} frames",
                self.frames_read
            )))
        }
    }
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut buf = vec![0u8; self.frame_bytes];
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(MarEyeError::Video(format!("frame read failed: {e}"))),
            }
        }

        if filled == 0 {
            return self.end_of_stream().map(|()| None);
        }
        if filled < buf.len() {
            return Err(MarEyeError::Video(format!(
                "truncated frame {}: {filled} of {} bytes",
                self.frames_read + 1,
                buf.len()
            )));
        }
        let frame = Frame::from_raw(self.info.width, self.info.height, buf, ColorOrder::Bgr)?;
        self.frames_read += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width as usize || frame.height() != self.height as usize {
            return Err(MarEyeError::Video(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MarEyeError::Video("encoder input already closed".into()))?;
        let bgr = frame.to_order(ColorOrder::Bgr);
        stdin
            .write_all(bgr.as_bytes())
            .map_err(|e| MarEyeError::Video(format!("frame write failed: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        drop(self.stdin.take());
        let status = self.child.wait()?;
        if status.success() {
            Ok(())
        } else {
            let stderr = join_stderr(self.stderr.take());
            Err(MarEyeError::Video(exit_message("encoder", status, &stderr)))
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl FfmpegBackend {
    /// Encoder reading raw `bgr24` frames from stdin; the caller appends
    /// any output options and the output path.
    fn encoder_command(&self, fps: u32, width: u32, height: u32, codec: &CodecCandidate) -> Command {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "bgr24"])
            .arg("-s")
            .arg(format!("{width}x{height}"))
            .arg("-framerate")
            .arg(fps.max(1).to_string())
            .args(["-i", "-", "-an", "-c:v"])
            .arg(&codec.encoder)
            .arg("-vtag")
            .arg(&codec.fourcc);
        command
    }

    /// Encode one black frame to `path` with the candidate's settings.
    ///
    /// ffmpeg only opens the muxer after its input delivers data, so this is
    /// the earliest point where a codec/container mismatch or an unwritable
    /// destination shows up.
    fn test_encode(
        &self,
        path: &Path,
        fps: u32,
        width: u32,
        height: u32,
        codec: &CodecCandidate,
    ) -> Result<()> {
        let mut child = self
            .encoder_command(fps, width, height, codec)
            .args(["-frames:v", "1"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MarEyeError::Video(format!("ffmpeg failed to start: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            let black = vec![0u8; width as usize * height as usize * COLOR_CHANNEL_COUNT];
            // A rejecting encoder may close its input early; its exit status decides.
            if let Err(e) = stdin.write_all(&black) {
                debug!("Test frame for {} not fully written: {e}", codec.encoder);
            }
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            return Ok(());
        }
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove {}: {e}", path.display());
            }
        }
        Err(MarEyeError::Video(exit_message(
            &format!("encoder {}", codec.encoder),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim(),
        )))
    }
}

impl SinkFactory for FfmpegBackend {
    fn open_sink(
        &self,
        path: &Path,
        fps: u32,
        width: u32,
        height: u32,
        codec: &CodecCandidate,
    ) -> Result<Box<dyn VideoSink>> {
        if !self.has_encoder(&codec.encoder) {
            return Err(MarEyeError::Video(format!(
                "encoder {} is not available",
                codec.encoder
            )));
        }
        self.test_encode(path, fps, width, height, codec)?;

        let mut child = self
            .encoder_command(fps, width, height, codec)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MarEyeError::Video(format!("ffmpeg failed to start: {e}")))?;

        debug!("Encoder {} ({}) started", codec.encoder, codec.fourcc);
        let stdin = child.stdin.take();
        let stderr = collect_stderr(&mut child);
        Ok(Box::new(FfmpegSink {
            child,
            stdin,
            stderr,
            width,
            height,
        }))
    }
}

impl VideoBackend for FfmpegBackend {
    /// Frames are decoded in coded orientation (`-noautorotate`) so their
    /// size always matches the probed width and height.
    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.is_file() {
            return Err(MarEyeError::InputOpen(path.display().to_string()));
        }
        let info = self.probe(path)?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-loglevel", "error", "-noautorotate", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "bgr24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MarEyeError::InputOpen(format!("ffmpeg failed to start: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MarEyeError::InputOpen("decoder has no output pipe".into()))?;
        let stderr = collect_stderr(&mut child);

        let frame_bytes = info.width as usize * info.height as usize * COLOR_CHANNEL_COUNT;
        Ok(Box::new(FfmpegSource {
            child,
            stdout,
            stderr,
            path: path.to_path_buf(),
            info,
            frame_bytes,
            frames_read: 0,
        }))
    }

    fn transcode_h264(&self, input: &Path, output: &Path) -> Result<()> {
        let status = Command::new(&self.ffmpeg)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| MarEyeError::Transcode(format!("ffmpeg failed to start: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(MarEyeError::Transcode(format!("ffmpeg exited with {status}")))
        }
    }
}
