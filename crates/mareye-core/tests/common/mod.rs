#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use ndarray::{Array3, Array4};

use mareye_core::error::{MarEyeError, Result};
use mareye_core::enhance::neural::{InferenceSession, SessionLoader};
use mareye_core::enhance::{EnhancementMethod, FrameEnhancer};
use mareye_core::frame::{ColorOrder, Frame, VideoInfo};
use mareye_core::pipeline::{PipelineStage, ProgressReporter};
use mareye_core::video::codec::CodecCandidate;
use mareye_core::video::{SinkFactory, VideoBackend, VideoSink, VideoSource};

// ---------------------------------------------------------------------------
// Frame builders
// ---------------------------------------------------------------------------

/// Every pixel set to the same gray level.
pub fn gray_frame(width: u32, height: u32, level: u8) -> Frame {
    Frame::filled(width, height, [level, level, level], ColorOrder::Rgb).unwrap()
}

/// Smooth diagonal color gradient with a bluish-green cast.
pub fn gradient_frame(width: u32, height: u32, order: ColorOrder) -> Frame {
    let (w, h) = (width as usize, height as usize);
    let idx = order.rgb_indices();
    let data = Array3::from_shape_fn((h, w, 3), |(y, x, c)| {
        let t = (x + y) as f32 / (w + h) as f32;
        let rgb = [
            20.0 + 60.0 * t,
            80.0 + 120.0 * t,
            100.0 + 100.0 * (1.0 - t),
        ];
        let color = idx.iter().position(|&i| i == c).unwrap();
        rgb[color] as u8
    });
    Frame::new(data, order).unwrap()
}

/// Deterministic pseudo-random texture (LCG), different per seed.
pub fn noise_frame(width: u32, height: u32, seed: u32) -> Frame {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let len = width as usize * height as usize * 3;
    let bytes = (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    Frame::from_raw(width, height, bytes, ColorOrder::Rgb).unwrap()
}

// ---------------------------------------------------------------------------
// Video mocks
// ---------------------------------------------------------------------------

pub fn video_info(width: u32, height: u32, fps: f64, frames: usize) -> VideoInfo {
    VideoInfo {
        width,
        height,
        fps,
        frame_count: Some(frames as u64),
    }
}

/// In-memory source. Optionally errors when asked for frame `fail_at`.
pub struct MockSource {
    info: VideoInfo,
    frames: Vec<Frame>,
    next: usize,
    fail_at: Option<usize>,
}

impl MockSource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width() as u32, f.height() as u32))
            .unwrap_or((16, 16));
        let info = video_info(width, height, fps, frames.len());
        Self {
            info,
            frames,
            next: 0,
            fail_at: None,
        }
    }

    pub fn with_info(frames: Vec<Frame>, info: VideoInfo) -> Self {
        Self {
            info,
            frames,
            next: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl VideoSource for MockSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_at == Some(self.next) {
            return Err(MarEyeError::Video("decoder failed".into()));
        }
        let frame = self.frames.get(self.next).cloned();
        self.next += 1;
        Ok(frame)
    }
}

/// Appends raw frame bytes to a file so the output exists and has a size.
pub struct MockSink {
    file: File,
    width: usize,
    height: usize,
}

impl VideoSink for MockSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(MarEyeError::Video(format!(
                "frame is {}x{}, sink expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        self.file.write_all(frame.as_bytes())?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Sink factory that refuses the listed codecs.
#[derive(Default)]
pub struct MockSinkFactory {
    pub failing: Vec<String>,
    /// Leave an empty file behind when a codec is refused.
    pub leave_partial: bool,
    pub attempts: RefCell<Vec<String>>,
    pub opened_with: RefCell<Option<(u32, u32, u32)>>,
}

impl MockSinkFactory {
    pub fn refusing(codecs: &[&str]) -> Self {
        Self {
            failing: codecs.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl SinkFactory for MockSinkFactory {
    fn open_sink(
        &self,
        path: &Path,
        fps: u32,
        width: u32,
        height: u32,
        codec: &CodecCandidate,
    ) -> Result<Box<dyn VideoSink>> {
        self.attempts.borrow_mut().push(codec.name.clone());
        if self.failing.contains(&codec.name) {
            if self.leave_partial {
                File::create(path)?;
            }
            return Err(MarEyeError::Video(format!("{} unavailable", codec.name)));
        }
        *self.opened_with.borrow_mut() = Some((fps, width, height));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(MockSink {
            file,
            width: width as usize,
            height: height as usize,
        }))
    }
}

/// Backend serving the same in-memory frames for every open.
pub struct MockBackend {
    pub frames: Vec<Frame>,
    pub fps: f64,
    pub sinks: MockSinkFactory,
    pub transcode_ok: bool,
    pub sources_opened: Cell<usize>,
}

impl MockBackend {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self {
            frames,
            fps,
            sinks: MockSinkFactory::default(),
            transcode_ok: true,
            sources_opened: Cell::new(0),
        }
    }
}

impl SinkFactory for MockBackend {
    fn open_sink(
        &self,
        path: &Path,
        fps: u32,
        width: u32,
        height: u32,
        codec: &CodecCandidate,
    ) -> Result<Box<dyn VideoSink>> {
        self.sinks.open_sink(path, fps, width, height, codec)
    }
}

impl VideoBackend for MockBackend {
    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.exists() {
            return Err(MarEyeError::InputOpen(path.display().to_string()));
        }
        self.sources_opened.set(self.sources_opened.get() + 1);
        Ok(Box::new(MockSource::new(self.frames.clone(), self.fps)))
    }

    fn transcode_h264(&self, input: &Path, output: &Path) -> Result<()> {
        if !self.transcode_ok {
            return Err(MarEyeError::Transcode("libx264 not available".into()));
        }
        std::fs::copy(input, output)?;
        Ok(())
    }
}

/// Records stage starts and the last advance count.
#[derive(Default)]
pub struct RecordingReporter {
    pub stages: Mutex<Vec<PipelineStage>>,
    pub last_advance: Mutex<usize>,
}

impl ProgressReporter for RecordingReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.lock().unwrap().push(stage);
    }

    fn advance(&self, items_done: usize) {
        *self.last_advance.lock().unwrap() = items_done;
    }
}

/// Returns every frame unchanged.
pub struct PassThrough;

impl FrameEnhancer for PassThrough {
    fn enhance(&mut self, frame: &Frame) -> Frame {
        frame.clone()
    }

    fn method(&self) -> EnhancementMethod {
        EnhancementMethod::Classical
    }
}

// ---------------------------------------------------------------------------
// Inference mocks
// ---------------------------------------------------------------------------

/// Always errors.
pub struct FailingSession;

impl InferenceSession for FailingSession {
    fn run(&mut self, _input: Array4<f32>) -> Result<Array4<f32>> {
        Err(MarEyeError::Inference("session crashed".into()))
    }
}

/// Returns its input unchanged.
pub struct IdentitySession;

impl InferenceSession for IdentitySession {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        Ok(input)
    }
}

/// Returns an all-black image of the input size.
pub struct DarkeningSession;

impl InferenceSession for DarkeningSession {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        Ok(Array4::zeros(input.dim()))
    }
}

/// Returns a single-channel tensor, which violates the output contract.
pub struct WrongShapeSession;

impl InferenceSession for WrongShapeSession {
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        let (n, _, h, w) = input.dim();
        Ok(Array4::zeros((n, 1, h, w)))
    }
}

/// Hands out a fresh session from `make` on every load.
pub struct MockLoader {
    make: fn() -> Box<dyn InferenceSession>,
}

impl MockLoader {
    pub fn new(make: fn() -> Box<dyn InferenceSession>) -> Self {
        Self { make }
    }
}

impl SessionLoader for MockLoader {
    fn load(&self, _model: &Path) -> Result<Box<dyn InferenceSession>> {
        Ok((self.make)())
    }
}

/// Every load fails, as for a corrupt model file.
pub struct FailingLoader;

impl SessionLoader for FailingLoader {
    fn load(&self, model: &Path) -> Result<Box<dyn InferenceSession>> {
        Err(MarEyeError::Inference(format!(
            "cannot parse {}",
            model.display()
        )))
    }
}
