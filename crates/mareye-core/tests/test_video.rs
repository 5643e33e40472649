mod common;

use std::sync::atomic::AtomicBool;

use approx::assert_relative_eq;
use tempfile::TempDir;

use mareye_core::enhance::classical::{ClassicalEnhancer, Preset};
use mareye_core::enhance::neural::NeuralEnhancer;
use mareye_core::enhance::FrameEnhancer;
use mareye_core::error::MarEyeError;
use mareye_core::frame::ColorOrder;
use mareye_core::pipeline::PipelineStage;
use mareye_core::quality::psnr::psnr_from_mse;
use mareye_core::video::codec::{default_candidates, is_browser_incompatible, open_writer, CodecCandidate};
use mareye_core::video::driver::{even_dimensions, run_video, RunOptions};
use mareye_core::video::ffmpeg::{parse_frame_rate, parse_probe};
use mareye_core::video::transcode::{h264_path, make_browser_compatible, H264_CODEC_NAME};

use common::{
    gradient_frame, noise_frame, video_info, FailingSession, MockBackend, MockSinkFactory,
    MockSource, PassThrough, RecordingReporter,
};

fn clip(frames: usize, width: u32, height: u32) -> Vec<mareye_core::frame::Frame> {
    (0..frames)
        .map(|i| noise_frame(width, height, i as u32 + 1).to_order(ColorOrder::Bgr))
        .collect()
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

#[test]
fn test_even_dimensions() {
    assert_eq!(even_dimensions(33, 21), (32, 20));
    assert_eq!(even_dimensions(64, 48), (64, 48));
    assert_eq!(even_dimensions(1, 1), (0, 0));
}

#[test]
fn test_run_video_odd_input_gives_even_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.mp4");
    let mut source = MockSource::new(clip(3, 33, 21), 29.97);
    let sinks = MockSinkFactory::default();
    let mut enhancer = ClassicalEnhancer::new(Preset::Video.params());

    let run = run_video(
        &mut source,
        &output,
        &mut enhancer,
        &sinks,
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!((run.width, run.height), (32, 20));
    assert_eq!(*sinks.opened_with.borrow(), Some((29, 32, 20)));
    assert_eq!(run.frame_count, 3);
    assert_eq!(run.fps, 29);
    assert_relative_eq!(run.duration, 3.0 / 29.0);
    assert_eq!(run.codec_used, "mp4v");
    assert_eq!(run.output_size, 3 * 32 * 20 * 3);
    assert_eq!(std::fs::metadata(&output).unwrap().len(), run.output_size);
}

#[test]
fn test_run_video_pass_through_metrics() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("same.mp4");
    let mut source = MockSource::new(clip(2, 16, 16), 25.0);

    let run = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(run.metrics.psnr(), psnr_from_mse(0.0));
    assert_relative_eq!(run.metrics.ssim(), 1.0, epsilon = 1e-9);
    assert_eq!(run.metrics.uiqm_improvement(), 0.0);
    assert!(run.metrics.processing_time() >= 0.0);
}

#[test]
fn test_run_video_zero_fps() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("nofps.mp4");
    let mut source = MockSource::new(clip(2, 16, 16), f64::NAN);

    let run = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(run.fps, 0);
    assert_eq!(run.duration, 0.0);
}

#[test]
fn test_run_video_no_frames() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("empty.mp4");
    let mut source = MockSource::with_info(Vec::new(), video_info(16, 16, 30.0, 0));

    let err = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, MarEyeError::NoFramesProcessed));
    assert!(!output.exists(), "empty output must be removed");
}

#[test]
fn test_run_video_one_pixel_input() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("tiny.mp4");
    let mut source = MockSource::new(clip(1, 1, 1), 30.0);

    let err = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, MarEyeError::InvalidDimensions { .. }));
    assert!(!output.exists());
}

#[test]
fn test_run_video_read_error_removes_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("broken.mp4");
    let mut source = MockSource::new(clip(4, 16, 16), 30.0).failing_at(2);

    let err = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, MarEyeError::Video(_)));
    assert!(!output.exists());
}

#[test]
fn test_run_video_cancelled() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cancelled.mp4");
    let mut source = MockSource::new(clip(4, 16, 16), 30.0);
    let cancel = AtomicBool::new(true);
    let options = RunOptions {
        cancel: Some(&cancel),
        ..RunOptions::default()
    };

    let err = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &options,
    )
    .unwrap_err();

    assert!(matches!(err, MarEyeError::Cancelled));
    assert!(!output.exists());
}

#[test]
fn test_run_video_failing_model_completes() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("fallback.mp4");
    let mut source = MockSource::new(clip(3, 16, 16), 30.0);
    let mut enhancer =
        NeuralEnhancer::new(Box::new(FailingSession), Preset::Video.params()).with_input_size(8);

    let run = run_video(
        &mut source,
        &output,
        &mut enhancer,
        &MockSinkFactory::default(),
        &default_candidates(),
        &RunOptions::default(),
    )
    .unwrap();

    assert_eq!(run.frame_count, 3);
    assert_eq!(enhancer.fallback_count(), 3);
    assert!(output.exists());
}

#[test]
fn test_run_video_reports_progress() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("progress.mp4");
    let mut source = MockSource::new(clip(5, 16, 16), 30.0);
    let reporter = RecordingReporter::default();
    let options = RunOptions {
        reporter: &reporter,
        cancel: None,
    };

    run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &MockSinkFactory::default(),
        &default_candidates(),
        &options,
    )
    .unwrap();

    assert_eq!(*reporter.stages.lock().unwrap(), vec![PipelineStage::Enhancing]);
    assert_eq!(*reporter.last_advance.lock().unwrap(), 5);
}

// ---------------------------------------------------------------------------
// Codec negotiation
// ---------------------------------------------------------------------------

#[test]
fn test_default_codec_order() {
    let names: Vec<String> = default_candidates().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["mp4v", "MJPG", "XVID"]);
}

#[test]
fn test_open_writer_skips_failing_codec() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.avi");
    let factory = MockSinkFactory::refusing(&["mp4v"]);

    let (_sink, codec) = open_writer(&factory, &path, 30, 16, 16, &default_candidates()).unwrap();
    assert_eq!(codec, "MJPG");
    assert_eq!(*factory.attempts.borrow(), vec!["mp4v", "MJPG"]);
}

#[test]
fn test_open_writer_exhausted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.mp4");
    let factory = MockSinkFactory {
        leave_partial: true,
        ..MockSinkFactory::refusing(&["mp4v", "MJPG", "XVID"])
    };

    let err = open_writer(&factory, &path, 30, 16, 16, &default_candidates())
        .err()
        .expect("every codec refused");
    match err {
        MarEyeError::OutputCodec { tried } => assert_eq!(tried, vec!["mp4v", "MJPG", "XVID"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists(), "partial output must be removed");
}

#[test]
fn test_run_video_codec_exhausted() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.mp4");
    let mut source = MockSource::new(clip(2, 16, 16), 30.0);
    let factory = MockSinkFactory::refusing(&["only"]);
    let codecs = vec![CodecCandidate::new("only", "only", "none")];

    let err = run_video(
        &mut source,
        &output,
        &mut PassThrough,
        &factory,
        &codecs,
        &RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MarEyeError::OutputCodec { .. }));
    assert!(!output.exists());
}

#[test]
fn test_browser_incompatible_codecs() {
    assert!(is_browser_incompatible("mp4v"));
    assert!(is_browser_incompatible("MPEG-4"));
    assert!(!is_browser_incompatible("MJPG"));
    assert!(!is_browser_incompatible(H264_CODEC_NAME));
}

// ---------------------------------------------------------------------------
// Transcode
// ---------------------------------------------------------------------------

#[test]
fn test_h264_path() {
    assert_eq!(
        h264_path(std::path::Path::new("/data/out/dive.mp4")),
        std::path::PathBuf::from("/data/out/dive_h264.mp4")
    );
    assert_eq!(
        h264_path(std::path::Path::new("clip")),
        std::path::PathBuf::from("clip_h264")
    );
}

#[test]
fn test_make_browser_compatible_success() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dive.mp4");
    std::fs::write(&output, b"encoded").unwrap();
    let backend = MockBackend::new(Vec::new(), 30.0);

    let (path, codec) = make_browser_compatible(&backend, &output, "mp4v");
    assert_eq!(path, dir.path().join("dive_h264.mp4"));
    assert_eq!(codec, "H.264");
    assert!(path.exists());
    assert!(!output.exists(), "original must be deleted after transcode");
}

#[test]
fn test_make_browser_compatible_failure_keeps_original() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dive.mp4");
    std::fs::write(&output, b"encoded").unwrap();
    let mut backend = MockBackend::new(Vec::new(), 30.0);
    backend.transcode_ok = false;

    let (path, codec) = make_browser_compatible(&backend, &output, "mp4v");
    assert_eq!(path, output);
    assert_eq!(codec, "mp4v");
    assert!(output.exists());
    assert!(!dir.path().join("dive_h264.mp4").exists());
}

#[test]
fn test_make_browser_compatible_skips_playable_codec() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dive.avi");
    std::fs::write(&output, b"encoded").unwrap();
    let backend = MockBackend::new(vec![gradient_frame(4, 4, ColorOrder::Bgr)], 30.0);

    let (path, codec) = make_browser_compatible(&backend, &output, "MJPG");
    assert_eq!(path, output);
    assert_eq!(codec, "MJPG");
}

// ---------------------------------------------------------------------------
// ffprobe parsing
// ---------------------------------------------------------------------------

#[test]
fn test_parse_frame_rate() {
    assert_relative_eq!(parse_frame_rate("30000/1001").unwrap(), 29.970_029_97, epsilon = 1e-6);
    assert_eq!(parse_frame_rate("25/1"), Some(25.0));
    assert_eq!(parse_frame_rate("24"), Some(24.0));
    assert_eq!(parse_frame_rate("0/0"), None);
    assert_eq!(parse_frame_rate("n/a"), None);
}

#[test]
fn test_parse_probe() {
    let json = r#"{
        "streams": [{
            "width": 1920,
            "height": 1081,
            "r_frame_rate": "30000/1001",
            "avg_frame_rate": "0/0",
            "nb_frames": "300"
        }]
    }"#;
    let info = parse_probe(json).unwrap();
    assert_eq!((info.width, info.height), (1920, 1081));
    assert_relative_eq!(info.fps, 30000.0 / 1001.0);
    assert_eq!(info.frame_count, Some(300));
}

#[test]
fn test_parse_probe_falls_back_to_average_rate() {
    let json = r#"{"streams": [{"width": 640, "height": 480, "r_frame_rate": "0/0", "avg_frame_rate": "25/1"}]}"#;
    let info = parse_probe(json).unwrap();
    assert_eq!(info.fps, 25.0);
    assert_eq!(info.frame_count, None);
}

#[test]
fn test_parse_probe_without_stream() {
    let err = parse_probe(r#"{"streams": []}"#).unwrap_err();
    assert!(matches!(err, MarEyeError::InputOpen(_)));
}

#[test]
fn test_parse_probe_keeps_coded_size_of_rotated_stream() {
    let json = r#"{
        "streams": [{
            "width": 1920,
            "height": 1080,
            "r_frame_rate": "30/1",
            "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]
        }]
    }"#;
    let info = parse_probe(json).unwrap();
    assert_eq!((info.width, info.height), (1920, 1080));
}

// ---------------------------------------------------------------------------
// ffmpeg backend (stand-in executables)
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod ffmpeg_backend {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use tempfile::TempDir;

    use mareye_core::error::MarEyeError;
    use mareye_core::video::codec::default_candidates;
    use mareye_core::video::driver::{run_video, RunOptions};
    use mareye_core::video::ffmpeg::FfmpegBackend;
    use mareye_core::video::{VideoBackend, VideoSource};

    use super::common::PassThrough;

    /// Writing an executable while another test forks can leave it busy, so
    /// these tests run one at a time.
    static SERIAL: Mutex<()> = Mutex::new(());

    /// 4x2 bgr24 frame.
    const FRAME_BYTES: usize = 24;

    const PROBE_JSON: &str =
        r#"{"streams":[{"width":4,"height":2,"r_frame_rate":"30/1","nb_frames":"3"}]}"#;

    const COPY_TO_OUTPUT: &str = r#"cat > "$last""#;

    struct FakeTools {
        dir: TempDir,
        backend: FfmpegBackend,
        input: PathBuf,
    }

    impl FakeTools {
        fn output(&self) -> PathBuf {
            self.dir.path().join("out.mp4")
        }
    }

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// `test_encode` handles the one-frame open check, `encode` the real
    /// output and `decode` the rawvideo stream on stdout.
    fn fake_tools(test_encode: &str, encode: &str, decode: &str) -> FakeTools {
        let dir = TempDir::new().unwrap();
        let ffmpeg = dir.path().join("ffmpeg");
        let ffprobe = dir.path().join("ffprobe");
        write_script(&ffprobe, &format!("printf '%s\\n' '{PROBE_JSON}'"));
        write_script(
            &ffmpeg,
            &format!(
                r#"for arg; do last="$arg"; done
case " $* " in
  *" -encoders "*)
    echo " V....D mpeg4                MPEG-4 part 2"
    echo " V....D mjpeg                MJPEG (Motion JPEG)"
    ;;
  *" -frames:v 1 "*)
    {test_encode}
    ;;
  *" -f rawvideo -pix_fmt bgr24 -s "*)
    {encode}
    ;;
  *" -noautorotate "*)
    {decode}
    ;;
  *)
    echo "decoder would autorotate" >&2
    exit 1
    ;;
esac"#
            ),
        );

        let input = dir.path().join("dive.mov");
        std::fs::write(&input, b"not really a video").unwrap();
        FakeTools {
            backend: FfmpegBackend::new(&ffmpeg, &ffprobe),
            dir,
            input,
        }
    }

    fn frames(count: usize) -> String {
        format!("head -c {} /dev/zero", count * FRAME_BYTES)
    }

    fn run(tools: &FakeTools) -> mareye_core::error::Result<mareye_core::video::driver::VideoRun> {
        let mut source = tools.backend.open_source(&tools.input)?;
        run_video(
            source.as_mut(),
            &tools.output(),
            &mut PassThrough,
            &tools.backend,
            &default_candidates(),
            &RunOptions::default(),
        )
    }

    #[test]
    fn test_full_run() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, &frames(3));

        let run = run(&tools).unwrap();
        assert_eq!(run.frame_count, 3);
        assert_eq!(run.fps, 30);
        assert_eq!(run.codec_used, "mp4v");
        assert_eq!(run.output_size, (3 * FRAME_BYTES) as u64);
    }

    #[test]
    fn test_decoder_runs_without_autorotation() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, &frames(1));

        let mut source = tools.backend.open_source(&tools.input).unwrap();
        let frame = source.read_frame().unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 2));
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_decoder_crash_is_an_error() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let decode = format!("{}\necho 'decode error in packet 7' >&2\nexit 1", frames(1));
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, &decode);

        let mut source = tools.backend.open_source(&tools.input).unwrap();
        assert!(source.read_frame().unwrap().is_some());
        match source.read_frame() {
            Err(MarEyeError::Video(message)) => {
                assert!(message.contains("decode error in packet 7"), "{message}");
            }
            other => panic!("expected a decoder failure, got {other:?}"),
        }
    }

    #[test]
    fn test_decoder_crash_aborts_run() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let decode = format!("{}\nexit 1", frames(1));
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, &decode);

        let err = run(&tools).unwrap_err();
        assert!(matches!(err, MarEyeError::Video(_)));
        assert!(!tools.output().exists());
    }

    #[test]
    fn test_undecodable_input() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let decode = "echo 'Invalid data found when processing input' >&2\nexit 1";
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, decode);

        let err = run(&tools).unwrap_err();
        match err {
            MarEyeError::InputOpen(message) => assert!(message.contains("Invalid data"), "{message}"),
            other => panic!("expected InputOpen, got {other:?}"),
        }
        assert!(!tools.output().exists());
    }

    #[test]
    fn test_truncated_final_frame() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let decode = format!("head -c {} /dev/zero", 2 * FRAME_BYTES + 10);
        let tools = fake_tools(COPY_TO_OUTPUT, COPY_TO_OUTPUT, &decode);

        let err = run(&tools).unwrap_err();
        match err {
            MarEyeError::Video(message) => assert!(message.contains("truncated"), "{message}"),
            other => panic!("expected a truncated frame, got {other:?}"),
        }
        assert!(!tools.output().exists());
    }

    #[test]
    fn test_encoder_exit_while_writing() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let encode = format!(r#"head -c {FRAME_BYTES} > "$last"
echo 'muxer write failed' >&2
exit 1"#);
        let tools = fake_tools(COPY_TO_OUTPUT, &encode, &frames(3));

        let err = run(&tools).unwrap_err();
        assert!(matches!(err, MarEyeError::Video(_)));
        assert!(!tools.output().exists());
    }

    #[test]
    fn test_rejected_codec_falls_through() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let test_encode = r#"case " $* " in
      *" -c:v mpeg4 "*) echo 'codec not currently supported in container' >&2; exit 1 ;;
    esac
    cat > "$last""#;
        let tools = fake_tools(test_encode, COPY_TO_OUTPUT, &frames(2));

        let run = run(&tools).unwrap();
        assert_eq!(run.codec_used, "MJPG");
        assert_eq!(run.frame_count, 2);
    }

    #[test]
    fn test_every_codec_rejected() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let test_encode = "echo 'Could not write header' >&2\n    exit 1";
        let tools = fake_tools(test_encode, COPY_TO_OUTPUT, &frames(2));

        let err = run(&tools).unwrap_err();
        match err {
            MarEyeError::OutputCodec { tried } => {
                assert_eq!(tried, vec!["mp4v", "MJPG", "XVID"]);
            }
            other => panic!("expected OutputCodec, got {other:?}"),
        }
        assert!(!tools.output().exists());
    }
}
