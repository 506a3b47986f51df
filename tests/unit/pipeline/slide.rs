use super::*;

use std::sync::Mutex;

use crate::audio::decode::FfmpegAudioDecoder;
use crate::config::build::StagePoolOpts;
use crate::encode::backend::{ClipConcatenator, ClipEncoder};
use crate::raster::backend::PageRasterizer;
use crate::script::loader::YamlScriptLoader;
use crate::speech::engine::SpeechEngine;

/// Writes half a second of 24 kHz mono tone per segment.
#[derive(Default)]
struct ToneTts {
    calls: Mutex<Vec<(String, String, String)>>,
}

impl SpeechEngine for ToneTts {
    fn synthesize(&self, text: &str, voice: &str, rate: &str, out: &Path) -> SlidereelResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_owned(), voice.to_owned(), rate.to_owned()));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(out, spec).unwrap();
        for _ in 0..12_000 {
            w.write_sample(1000i16).unwrap();
        }
        w.finalize().unwrap();
        Ok(())
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }
}

struct PngPages {
    fail: bool,
}

impl PageRasterizer for PngPages {
    fn extract(&self, _doc: &Path, page: u32, _dpi: u32, out: &Path) -> SlidereelResult<()> {
        if self.fail {
            return Err(SlidereelError::stage(
                Stage::Rasterize,
                format!("page {page} out of range"),
            ));
        }
        image::RgbaImage::new(4, 4).save(out).unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct RecordingEncoder {
    durations: Mutex<Vec<f64>>,
}

impl ClipEncoder for RecordingEncoder {
    fn encode(
        &self,
        image: &Path,
        audio: &Path,
        duration_sec: f64,
        _params: &ClipParams,
        out: &Path,
    ) -> SlidereelResult<()> {
        assert!(image.is_file());
        assert!(audio.is_file());
        self.durations.lock().unwrap().push(duration_sec);
        std::fs::write(out, b"clip").unwrap();
        Ok(())
    }
}

struct NoConcat;

impl ClipConcatenator for NoConcat {
    fn concat(&self, _clips: &[PathBuf], _out: &Path) -> SlidereelResult<()> {
        unreachable!("slide pipeline never concatenates")
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    work: PathBuf,
    cache: ArtifactCache,
    settings: Settings,
    pool: StagePool,
    tts: Arc<ToneTts>,
    encoder: Arc<RecordingEncoder>,
    tools: Toolset,
}

fn fixture(raster_fails: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    std::fs::create_dir(&work).unwrap();
    let cache = ArtifactCache::open(dir.path().join("cache")).unwrap();
    let tts = Arc::new(ToneTts::default());
    let encoder = Arc::new(RecordingEncoder::default());
    let tools = Toolset {
        loader: Arc::new(YamlScriptLoader),
        speech: tts.clone(),
        decoder: Arc::new(FfmpegAudioDecoder),
        rasterizer: Arc::new(PngPages { fail: raster_fails }),
        encoder: encoder.clone(),
        concatenator: Arc::new(NoConcat),
    };
    let settings = Settings {
        inline_pause: 1.0,
        slide_pause: 0.25,
        ..Settings::default()
    };
    Fixture {
        _dir: dir,
        work,
        cache,
        settings,
        pool: StagePool::new(&StagePoolOpts::default()).unwrap(),
        tts,
        encoder,
        tools,
    }
}

impl Fixture {
    fn pipeline(&self) -> SlidePipeline<'_> {
        SlidePipeline {
            document: Path::new("deck.pdf"),
            settings: &self.settings,
            work_dir: &self.work,
            cache: &self.cache,
            tools: &self.tools,
            pool: &self.pool,
        }
    }

    fn work_is_empty(&self) -> bool {
        std::fs::read_dir(&self.work).unwrap().next().is_none()
    }
}

fn slide(text: &str) -> SlideEntry {
    SlideEntry {
        index: 0,
        page: 3,
        text: text.to_owned(),
        voice: Some("en-US-AriaNeural".to_owned()),
        rate: None,
        note: None,
    }
}

fn fp(n: u128) -> Fingerprint {
    Fingerprint::from_hex(&format!("{n:032x}")).unwrap()
}

#[tokio::test]
async fn renders_clip_into_cache_and_cleans_up() {
    let fx = fixture(false);
    let path = fx
        .pipeline()
        .run(&slide("Hello. [pause] World."), fp(7))
        .await
        .unwrap();

    assert_eq!(path, fx.cache.resolve_path(fp(7)));
    assert!(path.is_file());
    assert!(!fx.cache.partial_path(fp(7)).exists());
    assert!(fx.work_is_empty());

    let calls = fx.tts.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            ("Hello.".to_owned(), "en-US-AriaNeural".to_owned(), "+0%".to_owned()),
            ("World.".to_owned(), "en-US-AriaNeural".to_owned(), "+0%".to_owned()),
        ]
    );

    // 0.5 + 1.0 pause + 0.5 + 0.25 trailing
    let durations = fx.encoder.durations.lock().unwrap().clone();
    assert_eq!(durations.len(), 1);
    assert!((durations[0] - 2.25).abs() < 1e-3);
}

#[tokio::test]
async fn blank_narration_fails_before_synthesis() {
    let fx = fixture(false);
    let failure = fx
        .pipeline()
        .run(&slide("  [pause]  [pause] "), fp(1))
        .await
        .unwrap_err();

    assert_eq!(failure.state, SlideState::SynthesizingAudio);
    assert_eq!(failure.error.failed_stage(), Some(Stage::Synthesize));
    assert!(fx.tts.calls.lock().unwrap().is_empty());
    assert!(!fx.cache.resolve_path(fp(1)).exists());
}

#[tokio::test]
async fn invalid_slide_fails_while_pending() {
    let fx = fixture(false);
    let bad = SlideEntry {
        rate: Some("fast".to_owned()),
        ..slide("Hi")
    };
    let failure = fx.pipeline().run(&bad, fp(3)).await.unwrap_err();

    assert_eq!(failure.state, SlideState::Pending);
    assert!(matches!(failure.error, SlidereelError::Validation(_)));
    assert!(fx.tts.calls.lock().unwrap().is_empty());
    assert!(fx.work_is_empty());
}

#[tokio::test]
async fn raster_failure_leaves_no_intermediates() {
    let fx = fixture(true);
    let failure = fx.pipeline().run(&slide("Hi"), fp(2)).await.unwrap_err();

    assert_eq!(failure.state, SlideState::RenderingClip);
    assert!(failure.error.to_string().contains("page 3 out of range"));
    assert!(fx.work_is_empty());
    assert!(!fx.cache.resolve_path(fp(2)).exists());
    assert!(!fx.cache.partial_path(fp(2)).exists());
    assert!(fx.encoder.durations.lock().unwrap().is_empty());
}

#[test]
fn state_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&SlideState::SynthesizingAudio).unwrap(),
        "\"synthesizing_audio\""
    );
    assert_eq!(SlideState::RenderingClip.to_string(), "rendering_clip");
}
