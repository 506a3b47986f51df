#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use slidereel::{
    BuildInputs, ClipConcatenator, ClipEncoder, ClipParams, DocumentIdentity, FfmpegAudioDecoder,
    PageRasterizer, ScriptLoader, SlidereelError, SlidereelResult, SpeechEngine, Stage, Toolset,
    YamlScriptLoader, fingerprint,
};

/// Writes 0.1 s of 16 kHz mono tone per segment.
///
/// Text containing `FAIL` errors, `flaky` errors on its first call only, `slow` sleeps 300 ms and
/// `hang` sleeps 2 s before writing.
#[derive(Default)]
pub struct FakeTts {
    pub calls: Mutex<Vec<String>>,
}

impl SpeechEngine for FakeTts {
    fn synthesize(&self, text: &str, _voice: &str, _rate: &str, out: &Path) -> SlidereelResult<()> {
        let seen_before = {
            let mut calls = self.calls.lock().unwrap();
            let seen = calls.iter().any(|c| c == text);
            calls.push(text.to_owned());
            seen
        };
        if text.contains("flaky") && !seen_before {
            return Err(SlidereelError::stage(
                Stage::Synthesize,
                format!("service hiccup on '{text}'"),
            ));
        }
        if text.contains("FAIL") {
            return Err(SlidereelError::stage(
                Stage::Synthesize,
                format!("voice rejected text '{text}'"),
            ));
        }
        if text.contains("hang") {
            std::thread::sleep(Duration::from_secs(2));
        } else if text.contains("slow") {
            std::thread::sleep(Duration::from_millis(300));
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(out, spec).map_err(anyhow::Error::from)?;
        for i in 0..1_600u32 {
            let s = if i % 32 < 16 { 2000i16 } else { -2000 };
            w.write_sample(s).map_err(anyhow::Error::from)?;
        }
        w.finalize().map_err(anyhow::Error::from)?;
        Ok(())
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }
}

/// Writes an 8x8 PNG; pages listed in `missing` are out of range.
#[derive(Default)]
pub struct FakeRasterizer {
    pub missing: Vec<u32>,
}

impl PageRasterizer for FakeRasterizer {
    fn extract(&self, _doc: &Path, page: u32, _dpi: u32, out: &Path) -> SlidereelResult<()> {
        if self.missing.contains(&page) {
            return Err(SlidereelError::stage(
                Stage::Rasterize,
                format!("page {page} out of range"),
            ));
        }
        image::RgbaImage::from_pixel(8, 8, image::Rgba([20, 40, 60, 255]))
            .save(out)
            .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// Writes a marker clip and records the durations it was asked for.
#[derive(Default)]
pub struct FakeEncoder {
    pub durations: Mutex<Vec<f64>>,
}

impl ClipEncoder for FakeEncoder {
    fn encode(
        &self,
        image: &Path,
        audio: &Path,
        duration_sec: f64,
        params: &ClipParams,
        out: &Path,
    ) -> SlidereelResult<()> {
        if !image.is_file() || !audio.is_file() {
            return Err(SlidereelError::stage(Stage::Encode, "missing clip inputs"));
        }
        self.durations.lock().unwrap().push(duration_sec);
        std::fs::write(
            out,
            format!("{} {} {duration_sec:.3}", params.video_codec, params.fps),
        )
        .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// Records every clip list it receives and writes them, one per line, to the output.
#[derive(Default)]
pub struct FakeConcat {
    pub fail: bool,
    pub calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl ClipConcatenator for FakeConcat {
    fn concat(&self, clips: &[PathBuf], out: &Path) -> SlidereelResult<()> {
        self.calls.lock().unwrap().push(clips.to_vec());
        if self.fail {
            return Err(SlidereelError::stage(Stage::Concat, "streams differ"));
        }
        let body: Vec<String> = clips.iter().map(|c| c.display().to_string()).collect();
        std::fs::write(out, body.join("\n")).map_err(anyhow::Error::from)?;
        Ok(())
    }
}

pub struct Fakes {
    pub tts: Arc<FakeTts>,
    pub raster: Arc<FakeRasterizer>,
    pub encoder: Arc<FakeEncoder>,
    pub concat: Arc<FakeConcat>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self::with(FakeRasterizer::default(), FakeConcat::default())
    }
}

impl Fakes {
    pub fn with(raster: FakeRasterizer, concat: FakeConcat) -> Self {
        Self {
            tts: Arc::new(FakeTts::default()),
            raster: Arc::new(raster),
            encoder: Arc::new(FakeEncoder::default()),
            concat: Arc::new(concat),
        }
    }

    pub fn toolset(&self) -> Toolset {
        Toolset {
            loader: Arc::new(YamlScriptLoader),
            speech: self.tts.clone(),
            decoder: Arc::new(FfmpegAudioDecoder),
            rasterizer: self.raster.clone(),
            encoder: self.encoder.clone(),
            concatenator: self.concat.clone(),
        }
    }

    pub fn synth_calls(&self) -> usize {
        self.tts.calls.lock().unwrap().len()
    }

    pub fn concat_calls(&self) -> Vec<Vec<PathBuf>> {
        self.concat.calls.lock().unwrap().clone()
    }
}

/// A document/script pair in a temporary directory.
pub struct Project {
    pub dir: tempfile::TempDir,
    pub inputs: BuildInputs,
}

impl Project {
    pub fn new(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let inputs = BuildInputs {
            document: dir.path().join("deck.pdf"),
            script: dir.path().join("deck.yaml"),
            output: dir.path().join("out").join("deck.mp4"),
            cache_dir: dir.path().join("deck"),
        };
        std::fs::write(&inputs.document, b"%PDF-1.4\n% fake deck\n").unwrap();
        let project = Self { dir, inputs };
        project.write_script(script);
        project
    }

    pub fn write_script(&self, script: &str) {
        std::fs::write(&self.inputs.script, script).unwrap();
    }

    /// Cache paths the current script's slides map to, in slide order.
    pub fn expected_clips(&self) -> Vec<PathBuf> {
        let source = std::fs::read_to_string(&self.inputs.script).unwrap();
        let script = YamlScriptLoader.parse(&source).unwrap();
        let doc = DocumentIdentity::from_path(&self.inputs.document).unwrap();
        script
            .slides
            .iter()
            .map(|s| {
                let fp = fingerprint(s, &script.settings, doc);
                self.inputs.cache_dir.join(format!("clip_{fp}.mp4"))
            })
            .collect()
    }

    /// File names in the cache directory, sorted.
    pub fn cache_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.inputs.cache_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn script(slides: &[(u32, &str)]) -> String {
    let mut out = String::from("global_settings:\n  inline_pause: 0.2\n  slide_pause: 0.5\nslides:\n");
    for (page, text) in slides {
        out.push_str(&format!("  - page: {page}\n    text: \"{text}\"\n"));
    }
    out
}
