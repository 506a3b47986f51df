use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::narration::{assemble, split_segments};
use crate::audio::pcm::{MIX_SAMPLE_RATE, write_wav_f32};
use crate::build::session::Toolset;
use crate::cache::fingerprint::Fingerprint;
use crate::cache::store::ArtifactCache;
use crate::config::settings::Settings;
use crate::encode::backend::ClipParams;
use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::pipeline::temp::TempArtifact;
use crate::script::model::SlideEntry;
use crate::stage::pool::StagePool;

/// Progress of one slide through its pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideState {
    /// Not started.
    Pending,
    /// Synthesizing narration segments and assembling the slide's audio track.
    SynthesizingAudio,
    /// Rasterizing the page and encoding the clip.
    RenderingClip,
    /// Clip stored in the cache.
    Done,
    /// Stopped by an error.
    Failed,
}

impl SlideState {
    /// Label used in logs and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SynthesizingAudio => "synthesizing_audio",
            Self::RenderingClip => "rendering_clip",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SlideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error that stopped a slide, with the state it was in at the time.
#[derive(Debug)]
pub(crate) struct PipelineFailure {
    pub(crate) state: SlideState,
    pub(crate) error: SlidereelError,
}

struct Narration {
    wav: TempArtifact,
    duration_sec: f64,
}

/// Renders one slide into its cache artifact.
///
/// Everything a slide writes besides the clip goes into `work_dir` and is owned by a
/// [`TempArtifact`]; the clip itself is encoded to the cache's partial path and only moved onto
/// the final path after the encoder succeeds.
pub(crate) struct SlidePipeline<'a> {
    pub(crate) document: &'a Path,
    pub(crate) settings: &'a Settings,
    pub(crate) work_dir: &'a Path,
    pub(crate) cache: &'a ArtifactCache,
    pub(crate) tools: &'a Toolset,
    pub(crate) pool: &'a StagePool,
}

impl SlidePipeline<'_> {
    /// Run `slide` from `Pending` to `Done`, returning the cached clip path.
    pub(crate) async fn run(
        &self,
        slide: &SlideEntry,
        fp: Fingerprint,
    ) -> Result<PathBuf, PipelineFailure> {
        let mut state = SlideState::Pending;
        slide.validate().map_err(|e| fail(slide, state, e))?;

        advance(slide, &mut state, SlideState::SynthesizingAudio);
        let narration = self
            .synthesize_audio(slide, fp)
            .await
            .map_err(|e| fail(slide, state, e))?;

        advance(slide, &mut state, SlideState::RenderingClip);
        let clip = self
            .render_clip(slide, fp, &narration)
            .await
            .map_err(|e| fail(slide, state, e))?;

        advance(slide, &mut state, SlideState::Done);
        Ok(clip)
    }

    async fn synthesize_audio(
        &self,
        slide: &SlideEntry,
        fp: Fingerprint,
    ) -> SlidereelResult<Narration> {
        let segments = split_segments(&slide.text);
        if segments.is_empty() {
            return Err(SlidereelError::stage(
                Stage::Synthesize,
                "narration has no text to synthesize",
            ));
        }

        let voice = slide.effective_voice(self.settings).to_owned();
        let rate = slide.effective_rate(self.settings).to_owned();
        let ext = self.tools.speech.output_extension();

        let mut segment_files = Vec::with_capacity(segments.len());
        for (i, text) in segments.into_iter().enumerate() {
            let guard = TempArtifact::new(self.work_dir.join(format!("{fp}_seg{i:03}.{ext}")));
            let out = guard.path().to_path_buf();
            segment_files.push(guard);

            let engine = Arc::clone(&self.tools.speech);
            let (text, voice, rate) = (text.to_owned(), voice.clone(), rate.clone());
            self.pool
                .run(Stage::Synthesize, move || {
                    engine.synthesize(&text, &voice, &rate, &out)
                })
                .await?;
        }

        let wav = TempArtifact::new(self.work_dir.join(format!("{fp}_narration.wav")));
        let wav_path = wav.path().to_path_buf();
        let inputs: Vec<PathBuf> = segment_files
            .iter()
            .map(|g| g.path().to_path_buf())
            .collect();
        let decoder = Arc::clone(&self.tools.decoder);
        let (inline_pause, slide_pause) = (self.settings.inline_pause, self.settings.slide_pause);

        let duration_sec = self
            .pool
            .run(Stage::Mix, move || {
                let decoded = inputs
                    .iter()
                    .map(|p| decoder.decode(p, MIX_SAMPLE_RATE))
                    .collect::<SlidereelResult<Vec<_>>>()?;
                let track = assemble(&decoded, inline_pause, slide_pause)?;
                write_wav_f32(&track, &wav_path)?;
                Ok(track.duration_sec())
            })
            .await?;

        Ok(Narration { wav, duration_sec })
    }

    async fn render_clip(
        &self,
        slide: &SlideEntry,
        fp: Fingerprint,
        narration: &Narration,
    ) -> SlidereelResult<PathBuf> {
        let image = TempArtifact::new(self.work_dir.join(format!("{fp}_page.png")));
        let image_path = image.path().to_path_buf();
        let rasterizer = Arc::clone(&self.tools.rasterizer);
        let document = self.document.to_path_buf();
        let (page, dpi) = (slide.page, self.settings.image_dpi);
        {
            let image_path = image_path.clone();
            self.pool
                .run(Stage::Rasterize, move || {
                    rasterizer.extract(&document, page, dpi, &image_path)
                })
                .await?;
        }

        let partial = TempArtifact::new(self.cache.partial_path(fp));
        let partial_path = partial.path().to_path_buf();
        let audio_path = narration.wav.path().to_path_buf();
        let duration_sec = narration.duration_sec;
        let encoder = Arc::clone(&self.tools.encoder);
        let params = ClipParams::from_settings(self.settings);
        self.pool
            .run(Stage::Encode, move || {
                encoder.encode(&image_path, &audio_path, duration_sec, &params, &partial_path)
            })
            .await?;

        let dest = self.cache.resolve_path(fp);
        partial.persist(&dest)?;
        Ok(dest)
    }
}

fn advance(slide: &SlideEntry, state: &mut SlideState, next: SlideState) {
    tracing::debug!(slide = slide.index, page = slide.page, from = %state, to = %next, "slide state");
    *state = next;
}

fn fail(slide: &SlideEntry, state: SlideState, error: SlidereelError) -> PipelineFailure {
    tracing::debug!(
        slide = slide.index,
        page = slide.page,
        from = %state,
        to = %SlideState::Failed,
        "slide state"
    );
    PipelineFailure { state, error }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/slide.rs"]
mod tests;
