use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use futures::stream::{self, StreamExt as _};

use crate::audio::decode::{AudioDecoder, FfmpegAudioDecoder};
use crate::build::result::{BuildResult, SlideFailure};
use crate::cache::fingerprint::{Fingerprint, fingerprint};
use crate::cache::store::ArtifactCache;
use crate::config::build::BuildOpts;
use crate::encode::backend::{ClipConcatenator, ClipEncoder};
use crate::encode::ffmpeg::{FfmpegEncoder, ensure_parent_dir};
use crate::foundation::core::{DocumentIdentity, Stage};
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::pipeline::slide::SlidePipeline;
use crate::raster::backend::PageRasterizer;
use crate::raster::pdftoppm::Pdftoppm;
use crate::script::loader::{ScriptLoader, YamlScriptLoader};
use crate::script::model::{Script, SlideEntry};
use crate::speech::edge::EdgeTts;
use crate::speech::engine::SpeechEngine;
use crate::stage::pool::StagePool;

/// Filesystem locations for one build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildInputs {
    /// Source document (PDF) whose pages become slide images.
    pub document: PathBuf,
    /// Narration script.
    pub script: PathBuf,
    /// Output video path.
    pub output: PathBuf,
    /// Artifact cache directory; created on first use.
    pub cache_dir: PathBuf,
}

/// External collaborators used by a build.
#[derive(Clone)]
pub struct Toolset {
    /// Script parser.
    pub loader: Arc<dyn ScriptLoader>,
    /// Text-to-speech engine.
    pub speech: Arc<dyn SpeechEngine>,
    /// Decoder for synthesized speech files.
    pub decoder: Arc<dyn AudioDecoder>,
    /// Page rasterizer.
    pub rasterizer: Arc<dyn PageRasterizer>,
    /// Per-slide clip encoder.
    pub encoder: Arc<dyn ClipEncoder>,
    /// Final clip concatenator.
    pub concatenator: Arc<dyn ClipConcatenator>,
}

impl Toolset {
    /// Collaborators backed by `edge-tts`, `pdftoppm` and `ffmpeg` on `PATH`.
    pub fn system() -> Self {
        let ffmpeg = Arc::new(FfmpegEncoder::default());
        Self {
            loader: Arc::new(YamlScriptLoader),
            speech: Arc::new(EdgeTts::default()),
            decoder: Arc::new(FfmpegAudioDecoder),
            rasterizer: Arc::new(Pdftoppm::default()),
            encoder: ffmpeg.clone(),
            concatenator: ffmpeg,
        }
    }
}

impl Default for Toolset {
    fn default() -> Self {
        Self::system()
    }
}

#[derive(Clone, Debug)]
enum SlideOutcome {
    Cached(PathBuf),
    Generated(PathBuf),
    Failed(SlideFailure),
}

struct Prepared {
    script: Script,
    document: DocumentIdentity,
    cache: ArtifactCache,
    work_dir: tempfile::TempDir,
}

/// Incremental builder for one document/script pair.
///
/// A session owns the stage pools; [`BuildSession::build`] can run more than once, and a
/// second run with unchanged inputs serves every slide from the cache.
pub struct BuildSession {
    inputs: BuildInputs,
    tools: Toolset,
    opts: BuildOpts,
    pool: StagePool,
}

impl BuildSession {
    /// Validate `opts` and spin up the stage pools. Touches no files.
    pub fn new(inputs: BuildInputs, tools: Toolset, opts: BuildOpts) -> SlidereelResult<Self> {
        opts.validate()?;
        let pool = StagePool::new(&opts.pools)?;
        Ok(Self {
            inputs,
            tools,
            opts,
            pool,
        })
    }

    /// Paths this session builds from and into.
    pub fn inputs(&self) -> &BuildInputs {
        &self.inputs
    }

    /// Run one build.
    ///
    /// Never returns an error: fatal problems are reported through
    /// [`BuildResult::error_message`] with `success == false`.
    pub async fn build(&self) -> BuildResult {
        let prepared = match self.prepare() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("build aborted: {e}");
                return BuildResult {
                    error_message: Some(e.to_string()),
                    ..BuildResult::default()
                };
            }
        };

        let total_slides = prepared.script.slides.len();
        let outcomes = self.process_slides(&prepared).await;

        let mut clips = Vec::with_capacity(total_slides);
        let (mut cached_count, mut generated_count) = (0usize, 0usize);
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                SlideOutcome::Cached(path) => {
                    cached_count += 1;
                    clips.push(path);
                }
                SlideOutcome::Generated(path) => {
                    generated_count += 1;
                    clips.push(path);
                }
                SlideOutcome::Failed(failure) => failures.push(failure),
            }
        }
        let failed_slides = failures.iter().map(|f| f.index).collect();

        // Every slide pipeline has finished; nothing is writing into the cache anymore.
        let keep: HashSet<PathBuf> = clips.iter().cloned().collect();
        let gc_removed = match prepared.cache.garbage_collect(&keep) {
            Ok(report) => report.removed.len(),
            Err(e) => {
                tracing::warn!("cache garbage collection failed: {e}");
                0
            }
        };

        let assembled = if clips.is_empty() {
            Err(SlidereelError::assembly(
                "no clips were generated successfully",
            ))
        } else {
            self.concat(clips).await
        };

        let (success, output_path, error_message) = match assembled {
            Ok(()) => {
                tracing::info!(
                    output = %self.inputs.output.display(),
                    cached = cached_count,
                    generated = generated_count,
                    failed = failures.len(),
                    "build finished"
                );
                (true, Some(self.inputs.output.clone()), None)
            }
            Err(e) => {
                tracing::error!("build failed: {e}");
                (false, None, Some(e.to_string()))
            }
        };

        BuildResult {
            success,
            output_path,
            total_slides,
            cached_count,
            generated_count,
            failed_slides,
            failures,
            gc_removed,
            error_message,
        }
    }

    /// Validate inputs and parse the script. No file is created before this succeeds.
    fn prepare(&self) -> SlidereelResult<Prepared> {
        let inputs = &self.inputs;
        if !inputs.document.is_file() {
            return Err(SlidereelError::input(format!(
                "source document not found: '{}'",
                inputs.document.display()
            )));
        }
        if !inputs.script.is_file() {
            return Err(SlidereelError::input(format!(
                "script not found: '{}'",
                inputs.script.display()
            )));
        }

        let source = std::fs::read_to_string(&inputs.script).map_err(|e| {
            SlidereelError::input(format!(
                "failed to read script '{}': {e}",
                inputs.script.display()
            ))
        })?;
        let script = self.tools.loader.parse(&source)?;
        if script.slides.is_empty() {
            return Err(SlidereelError::input(format!(
                "script '{}' contains no slides",
                inputs.script.display()
            )));
        }
        script.validate()?;

        let document = DocumentIdentity::from_path(&inputs.document)?;

        let cache = ArtifactCache::open(&inputs.cache_dir)?;
        if self.opts.clean {
            cache.clear()?;
        }
        let work_dir = tempfile::Builder::new()
            .prefix("slidereel_work_")
            .tempdir()
            .context("failed to create working directory")?;

        Ok(Prepared {
            script,
            document,
            cache,
            work_dir,
        })
    }

    /// Process every slide and return one outcome per slide, in slide order.
    async fn process_slides(&self, prepared: &Prepared) -> Vec<SlideOutcome> {
        let slides = &prepared.script.slides;
        let settings = &prepared.script.settings;
        let fingerprints: Vec<Fingerprint> = slides
            .iter()
            .map(|s| fingerprint(s, settings, prepared.document))
            .collect();

        // Slides sharing a fingerprint share one artifact; only the first of them is rendered.
        let mut slot_of: HashMap<Fingerprint, usize> = HashMap::new();
        let mut leaders: Vec<usize> = Vec::new();
        let mut slots = Vec::with_capacity(slides.len());
        for (i, fp) in fingerprints.iter().enumerate() {
            let slot = *slot_of.entry(*fp).or_insert_with(|| {
                leaders.push(i);
                leaders.len() - 1
            });
            slots.push(slot);
        }

        let pipeline = SlidePipeline {
            document: &self.inputs.document,
            settings,
            work_dir: prepared.work_dir.path(),
            cache: &prepared.cache,
            tools: &self.tools,
            pool: &self.pool,
        };
        let total = slides.len();

        // `buffered` yields in input order no matter which pipeline finishes first.
        let led: Vec<SlideOutcome> = stream::iter(leaders.iter().copied())
            .map(|i| self.process_slide(&pipeline, &slides[i], fingerprints[i], total))
            .buffered(self.opts.slide_concurrency())
            .collect()
            .await;

        // A duplicate of a failed slide is retried as a cache miss; its success is shared with
        // the duplicates after it.
        let mut shared = led;
        let mut outcomes = Vec::with_capacity(total);
        for (slide, &slot) in slides.iter().zip(&slots) {
            let leader = leaders[slot];
            if leader == slide.index {
                outcomes.push(shared[slot].clone());
                continue;
            }
            let outcome = match follow(slide, &slides[leader], &shared[slot], total) {
                Some(outcome) => outcome,
                None => {
                    let retried = self
                        .process_slide(&pipeline, slide, fingerprints[slide.index], total)
                        .await;
                    if !matches!(retried, SlideOutcome::Failed(_)) {
                        shared[slot] = retried.clone();
                    }
                    retried
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn process_slide(
        &self,
        pipeline: &SlidePipeline<'_>,
        slide: &SlideEntry,
        fp: Fingerprint,
        total: usize,
    ) -> SlideOutcome {
        let n = slide.index + 1;
        let path = pipeline.cache.resolve_path(fp);
        if pipeline.cache.exists(&path) {
            tracing::info!("[{n}/{total}] page {}: cached ({fp})", slide.page);
            return SlideOutcome::Cached(path);
        }

        tracing::info!("[{n}/{total}] page {}: generating ({fp})", slide.page);
        match pipeline.run(slide, fp).await {
            Ok(path) => SlideOutcome::Generated(path),
            Err(failure) => {
                tracing::warn!(
                    "[{n}/{total}] page {}: failed while {}: {}",
                    slide.page,
                    failure.state,
                    failure.error
                );
                SlideOutcome::Failed(SlideFailure {
                    index: slide.index,
                    page: slide.page,
                    state: failure.state,
                    message: failure.error.to_string(),
                })
            }
        }
    }

    async fn concat(&self, clips: Vec<PathBuf>) -> SlidereelResult<()> {
        ensure_parent_dir(&self.inputs.output)?;
        tracing::info!(
            clips = clips.len(),
            output = %self.inputs.output.display(),
            "concatenating clips"
        );
        let concatenator = Arc::clone(&self.tools.concatenator);
        let output = self.inputs.output.clone();
        self.pool
            .run(Stage::Concat, move || concatenator.concat(&clips, &output))
            .await
            .map_err(|e| match e {
                SlidereelError::Assembly(_) => e,
                other => SlidereelError::assembly(other.to_string()),
            })
    }
}

/// Outcome of a slide whose fingerprint was already handled by `leader`.
///
/// Returns `None` when the leader failed and the slide has to run its own pipeline.
fn follow(
    slide: &SlideEntry,
    leader: &SlideEntry,
    outcome: &SlideOutcome,
    total: usize,
) -> Option<SlideOutcome> {
    match outcome {
        SlideOutcome::Cached(path) | SlideOutcome::Generated(path) => {
            tracing::info!(
                "[{}/{total}] page {}: cached (same clip as slide {})",
                slide.index + 1,
                slide.page,
                leader.index + 1
            );
            Some(SlideOutcome::Cached(path.clone()))
        }
        SlideOutcome::Failed(_) => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/session.rs"]
mod tests;
