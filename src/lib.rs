//! Slidereel builds narrated slide videos incrementally.
//!
//! Each slide of a script pairs one page of a source document with narration text. A build
//! synthesizes the narration, holds the rasterized page for the length of the audio, encodes
//! one clip per slide and concatenates the clips in script order. Clips are cached by a
//! fingerprint of everything that affects their bytes, so rebuilding after an edit only
//! renders the slides that changed.
//!
//! - Describe the run with [`BuildInputs`] and [`BuildOpts`]
//! - Pick collaborators with [`Toolset`] (or [`Toolset::system`])
//! - Create a [`BuildSession`] and await [`BuildSession::build`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
pub(crate) mod build;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod encode;
pub(crate) mod pipeline;
pub(crate) mod raster;
pub(crate) mod script;
pub(crate) mod speech;
pub(crate) mod stage;

pub use crate::foundation::core::{DocumentIdentity, Stage};
pub use crate::foundation::error::{SlidereelError, SlidereelResult};
pub use crate::foundation::process::{is_ffmpeg_on_path, is_tool_on_path};

pub use crate::audio::decode::{AudioDecoder, FfmpegAudioDecoder, decode_audio_f32_stereo};
pub use crate::audio::narration::{PAUSE_MARKER, assemble, split_segments};
pub use crate::audio::pcm::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, read_wav, write_wav_f32};
pub use crate::build::result::{BuildResult, SlideFailure};
pub use crate::build::session::{BuildInputs, BuildSession, Toolset};
pub use crate::cache::fingerprint::{Fingerprint, fingerprint};
pub use crate::cache::store::{ArtifactCache, GcReport, parse_clip_name};
pub use crate::config::build::{BuildOpts, StagePoolOpts};
pub use crate::config::settings::{
    DEFAULT_RATE, DEFAULT_VOICE, MAX_IMAGE_DPI, Settings, SettingsOverrides, validate_rate,
};
pub use crate::encode::backend::{ClipConcatenator, ClipEncoder, ClipParams};
pub use crate::encode::ffmpeg::{FfmpegEncoder, ensure_parent_dir};
pub use crate::pipeline::slide::SlideState;
pub use crate::raster::backend::PageRasterizer;
pub use crate::raster::pdftoppm::Pdftoppm;
pub use crate::script::loader::{ScriptLoader, YamlScriptLoader};
pub use crate::script::model::{Script, SlideEntry};
pub use crate::speech::edge::EdgeTts;
pub use crate::speech::engine::SpeechEngine;
pub use crate::stage::pool::StagePool;
