use std::path::{Path, PathBuf};

use crate::config::settings::Settings;
use crate::foundation::error::SlidereelResult;

/// Codec parameters shared by every clip of one build.
///
/// All clips of a build use the same parameters, which is what lets the concatenator join them
/// with a stream copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipParams {
    /// Output frame rate.
    pub fps: u32,
    /// ffmpeg video codec name.
    pub video_codec: String,
    /// ffmpeg audio codec name.
    pub audio_codec: String,
}

impl ClipParams {
    /// Parameters derived from build settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fps: settings.video_fps,
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
        }
    }
}

/// Encodes a still image held for the duration of a narration track.
pub trait ClipEncoder: Send + Sync {
    /// Write an MP4 clip of `duration_sec` seconds to `out_path`.
    fn encode(
        &self,
        image: &Path,
        audio: &Path,
        duration_sec: f64,
        params: &ClipParams,
        out_path: &Path,
    ) -> SlidereelResult<()>;
}

/// Joins clips that share codec parameters into one video, in the given order.
pub trait ClipConcatenator: Send + Sync {
    /// Concatenate `clips` into `out_path`.
    fn concat(&self, clips: &[PathBuf], out_path: &Path) -> SlidereelResult<()>;
}
