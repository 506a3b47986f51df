use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Default narration voice.
pub const DEFAULT_VOICE: &str = "ja-JP-NanamiNeural";
/// Default speech rate adjustment.
pub const DEFAULT_RATE: &str = "+0%";
/// Highest accepted rasterization DPI.
pub const MAX_IMAGE_DPI: u32 = 2400;

/// Rendering parameters shared by every slide of one build.
///
/// Constructed once from [`Settings::default`] overlaid with script-level overrides and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Settings {
    /// Speech voice identifier passed to the TTS engine.
    pub voice: String,
    /// Silence inserted between narration segments, in seconds.
    pub inline_pause: f64,
    /// Silence appended after each slide's narration, in seconds.
    pub slide_pause: f64,
    /// Output frame rate.
    pub video_fps: u32,
    /// Page rasterization resolution.
    pub image_dpi: u32,
    /// ffmpeg video codec name.
    pub video_codec: String,
    /// ffmpeg audio codec name.
    pub audio_codec: String,
    /// Speech rate adjustment, e.g. `+0%` or `-10%`.
    pub rate: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            inline_pause: 1.0,
            slide_pause: 0.0,
            video_fps: 24,
            image_dpi: 200,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            rate: DEFAULT_RATE.to_string(),
        }
    }
}

/// Optional settings supplied by a script's `global_settings` block.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct SettingsOverrides {
    /// Override for [`Settings::voice`].
    pub voice: Option<String>,
    /// Override for [`Settings::inline_pause`].
    #[serde(alias = "pause_duration")]
    pub inline_pause: Option<f64>,
    /// Override for [`Settings::slide_pause`].
    #[serde(alias = "transition_pause")]
    pub slide_pause: Option<f64>,
    /// Override for [`Settings::video_fps`].
    pub video_fps: Option<u32>,
    /// Override for [`Settings::image_dpi`].
    pub image_dpi: Option<u32>,
    /// Override for [`Settings::video_codec`].
    pub video_codec: Option<String>,
    /// Override for [`Settings::audio_codec`].
    pub audio_codec: Option<String>,
    /// Override for [`Settings::rate`].
    pub rate: Option<String>,
}

impl Settings {
    /// Return a copy of `self` with every present override applied.
    pub fn overlay(&self, o: &SettingsOverrides) -> Self {
        Self {
            voice: o.voice.clone().unwrap_or_else(|| self.voice.clone()),
            inline_pause: o.inline_pause.unwrap_or(self.inline_pause),
            slide_pause: o.slide_pause.unwrap_or(self.slide_pause),
            video_fps: o.video_fps.unwrap_or(self.video_fps),
            image_dpi: o.image_dpi.unwrap_or(self.image_dpi),
            video_codec: o
                .video_codec
                .clone()
                .unwrap_or_else(|| self.video_codec.clone()),
            audio_codec: o
                .audio_codec
                .clone()
                .unwrap_or_else(|| self.audio_codec.clone()),
            rate: o.rate.clone().unwrap_or_else(|| self.rate.clone()),
        }
    }

    /// Check that every field can be handed to the collaborators as-is.
    pub fn validate(&self) -> SlidereelResult<()> {
        if self.voice.trim().is_empty() {
            return Err(SlidereelError::validation("voice must be non-empty"));
        }
        validate_pause("inline_pause", self.inline_pause)?;
        validate_pause("slide_pause", self.slide_pause)?;
        if self.video_fps == 0 {
            return Err(SlidereelError::validation("video_fps must be >= 1"));
        }
        if self.image_dpi == 0 || self.image_dpi > MAX_IMAGE_DPI {
            return Err(SlidereelError::validation(format!(
                "image_dpi must be in 1..={MAX_IMAGE_DPI}, got {}",
                self.image_dpi
            )));
        }
        if self.video_codec.trim().is_empty() {
            return Err(SlidereelError::validation("video_codec must be non-empty"));
        }
        if self.audio_codec.trim().is_empty() {
            return Err(SlidereelError::validation("audio_codec must be non-empty"));
        }
        validate_rate(&self.rate)
    }
}

fn validate_pause(name: &str, v: f64) -> SlidereelResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(SlidereelError::validation(format!(
            "{name} must be finite and >= 0, got {v}"
        )));
    }
    Ok(())
}

/// Validate a speech rate of the form `[+-]<digits>%`.
pub fn validate_rate(rate: &str) -> SlidereelResult<()> {
    let digits = rate
        .strip_prefix(['+', '-'])
        .and_then(|r| r.strip_suffix('%'));
    match digits {
        Some(d) if !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(SlidereelError::validation(format!(
            "rate must look like '+0%' or '-10%', got '{rate}'"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
