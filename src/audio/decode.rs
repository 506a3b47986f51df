use std::path::Path;

use crate::audio::pcm::{self, AudioPcm, MIX_CHANNELS};
use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Decodes a synthesized speech file into mixable PCM.
pub trait AudioDecoder: Send + Sync {
    /// Decode `path` to interleaved stereo `f32` at `sample_rate`.
    fn decode(&self, path: &Path, sample_rate: u32) -> SlidereelResult<AudioPcm>;
}

/// Default decoder: WAV in-process, anything else through the system `ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioDecoder;

impl AudioDecoder for FfmpegAudioDecoder {
    fn decode(&self, path: &Path, sample_rate: u32) -> SlidereelResult<AudioPcm> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav {
            return pcm::read_wav(path)?.conform(sample_rate, MIX_CHANNELS);
        }
        decode_audio_f32_stereo(path, sample_rate)
    }
}

/// Decode any ffmpeg-readable audio to stereo interleaved `f32` PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> SlidereelResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            SlidereelError::stage(Stage::Mix, format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(SlidereelError::stage(
            Stage::Mix,
            format!(
                "ffmpeg audio decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ));
    }
    if !out.stdout.len().is_multiple_of(4) {
        return Err(SlidereelError::stage(
            Stage::Mix,
            "decoded audio byte length is not a multiple of 4",
        ));
    }

    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
