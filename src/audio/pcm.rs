use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Internal narration mixing sample rate.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Internal narration channel count.
pub const MIX_CHANNELS: u16 = 2;

#[derive(Clone, Debug, PartialEq)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Empty buffer in the given format.
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            interleaved_f32: Vec::new(),
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved_f32.len() / usize::from(self.channels)
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Append `secs` seconds of silence.
    pub fn push_silence(&mut self, secs: f64) {
        if !secs.is_finite() || secs <= 0.0 {
            return;
        }
        let frames = (secs * f64::from(self.sample_rate)).round() as usize;
        let len = self.interleaved_f32.len() + frames * usize::from(self.channels);
        self.interleaved_f32.resize(len, 0.0);
    }

    /// Append `other`, which must already share this buffer's format.
    pub fn append(&mut self, other: &AudioPcm) -> SlidereelResult<()> {
        if other.sample_rate != self.sample_rate || other.channels != self.channels {
            return Err(SlidereelError::validation(format!(
                "cannot append {}Hz/{}ch audio to {}Hz/{}ch buffer",
                other.sample_rate, other.channels, self.sample_rate, self.channels
            )));
        }
        self.interleaved_f32.extend_from_slice(&other.interleaved_f32);
        Ok(())
    }

    /// Convert to `sample_rate`/`channels` (linear interpolation, mono upmix, channel drop).
    pub fn conform(&self, sample_rate: u32, channels: u16) -> SlidereelResult<AudioPcm> {
        if self.sample_rate == 0 || self.channels == 0 || sample_rate == 0 || channels == 0 {
            return Err(SlidereelError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }
        if self.sample_rate == sample_rate && self.channels == channels {
            return Ok(self.clone());
        }

        let src_frames = self.frames();
        let src_ch = usize::from(self.channels);
        let dst_ch = usize::from(channels);
        let dst_frames = if self.sample_rate == sample_rate {
            src_frames
        } else {
            ((src_frames as u64 * u64::from(sample_rate)) / u64::from(self.sample_rate)) as usize
        };
        let step = f64::from(self.sample_rate) / f64::from(sample_rate);

        let mut out = Vec::with_capacity(dst_frames * dst_ch);
        for i in 0..dst_frames {
            let pos = i as f64 * step;
            let f0 = (pos.floor() as usize).min(src_frames.saturating_sub(1));
            let f1 = (f0 + 1).min(src_frames.saturating_sub(1));
            let frac = (pos - f0 as f64) as f32;
            for c in 0..dst_ch {
                let sc = if src_ch == 1 { 0 } else { c.min(src_ch - 1) };
                let v0 = self.interleaved_f32[f0 * src_ch + sc];
                let v1 = self.interleaved_f32[f1 * src_ch + sc];
                out.push(v0 + (v1 - v0) * frac);
            }
        }

        Ok(AudioPcm {
            sample_rate,
            channels,
            interleaved_f32: out,
        })
    }
}

/// Read a WAV file (integer or float samples) into interleaved `f32`.
pub fn read_wav(path: &Path) -> SlidereelResult<AudioPcm> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open wav '{}'", path.display()))?;
    let spec = reader.spec();
    let interleaved_f32 = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to read wav samples '{}'", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to read wav samples '{}'", path.display()))?
        }
    };
    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

/// Write `pcm` as a 32-bit float WAV file.
pub fn write_wav_f32(pcm: &AudioPcm, path: &Path) -> SlidereelResult<()> {
    let spec = hound::WavSpec {
        channels: pcm.channels,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create wav '{}'", path.display()))?;
    for &s in &pcm.interleaved_f32 {
        writer
            .write_sample(s)
            .with_context(|| format!("failed to write wav '{}'", path.display()))?;
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize wav '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
