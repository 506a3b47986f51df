use crate::audio::pcm::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE};
use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Inline marker that splits narration into separately synthesized segments.
pub const PAUSE_MARKER: &str = "[pause]";

/// Split narration on [`PAUSE_MARKER`], dropping segments that are empty after trimming.
pub fn split_segments(text: &str) -> Vec<&str> {
    text.split(PAUSE_MARKER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lay segments out in order with `inline_pause` seconds of silence between neighbours and
/// `slide_pause` seconds after the last one.
///
/// The output is in the internal mix format regardless of the segments' formats.
pub fn assemble(
    segments: &[AudioPcm],
    inline_pause: f64,
    slide_pause: f64,
) -> SlidereelResult<AudioPcm> {
    if segments.is_empty() {
        return Err(SlidereelError::stage(
            Stage::Mix,
            "no audio segments generated",
        ));
    }

    let mut out = AudioPcm::empty(MIX_SAMPLE_RATE, MIX_CHANNELS);
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push_silence(inline_pause);
        }
        out.append(&seg.conform(MIX_SAMPLE_RATE, MIX_CHANNELS)?)?;
    }
    out.push_silence(slide_pause);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/narration.rs"]
mod tests;
