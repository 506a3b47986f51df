use std::path::Path;

use crate::foundation::error::SlidereelResult;

/// Text-to-speech engine contract.
///
/// Calls block; the slide pipeline runs them on the speech stage pool.
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `text` with `voice` at `rate` into `out_path`.
    fn synthesize(&self, text: &str, voice: &str, rate: &str, out_path: &Path)
    -> SlidereelResult<()>;

    /// File extension (without dot) of the audio this engine writes.
    fn output_extension(&self) -> &'static str;
}
