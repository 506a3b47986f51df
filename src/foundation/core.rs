use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::Context as _;

use crate::foundation::error::SlidereelResult;

/// One blocking unit of work dispatched to a stage pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Text-to-speech call for one narration segment.
    Synthesize,
    /// Decoding synthesized segments and writing the composite narration.
    Mix,
    /// Extracting one page image from the source document.
    Rasterize,
    /// Encoding a still image plus narration into a clip.
    Encode,
    /// Joining all retained clips into the output video.
    Concat,
}

impl Stage {
    /// Label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Synthesize => "synthesize",
            Self::Mix => "mix",
            Self::Rasterize => "rasterize",
            Self::Encode => "encode",
            Self::Concat => "concat",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Source document identity used as a stand-in for its content.
///
/// Captured once per build. Page content that changes without touching the file's
/// modification time or size is not detected, so such an edit can leave a stale clip in
/// the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentIdentity {
    /// Modification time in nanoseconds relative to the Unix epoch (negative before it).
    pub modified_ns: i128,
    /// File size in bytes.
    pub size: u64,
}

impl DocumentIdentity {
    /// Stat `path` once and capture its identity.
    pub fn from_path(path: &Path) -> SlidereelResult<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat document '{}'", path.display()))?;
        let modified = meta
            .modified()
            .with_context(|| format!("document '{}' has no modification time", path.display()))?;
        let modified_ns = match modified.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_nanos() as i128,
            Err(before) => -(before.duration().as_nanos() as i128),
        };
        Ok(Self {
            modified_ns,
            size: meta.len(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
