use std::path::PathBuf;

use crate::pipeline::slide::SlideState;

/// Why one slide produced no clip.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SlideFailure {
    /// 0-based slide index.
    pub index: usize,
    /// Source document page of the slide.
    pub page: u32,
    /// Pipeline state the slide was in when it failed.
    pub state: SlideState,
    /// Rendered error.
    pub message: String,
}

/// Summary of one build invocation.
///
/// `success` is `true` whenever an output video was produced, including builds where some
/// slides failed; compare `failed_slides` to tell the two apart.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BuildResult {
    /// An output video was written.
    pub success: bool,
    /// Output video path, set on success.
    pub output_path: Option<PathBuf>,
    /// Slides in the script.
    pub total_slides: usize,
    /// Slides served from the artifact cache.
    pub cached_count: usize,
    /// Slides rendered by this build.
    pub generated_count: usize,
    /// Indices of slides that produced no clip, ascending.
    pub failed_slides: Vec<usize>,
    /// Per-slide failure detail, in the same order as `failed_slides`.
    pub failures: Vec<SlideFailure>,
    /// Cache entries removed by garbage collection.
    pub gc_removed: usize,
    /// Reason the build failed, when it did.
    pub error_message: Option<String>,
}

impl BuildResult {
    /// `true` when an output was produced but at least one slide is missing from it.
    pub fn is_partial(&self) -> bool {
        self.success && !self.failed_slides.is_empty()
    }
}
