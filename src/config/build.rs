use std::time::Duration;

use crate::foundation::error::{SlidereelError, SlidereelResult};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Worker counts and call limits for the stage pools.
pub struct StagePoolOpts {
    /// Workers for speech synthesis and narration mixing.
    pub speech_threads: usize,
    /// Workers for page rasterization.
    pub raster_threads: usize,
    /// Workers for clip encoding and final concatenation.
    pub encode_threads: usize,
    /// Optional limit for a single collaborator call.
    pub stage_timeout: Option<Duration>,
}

impl Default for StagePoolOpts {
    fn default() -> Self {
        Self {
            speech_threads: 4,
            raster_threads: 2,
            encode_threads: 2,
            stage_timeout: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Runtime knobs for one build invocation.
pub struct BuildOpts {
    /// Stage pool sizing and timeouts.
    pub pools: StagePoolOpts,
    /// Maximum number of slide pipelines in flight. `0` and `1` both mean sequential.
    pub parallel_slides: usize,
    /// Empty the cache directory before processing slides.
    pub clean: bool,
}

impl BuildOpts {
    /// Reject pool sizes or timeouts that cannot make progress.
    pub fn validate(&self) -> SlidereelResult<()> {
        for (name, n) in [
            ("speech_threads", self.pools.speech_threads),
            ("raster_threads", self.pools.raster_threads),
            ("encode_threads", self.pools.encode_threads),
        ] {
            if n == 0 {
                return Err(SlidereelError::validation(format!("{name} must be >= 1")));
            }
        }
        if let Some(t) = self.pools.stage_timeout
            && t.is_zero()
        {
            return Err(SlidereelError::validation(
                "stage_timeout must be non-zero when set",
            ));
        }
        Ok(())
    }

    pub(crate) fn slide_concurrency(&self) -> usize {
        self.parallel_slides.max(1)
    }
}
