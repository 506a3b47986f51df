use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::build::StagePoolOpts;
use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Bounded worker pools for blocking collaborator calls.
///
/// Speech work (I/O bound) and the CPU/memory heavy raster and encode work run on separate
/// rayon pools, so a slow encoder never starves synthesis and at most `raster_threads`
/// decoded pages are alive at once.
pub struct StagePool {
    speech: rayon::ThreadPool,
    raster: rayon::ThreadPool,
    encode: rayon::ThreadPool,
    timeout: Option<Duration>,
}

impl StagePool {
    /// Build the pools described by `opts`.
    pub fn new(opts: &StagePoolOpts) -> SlidereelResult<Self> {
        Ok(Self {
            speech: build_thread_pool("speech", opts.speech_threads)?,
            raster: build_thread_pool("raster", opts.raster_threads)?,
            encode: build_thread_pool("encode", opts.encode_threads)?,
            timeout: opts.stage_timeout,
        })
    }

    /// Worker count of the pool serving `stage`.
    pub fn threads_for(&self, stage: Stage) -> usize {
        self.pool_for(stage).current_num_threads()
    }

    fn pool_for(&self, stage: Stage) -> &rayon::ThreadPool {
        match stage {
            Stage::Synthesize | Stage::Mix => &self.speech,
            Stage::Rasterize => &self.raster,
            Stage::Encode | Stage::Concat => &self.encode,
        }
    }

    /// Run `job` on the pool for `stage` and wait for it without blocking the caller's task.
    ///
    /// A panic inside `job` becomes a [`SlidereelError::Stage`]. When a timeout is configured
    /// and expires, the call fails with [`SlidereelError::Timeout`]; the worker still runs the
    /// job to completion but its result is dropped.
    pub async fn run<T, F>(&self, stage: Stage, job: F) -> SlidereelResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> SlidereelResult<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.pool_for(stage).spawn(move || {
            let out = std::panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|panic| {
                Err(SlidereelError::stage(
                    stage,
                    format!("worker panicked: {}", panic_message(panic.as_ref())),
                ))
            });
            // The receiver is gone when the caller timed out.
            let _ = tx.send(out);
        });

        let received = match self.timeout {
            Some(after) => tokio::time::timeout(after, rx)
                .await
                .map_err(|_| SlidereelError::Timeout { stage, after })?,
            None => rx.await,
        };
        received.map_err(|_| SlidereelError::stage(stage, "worker dropped the job"))?
    }
}

fn build_thread_pool(name: &'static str, threads: usize) -> SlidereelResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(SlidereelError::validation(format!(
            "stage pool '{name}' must have >= 1 worker"
        )));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("slidereel-{name}-{i}"))
        .build()
        .map_err(|e| {
            SlidereelError::validation(format!("failed to build '{name}' stage pool: {e}"))
        })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/pool.rs"]
mod tests;
