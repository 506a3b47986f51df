use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context as _;

use crate::encode::backend::{ClipConcatenator, ClipEncoder, ClipParams};
use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::foundation::process::{is_ffmpeg_on_path, run_tool};

/// Clip encoder and concatenator backed by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegEncoder {
    /// Use `program` instead of the `ffmpeg` found on `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn preflight(&self, stage: Stage) -> SlidereelResult<()> {
        if self.program == Path::new("ffmpeg") && !is_ffmpeg_on_path() {
            return Err(SlidereelError::stage(
                stage,
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        Ok(())
    }

    fn clip_command(
        &self,
        image: &Path,
        audio: &Path,
        duration_sec: f64,
        params: &ClipParams,
        out_path: &Path,
    ) -> Command {
        let fps = params.fps.to_string();
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error"])
            .args(["-loop", "1", "-framerate", &fps, "-i"])
            .arg(image)
            .arg("-i")
            .arg(audio)
            .args(["-t", &format!("{duration_sec:.6}")])
            // yuv420p needs even dimensions; rasterized pages rarely have them.
            .args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2", "-r", &fps])
            .args(["-c:v", &params.video_codec]);
        if params.video_codec == "libx264" {
            cmd.args(["-tune", "stillimage"]);
        }
        cmd.args(["-pix_fmt", "yuv420p", "-c:a", &params.audio_codec])
            .args(["-shortest", "-movflags", "+faststart", "-f", "mp4"])
            .arg(out_path);
        cmd
    }

    fn concat_command(&self, list_path: &Path, out_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(list_path)
            .args(["-c", "copy", "-movflags", "+faststart"])
            .arg(out_path);
        cmd
    }
}

impl ClipEncoder for FfmpegEncoder {
    fn encode(
        &self,
        image: &Path,
        audio: &Path,
        duration_sec: f64,
        params: &ClipParams,
        out_path: &Path,
    ) -> SlidereelResult<()> {
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(SlidereelError::stage(
                Stage::Encode,
                format!("clip duration must be > 0, got {duration_sec}"),
            ));
        }
        if params.fps == 0 {
            return Err(SlidereelError::stage(Stage::Encode, "fps must be non-zero"));
        }
        self.preflight(Stage::Encode)?;
        ensure_parent_dir(out_path)?;
        run_tool(
            Stage::Encode,
            &mut self.clip_command(image, audio, duration_sec, params, out_path),
        )
    }
}

impl ClipConcatenator for FfmpegEncoder {
    fn concat(&self, clips: &[PathBuf], out_path: &Path) -> SlidereelResult<()> {
        if clips.is_empty() {
            return Err(SlidereelError::assembly("no clips to concatenate"));
        }
        self.preflight(Stage::Concat)?;
        ensure_parent_dir(out_path)?;

        let mut list = tempfile::Builder::new()
            .prefix("slidereel_concat_")
            .suffix(".txt")
            .tempfile()
            .context("failed to create concat list file")?;
        let body = concat_list(clips)?;
        list.write_all(body.as_bytes())
            .context("failed to write concat list file")?;
        list.flush().context("failed to write concat list file")?;

        // `list` is removed when dropped, on every path out of here.
        run_tool(
            Stage::Concat,
            &mut self.concat_command(list.path(), out_path),
        )
    }
}

/// Render the concat demuxer list for `clips`, one absolute `file '...'` line per clip.
pub(crate) fn concat_list(clips: &[PathBuf]) -> SlidereelResult<String> {
    let mut out = String::new();
    for clip in clips {
        let abs = std::path::absolute(clip)
            .with_context(|| format!("failed to resolve clip path '{}'", clip.display()))?;
        let escaped = abs
            .to_string_lossy()
            .replace('\\', "/")
            .replace('\'', "'\\''");
        out.push_str("file '");
        out.push_str(&escaped);
        out.push_str("'\n");
    }
    Ok(out)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> SlidereelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
