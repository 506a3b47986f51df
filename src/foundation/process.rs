use std::process::{Command, Stdio};

use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};

/// Run `cmd` to completion, folding a non-zero exit and its stderr into a stage error.
pub(crate) fn run_tool(stage: Stage, cmd: &mut Command) -> SlidereelResult<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(%stage, command = ?cmd, "running external tool");

    let out = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            SlidereelError::stage(
                stage,
                format!("failed to spawn {program} (is it installed and on PATH?): {e}"),
            )
        })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(SlidereelError::stage(
            stage,
            format!("{program} exited with status {}: {}", out.status, stderr.trim()),
        ));
    }
    Ok(())
}

/// Return `true` when `program` can be invoked from `PATH` with `version_arg`.
pub fn is_tool_on_path(program: &str, version_arg: &str) -> bool {
    Command::new(program)
        .arg(version_arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg", "-version")
}
