use std::path::{Path, PathBuf};
use std::process::Command;

use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::foundation::process::run_tool;
use crate::speech::engine::SpeechEngine;

/// Microsoft Edge neural voices through the `edge-tts` command line tool.
#[derive(Clone, Debug)]
pub struct EdgeTts {
    program: PathBuf,
}

impl Default for EdgeTts {
    fn default() -> Self {
        Self::new("edge-tts")
    }
}

impl EdgeTts {
    /// Use `program` instead of the `edge-tts` found on `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SpeechEngine for EdgeTts {
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: &str,
        out_path: &Path,
    ) -> SlidereelResult<()> {
        let mut cmd = Command::new(&self.program);
        // `--rate=-10%` must stay one argument or the value parses as a flag.
        cmd.args(["--voice", voice])
            .arg(format!("--rate={rate}"))
            .args(["--text", text])
            .arg("--write-media")
            .arg(out_path);
        run_tool(Stage::Synthesize, &mut cmd)?;

        let written = std::fs::metadata(out_path).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(SlidereelError::stage(
                Stage::Synthesize,
                format!("edge-tts produced no audio for voice '{voice}'"),
            ));
        }
        Ok(())
    }

    fn output_extension(&self) -> &'static str {
        "mp3"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/speech/edge.rs"]
mod tests;
