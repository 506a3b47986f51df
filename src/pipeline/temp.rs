use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::SlidereelResult;

/// Intermediate file owned by one slide pipeline, removed when dropped.
///
/// The file does not have to exist yet; the guard is taken out before the collaborator that
/// writes it is called, so a failed or panicking call still leaves nothing behind.
#[derive(Debug)]
pub(crate) struct TempArtifact {
    path: PathBuf,
    armed: bool,
}

impl TempArtifact {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Move the file onto `dest` and stop tracking it.
    pub(crate) fn persist(mut self, dest: &Path) -> SlidereelResult<()> {
        std::fs::rename(&self.path, dest).with_context(|| {
            format!(
                "failed to move '{}' to '{}'",
                self.path.display(),
                dest.display()
            )
        })?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/temp.rs"]
mod tests;
