use std::path::{Path, PathBuf};
use std::process::Command;

use crate::foundation::core::Stage;
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::foundation::process::run_tool;
use crate::raster::backend::PageRasterizer;

/// Poppler's `pdftoppm` rasterizer.
#[derive(Clone, Debug)]
pub struct Pdftoppm {
    program: PathBuf,
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl Pdftoppm {
    /// Use `program` instead of the `pdftoppm` found on `PATH`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, document: &Path, page: u32, dpi: u32, out_prefix: &Path) -> Command {
        let page = page.to_string();
        let mut cmd = Command::new(&self.program);
        cmd.args(["-f", &page, "-l", &page, "-r", &dpi.to_string()])
            .args(["-png", "-singlefile"])
            .arg(document)
            .arg(out_prefix);
        cmd
    }
}

impl PageRasterizer for Pdftoppm {
    fn extract(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
        out_path: &Path,
    ) -> SlidereelResult<()> {
        // pdftoppm appends `.png` to the prefix it is given.
        let prefix = out_path.with_extension("");
        let produced = prefix.with_extension("png");
        run_tool(
            Stage::Rasterize,
            &mut self.command(document, page, dpi, &prefix),
        )
        .map_err(|e| match e {
            SlidereelError::Stage { stage, message } => SlidereelError::Stage {
                stage,
                message: format!("page {page}: {message}"),
            },
            other => other,
        })?;

        if produced != out_path {
            std::fs::rename(&produced, out_path).map_err(|e| {
                SlidereelError::stage(
                    Stage::Rasterize,
                    format!("failed to move '{}': {e}", produced.display()),
                )
            })?;
        }

        let (w, h) = image::image_dimensions(out_path).map_err(|e| {
            SlidereelError::stage(
                Stage::Rasterize,
                format!("page {page} produced an unreadable image: {e}"),
            )
        })?;
        if w == 0 || h == 0 {
            return Err(SlidereelError::stage(
                Stage::Rasterize,
                format!("page {page} rendered to an empty {w}x{h} image"),
            ));
        }
        tracing::debug!(page, dpi, width = w, height = h, "rasterized page");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/pdftoppm.rs"]
mod tests;
