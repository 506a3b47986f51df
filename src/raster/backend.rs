use std::path::Path;

use crate::foundation::error::SlidereelResult;

/// Extracts one page of the source document as a PNG image.
pub trait PageRasterizer: Send + Sync {
    /// Render 1-based `page` of `document` at `dpi` into `out_path`.
    fn extract(&self, document: &Path, page: u32, dpi: u32, out_path: &Path)
    -> SlidereelResult<()>;
}
