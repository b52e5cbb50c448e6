//! Page rendering with poppler's `pdftoppm`.

use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use tracing::debug;

use super::Result;
use crate::error::OcrError;
use crate::models::config::ToolConfig;

/// Renders single PDF pages to images via `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    tools: ToolConfig,
}

impl PopplerRasterizer {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }

    /// Render a page (0-indexed) at the configured DPI.
    pub fn render(&self, path: &Path, page_index: u32) -> Result<DynamicImage> {
        let page = (page_index + 1).to_string();
        let temp_dir = tempfile::tempdir()
            .map_err(|e| OcrError::Rasterize(format!("failed to create temp dir: {}", e)))?;
        let prefix = temp_dir.path().join("page");

        let output = Command::new(self.tools.pdftoppm())
            .arg("-png")
            .arg("-singlefile")
            .args(["-r", &self.tools.render_dpi.to_string()])
            .args(["-f", &page, "-l", &page])
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| OcrError::Rasterize(format!("failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Rasterize(format!(
                "pdftoppm failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            )));
        }

        let png = prefix.with_extension("png");
        debug!("Rendered page {} of {} to {}", page, path.display(), png.display());

        image::open(&png).map_err(|e| OcrError::InvalidImage(e.to_string()))
    }
}
