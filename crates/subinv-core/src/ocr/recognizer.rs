//! Rasterize → grayscale → recognize, as one [`PageRecognizer`].

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::{group_lines, PageRecognizer, PopplerRasterizer, PureOcrEngine, Result};
use crate::models::config::SubinvConfig;

/// Page OCR over rendered PDF pages.
pub struct PdfPageRecognizer {
    rasterizer: PopplerRasterizer,
    engine: PureOcrEngine,
    line_tolerance: f32,
}

impl PdfPageRecognizer {
    pub fn new(rasterizer: PopplerRasterizer, engine: PureOcrEngine, line_tolerance: f32) -> Self {
        Self {
            rasterizer,
            engine,
            line_tolerance,
        }
    }

    /// Build the rasterizer and load the OCR models from configuration.
    pub fn from_config(config: &SubinvConfig) -> Result<Self> {
        Ok(Self::new(
            PopplerRasterizer::new(config.tools.clone()),
            PureOcrEngine::from_config(&config.ocr)?,
            config.ocr.line_tolerance,
        ))
    }
}

impl PageRecognizer for PdfPageRecognizer {
    fn recognize_page(&self, path: &Path, page_index: u32) -> Result<String> {
        let image = self.rasterizer.render(path, page_index)?;
        let gray = DynamicImage::ImageLuma8(image.to_luma8());

        let boxes = self.engine.recognize(&gray)?;
        let lines = group_lines(boxes, self.line_tolerance);
        debug!("Recognized {} lines on page index {}", lines.len(), page_index);

        Ok(lines.join("\n"))
    }
}
