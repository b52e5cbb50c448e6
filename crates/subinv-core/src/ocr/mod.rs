//! Page OCR: rasterize a PDF page, convert to grayscale, recognize text.

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "native")]
mod rasterizer;
#[cfg(feature = "native")]
mod recognizer;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
#[cfg(feature = "native")]
pub use rasterizer::PopplerRasterizer;
#[cfg(feature = "native")]
pub use recognizer::PdfPageRecognizer;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Image→text service for one PDF page.
pub trait PageRecognizer {
    /// Recognized text of a page (0-indexed), newline-delimited.
    fn recognize_page(&self, path: &Path, page_index: u32) -> Result<String>;
}

/// A recognized text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the center point of the bounding box.
    pub fn center(&self) -> (f32, f32) {
        let x = (self.bbox[0] + self.bbox[2] + self.bbox[4] + self.bbox[6]) / 4.0;
        let y = (self.bbox[1] + self.bbox[3] + self.bbox[5] + self.bbox[7]) / 4.0;
        (x, y)
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Join text boxes into reading-order lines.
///
/// Boxes whose vertical centers lie within `tolerance` pixels of a line's
/// first box belong to that line; each line reads left to right.
pub fn group_lines(mut boxes: Vec<TextBox>, tolerance: f32) -> Vec<String> {
    boxes.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));

    let mut lines: Vec<(f32, Vec<TextBox>)> = Vec::new();
    for text_box in boxes {
        let y = text_box.center().1;
        match lines.last_mut() {
            Some((anchor, members)) if (y - *anchor).abs() <= tolerance => members.push(text_box),
            _ => lines.push((y, vec![text_box])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
            members
                .iter()
                .map(|b| b.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + 40.0, y, x + 40.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_group_lines_reading_order() {
        let boxes = vec![
            text_box("12/03/2024", 200.0, 102.0),
            text_box("REMARKS", 10.0, 300.0),
            text_box("DATE REQUIRED:", 10.0, 100.0),
        ];

        assert_eq!(
            group_lines(boxes, 15.0),
            vec!["DATE REQUIRED: 12/03/2024".to_string(), "REMARKS".to_string()]
        );
    }

    #[test]
    fn test_group_lines_skips_blank() {
        let boxes = vec![text_box("  ", 0.0, 0.0), text_box("A", 0.0, 50.0)];
        assert_eq!(group_lines(boxes, 15.0), vec!["A".to_string()]);
    }

    #[test]
    fn test_center() {
        assert_eq!(text_box("x", 0.0, 0.0).center(), (20.0, 5.0));
    }
}
