//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SubinvError;

/// Main configuration for the subinv pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubinvConfig {
    /// External tool locations.
    pub tools: ToolConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Table and header extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Locations of the external table extraction and rasterization tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Java executable used to run tabula.
    pub java_path: PathBuf,

    /// Path to the tabula-java jar.
    pub tabula_jar: PathBuf,

    /// Directory holding poppler's `pdftoppm` (None = search PATH).
    pub poppler_dir: Option<PathBuf>,

    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            java_path: PathBuf::from("java"),
            tabula_jar: PathBuf::from("tabula.jar"),
            poppler_dir: None,
            render_dpi: 200,
        }
    }
}

impl ToolConfig {
    /// Full path to the `pdftoppm` executable.
    pub fn pdftoppm(&self) -> PathBuf {
        match &self.poppler_dir {
            Some(dir) => dir.join("pdftoppm"),
            None => PathBuf::from("pdftoppm"),
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text.
    pub keep_unk: bool,

    /// Boxes whose vertical centers differ by less than this many pixels
    /// are joined into one text line.
    pub line_tolerance: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            line_tolerance: 15.0,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

/// Maps an order reference token to a zone code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRule {
    /// Case-insensitive substring of the order reference.
    pub token: String,
    /// Zone written to the ZONE column.
    pub zone: String,
}

/// Table layout and header extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Column count of a line-item page; any other count ends the table.
    pub line_item_columns: usize,

    /// Source columns dropped from the stitched table.
    pub drop_columns: Vec<String>,

    /// Candidate names of the line subtotal column, in priority order.
    pub subtotal_headers: Vec<String>,

    /// Marker of the totals header whose right neighbour is the total.
    pub totals_marker: String,

    /// OCR label preceding the required delivery date.
    pub date_required_label: String,

    /// Order reference value that names the subcontractor on the next line.
    pub sample_token: String,

    /// Zone rules, first match wins. Empty leaves ZONE blank.
    pub zone_rules: Vec<ZoneRule>,

    /// Maximum pages scanned for the totals block (0 = whole document).
    pub max_pages: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_item_columns: 9,
            drop_columns: ["IT", "UNIT", "UNIT PRICE", "PER", "DISC."]
                .into_iter()
                .map(String::from)
                .collect(),
            subtotal_headers: vec!["$ AMOUNT".to_string(), "AMOUNT IN SGD".to_string()],
            totals_marker: "SGD".to_string(),
            date_required_label: "DATE REQUIRED".to_string(),
            sample_token: "SAMPLE".to_string(),
            zone_rules: Vec::new(),
            max_pages: 0,
        }
    }
}

impl SubinvConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SubinvError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SubinvError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
