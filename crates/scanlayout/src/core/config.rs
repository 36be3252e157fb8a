//! Configuration loading and management.
//!
//! Every tunable threshold used by normalization, table detection and rendering
//! lives here as a named default. Configuration can be loaded from TOML, YAML or
//! JSON files, discovered from the directory hierarchy, or built in code.

use crate::ocr::RecognizerConfig;
use crate::{Result, ScanLayoutError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for processing a document.
///
/// # Example
///
/// ```rust
/// use scanlayout::core::config::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.max_pages, 50);
///
/// // let config = ScanConfig::from_toml_file("scanlayout.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Recognition language code, e.g. `eng` or `eng+deu`.
    #[serde(default = "default_language")]
    pub language: String,

    /// Documents with more pages than this are rejected before any page work.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Upper bound on pages processed at once.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,

    /// Per-page timeout for async processing. `None` waits indefinitely.
    #[serde(default)]
    pub page_timeout_secs: Option<u64>,

    /// Rasterisation resolution for PDF input.
    #[serde(default = "default_pdf_dpi")]
    pub pdf_dpi: u32,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub tables: TableConfig,

    #[serde(default)]
    pub recognizer: RecognizerSettings,

    #[serde(default)]
    pub render: RenderConfig,
}

/// Image normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default = "default_clahe_clip_limit")]
    pub clahe_clip_limit: f32,

    /// Tiles per side of the equalization grid.
    #[serde(default = "default_clahe_tiles")]
    pub clahe_tiles: u32,

    #[serde(default = "default_true")]
    pub denoise: bool,

    /// Filter strength `h` of non-local means.
    #[serde(default = "default_denoise_strength")]
    pub denoise_strength: f32,

    #[serde(default = "default_denoise_template_window")]
    pub denoise_template_window: u32,

    #[serde(default = "default_denoise_search_window")]
    pub denoise_search_window: u32,

    /// Side of the square neighborhood used for the local mean. Must be odd.
    #[serde(default = "default_threshold_block_size")]
    pub threshold_block_size: u32,

    /// Subtracted from the local mean before comparing.
    #[serde(default = "default_threshold_offset")]
    pub threshold_offset: i32,

    #[serde(default = "default_true")]
    pub deskew: bool,

    /// Below this many detected segments no rotation is attempted.
    #[serde(default = "default_min_skew_segments")]
    pub min_skew_segments: usize,

    /// Median skew at or below this magnitude is left alone.
    #[serde(default = "default_skew_threshold_degrees")]
    pub skew_threshold_degrees: f64,

    #[serde(default = "default_median_radius")]
    pub median_radius: u32,
}

/// Ruled-table detection and cell extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pixels darker than or equal to this count as ink.
    #[serde(default = "default_ink_threshold")]
    pub ink_threshold: u8,

    /// Minimum run, in pixels, for a ruling line to survive the opening.
    #[serde(default = "default_min_line_length")]
    pub min_line_length: u32,

    /// Minimum contour area, in square pixels, of a table candidate.
    #[serde(default = "default_min_area")]
    pub min_area: f64,

    /// Height of the vertical bins tokens are grouped into rows by.
    #[serde(default = "default_row_bin_height")]
    pub row_bin_height: u32,

    /// Tables with fewer rows are discarded.
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
}

/// Recognizer invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerSettings {
    /// Full-page call, `--oem 3 --psm 3` by default.
    #[serde(default = "default_page_recognizer")]
    pub page: RecognizerConfig,

    /// Table crop call, `--psm 6` by default.
    #[serde(default = "default_table_recognizer")]
    pub table: RecognizerConfig,

    /// Tesseract language data directory. Falls back to `TESSDATA_PREFIX`.
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
}

/// Renderer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Line prefixes that always mark a heading in the rich document.
    #[serde(default = "default_label_prefixes")]
    pub label_prefixes: Vec<String>,

    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default = "default_font_size_pt")]
    pub font_size_pt: u32,
}

fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "eng".to_string()
}
fn default_max_pages() -> usize {
    50
}
fn default_max_concurrent_pages() -> usize {
    num_cpus::get().max(1)
}
fn default_pdf_dpi() -> u32 {
    300
}
fn default_clahe_clip_limit() -> f32 {
    3.0
}
fn default_clahe_tiles() -> u32 {
    8
}
fn default_denoise_strength() -> f32 {
    10.0
}
fn default_denoise_template_window() -> u32 {
    7
}
fn default_denoise_search_window() -> u32 {
    21
}
fn default_threshold_block_size() -> u32 {
    15
}
fn default_threshold_offset() -> i32 {
    8
}
fn default_min_skew_segments() -> usize {
    6
}
fn default_skew_threshold_degrees() -> f64 {
    0.3
}
fn default_median_radius() -> u32 {
    1
}
fn default_ink_threshold() -> u8 {
    200
}
fn default_min_line_length() -> u32 {
    40
}
fn default_min_area() -> f64 {
    5000.0
}
fn default_row_bin_height() -> u32 {
    20
}
fn default_min_rows() -> usize {
    2
}
fn default_page_recognizer() -> RecognizerConfig {
    RecognizerConfig::full_page()
}
fn default_table_recognizer() -> RecognizerConfig {
    RecognizerConfig::table_crop()
}
fn default_label_prefixes() -> Vec<String> {
    ["YAH:", "REF:", "TAREHE:", "Kumb."].iter().map(|s| s.to_string()).collect()
}
fn default_font() -> String {
    "Calibri".to_string()
}
fn default_font_size_pt() -> u32 {
    11
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_pages: default_max_pages(),
            max_concurrent_pages: default_max_concurrent_pages(),
            page_timeout_secs: None,
            pdf_dpi: default_pdf_dpi(),
            normalize: NormalizeConfig::default(),
            tables: TableConfig::default(),
            recognizer: RecognizerSettings::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: default_clahe_clip_limit(),
            clahe_tiles: default_clahe_tiles(),
            denoise: true,
            denoise_strength: default_denoise_strength(),
            denoise_template_window: default_denoise_template_window(),
            denoise_search_window: default_denoise_search_window(),
            threshold_block_size: default_threshold_block_size(),
            threshold_offset: default_threshold_offset(),
            deskew: true,
            min_skew_segments: default_min_skew_segments(),
            skew_threshold_degrees: default_skew_threshold_degrees(),
            median_radius: default_median_radius(),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ink_threshold: default_ink_threshold(),
            min_line_length: default_min_line_length(),
            min_area: default_min_area(),
            row_bin_height: default_row_bin_height(),
            min_rows: default_min_rows(),
        }
    }
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            page: default_page_recognizer(),
            table: default_table_recognizer(),
            tessdata_path: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            label_prefixes: default_label_prefixes(),
            font: default_font(),
            font_size_pt: default_font_size_pt(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ScanLayoutError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ScanLayoutError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content).map_err(|e| {
            ScanLayoutError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ScanLayoutError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration choosing the parser from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            other => Err(ScanLayoutError::validation(format!(
                "Unsupported config file extension '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Discover `scanlayout.toml` in the current directory or its parents.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(ScanLayoutError::Io)?;

        loop {
            let candidate = current.join("scanlayout.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(ScanLayoutError::validation("max_pages must be at least 1"));
        }
        if self.max_concurrent_pages == 0 {
            return Err(ScanLayoutError::validation("max_concurrent_pages must be at least 1"));
        }
        if self.pdf_dpi == 0 {
            return Err(ScanLayoutError::validation("pdf_dpi must be positive"));
        }

        let n = &self.normalize;
        if n.threshold_block_size < 3 || n.threshold_block_size % 2 == 0 {
            return Err(ScanLayoutError::validation(format!(
                "threshold_block_size must be odd and at least 3, got {}",
                n.threshold_block_size
            )));
        }
        if n.clahe_tiles == 0 {
            return Err(ScanLayoutError::validation("clahe_tiles must be at least 1"));
        }
        if n.denoise_template_window % 2 == 0 || n.denoise_search_window % 2 == 0 {
            return Err(ScanLayoutError::validation("denoise windows must have odd sizes"));
        }

        if self.tables.row_bin_height == 0 {
            return Err(ScanLayoutError::validation("row_bin_height must be positive"));
        }
        if self.tables.min_line_length == 0 {
            return Err(ScanLayoutError::validation("min_line_length must be positive"));
        }

        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ScanLayoutError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
