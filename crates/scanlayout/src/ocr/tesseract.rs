//! Tesseract-backed [`Recognizer`].

use super::recognizer::{Recognition, Recognizer, RecognizerConfig};
use super::tsv::parse_tsv_tokens;
use crate::{Result, ScanLayoutError};
use image::DynamicImage;
use kreuzberg_tesseract::{TessPageSegMode, TesseractAPI};
use std::env;
use std::path::{Path, PathBuf};

const FALLBACK_TESSDATA_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
];

/// Recognizer driving the Tesseract C API.
///
/// A fresh engine handle is created per call, so one instance can serve many
/// page workers concurrently.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    tessdata_path: String,
}

impl TesseractRecognizer {
    /// Resolve language data from `tessdata_path`, then `TESSDATA_PREFIX`,
    /// then well-known install locations.
    pub fn new(tessdata_path: Option<PathBuf>) -> Self {
        let tessdata_path = tessdata_path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| env::var("TESSDATA_PREFIX").ok())
            .or_else(|| {
                FALLBACK_TESSDATA_PATHS
                    .iter()
                    .find(|p| Path::new(p).exists())
                    .map(|p| (*p).to_string())
            })
            .unwrap_or_default();

        tracing::debug!(tessdata = %tessdata_path, "Resolved tessdata path");
        Self { tessdata_path }
    }

    pub fn tessdata_path(&self) -> &str {
        &self.tessdata_path
    }

    fn check_language_data(&self, language: &str) -> Result<()> {
        if self.tessdata_path.is_empty() {
            return Ok(());
        }
        for lang in language.split('+') {
            let traineddata = Path::new(&self.tessdata_path).join(format!("{}.traineddata", lang));
            if !traineddata.exists() {
                return Err(ScanLayoutError::recognition(
                    None,
                    format!(
                        "Language data for '{}' not found in {}",
                        lang, self.tessdata_path
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Recognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, language: &str, config: &RecognizerConfig) -> Result<Recognition> {
        self.check_language_data(language)?;

        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanLayoutError::recognition(None, "Cannot recognize an empty image"));
        }

        let api = TesseractAPI::new();
        api.init(&self.tessdata_path, language).map_err(|e| {
            ScanLayoutError::recognition(None, format!("Failed to initialize language '{}': {}", language, e))
        })?;

        api.set_page_seg_mode(TessPageSegMode::from_int(i32::from(config.page_segmentation)))
            .map_err(|e| ScanLayoutError::recognition(None, format!("Failed to set PSM mode: {}", e)))?;

        if let Some(oem) = config.engine_mode
            && let Err(e) = api.set_variable("tessedit_ocr_engine_mode", &oem.to_string())
        {
            tracing::warn!(oem, error = %e, "Engine mode rejected, using engine default");
        }

        api.set_image(gray.as_raw(), width as i32, height as i32, 1, width as i32)
            .map_err(|e| ScanLayoutError::recognition(None, format!("Failed to set image: {}", e)))?;

        api.recognize()
            .map_err(|e| ScanLayoutError::recognition(None, format!("Failed to recognize text: {}", e)))?;

        let transcription = api
            .get_utf8_text()
            .map_err(|e| ScanLayoutError::recognition(None, format!("Failed to extract text: {}", e)))?;
        let tsv = api
            .get_tsv_text(0)
            .map_err(|e| ScanLayoutError::recognition(None, format!("Failed to extract TSV: {}", e)))?;

        let tokens = parse_tsv_tokens(&tsv);
        tracing::debug!(
            language,
            config = %config,
            width,
            height,
            tokens = tokens.len(),
            "Tesseract recognition complete"
        );

        Ok(Recognition { transcription, tokens })
    }
}
