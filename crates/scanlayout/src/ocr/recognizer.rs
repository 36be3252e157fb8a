//! The recognizer seam.
//!
//! Recognition itself is an external capability. The pipeline only needs a
//! transcription and a token stream for an image, so anything implementing
//! [`Recognizer`] can be plugged in: the Tesseract backend, a remote service, or
//! a scripted fake in tests.

use crate::types::Token;
use crate::{Result, ScanLayoutError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output of one recognizer call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    pub transcription: String,
    pub tokens: Vec<Token>,
}

/// Page segmentation and engine mode for a recognizer call.
///
/// Displayed as a Tesseract-style config string, e.g. `--oem 3 --psm 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// OCR engine mode; `None` leaves the engine default.
    #[serde(default)]
    pub engine_mode: Option<u8>,
    pub page_segmentation: u8,
}

impl RecognizerConfig {
    /// Fully automatic segmentation with the default engine, for whole pages.
    pub const fn full_page() -> Self {
        Self {
            engine_mode: Some(3),
            page_segmentation: 3,
        }
    }

    /// A single uniform block of text, for cropped table regions.
    pub const fn table_crop() -> Self {
        Self {
            engine_mode: None,
            page_segmentation: 6,
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self::full_page()
    }
}

impl fmt::Display for RecognizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(oem) = self.engine_mode {
            write!(f, "--oem {} ", oem)?;
        }
        write!(f, "--psm {}", self.page_segmentation)
    }
}

impl FromStr for RecognizerConfig {
    type Err = ScanLayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let mut engine_mode = None;
        let mut page_segmentation = None;
        let mut parts = s.split_whitespace();

        while let Some(flag) = parts.next() {
            let value = parts
                .next()
                .ok_or_else(|| ScanLayoutError::validation(format!("Missing value for '{}' in '{}'", flag, s)))?;
            let parsed: u8 = value
                .parse()
                .map_err(|_| ScanLayoutError::validation(format!("Invalid value '{}' for '{}'", value, flag)))?;

            match flag {
                "--oem" if parsed <= 3 => engine_mode = Some(parsed),
                "--psm" if parsed <= 13 => page_segmentation = Some(parsed),
                "--oem" | "--psm" => {
                    return Err(ScanLayoutError::validation(format!(
                        "Value {} out of range for '{}'",
                        parsed, flag
                    )));
                }
                other => {
                    return Err(ScanLayoutError::validation(format!(
                        "Unknown recognizer option '{}'",
                        other
                    )));
                }
            }
        }

        Ok(Self {
            engine_mode,
            page_segmentation: page_segmentation.unwrap_or(3),
        })
    }
}

/// A text recognizer.
///
/// Implementations must be usable from several worker threads at once. Each
/// call is blocking; async callers run it on a blocking pool.
pub trait Recognizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Recognize `image` in `language` with the given segmentation settings.
    ///
    /// # Errors
    ///
    /// Returns `ScanLayoutError::RecognitionFailed` for engine failures and
    /// unsupported languages. Callers do not retry.
    fn recognize(&self, image: &DynamicImage, language: &str, config: &RecognizerConfig) -> Result<Recognition>;
}

impl<R: Recognizer + ?Sized> Recognizer for std::sync::Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage, language: &str, config: &RecognizerConfig) -> Result<Recognition> {
        (**self).recognize(image, language, config)
    }
}
