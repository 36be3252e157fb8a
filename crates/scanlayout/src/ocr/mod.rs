//! Recognizer integration.
//!
//! The crate never recognizes text itself. This module defines the contract a
//! recognizer fulfils, the conversion of raw recognizer output into tokens, the
//! supported language table and, behind the `tesseract` feature, a Tesseract
//! backend.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "tesseract")]
//! # fn example() -> scanlayout::Result<()> {
//! use scanlayout::ocr::{Recognizer, RecognizerConfig, TesseractRecognizer};
//!
//! let recognizer = TesseractRecognizer::new(None);
//! let image = image::open("scan.png")?;
//! let recognition = recognizer.recognize(&image, "eng", &RecognizerConfig::full_page())?;
//! println!("{}", recognition.transcription);
//! # Ok(())
//! # }
//! ```
pub mod languages;
pub mod recognizer;
pub mod tsv;

#[cfg(feature = "tesseract")]
pub mod tesseract;

pub use languages::{DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES, language_name, resolve_language, validate_language};
pub use recognizer::{Recognition, Recognizer, RecognizerConfig};
pub use tsv::{TokenColumns, parse_tsv_tokens};

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;
