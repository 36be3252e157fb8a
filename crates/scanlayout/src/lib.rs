//! scanlayout - scanned document layout reconstruction.
//!
//! Scanned pages go through image normalization, an external recognizer, and
//! layout reconstruction, producing a [`DocumentModel`] of pages with
//! blocks, lines and ruled tables. The model renders to plain text, docx and
//! xlsx.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "tesseract")]
//! # fn main() -> scanlayout::Result<()> {
//! use scanlayout::{DocumentProcessor, OutputFormat, ScanConfig, TesseractRecognizer};
//! use std::sync::Arc;
//!
//! let config = ScanConfig::default();
//! let processor = DocumentProcessor::new(Arc::new(TesseractRecognizer::new(None)), config.clone());
//! let result = processor.process_file("invoice.png")?;
//!
//! let written = scanlayout::render::write_artifacts(
//!     &result.model,
//!     &[OutputFormat::Txt, OutputFormat::Docx],
//!     &config.render,
//!     std::path::Path::new("out"),
//!     "job-1",
//!     "invoice.png",
//! );
//! for (format, path) in written {
//!     println!("{format}: {:?}", path);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "tesseract"))]
//! # fn main() {}
//! ```
//!
//! # Architecture
//!
//! - **Image** (`image`): normalization, skew correction and OCR resizing
//! - **OCR** (`ocr`): the recognizer seam, token parsing and language table
//! - **Layout** (`layout`): blocks and lines, table regions, table cells
//! - **Core** (`core`): configuration, input loading, the page pipeline and
//!   document-level concurrency
//! - **Render** (`render`): txt, docx and xlsx artifacts

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod image;
pub mod layout;
pub mod ocr;
pub mod render;
pub mod types;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use error::{Result, ScanLayoutError};
pub use types::*;

pub use core::config::{NormalizeConfig, RecognizerSettings, RenderConfig, ScanConfig, TableConfig};
pub use core::document::{DocumentProcessor, build_document, build_page};
pub use core::io::{is_supported_input, load_pages};
pub use core::pipeline::process_page;

pub use ocr::{Recognition, Recognizer, RecognizerConfig};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;

pub use render::{OutputFormat, Renderer, artifact_file_name, render_all, write_artifacts};
