//! Output rendering.
//!
//! A [`Renderer`] turns a [`DocumentModel`] into the bytes of one artifact.
//! Renderers are pure: the same model always produces the same output, and a
//! model built by the pipeline never makes them fail. When several formats
//! are requested, each one succeeds or fails on its own.
//!
//! # Example
//!
//! ```rust
//! use scanlayout::render::{OutputFormat, artifact_file_name, render_all};
//! use scanlayout::core::config::RenderConfig;
//! use scanlayout::types::{DocumentModel, Page};
//!
//! let model = DocumentModel::from_pages(vec![Page::empty(1)]);
//! let outputs = render_all(&model, &[OutputFormat::Txt, OutputFormat::Xlsx], &RenderConfig::default());
//! assert!(outputs.iter().all(|(_, result)| result.is_ok()));
//! assert_eq!(artifact_file_name("abc", "scan.png", OutputFormat::Docx), "abc_scan.docx");
//! ```
pub mod docx;
pub mod heading;
pub(crate) mod ooxml;
pub mod text;
pub mod xlsx;

use crate::core::config::RenderConfig;
use crate::types::DocumentModel;
use crate::{Result, ScanLayoutError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use docx::{DocxElement, DocxRenderer};
pub use heading::{LineClassifier, LineKind};
pub use text::{TextRenderer, render_text};
pub use xlsx::{Sheet, SheetRow, XlsxRenderer};

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Txt,
    Docx,
    Xlsx,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Txt, OutputFormat::Docx, OutputFormat::Xlsx];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Docx => "docx",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "text/plain",
            OutputFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            OutputFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ScanLayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(OutputFormat::Txt),
            "docx" | "word" => Ok(OutputFormat::Docx),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            other => Err(ScanLayoutError::validation(format!(
                "Unknown output format '{other}', expected txt, docx or xlsx"
            ))),
        }
    }
}

/// Serializes a document model to one output format.
pub trait Renderer: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// # Errors
    ///
    /// `RenderFailed` when the artifact cannot be serialized.
    fn render(&self, model: &DocumentModel) -> Result<Vec<u8>>;
}

/// The renderer for `format`.
pub fn renderer_for(format: OutputFormat, config: &RenderConfig) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Txt => Box::new(TextRenderer),
        OutputFormat::Docx => Box::new(DocxRenderer::new(config.clone())),
        OutputFormat::Xlsx => Box::new(XlsxRenderer),
    }
}

/// Artifact file name: `{id}_{stem}.{ext}`, where `stem` is the original file
/// name without directory and extension.
pub fn artifact_file_name(id: &str, original_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{id}_{stem}.{}", format.extension())
}

/// Render every requested format. Each entry carries its own result.
pub fn render_all(
    model: &DocumentModel,
    formats: &[OutputFormat],
    config: &RenderConfig,
) -> Vec<(OutputFormat, Result<Vec<u8>>)> {
    formats
        .iter()
        .map(|&format| {
            let result = renderer_for(format, config).render(model);
            if let Err(e) = &result {
                tracing::warn!(%format, error = %e, "Rendering failed");
            }
            (format, result)
        })
        .collect()
}

/// Render every requested format into `output_dir`, named by
/// [`artifact_file_name`]. A failing format does not stop the others.
pub fn write_artifacts(
    model: &DocumentModel,
    formats: &[OutputFormat],
    config: &RenderConfig,
    output_dir: &Path,
    id: &str,
    original_name: &str,
) -> Vec<(OutputFormat, Result<PathBuf>)> {
    render_all(model, formats, config)
        .into_iter()
        .map(|(format, rendered)| {
            let written = rendered.and_then(|bytes| {
                let path = output_dir.join(artifact_file_name(id, original_name, format));
                std::fs::write(&path, bytes).map_err(|e| {
                    ScanLayoutError::render_with_source(format.extension(), format!("cannot write {}", path.display()), e)
                })?;
                tracing::info!(%format, path = %path.display(), "Artifact written");
                Ok(path)
            });
            (format, written)
        })
        .collect()
}
