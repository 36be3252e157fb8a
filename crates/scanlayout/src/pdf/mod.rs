//! PDF rasterisation through pdfium.
//!
//! Scanned PDFs are image containers: each page is rendered to a bitmap at a
//! fixed resolution and then handled exactly like a raster input.

use image::DynamicImage;
use pdfium_render::prelude::*;
use thiserror::Error;

const PDF_POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, Error)]
pub enum PdfError {
    #[error("Pdfium library unavailable: {0}")]
    LibraryUnavailable(String),
    #[error("PDF is password-protected")]
    PasswordRequired,
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),
    #[error("Page {0} not found")]
    PageNotFound(usize),
    #[error("Page rendering failed: {0}")]
    RenderingFailed(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Renders PDF pages to images.
pub struct PdfRasterizer {
    pdfium: Pdfium,
}

impl PdfRasterizer {
    /// Bind to a pdfium library next to the executable, falling back to the
    /// system library.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::LibraryUnavailable(e.to_string()))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn load<'a>(&'a self, bytes: &'a [u8]) -> Result<PdfDocument<'a>> {
        self.pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
            let message = e.to_string();
            if message.to_lowercase().contains("password") {
                PdfError::PasswordRequired
            } else {
                PdfError::InvalidPdf(message)
            }
        })
    }

    /// Number of pages, without rendering anything.
    pub fn page_count(&self, bytes: &[u8]) -> Result<usize> {
        let document = self.load(bytes)?;
        Ok(usize::from(document.pages().len()))
    }

    /// Render every page at `dpi`.
    pub fn render_pages(&self, bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let document = self.load(bytes)?;
        let scale = dpi as f32 / PDF_POINTS_PER_INCH;

        let mut images = Vec::with_capacity(usize::from(document.pages().len()));
        for (index, page) in document.pages().iter().enumerate() {
            let config = PdfRenderConfig::new()
                .set_target_width(((page.width().value * scale) as i32).max(1))
                .set_target_height(((page.height().value * scale) as i32).max(1))
                .rotate_if_landscape(PdfPageRenderRotation::None, false);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| PdfError::RenderingFailed(format!("page {}: {}", index + 1, e)))?;
            images.push(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()));
        }

        tracing::debug!(pages = images.len(), dpi, "Rasterised PDF");
        Ok(images)
    }
}
