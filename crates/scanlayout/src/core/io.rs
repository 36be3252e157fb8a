//! Input loading.
//!
//! Turns an input file into one image per page. Raster formats decode through
//! `image`; multi-frame TIFFs yield one page per frame; PDFs are rasterised
//! when the `pdf` feature is enabled. The page count is checked against the
//! configured ceiling before any page is decoded.

use crate::core::config::ScanConfig;
use crate::{Result, ScanLayoutError};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};

/// File extensions accepted as input, lower-case.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Whether the file extension is one the loader understands.
pub fn is_supported_input(path: impl AsRef<Path>) -> bool {
    extension_of(path.as_ref()).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Fail with `PageLimitExceeded` when `pages` is above `limit`.
pub fn check_page_limit(pages: usize, limit: usize) -> Result<()> {
    if pages > limit {
        return Err(ScanLayoutError::PageLimitExceeded { pages, limit });
    }
    Ok(())
}

/// Load every page of the file at `path`.
///
/// # Errors
///
/// - `Io` when the file cannot be read
/// - `UnreadableImage` for unsupported or undecodable input
/// - `PageLimitExceeded` when the document has more than `config.max_pages` pages
pub fn load_pages(path: impl AsRef<Path>, config: &ScanConfig) -> Result<Vec<DynamicImage>> {
    let path = path.as_ref();
    let extension = extension_of(path).unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ScanLayoutError::unreadable_image(format!(
            "Unsupported input type: {}",
            path.display()
        )));
    }

    let bytes = std::fs::read(path)?;
    let pages = load_pages_from_bytes(&bytes, &extension, config)?;
    tracing::info!(path = %path.display(), pages = pages.len(), "Loaded input");
    Ok(pages)
}

/// Load every page from in-memory bytes. `extension` selects the decoder.
pub fn load_pages_from_bytes(bytes: &[u8], extension: &str, config: &ScanConfig) -> Result<Vec<DynamicImage>> {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => load_pdf(bytes, config),
        "tif" | "tiff" => {
            let frames = tiff_frame_count(bytes)?;
            check_page_limit(frames, config.max_pages)?;
            decode_tiff_frames(bytes)
        }
        _ => {
            check_page_limit(1, config.max_pages)?;
            Ok(vec![image::load_from_memory(bytes)?])
        }
    }
}

#[cfg(feature = "pdf")]
fn load_pdf(bytes: &[u8], config: &ScanConfig) -> Result<Vec<DynamicImage>> {
    let rasterizer = crate::pdf::PdfRasterizer::new()?;
    check_page_limit(rasterizer.page_count(bytes)?, config.max_pages)?;
    Ok(rasterizer.render_pages(bytes, config.pdf_dpi)?)
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(_bytes: &[u8], _config: &ScanConfig) -> Result<Vec<DynamicImage>> {
    Err(ScanLayoutError::unreadable_image(
        "PDF input requires the `pdf` feature",
    ))
}

/// Number of frames in a TIFF file.
pub fn tiff_frame_count(bytes: &[u8]) -> Result<usize> {
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| ScanLayoutError::unreadable_image_with_source("TIFF decode failed", e))?;

    let mut count = 1;
    while decoder.more_images() {
        if decoder.next_image().is_err() {
            break;
        }
        count += 1;
    }
    Ok(count)
}

fn decode_tiff_frames(bytes: &[u8]) -> Result<Vec<DynamicImage>> {
    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| ScanLayoutError::unreadable_image_with_source("TIFF decode failed", e))?;

    let mut frames = Vec::new();
    loop {
        let index = frames.len();
        match decode_tiff_frame(&mut decoder) {
            Ok(frame) => frames.push(frame),
            // Layouts the frame converter does not cover still decode through
            // `image`, which only reads the first frame.
            Err(e) if index == 0 && !decoder.more_images() => {
                tracing::debug!(error = %e, "Falling back to single-frame TIFF decode");
                return Ok(vec![image::load_from_memory(bytes)?]);
            }
            Err(e) => return Err(e),
        }

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|e| {
            ScanLayoutError::unreadable_image_with_source(format!("TIFF frame {} unreadable", index + 2), e)
        })?;
    }
    Ok(frames)
}

fn decode_tiff_frame(decoder: &mut Decoder<Cursor<&[u8]>>) -> Result<DynamicImage> {
    let frame_error = |e: tiff::TiffError| ScanLayoutError::unreadable_image_with_source("TIFF frame unreadable", e);

    let (width, height) = decoder.dimensions().map_err(frame_error)?;
    let color = decoder.colortype().map_err(frame_error)?;
    let data = decoder.read_image().map_err(frame_error)?;

    let too_short = || ScanLayoutError::unreadable_image("TIFF frame data shorter than its dimensions");
    match (color, data) {
        (ColorType::Gray(8), DecodingResult::U8(buf)) => GrayImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(too_short),
        (ColorType::Gray(16), DecodingResult::U16(buf)) => ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf)
            .map(DynamicImage::ImageLuma16)
            .ok_or_else(too_short),
        (ColorType::RGB(8), DecodingResult::U8(buf)) => RgbImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(too_short),
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => RgbaImage::from_raw(width, height, buf)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(too_short),
        (color, _) => Err(ScanLayoutError::unreadable_image(format!(
            "Unsupported TIFF color type {color:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use tempfile::tempdir;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_supported_inputs() {
        assert!(is_supported_input("scan.PNG"));
        assert!(is_supported_input("a/b/c.tiff"));
        assert!(is_supported_input("doc.pdf"));
        assert!(!is_supported_input("notes.txt"));
        assert!(!is_supported_input("no_extension"));
    }

    #[test]
    fn test_page_limit() {
        assert!(check_page_limit(50, 50).is_ok());
        let err = check_page_limit(51, 50).unwrap_err();
        assert!(matches!(err, ScanLayoutError::PageLimitExceeded { pages: 51, limit: 50 }));
    }

    #[test]
    fn test_png_loads_as_single_page() {
        let image = DynamicImage::new_luma8(40, 30);
        let bytes = encode(&image, ImageFormat::Png);
        let pages = load_pages_from_bytes(&bytes, "png", &ScanConfig::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (40, 30));
    }

    #[test]
    fn test_single_frame_tiff() {
        let image = DynamicImage::new_luma8(32, 16);
        let bytes = encode(&image, ImageFormat::Tiff);
        assert_eq!(tiff_frame_count(&bytes).unwrap(), 1);
        let pages = load_pages_from_bytes(&bytes, "tif", &ScanConfig::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width(), 32);
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err = load_pages_from_bytes(b"definitely not an image", "png", &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanLayoutError::UnreadableImage { .. }));
    }

    #[test]
    fn test_zero_page_limit_rejects_image() {
        let config = ScanConfig {
            max_pages: 0,
            ..Default::default()
        };
        let bytes = encode(&DynamicImage::new_luma8(4, 4), ImageFormat::Png);
        let err = load_pages_from_bytes(&bytes, "png", &config).unwrap_err();
        assert!(matches!(err, ScanLayoutError::PageLimitExceeded { pages: 1, limit: 0 }));
    }

    #[test]
    fn test_unsupported_extension_rejected_before_reading() {
        let err = load_pages("missing.docx", &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanLayoutError::UnreadableImage { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_pages(dir.path().join("absent.png"), &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, ScanLayoutError::Io(_)));
    }
}
