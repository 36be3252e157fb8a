//! The per-page pipeline.
//!
//! One page runs strictly in order: resize, normalize, recognize, detect
//! tables, build layout, extract table cells, assemble the page. Nothing here
//! touches another page's state, so pages can run on any worker.

use crate::core::config::ScanConfig;
use crate::core::document::build_page;
use crate::image::{normalize, resize_for_ocr};
use crate::layout::{build_blocks, detect_tables, extract_table};
use crate::ocr::{Recognizer, resolve_language};
use crate::types::Page;
use crate::Result;
use image::DynamicImage;

/// Run the full pipeline on one page image.
///
/// `page_number` is 1-based. Table detection works on the resized page
/// before normalization, where ruling lines are still intact, and table crops
/// are taken from the same image.
///
/// # Errors
///
/// `RecognitionFailed` tagged with `page_number` when the full-page
/// recognition call fails. Table crop failures only drop that table.
pub fn process_page(
    recognizer: &dyn Recognizer,
    image: DynamicImage,
    page_number: usize,
    config: &ScanConfig,
) -> Result<Page> {
    let span = tracing::info_span!("page", page = page_number);
    let _guard = span.enter();

    let language = resolve_language(&config.language);

    let resized = resize_for_ocr(image)?;
    let normalized = DynamicImage::ImageLuma8(normalize(&resized, &config.normalize));

    let recognition = recognizer
        .recognize(&normalized, language, &config.recognizer.page)
        .map_err(|e| e.with_page(page_number))?;
    tracing::debug!(
        recognizer = recognizer.name(),
        tokens = recognition.tokens.len(),
        "Page recognized"
    );

    let regions = if config.tables.enabled {
        detect_tables(&resized, &config.tables)
    } else {
        Vec::new()
    };

    let blocks = build_blocks(&recognition.tokens);

    let tables = regions
        .into_iter()
        .map(|region| {
            extract_table(
                recognizer,
                &resized,
                region,
                language,
                &config.recognizer.table,
                &config.tables,
            )
        })
        .collect();

    let page = build_page(page_number, recognition.transcription, blocks, tables);
    tracing::debug!(blocks = page.blocks.len(), tables = page.tables.len(), "Page built");
    Ok(page)
}
