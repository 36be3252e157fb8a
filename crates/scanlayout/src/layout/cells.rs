//! Table cell extraction.
//!
//! Each detected region is cropped from the page and recognized on its own.
//! The returned tokens are grouped into rows by fixed-height vertical bins and
//! ordered left to right inside a row. Nothing in here fails: a recognizer
//! error or a table with too few rows simply produces no rows.

use crate::core::config::TableConfig;
use crate::ocr::{Recognizer, RecognizerConfig};
use crate::types::{TableRegion, TableRow, Token};
use image::DynamicImage;
use std::collections::BTreeMap;

/// Group tokens into table rows.
///
/// Tokens are filtered like layout tokens, binned by `top / row_bin_height`
/// and sorted by `left` within a bin. Bins become rows in ascending order.
/// Fewer than `min_rows` rows yields an empty result.
pub fn extract_cells(tokens: &[Token], row_bin_height: u32, min_rows: usize) -> Vec<TableRow> {
    let bin_height = i64::from(row_bin_height.max(1));
    let mut bins: BTreeMap<i64, Vec<&Token>> = BTreeMap::new();

    for token in tokens.iter().filter(|t| t.is_retained()) {
        let key = i64::from(token.top).div_euclid(bin_height);
        bins.entry(key).or_default().push(token);
    }

    let rows: Vec<TableRow> = bins
        .into_values()
        .map(|mut cells| {
            cells.sort_by_key(|t| t.left);
            cells.into_iter().map(|t| t.text.trim().to_string()).collect()
        })
        .collect();

    if rows.len() < min_rows.max(1) {
        return Vec::new();
    }
    rows
}

/// Crop `region` out of `page`, recognize it and fill in its rows.
///
/// The returned region has no rows when recognition fails or too few rows
/// are found.
pub fn extract_table(
    recognizer: &dyn Recognizer,
    page: &DynamicImage,
    mut region: TableRegion,
    language: &str,
    recognizer_config: &RecognizerConfig,
    config: &TableConfig,
) -> TableRegion {
    region.rows = Vec::new();

    let Some(crop) = crop_region(page, &region) else {
        tracing::debug!(?region, "Table region outside page bounds");
        return region;
    };

    match recognizer.recognize(&crop, language, recognizer_config) {
        Ok(recognition) => {
            region.rows = extract_cells(&recognition.tokens, config.row_bin_height, config.min_rows);
        }
        Err(e) => {
            tracing::warn!(
                x = region.x,
                y = region.y,
                error = %e,
                "Table crop recognition failed, keeping page without this table"
            );
        }
    }
    region
}

fn crop_region(page: &DynamicImage, region: &TableRegion) -> Option<DynamicImage> {
    if region.x >= page.width() || region.y >= page.height() {
        return None;
    }
    let width = region.width.min(page.width() - region.x);
    let height = region.height.min(page.height() - region.y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(page.crop_imm(region.x, region.y, width, height))
}
