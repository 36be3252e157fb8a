//! Ruled table detection.
//!
//! Ruling lines are long straight runs of ink. Opening the inverted page with a
//! wide horizontal and a tall vertical element removes text and keeps the
//! rulings. Every outer contour of the combined ruling mask that encloses
//! enough area is reported as a table region.

use crate::core::config::TableConfig;
use crate::image::inverse_threshold;
use crate::image::morphology::{keep_horizontal_runs, keep_vertical_runs, union};
use crate::types::TableRegion;
use image::{DynamicImage, GrayImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;

/// Find ruled table regions on a page, ordered top to bottom then left to right.
pub fn detect_tables(image: &DynamicImage, config: &TableConfig) -> Vec<TableRegion> {
    let gray = image.to_luma8();
    detect_tables_gray(&gray, config)
}

pub fn detect_tables_gray(gray: &GrayImage, config: &TableConfig) -> Vec<TableRegion> {
    let mask = ruling_mask(gray, config);

    let mut regions: Vec<TableRegion> = find_contours::<u32>(&mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| polygon_area(&c.points) > config.min_area)
        .filter_map(|c| bounding_rect(&c.points))
        .collect();

    regions.sort_by_key(|r| (r.y, r.x));
    tracing::debug!(tables = regions.len(), "Table regions detected");
    regions
}

/// Union of the horizontal and vertical ruling lines of a page.
pub fn ruling_mask(gray: &GrayImage, config: &TableConfig) -> GrayImage {
    let ink = inverse_threshold(gray, config.ink_threshold);
    let horizontal = keep_horizontal_runs(&ink, config.min_line_length);
    let vertical = keep_vertical_runs(&ink, config.min_line_length);
    union(&horizontal, &vertical)
}

/// Area enclosed by a closed contour (shoelace formula).
fn polygon_area(points: &[Point<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| f64::from(a.x) * f64::from(b.y) - f64::from(b.x) * f64::from(a.y))
        .sum();
    twice.abs() / 2.0
}

fn bounding_rect(points: &[Point<u32>]) -> Option<TableRegion> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(TableRegion::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn draw_grid(gray: &mut GrayImage, x: u32, y: u32, cols: &[u32], rows: &[u32]) {
        let width = *cols.last().unwrap();
        let height = *rows.last().unwrap();
        for &ry in rows {
            for dx in 0..=width {
                for t in 0..2 {
                    gray.put_pixel(x + dx, y + ry + t, Luma([0]));
                }
            }
        }
        for &cx in cols {
            for dy in 0..=height {
                for t in 0..2 {
                    gray.put_pixel(x + cx + t, y + dy, Luma([0]));
                }
            }
        }
    }

    #[test]
    fn test_blank_page_has_no_tables() {
        let gray = GrayImage::from_pixel(400, 400, Luma([255]));
        assert!(detect_tables_gray(&gray, &TableConfig::default()).is_empty());
    }

    #[test]
    fn test_single_grid_detected() {
        let mut gray = GrayImage::from_pixel(600, 500, Luma([255]));
        draw_grid(&mut gray, 100, 150, &[0, 200, 400], &[0, 50, 100, 150]);

        let regions = detect_tables_gray(&gray, &TableConfig::default());
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!((r.x, r.y), (100, 150));
        assert_eq!((r.width, r.height), (402, 152));
        assert!(r.rows.is_empty());
    }

    #[test]
    fn test_small_box_below_min_area_ignored() {
        let mut gray = GrayImage::from_pixel(300, 300, Luma([255]));
        draw_grid(&mut gray, 10, 10, &[0, 60], &[0, 60]);
        assert!(detect_tables_gray(&gray, &TableConfig::default()).is_empty());
    }

    #[test]
    fn test_text_is_not_a_table() {
        let mut gray = GrayImage::from_pixel(400, 200, Luma([255]));
        // Glyph-sized blobs in a row: short runs only.
        for i in 0..20 {
            for dx in 0..8 {
                for dy in 0..12 {
                    gray.put_pixel(20 + i * 15 + dx, 80 + dy, Luma([0]));
                }
            }
        }
        assert!(detect_tables_gray(&gray, &TableConfig::default()).is_empty());
    }

    #[test]
    fn test_two_tables_ordered_top_down() {
        let mut gray = GrayImage::from_pixel(700, 900, Luma([255]));
        draw_grid(&mut gray, 50, 600, &[0, 300], &[0, 40, 80]);
        draw_grid(&mut gray, 50, 100, &[0, 150, 300], &[0, 40, 80]);

        let regions = detect_tables_gray(&gray, &TableConfig::default());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].y, 100);
        assert_eq!(regions[1].y, 600);
    }

    #[test]
    fn test_polygon_area_square() {
        let square = [Point::new(0, 0), Point::new(10, 0), Point::new(10, 10), Point::new(0, 10)];
        assert_eq!(polygon_area(&square), 100.0);
    }
}
