//! Image normalization: skew correction and resolution normalization on
//! synthetic pages.

mod helpers;

use helpers::{blank_page, draw_bars, test_config};
use image::DynamicImage;
use scanlayout::image::{DeskewParams, deskew, estimate_skew, normalize, resize_for_ocr, rotate_about_center};

/// Ten long bars rotated by `degrees` about the page centre.
fn skewed_page(degrees: f64) -> image::GrayImage {
    let mut page = blank_page(1200, 1200);
    draw_bars(&mut page, 200, 250, 800, 10, 70, 6);
    rotate_about_center(&page, degrees)
}

#[test]
fn test_known_rotation_is_measured() {
    let page = skewed_page(10.0);
    let estimate = estimate_skew(&page, &DeskewParams::default()).expect("enough segments on a ruled page");
    assert!(estimate.segment_count >= 6);
    assert!(
        (estimate.angle - 10.0).abs() <= 1.0,
        "estimated {} degrees",
        estimate.angle
    );
}

#[test]
fn test_correction_removes_skew() {
    let params = DeskewParams::default();
    let corrected = deskew(&skewed_page(10.0), &params);

    // Ten bars give twenty ruling edges, well above the segment minimum.
    let residual = estimate_skew(&corrected, &params).expect("corrected page keeps its rulings");
    assert!(residual.segment_count >= params.min_segments);
    assert!(
        residual.angle.abs() < 0.3,
        "residual {} degrees",
        residual.angle
    );
}

#[test]
fn test_opposite_rotation_is_measured() {
    let page = skewed_page(-4.0);
    let estimate = estimate_skew(&page, &DeskewParams::default()).unwrap();
    assert!((estimate.angle + 4.0).abs() <= 1.0, "estimated {} degrees", estimate.angle);
}

#[test]
fn test_sparse_segments_leave_page_untouched() {
    let mut page = blank_page(1200, 1200);
    draw_bars(&mut page, 300, 500, 600, 1, 0, 6);
    let page = rotate_about_center(&page, 7.0);

    let params = DeskewParams::default();
    assert!(estimate_skew(&page, &params).is_none());
    assert_eq!(deskew(&page, &params), page);
}

#[test]
fn test_small_skew_below_threshold_is_ignored() {
    let mut page = blank_page(1200, 1200);
    draw_bars(&mut page, 200, 250, 800, 10, 70, 6);
    assert_eq!(deskew(&page, &DeskewParams::default()), page);
}

#[test]
fn test_resize_upscales_small_pages() {
    let resized = resize_for_ocr(DynamicImage::ImageLuma8(blank_page(500, 500))).unwrap();
    assert_eq!((resized.width(), resized.height()), (1000, 1000));
}

#[test]
fn test_resize_downscales_large_pages() {
    let resized = resize_for_ocr(DynamicImage::ImageLuma8(blank_page(5000, 5000))).unwrap();
    assert_eq!((resized.width(), resized.height()), (3750, 3750));
}

#[test]
fn test_resize_is_idempotent_in_range() {
    let page = DynamicImage::ImageLuma8(blank_page(1240, 1754));
    let once = resize_for_ocr(page.clone()).unwrap();
    let twice = resize_for_ocr(once.clone()).unwrap();
    assert_eq!(once, page);
    assert_eq!(twice, once);
}

#[test]
fn test_normalize_keeps_size_and_binarizes_straight_page() {
    let mut page = blank_page(1100, 1000);
    draw_bars(&mut page, 100, 100, 700, 5, 80, 4);
    let normalized = normalize(&DynamicImage::ImageLuma8(page), &test_config().normalize);

    assert_eq!(normalized.dimensions(), (1100, 1000));
    assert!(normalized.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    // The bars survive as ink.
    assert_eq!(normalized.get_pixel(400, 101).0[0], 0);
    assert_eq!(normalized.get_pixel(400, 50).0[0], 255);
}

#[test]
fn test_normalize_converts_color_input() {
    let rgb = DynamicImage::ImageLuma8(blank_page(300, 200)).to_rgb8();
    let normalized = normalize(&DynamicImage::ImageRgb8(rgb), &test_config().normalize);
    assert_eq!(normalized.dimensions(), (300, 200));
}
