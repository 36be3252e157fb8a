//! Image normalization for recognition.
//!
//! [`normalize`] turns an arbitrary page image into a deskewed black-on-white
//! binary image. [`resize_for_ocr`] brings the page into the size range the
//! recognizer works best at and runs before normalization. The building blocks
//! are exposed for callers that need a subset, e.g. only skew estimation.
pub mod binarize;
pub mod clahe;
pub mod denoise;
pub mod deskew;
pub mod hough;
pub mod morphology;
pub mod normalize;
pub mod resize;

pub use binarize::{adaptive_mean_threshold, inverse_threshold};
pub use clahe::clahe;
pub use denoise::non_local_means;
pub use deskew::{DeskewParams, SkewEstimate, deskew, estimate_skew, fold_angle, rotate_about_center};
pub use hough::{LineSegment, SegmentParams, detect_segments};
pub use normalize::normalize;
pub use resize::{MAX_OCR_DIMENSION, MIN_OCR_DIMENSION, ocr_scale_factor, resize_for_ocr};
