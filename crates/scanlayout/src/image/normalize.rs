use super::binarize::adaptive_mean_threshold;
use super::clahe::clahe;
use super::denoise::non_local_means;
use super::deskew::{DeskewParams, deskew};
use super::morphology::close_2x2;
use crate::core::config::NormalizeConfig;
use image::{DynamicImage, GrayImage};
use imageproc::filter::{filter3x3, median_filter};

/// High-pass kernel restoring stroke edges softened by denoising.
const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// Prepare a page image for recognition.
///
/// Deterministic and free of external state. The steps always run in this
/// order: grayscale, local contrast equalization, non-local means denoising,
/// sharpening, adaptive binarization, a 2x2 closing, skew correction and a
/// final median filter. Denoising and skew correction can be switched off in
/// `config`; everything else always runs.
pub fn normalize(image: &DynamicImage, config: &NormalizeConfig) -> GrayImage {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    tracing::debug!(width, height, "Normalizing page image");

    let equalized = clahe(&gray, config.clahe_clip_limit, config.clahe_tiles);

    let denoised = if config.denoise {
        non_local_means(
            &equalized,
            config.denoise_strength,
            config.denoise_template_window,
            config.denoise_search_window,
        )
    } else {
        equalized
    };

    let sharpened: GrayImage = filter3x3(&denoised, &SHARPEN_KERNEL);
    let binary = adaptive_mean_threshold(&sharpened, config.threshold_block_size, config.threshold_offset);
    let closed = close_2x2(&binary);

    let straightened = if config.deskew {
        deskew(&closed, &DeskewParams::from(config))
    } else {
        closed
    };

    if config.median_radius > 0 {
        median_filter(&straightened, config.median_radius, config.median_radius)
    } else {
        straightened
    }
}
