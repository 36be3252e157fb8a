use crate::{Result, ScanLayoutError};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, RgbImage};

/// Images with a side below this are upscaled.
pub const MIN_OCR_DIMENSION: u32 = 1000;
/// Images with a side above this are downscaled.
pub const MAX_OCR_DIMENSION: u32 = 4000;

const UPSCALE_FACTOR: f64 = 2.0;
const DOWNSCALE_FACTOR: f64 = 0.75;

/// Scale factor that brings a page into the recognizer's preferred size range,
/// or `None` when no resize is needed.
pub fn ocr_scale_factor(width: u32, height: u32) -> Option<f64> {
    if width < MIN_OCR_DIMENSION || height < MIN_OCR_DIMENSION {
        Some(UPSCALE_FACTOR)
    } else if width > MAX_OCR_DIMENSION || height > MAX_OCR_DIMENSION {
        Some(DOWNSCALE_FACTOR)
    } else {
        None
    }
}

/// Resize a page for recognition.
///
/// Small pages are doubled with cubic interpolation, very large pages are
/// shrunk to three quarters with area averaging, anything else is returned
/// as is. Target sizes truncate toward zero.
pub fn resize_for_ocr(image: DynamicImage) -> Result<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    let Some(factor) = ocr_scale_factor(width, height) else {
        return Ok(image);
    };

    let new_width = ((f64::from(width) * factor) as u32).max(1);
    let new_height = ((f64::from(height) * factor) as u32).max(1);
    let filter = if factor > 1.0 { FilterType::CatmullRom } else { FilterType::Box };

    tracing::debug!(width, height, new_width, new_height, factor, "Resizing page for recognition");

    let resized = match image {
        DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(resize_gray(&gray, new_width, new_height, filter)?),
        other => {
            let rgb = other.to_rgb8();
            DynamicImage::ImageRgb8(resize_rgb(&rgb, new_width, new_height, filter)?)
        }
    };
    Ok(resized)
}

fn resize_gray(gray: &GrayImage, width: u32, height: u32, filter: FilterType) -> Result<GrayImage> {
    let buffer = resize_buffer(gray.as_raw().clone(), gray.dimensions(), (width, height), PixelType::U8, filter)?;
    GrayImage::from_raw(width, height, buffer)
        .ok_or_else(|| ScanLayoutError::unreadable_image("Resized buffer has unexpected size"))
}

fn resize_rgb(rgb: &RgbImage, width: u32, height: u32, filter: FilterType) -> Result<RgbImage> {
    let buffer = resize_buffer(rgb.as_raw().clone(), rgb.dimensions(), (width, height), PixelType::U8x3, filter)?;
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ScanLayoutError::unreadable_image("Resized buffer has unexpected size"))
}

fn resize_buffer(
    buffer: Vec<u8>,
    (src_width, src_height): (u32, u32),
    (dst_width, dst_height): (u32, u32),
    pixel_type: PixelType,
    filter: FilterType,
) -> Result<Vec<u8>> {
    let src = Image::from_vec_u8(src_width, src_height, buffer, pixel_type)
        .map_err(|e| ScanLayoutError::unreadable_image_with_source("Invalid image buffer for resize", e))?;
    let mut dst = Image::new(dst_width, dst_height, pixel_type);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(filter));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| ScanLayoutError::unreadable_image_with_source("Resize failed", e))?;

    Ok(dst.into_vec())
}
