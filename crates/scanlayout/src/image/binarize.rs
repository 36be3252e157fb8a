use image::GrayImage;
use rayon::prelude::*;

/// Adaptive binarization against the local mean.
///
/// Each pixel is compared with the mean of the `block_size` x `block_size`
/// window centred on it (clipped at the borders) minus `offset`. Brighter
/// pixels become white, the rest black.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let integral = integral_image(gray);
    let radius = block_size / 2;
    let row_len = width as usize;
    let mut output = vec![0u8; row_len * height as usize];

    output.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let y = y as u32;
        for (x, out) in row.iter_mut().enumerate() {
            let x = x as u32;
            let mean = region_mean(&integral, width, height, x, y, radius);
            let threshold = mean - f64::from(offset);
            let value = f64::from(gray.get_pixel(x, y).0[0]);
            *out = if value > threshold { 255 } else { 0 };
        }
    });

    GrayImage::from_raw(width, height, output).unwrap_or_else(|| gray.clone())
}

/// Inverse global threshold: pixels at or below `threshold` become foreground (255).
pub fn inverse_threshold(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut output = gray.clone();
    for pixel in output.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { 0 } else { 255 };
    }
    output
}

/// Summed-area table with a zero row and column, `(width + 1) * (height + 1)` entries.
pub(crate) fn integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += u64::from(gray.get_pixel(x, y).0[0]);
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

fn region_mean(integral: &[u64], width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = (width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(width as usize);
    let y2 = ((cy + radius + 1) as usize).min(height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64 - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
