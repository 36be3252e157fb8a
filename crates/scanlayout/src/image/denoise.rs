use image::GrayImage;
use rayon::prelude::*;

/// Weights below this are treated as zero.
const MIN_WEIGHT: f32 = 0.001;

/// Non-local means denoising for single-channel images.
///
/// Every pixel is replaced by a weighted average of the pixels in its
/// `search_window` neighbourhood. A candidate's weight is
/// `exp(-d / strength^2)`, where `d` is the mean squared difference between
/// the `template_window` patches around the two pixels. Borders replicate.
///
/// Patch distances are computed one search offset at a time with running box
/// sums, so the cost is proportional to `search_window^2` per pixel rather than
/// `search_window^2 * template_window^2`.
pub fn non_local_means(gray: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || strength <= 0.0 {
        return gray.clone();
    }

    let w = width as usize;
    let h = height as usize;
    let tr = (template_window / 2) as i64;
    let sr = (search_window / 2) as i64;
    let area = ((2 * tr + 1) * (2 * tr + 1)) as u32;
    let lut = weight_table(strength);
    let src = gray.as_raw();

    let clamp_x = |x: i64| x.clamp(0, w as i64 - 1) as usize;
    let clamp_y = |y: i64| y.clamp(0, h as i64 - 1) as usize;

    let mut weight_sum = vec![0f32; w * h];
    let mut value_sum = vec![0f32; w * h];
    let mut row_sums = vec![0u32; w * h];
    let mut column = vec![0u32; w];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            // Horizontal template sums of the squared difference image.
            row_sums.par_chunks_mut(w).enumerate().for_each(|(y, out)| {
                let sy = clamp_y(y as i64 + dy);
                let diff = |x: i64| {
                    let a = i32::from(src[y * w + clamp_x(x)]);
                    let b = i32::from(src[sy * w + clamp_x(x + dx)]);
                    ((a - b) * (a - b)) as u32
                };
                let mut acc: u32 = (-tr..=tr).map(diff).sum();
                for (x, slot) in out.iter_mut().enumerate() {
                    *slot = acc;
                    let x = x as i64;
                    acc = acc + diff(x + tr + 1) - diff(x - tr);
                }
            });

            // Vertical pass with a running window per column.
            column.iter_mut().for_each(|c| *c = 0);
            for k in -tr..=tr {
                let row = clamp_y(k);
                for (c, v) in column.iter_mut().zip(&row_sums[row * w..(row + 1) * w]) {
                    *c += v;
                }
            }

            for y in 0..h {
                let sy = clamp_y(y as i64 + dy);
                for x in 0..w {
                    let distance = (column[x] / area) as usize;
                    if let Some(&weight) = lut.get(distance) {
                        let idx = y * w + x;
                        weight_sum[idx] += weight;
                        value_sum[idx] += weight * f32::from(src[sy * w + clamp_x(x as i64 + dx)]);
                    }
                }

                let enter = clamp_y(y as i64 + tr + 1);
                let leave = clamp_y(y as i64 - tr);
                for x in 0..w {
                    column[x] = column[x] + row_sums[enter * w + x] - row_sums[leave * w + x];
                }
            }
        }
    }

    let output = weight_sum
        .iter()
        .zip(&value_sum)
        .zip(src)
        .map(|((&ws, &vs), &orig)| {
            if ws > 0.0 {
                (vs / ws).round().clamp(0.0, 255.0) as u8
            } else {
                orig
            }
        })
        .collect();

    GrayImage::from_raw(width, height, output).unwrap_or_else(|| gray.clone())
}

/// `exp(-d / h^2)` for every mean squared patch distance `d` whose weight is
/// still significant.
fn weight_table(strength: f32) -> Vec<f32> {
    let h2 = strength * strength;
    let mut table = Vec::new();
    for d in 0..=(255 * 255) {
        let weight = (-(d as f32) / h2).exp();
        if weight < MIN_WEIGHT {
            break;
        }
        table.push(weight);
    }
    table
}
