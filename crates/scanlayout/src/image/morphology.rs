//! Morphology with non-square structuring elements: a 2x2 closing anchored at
//! its bottom-right cell and openings with 1-pixel-thick line elements.
//!
//! `imageproc::morphology` offers norm-ball and `Mask` elements, but a mask
//! opening costs the element length per pixel. The run filters below visit
//! each pixel once whatever the configured ruling length.

use image::GrayImage;

/// Grayscale closing with a 2x2 square element anchored at its bottom-right
/// cell: a max over `(x-1..=x, y-1..=y)` followed by a min over `(x..=x+1, y..=y+1)`.
///
/// Fills dark gaps narrower than two pixels.
pub fn close_2x2(gray: &GrayImage) -> GrayImage {
    let dilated = window_2x2(gray, -1, u8::max);
    window_2x2(&dilated, 1, u8::min)
}

fn window_2x2(gray: &GrayImage, step: i64, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = gray.dimensions();
    let clamp = |v: i64, max: u32| v.clamp(0, i64::from(max) - 1) as u32;

    GrayImage::from_fn(width, height, |x, y| {
        let x2 = clamp(i64::from(x) + step, width);
        let y2 = clamp(i64::from(y) + step, height);
        let a = gray.get_pixel(x, y).0[0];
        let b = gray.get_pixel(x2, y).0[0];
        let c = gray.get_pixel(x, y2).0[0];
        let d = gray.get_pixel(x2, y2).0[0];
        image::Luma([pick(pick(a, b), pick(c, d))])
    })
}

/// Binary opening with a `length` x 1 element: keeps only horizontal
/// foreground runs at least `length` pixels long.
pub fn keep_horizontal_runs(mask: &GrayImage, length: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        let mut run_start = None;
        for x in 0..=width {
            let on = x < width && mask.get_pixel(x, y).0[0] > 0;
            match (on, run_start) {
                (true, None) => run_start = Some(x),
                (false, Some(start)) => {
                    if x - start >= length {
                        for rx in start..x {
                            output.put_pixel(rx, y, image::Luma([255]));
                        }
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    output
}

/// Binary opening with a 1 x `length` element: keeps only vertical
/// foreground runs at least `length` pixels long.
pub fn keep_vertical_runs(mask: &GrayImage, length: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut output = GrayImage::new(width, height);

    for x in 0..width {
        let mut run_start = None;
        for y in 0..=height {
            let on = y < height && mask.get_pixel(x, y).0[0] > 0;
            match (on, run_start) {
                (true, None) => run_start = Some(y),
                (false, Some(start)) => {
                    if y - start >= length {
                        for ry in start..y {
                            output.put_pixel(x, ry, image::Luma([255]));
                        }
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    output
}

/// Pixelwise saturating sum of two masks of equal size.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut output = a.clone();
    for (out, other) in output.pixels_mut().zip(b.pixels()) {
        out.0[0] = out.0[0].saturating_add(other.0[0]);
    }
    output
}
