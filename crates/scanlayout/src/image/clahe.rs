use image::{GrayImage, Luma};

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tiles` x `tiles` grid. Each tile gets its own
/// equalization lookup table built from a histogram clipped at
/// `clip_limit * tile_area / 256` with the excess spread evenly over all bins.
/// Output pixels blend the four surrounding tile tables bilinearly.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || tiles == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(tiles.min(width));
    let tile_h = height.div_ceil(tiles.min(height));
    // Rounding the tile size up can leave fewer tiles than requested.
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(gray, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as usize;

        // Position relative to tile centres.
        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = fx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = fy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let ax = (fx - tx0 as f32).clamp(0.0, 1.0);
        let ay = (fy - ty0 as f32).clamp(0.0, 1.0);

        let top = lut_at(tx0, ty0)[value] * (1.0 - ax) + lut_at(tx1, ty0)[value] * ax;
        let bottom = lut_at(tx0, ty1)[value] * (1.0 - ax) + lut_at(tx1, ty1)[value] * ax;
        let blended = top * (1.0 - ay) + bottom * ay;

        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [f32; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    let mut lut = [0f32; 256];
    if area == 0 {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as f32;
        }
        return lut;
    }

    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in histogram.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }

        let per_bin = excess / 256;
        let remainder = (excess % 256) as usize;
        for bin in histogram.iter_mut() {
            *bin += per_bin;
        }
        if remainder > 0 {
            let step = (256 / remainder).max(1);
            for i in (0..256).step_by(step).take(remainder) {
                histogram[i] += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut cumulative = 0u32;
    for (i, bin) in histogram.iter().enumerate() {
        cumulative += bin;
        lut[i] = (cumulative as f32 * scale).min(255.0);
    }
    lut
}
