//! Line segment extraction from an edge map.
//!
//! imageproc only offers the standard Hough transform, which yields infinite
//! lines. Skew estimation needs finite segments with a length and gap policy,
//! so this module runs the accumulator itself and then walks each strong line
//! through the edge map, splitting it at gaps and consuming the pixels of every
//! accepted segment so that neighbouring bins do not report it twice.

use image::GrayImage;

/// Parameters of the segment search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    /// Minimum accumulator votes for a line to be walked.
    pub threshold: u32,
    /// Segments shorter than this are dropped.
    pub min_line_length: f32,
    /// Largest run of missing pixels bridged inside one segment.
    pub max_line_gap: u32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            threshold: 100,
            min_line_length: 100.0,
            max_line_gap: 10,
        }
    }
}

/// A detected straight segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (f32, f32),
    pub end: (f32, f32),
    /// Direction in degrees in `(-90, 90]`, fitted to the supporting pixels.
    pub angle: f64,
}

impl LineSegment {
    pub fn length(&self) -> f32 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }
}

const THETA_BINS: usize = 180;

/// Find straight segments among the non-zero pixels of `edges`.
pub fn detect_segments(edges: &GrayImage, params: &SegmentParams) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let points: Vec<(i32, i32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| (x as i32, y as i32))
        .collect();
    if points.is_empty() {
        return Vec::new();
    }

    let trig: Vec<(f32, f32)> = (0..THETA_BINS)
        .map(|t| {
            let theta = (t as f32).to_radians();
            (theta.cos(), theta.sin())
        })
        .collect();

    let max_rho = ((w * w + h * h) as f32).sqrt().ceil() as i32;
    let rho_bins = (2 * max_rho + 1) as usize;
    let mut accumulator = vec![0u32; THETA_BINS * rho_bins];

    for &(x, y) in &points {
        for (t, &(cos, sin)) in trig.iter().enumerate() {
            let rho = (x as f32 * cos + y as f32 * sin).round() as i32 + max_rho;
            accumulator[t * rho_bins + rho as usize] += 1;
        }
    }

    let mut candidates = Vec::new();
    for t in 0..THETA_BINS {
        for r in 0..rho_bins {
            let votes = accumulator[t * rho_bins + r];
            if votes >= params.threshold && is_local_max(&accumulator, rho_bins, t, r, votes) {
                candidates.push((votes, t, r));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut consumed = vec![false; w * h];
    let is_edge = |x: i32, y: i32| {
        x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && edges.get_pixel(x as u32, y as u32).0[0] > 0
    };

    let mut segments = Vec::new();
    for (_, t, r) in candidates {
        let (cos, sin) = trig[t];
        let rho = r as f32 - max_rho as f32;
        let base = (rho * cos, rho * sin);
        let direction = (-sin, cos);

        let mut run: Vec<(i32, i32)> = Vec::new();
        let mut gap = 0u32;

        for step in -max_rho..=max_rho {
            let fx = base.0 + step as f32 * direction.0;
            let fy = base.1 + step as f32 * direction.1;

            let mut hit = None;
            for offset in [0.0f32, -1.0, 1.0] {
                let px = (fx + offset * cos).round() as i32;
                let py = (fy + offset * sin).round() as i32;
                if is_edge(px, py) && !consumed[py as usize * w + px as usize] {
                    hit = Some((px, py));
                    break;
                }
            }

            match hit {
                Some(p) => {
                    if run.last() != Some(&p) {
                        run.push(p);
                    }
                    gap = 0;
                }
                None if !run.is_empty() => {
                    gap += 1;
                    if gap > params.max_line_gap {
                        accept_run(&mut run, params, &mut consumed, w, &mut segments);
                        gap = 0;
                    }
                }
                None => {}
            }
        }
        accept_run(&mut run, params, &mut consumed, w, &mut segments);
    }

    segments
}

fn is_local_max(accumulator: &[u32], rho_bins: usize, t: usize, r: usize, votes: u32) -> bool {
    for dt in [-1i64, 0, 1] {
        for dr in [-1i64, 0, 1] {
            if dt == 0 && dr == 0 {
                continue;
            }
            let nt = (t as i64 + dt).rem_euclid(THETA_BINS as i64) as usize;
            let nr = r as i64 + dr;
            if nr < 0 || nr >= rho_bins as i64 {
                continue;
            }
            let neighbour = accumulator[nt * rho_bins + nr as usize];
            // Ties go to the earlier bin so plateaus yield one candidate.
            let earlier = (dt, dr) < (0, 0);
            if neighbour > votes || (neighbour == votes && earlier) {
                return false;
            }
        }
    }
    true
}

fn accept_run(
    run: &mut Vec<(i32, i32)>,
    params: &SegmentParams,
    consumed: &mut [bool],
    width: usize,
    segments: &mut Vec<LineSegment>,
) {
    if run.len() >= 2 {
        let first = run[0];
        let last = run[run.len() - 1];
        let dx = (last.0 - first.0) as f32;
        let dy = (last.1 - first.1) as f32;
        if (dx * dx + dy * dy).sqrt() >= params.min_line_length {
            for &(x, y) in run.iter() {
                consumed[y as usize * width + x as usize] = true;
            }
            let (start, end) = if first.0 <= last.0 { (first, last) } else { (last, first) };
            segments.push(LineSegment {
                start: (start.0 as f32, start.1 as f32),
                end: (end.0 as f32, end.1 as f32),
                angle: principal_angle(run),
            });
        }
    }
    run.clear();
}

/// Orientation of the principal axis of a point cloud, in degrees in `(-90, 90]`.
fn principal_angle(points: &[(i32, i32)]) -> f64 {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + f64::from(x), sy + f64::from(y)));
    let (mx, my) = (sx / n, sy / n);

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let dx = f64::from(x) - mx;
        let dy = f64::from(y) - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let angle = 0.5 * (2.0 * sxy).atan2(sxx - syy).to_degrees();
    if angle <= -90.0 { angle + 180.0 } else { angle }
}
