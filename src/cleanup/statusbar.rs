use image::{GrayImage, RgbImage};

use crate::utils::{imgutils, math::Stats};

/// Regions shorter than this are not believable as a status bar.
pub const MIN_STATUS_BAR_HEIGHT: u32 = 20;

/// Fraction of rows at the bottom of the screen searched for the bar.
const SEARCH_WINDOW: f64 = 0.2;
/// Rows at either end of the search window excluded from peak finding.
const PEAK_GUARD: usize = 10;
/// Rows on each side of a candidate peak used as its local baseline.
const PEAK_BASELINE: usize = 5;
/// A row is a peak when it exceeds both baselines by this factor.
const PEAK_FACTOR: f64 = 1.5;
/// The detected bar never starts above this fraction of the height.
const START_CLAMP: f64 = 0.85;
/// Fallback bar height, as a fraction of the height and an absolute cap.
const FALLBACK_FRACTION: f64 = 0.15;
const FALLBACK_MAX_ROWS: u32 = 100;

/// A half-open row interval `[start_y, end_y)` believed to hold the status
/// bar. May be degenerate (empty) on images too small to contain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBarRegion {
    start_y: u32,
    end_y: u32,
}

impl StatusBarRegion {
    pub fn new(start_y: u32, end_y: u32) -> Self {
        assert!(start_y <= end_y);
        Self { start_y, end_y }
    }

    pub fn start_y(&self) -> u32 {
        self.start_y
    }

    pub fn end_y(&self) -> u32 {
        self.end_y
    }

    pub fn height(&self) -> u32 {
        self.end_y - self.start_y
    }

    pub fn is_present(&self) -> bool {
        self.height() >= MIN_STATUS_BAR_HEIGHT
    }
}

/// Locates the row band likely occupied by the status bar.
///
/// Strong horizontal edges (a vertical sobel response thresholded at one
/// standard deviation above its mean) are projected row-wise over the bottom
/// fifth of the screen. Two or more local peaks in that profile put the bar
/// at the second to last one; otherwise a fixed-size band at the very bottom
/// is assumed. Callers must treat regions under [`MIN_STATUS_BAR_HEIGHT`]
/// as "no bar found".
pub fn detect(img: &RgbImage) -> StatusBarRegion {
    let height = img.height();
    let gray = imgutils::grayscale(img);

    let gradient = vertical_gradient_magnitude(&gray);
    let mut stats = Stats::new();
    stats.extend(gradient.iter().map(|&g| g as f64));
    let edge_threshold = stats.mean() + stats.std_dev();

    let window_start = (height as f64 * (1.0 - SEARCH_WINDOW)) as u32;
    let projection = row_projection(&gradient, img.width(), window_start, height, edge_threshold);
    let peaks = find_peaks(&projection, window_start);

    let start_y = if peaks.len() >= 2 {
        peaks[peaks.len() - 2].max((height as f64 * START_CLAMP) as u32)
    } else {
        height - FALLBACK_MAX_ROWS.min((height as f64 * FALLBACK_FRACTION) as u32)
    };

    StatusBarRegion::new(start_y.min(height), height)
}

/// Absolute response of a 3x3 vertical sobel kernel, row-major. Border rows
/// and columns are left at zero.
fn vertical_gradient_magnitude(gray: &GrayImage) -> Vec<u16> {
    let (width, height) = gray.dimensions();
    let mut out = vec![0u16; (width * height) as usize];
    if width < 3 || height < 3 {
        return out;
    }

    let at = |x: u32, y: u32| -> i32 { gray.get_pixel(x, y)[0] as i32 };
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let below = at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1);
            let above = at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1);
            out[(y * width + x) as usize] = (below - above).unsigned_abs() as u16;
        }
    }
    out
}

/// Counts edge pixels per row over the rows `[from, to)`.
fn row_projection(gradient: &[u16], width: u32, from: u32, to: u32, threshold: f64) -> Vec<u32> {
    (from..to)
        .map(|y| {
            (0..width)
                .filter(|x| gradient[(y * width + x) as usize] as f64 > threshold)
                .count() as u32
        })
        .collect()
}

/// Local peaks in the projection profile, as absolute row numbers.
fn find_peaks(projection: &[u32], window_start: u32) -> Vec<u32> {
    let n = projection.len();
    if n <= 2 * PEAK_GUARD {
        return vec![];
    }

    let mean_of = |range: std::ops::Range<usize>| -> f64 {
        let len = range.len();
        projection[range].iter().sum::<u32>() as f64 / len as f64
    };

    (PEAK_GUARD..n - PEAK_GUARD)
        .filter(|&i| {
            let value = projection[i] as f64;
            value > mean_of(i - PEAK_BASELINE..i) * PEAK_FACTOR
                && value > mean_of(i + 1..i + 1 + PEAK_BASELINE) * PEAK_FACTOR
        })
        .map(|i| window_start + i as u32)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::imgutils::filled;

    fn with_bar(width: u32, height: u32, bar_top: u32) -> RgbImage {
        let mut img = filled(width, height, 250, 250, 250);
        for y in bar_top..height {
            for x in 0..width {
                img.put_pixel(x, y, image::Rgb([60, 60, 60]));
            }
        }
        img
    }

    #[test]
    fn finds_synthetic_bar_within_tolerance() {
        let img = with_bar(200, 400, 352);
        let region = detect(&img);

        assert!(region.is_present());
        assert_eq!(400, region.end_y());
        assert!(region.start_y() >= 320, "start {} too high", region.start_y());
        let err = (region.height() as i64 - 48).abs();
        assert!(err <= 16, "height {} too far from 48", region.height());
    }

    #[test]
    fn uniform_image_takes_fallback_region() {
        let img = filled(200, 400, 128, 128, 128);
        let region = detect(&img);

        // No edges at all, so the fixed bottom band is assumed.
        assert_eq!(StatusBarRegion::new(340, 400), region);
        assert!(region.is_present());
    }

    #[test]
    fn tiny_image_yields_degenerate_region() {
        let img = filled(10, 10, 0, 0, 0);
        let region = detect(&img);

        assert!(!region.is_present());
        assert!(region.height() < MIN_STATUS_BAR_HEIGHT);
    }

    #[test]
    fn region_invariants() {
        let r = StatusBarRegion::new(5, 5);
        assert_eq!(0, r.height());
        assert!(!r.is_present());

        let r = StatusBarRegion::new(0, MIN_STATUS_BAR_HEIGHT);
        assert!(r.is_present());
    }
}
