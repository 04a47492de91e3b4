use std::collections::VecDeque;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::contrast::otsu_level;

use super::statusbar::StatusBarRegion;
use crate::utils::imgutils::{self, BLACK};

/// Window radius for sampling known pixels around a masked one.
pub const DEFAULT_INPAINT_RADIUS: u32 = 3;

/// Rows sampled immediately above the status bar by the fallback fill.
const SAMPLE_BAND_ROWS: u32 = 30;

#[derive(Debug, thiserror::Error)]
pub enum InpaintError {
    #[error("mask is {mask:?} but the image is {image:?}")]
    MaskMismatch { image: (u32, u32), mask: (u32, u32) },
    #[error("the mask covers the whole image, no pixels left to sample")]
    NothingKnown,
    #[error("no rows above the status bar to sample a background from")]
    NoSampleBand,
}

/// Fills masked pixels with plausible background texture.
///
/// Masked pixels are visited in order of increasing distance from the
/// nearest unmasked pixel, marching the known boundary inward. Each is
/// filled with the inverse-distance weighted average of the known pixels
/// inside the `radius` window, so already filled pixels feed the ones
/// behind them and gradients continue into the hole.
pub fn inpaint(image: &RgbImage, mask: &GrayImage, radius: u32) -> Result<RgbImage, InpaintError> {
    if image.dimensions() != mask.dimensions() {
        return Err(InpaintError::MaskMismatch {
            image: image.dimensions(),
            mask: mask.dimensions(),
        });
    }

    let (width, height) = image.dimensions();
    let idx = |x: u32, y: u32| (y * width + x) as usize;

    let mut known: Vec<bool> = mask.pixels().map(|p| p[0] == BLACK).collect();
    if known.iter().all(|&k| k) {
        return Ok(image.clone());
    }
    if !known.iter().any(|&k| k) {
        return Err(InpaintError::NothingKnown);
    }

    let radius = radius.max(1) as i64;
    let mut out = image.clone();

    // Multi-source BFS from the known boundary, FIFO order keeps distances
    // nondecreasing.
    let mut queued = vec![false; known.len()];
    let mut queue: VecDeque<(u32, u32)> = VecDeque::new();
    for y in 0..height {
        for x in 0..width {
            if !known[idx(x, y)] && has_known_neighbor(&known, width, height, x, y) {
                queued[idx(x, y)] = true;
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let mut weight_sum = 0.0f64;
        let mut acc = [0.0f64; 3];
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if !known[idx(nx, ny)] {
                    continue;
                }
                let weight = 1.0 / (1.0 + (dx * dx + dy * dy) as f64);
                let pixel = out.get_pixel(nx, ny);
                for c in 0..3 {
                    acc[c] += weight * pixel[c] as f64;
                }
                weight_sum += weight;
            }
        }

        // Queued pixels always have a known 4-neighbor, so the window is
        // never empty.
        let mut filled = [0u8; 3];
        for c in 0..3 {
            filled[c] = (acc[c] / weight_sum).round().min(255.0) as u8;
        }
        out.put_pixel(x, y, Rgb(filled));
        known[idx(x, y)] = true;

        for (nx, ny) in neighbors4(width, height, x, y) {
            if !known[idx(nx, ny)] && !queued[idx(nx, ny)] {
                queued[idx(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    Ok(out)
}

/// Flat-fill fallback for when the texture fill is not possible: sample the
/// average color of a band above the bar, find presumed dark glyphs with an
/// otsu threshold, and paint them over with the sampled color.
pub fn fallback_fill(
    image: &RgbImage,
    region: &StatusBarRegion,
) -> Result<RgbImage, InpaintError> {
    if region.start_y() == 0 {
        return Err(InpaintError::NoSampleBand);
    }

    let sample_start = region.start_y().saturating_sub(SAMPLE_BAND_ROWS);
    let sample = imgutils::crop_rows(image, sample_start, region.start_y());
    let background = imgutils::average_color(&sample);

    let band = imgutils::crop_rows(image, region.start_y(), region.end_y());
    let gray = imgutils::grayscale(&band);
    let level = otsu_level(&gray);

    let mut out = image.clone();
    for (x, y, p) in gray.enumerate_pixels() {
        if p[0] <= level {
            out.put_pixel(x, y + region.start_y(), background);
        }
    }
    Ok(out)
}

fn has_known_neighbor(known: &[bool], width: u32, height: u32, x: u32, y: u32) -> bool {
    neighbors4(width, height, x, y)
        .into_iter()
        .any(|(nx, ny)| known[(ny * width + nx) as usize])
}

fn neighbors4(width: u32, height: u32, x: u32, y: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(4);
    if x > 0 {
        out.push((x - 1, y));
    }
    if y > 0 {
        out.push((x, y - 1));
    }
    if x + 1 < width {
        out.push((x + 1, y));
    }
    if y + 1 < height {
        out.push((x, y + 1));
    }
    out
}
