use clap::Args;
use image::{GrayImage, RgbImage};

use crate::utils::imgutils;

pub mod inpaint;
pub mod overlay;
pub mod statusbar;

#[derive(Args, Debug)]
pub struct CleanupCli {
    /// Radius of the window used to fill each inpainted pixel
    #[arg(long, default_value_t = inpaint::DEFAULT_INPAINT_RADIUS)]
    inpaint_radius: u32,

    /// Minimum number of detected overlay pixels needed to inpaint at all
    #[arg(long, default_value_t = overlay::MIN_OVERLAY_PIXELS)]
    min_overlay_pixels: u32,
}

impl CleanupCli {
    pub fn to_conf(&self) -> CleanupConf {
        CleanupConf::default()
            .inpaint_radius(self.inpaint_radius)
            .min_overlay_pixels(self.min_overlay_pixels)
    }
}

pub struct CleanupConf {
    inpaint_radius: u32,
    min_overlay_pixels: u32,
}

impl Default for CleanupConf {
    fn default() -> Self {
        Self {
            inpaint_radius: inpaint::DEFAULT_INPAINT_RADIUS,
            min_overlay_pixels: overlay::MIN_OVERLAY_PIXELS,
        }
    }
}

impl CleanupConf {
    pub fn inpaint_radius(mut self, radius: u32) -> Self {
        self.inpaint_radius = radius;
        self
    }

    pub fn min_overlay_pixels(mut self, pixels: u32) -> Self {
        self.min_overlay_pixels = pixels;
        self
    }

    /// Removes the status bar overlay from one screenshot.
    ///
    /// Best effort, never fails: detection uncertainty skips the image,
    /// a failed texture fill falls back to a flat fill, and a failed flat
    /// fill returns the pixels unchanged.
    pub fn clean_screenshot(&self, name: &str, img: &RgbImage) -> RgbImage {
        let region = statusbar::detect(img);
        if !region.is_present() {
            log::debug!(target: "detect", "{name}: no status bar found, leaving as is");
            return img.clone();
        }
        log::info!(
            target: "detect",
            "{name}: status bar at rows {}..{} ({} px tall)",
            region.start_y(),
            region.end_y(),
            region.height()
        );

        let band = imgutils::crop_rows(img, region.start_y(), region.end_y());
        let mask = overlay::build_mask(&band);
        let population = imgutils::mask_population(&mask);
        if population < self.min_overlay_pixels {
            log::info!(
                target: "detect",
                "{name}: only {population} overlay pixels, skipping inpainting"
            );
            return img.clone();
        }
        log::info!(target: "inpaint", "{name}: inpainting {population} overlay pixels");

        let full_mask = place_mask(img.dimensions(), &mask, region.start_y());
        match inpaint::inpaint(img, &full_mask, self.inpaint_radius) {
            Ok(out) => out,
            Err(e) => {
                log::warn!(target: "inpaint", "{name}: texture fill failed ({e}), trying flat fill");
                match inpaint::fallback_fill(img, &region) {
                    Ok(out) => out,
                    Err(e) => {
                        log::error!(
                            target: "inpaint",
                            "{name}: flat fill failed too ({e}), keeping original pixels"
                        );
                        img.clone()
                    }
                }
            }
        }
    }
}

/// Expands a band mask to a full-size mask, zero everywhere outside the band.
fn place_mask((width, height): (u32, u32), band_mask: &GrayImage, start_y: u32) -> GrayImage {
    let mut full = GrayImage::new(width, height);
    for (x, y, p) in band_mask.enumerate_pixels() {
        full.put_pixel(x, y + start_y, *p);
    }
    full
}
