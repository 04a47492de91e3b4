use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::map::map_colors;
use imageproc::morphology::{close, open};

use crate::utils::imgutils::{self, BLACK, WHITE};

/// Masks with fewer set pixels than this are treated as insufficient
/// evidence of an overlay and inpainting is skipped.
pub const MIN_OVERLAY_PIXELS: u32 = 100;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// 11x11 neighborhood for the adaptive threshold.
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;

/// Reddish hue ranges on the opencv scale (hue in [0, 180]), the usual color
/// of status bar icons and alert text.
const RED_HUE_LOW_MAX: u8 = 10;
const RED_HUE_HIGH_MIN: u8 = 160;
const MIN_SATURATION: u8 = 30;
const MIN_VALUE: u8 = 30;

/// Marks the glyph and icon pixels inside a status bar band.
///
/// Three detectors are unioned: reddish colors, canny edges, and dark text
/// found by an inverted adaptive threshold. No single one generalizes over
/// the varied status bar color schemes, so the union is biased toward
/// over-detection. A 3x3 close-then-open pass removes speckle and bridges
/// small gaps in glyph strokes.
pub fn build_mask(band: &RgbImage) -> GrayImage {
    let gray = imgutils::grayscale(band);

    let color = color_mask(band);
    let edges = close(&canny(&gray, CANNY_LOW, CANNY_HIGH), Norm::LInf, 1);
    let dark_text = close(&inverted_adaptive(&gray), Norm::LInf, 1);

    let mut combined = GrayImage::from_fn(band.width(), band.height(), |x, y| {
        let set = color.get_pixel(x, y)[0] != BLACK
            || edges.get_pixel(x, y)[0] != BLACK
            || dark_text.get_pixel(x, y)[0] != BLACK;
        Luma([if set { WHITE } else { BLACK }])
    });

    combined = close(&combined, Norm::LInf, 1);
    open(&combined, Norm::LInf, 1)
}

fn color_mask(band: &RgbImage) -> GrayImage {
    map_colors(band, |rgb| {
        let [h, s, v] = imgutils::rgb_to_hsv(rgb);
        let reddish = h <= RED_HUE_LOW_MAX || h >= RED_HUE_HIGH_MIN;
        let set = reddish && s >= MIN_SATURATION && v >= MIN_VALUE;
        Luma([if set { WHITE } else { BLACK }])
    })
}

/// White where the pixel is darker than its 11x11 neighborhood mean, i.e.,
/// dark text on a light background.
fn inverted_adaptive(gray: &GrayImage) -> GrayImage {
    let thresholded = adaptive_threshold(gray, ADAPTIVE_BLOCK_RADIUS);
    map_colors(&thresholded, |p| {
        Luma([if p[0] == BLACK { WHITE } else { BLACK }])
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::imgutils::{filled, mask_population};

    #[test]
    fn uniform_band_has_empty_mask() {
        let band = filled(200, 40, 200, 200, 200);
        let mask = build_mask(&band);

        assert_eq!((200, 40), mask.dimensions());
        assert_eq!(0, mask_population(&mask));
    }

    #[test]
    fn red_icon_blocks_are_masked() {
        let mut band = filled(200, 40, 255, 255, 255);
        for block in 0..4u32 {
            let x0 = 20 + block * 45;
            for y in 10..30 {
                for x in x0..x0 + 20 {
                    band.put_pixel(x, y, image::Rgb([255, 0, 0]));
                }
            }
        }

        let mask = build_mask(&band);
        assert!(
            mask_population(&mask) >= MIN_OVERLAY_PIXELS,
            "population {} below the inpainting gate",
            mask_population(&mask)
        );
        // The block interiors must survive the open pass.
        assert_eq!(WHITE, mask.get_pixel(30, 20)[0]);
    }

    #[test]
    fn dark_text_on_light_background_is_masked() {
        let mut band = filled(120, 40, 230, 230, 230);
        for x in 30..90 {
            for y in 18..23 {
                band.put_pixel(x, y, image::Rgb([20, 20, 20]));
            }
        }

        let mask = build_mask(&band);
        assert!(mask_population(&mask) > 0);
        assert_eq!(WHITE, mask.get_pixel(60, 20)[0]);
    }
}
