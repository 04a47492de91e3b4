use clap::Args;
use image::{GrayImage, RgbImage};
use imageproc::binary_descriptors::brief::{brief, BriefDescriptor, TestPair};
use imageproc::corners::corners_fast9;
use imageproc::point::Point;

use crate::utils::imgutils;

/// Keypoint budget per image.
pub const MAX_KEYPOINTS: usize = 500;
/// Corner detector contrast threshold.
pub const DEFAULT_FAST_THRESHOLD: u8 = 20;
/// Descriptor length in bits.
const DESCRIPTOR_BITS: usize = 256;
/// Corners closer than this to a border have no full sampling patch.
const BORDER_MARGIN: u32 = 20;

/// Bins per channel of the joint color histogram.
const HISTOGRAM_BINS_PER_CHANNEL: u32 = 8;
/// Total histogram dimensionality, 8 bins over 3 channels.
pub const HISTOGRAM_DIMS: usize = 512;

/// Visual descriptors of one screen. Exactly one representation is ever
/// populated: keypoint descriptors normally, the color histogram when no
/// keypoints could be computed (near uniform images).
#[derive(Clone)]
pub enum ScreenFeatures {
    Keypoints(Vec<BriefDescriptor>),
    Histogram(ColorHistogram),
}

impl ScreenFeatures {
    pub fn is_histogram(&self) -> bool {
        matches!(self, ScreenFeatures::Histogram(_))
    }
}

/// L2-normalized joint rgb histogram, 8 bins per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram(Vec<f32>);

impl ColorHistogram {
    pub fn of_image(img: &RgbImage) -> Self {
        let shift = 8 - HISTOGRAM_BINS_PER_CHANNEL.trailing_zeros();
        let mut bins = vec![0f32; HISTOGRAM_DIMS];
        for p in img.pixels() {
            let r = (p[0] as u32) >> shift;
            let g = (p[1] as u32) >> shift;
            let b = (p[2] as u32) >> shift;
            let index = (r * HISTOGRAM_BINS_PER_CHANNEL + g) * HISTOGRAM_BINS_PER_CHANNEL + b;
            bins[index as usize] += 1.0;
        }

        let norm = bins.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            bins.iter_mut().for_each(|v| *v /= norm);
        }
        Self(bins)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Args, Debug)]
pub struct FeatureCli {
    /// Contrast threshold of the FAST corner detector
    #[arg(long, default_value_t = DEFAULT_FAST_THRESHOLD)]
    fast_threshold: u8,

    /// Keep at most this many keypoints per image
    #[arg(long, default_value_t = MAX_KEYPOINTS)]
    max_keypoints: usize,
}

impl FeatureCli {
    pub fn to_conf(&self) -> FeatureConf {
        FeatureConf::default()
            .fast_threshold(self.fast_threshold)
            .max_keypoints(self.max_keypoints)
    }
}

/// Immutable extraction config. Carries one fixed set of sampling test
/// pairs so descriptors from different images are comparable.
pub struct FeatureConf {
    fast_threshold: u8,
    max_keypoints: usize,
    test_pairs: Vec<TestPair>,
}

impl Default for FeatureConf {
    fn default() -> Self {
        Self {
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            max_keypoints: MAX_KEYPOINTS,
            test_pairs: generate_test_pairs(),
        }
    }
}

impl FeatureConf {
    pub fn fast_threshold(mut self, threshold: u8) -> Self {
        self.fast_threshold = threshold;
        self
    }

    pub fn max_keypoints(mut self, max: usize) -> Self {
        self.max_keypoints = max;
        self
    }

    /// Computes the descriptor set of one screen, falling back to the color
    /// histogram when no keypoints can be described.
    pub fn extract(&self, img: &RgbImage) -> ScreenFeatures {
        let gray = imgutils::grayscale(img);
        let keypoints = self.detect_keypoints(&gray);
        if keypoints.is_empty() {
            log::debug!(target: "match", "no usable keypoints, using the color histogram");
            return ScreenFeatures::Histogram(ColorHistogram::of_image(img));
        }

        match brief(&gray, &keypoints, DESCRIPTOR_BITS, Some(&self.test_pairs)) {
            Ok((descriptors, _)) if !descriptors.is_empty() => {
                ScreenFeatures::Keypoints(descriptors)
            }
            Ok(_) => ScreenFeatures::Histogram(ColorHistogram::of_image(img)),
            Err(e) => {
                log::warn!(
                    target: "match",
                    "descriptor computation failed ({e}), using the color histogram"
                );
                ScreenFeatures::Histogram(ColorHistogram::of_image(img))
            }
        }
    }

    /// The strongest FAST corners that still have a full descriptor patch.
    fn detect_keypoints(&self, gray: &GrayImage) -> Vec<Point<u32>> {
        let (width, height) = gray.dimensions();
        if width <= 2 * BORDER_MARGIN || height <= 2 * BORDER_MARGIN {
            return vec![];
        }

        let mut corners = corners_fast9(gray, self.fast_threshold);
        corners.retain(|c| {
            c.x >= BORDER_MARGIN
                && c.y >= BORDER_MARGIN
                && c.x < width - BORDER_MARGIN
                && c.y < height - BORDER_MARGIN
        });
        corners.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .expect("corner scores are finite")
        });
        corners.truncate(self.max_keypoints);
        corners.into_iter().map(|c| Point::new(c.x, c.y)).collect()
    }
}

/// One fixed, crate-wide set of BRIEF sampling pairs. Descriptors are only
/// comparable when computed from the same pairs.
fn generate_test_pairs() -> Vec<TestPair> {
    let blank = GrayImage::new(64, 64);
    let (_, pairs) = brief(&blank, &[], DESCRIPTOR_BITS, None)
        .expect("pair generation does not depend on the image");
    pairs
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::utils::imgutils::filled;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    pub(crate) fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = SmallRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| image::Rgb(rng.gen::<[u8; 3]>()))
    }

    #[test]
    fn uniform_image_falls_back_to_histogram() {
        let conf = FeatureConf::default();
        let features = conf.extract(&filled(100, 100, 77, 77, 77));
        assert!(features.is_histogram());
    }

    #[test]
    fn textured_image_yields_keypoints() {
        let conf = FeatureConf::default();
        let features = conf.extract(&noise_image(128, 128, 7));
        match features {
            ScreenFeatures::Keypoints(descriptors) => {
                assert!(!descriptors.is_empty());
                assert!(descriptors.len() <= MAX_KEYPOINTS);
            }
            ScreenFeatures::Histogram(_) => panic!("expected keypoints on a noise image"),
        }
    }

    #[test]
    fn features_clone_keeps_the_variant() {
        let conf = FeatureConf::default();
        let keypoints = conf.extract(&noise_image(128, 128, 7));
        assert!(!keypoints.clone().is_histogram());

        let histogram = conf.extract(&filled(100, 100, 77, 77, 77));
        assert!(histogram.clone().is_histogram());
    }

    #[test]
    fn keypoint_budget_is_respected() {
        let conf = FeatureConf::default().max_keypoints(10);
        if let ScreenFeatures::Keypoints(descriptors) = conf.extract(&noise_image(128, 128, 7)) {
            assert!(descriptors.len() <= 10);
        } else {
            panic!("expected keypoints on a noise image");
        }
    }

    #[test]
    fn histogram_is_l2_normalized() {
        let hist = ColorHistogram::of_image(&noise_image(64, 64, 3));
        let norm: f32 = hist.values().iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-4);
        assert_eq!(HISTOGRAM_DIMS, hist.values().len());
    }

    #[test]
    fn histogram_of_solid_color_is_one_hot() {
        let hist = ColorHistogram::of_image(&filled(10, 10, 255, 0, 0));
        let nonzero: Vec<_> = hist
            .values()
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .collect();
        assert_eq!(1, nonzero.len());
        // Red maxed out lands in the last red bin.
        assert_eq!(7 * 64, nonzero[0].0);
        assert_eq!(1.0, *nonzero[0].1);
    }

    #[test]
    fn empty_image_histogram_is_all_zero() {
        let hist = ColorHistogram::of_image(&RgbImage::new(0, 0));
        assert!(hist.values().iter().all(|&v| v == 0.0));
    }
}
