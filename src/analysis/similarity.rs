use std::borrow::Cow;

use clap::Args;
use imageproc::binary_descriptors::{brief::BriefDescriptor, BinaryDescriptor};

use super::features::{ColorHistogram, ScreenFeatures};
use super::Screen;

/// Hamming distance below which two descriptors count as the same point.
pub const DEFAULT_MATCH_DISTANCE: u32 = 50;

#[derive(Args, Debug)]
pub struct MatchCli {
    /// Maximum hamming distance for a descriptor match to count
    #[arg(long, default_value_t = DEFAULT_MATCH_DISTANCE)]
    match_distance: u32,
}

impl MatchCli {
    pub fn to_conf(&self) -> MatchConf {
        MatchConf::default().match_distance(self.match_distance)
    }
}

pub struct MatchConf {
    match_distance: u32,
}

impl Default for MatchConf {
    fn default() -> Self {
        Self {
            match_distance: DEFAULT_MATCH_DISTANCE,
        }
    }
}

impl MatchConf {
    pub fn match_distance(mut self, distance: u32) -> Self {
        self.match_distance = distance;
        self
    }

    /// Similarity of two screens in `[0, 1]`.
    ///
    /// Keypoint descriptors are compared when both screens have them. As
    /// soon as either side fell back to its histogram the comparison drops
    /// to histograms for both, recomputing the missing one from the pixels.
    pub fn score(&self, a: &Screen, b: &Screen) -> f64 {
        match (a.features(), b.features()) {
            (ScreenFeatures::Keypoints(da), ScreenFeatures::Keypoints(db)) => {
                self.match_score(da, db)
            }
            _ => histogram_score(&histogram_of(a), &histogram_of(b)),
        }
    }

    /// Fraction of descriptors with a mutual nearest neighbor closer than
    /// the match distance, relative to the smaller descriptor set.
    pub fn match_score(&self, a: &[BriefDescriptor], b: &[BriefDescriptor]) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let nearest = |from: &[BriefDescriptor], to: &[BriefDescriptor]| -> Vec<(usize, u32)> {
            from.iter()
                .map(|d| {
                    to.iter()
                        .enumerate()
                        .map(|(j, e)| (j, d.hamming_distance(e)))
                        .min_by_key(|&(_, dist)| dist)
                        .expect("the other side is nonempty")
                })
                .collect()
        };

        // Cross check: a pair only counts when each side is the other's
        // nearest neighbor.
        let a_to_b = nearest(a, b);
        let b_to_a = nearest(b, a);
        let good = a_to_b
            .iter()
            .enumerate()
            .filter(|&(i, &(j, dist))| dist < self.match_distance && b_to_a[j].0 == i)
            .count();

        (good as f64 / a.len().min(b.len()) as f64).min(1.0)
    }
}

/// Pearson correlation of the two histograms, clamped to `[0, 1]`.
pub fn histogram_score(a: &ColorHistogram, b: &ColorHistogram) -> f64 {
    if a.values() == b.values() {
        return 1.0;
    }

    let n = a.values().len() as f64;
    let mean = |h: &ColorHistogram| h.values().iter().map(|&v| v as f64).sum::<f64>() / n;
    let (ma, mb) = (mean(a), mean(b));

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&va, &vb) in a.values().iter().zip(b.values()) {
        let da = va as f64 - ma;
        let db = vb as f64 - mb;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(0.0, 1.0)
}

fn histogram_of(screen: &Screen) -> Cow<'_, ColorHistogram> {
    match screen.features() {
        ScreenFeatures::Histogram(h) => Cow::Borrowed(h),
        ScreenFeatures::Keypoints(_) => Cow::Owned(ColorHistogram::of_image(screen.image())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analysis::features::test::noise_image;
    use crate::analysis::features::FeatureConf;
    use crate::utils::imgutils::filled;

    fn screen(name: &str, img: image::RgbImage, conf: &FeatureConf) -> Screen {
        Screen::new(name.to_owned(), img, conf)
    }

    #[test]
    fn identical_histograms_score_one() {
        let a = ColorHistogram::of_image(&filled(10, 10, 0, 200, 0));
        let b = ColorHistogram::of_image(&filled(30, 30, 0, 200, 0));
        assert_eq!(1.0, histogram_score(&a, &b));
    }

    #[test]
    fn disjoint_solid_colors_score_zero() {
        let a = ColorHistogram::of_image(&filled(10, 10, 255, 0, 0));
        let b = ColorHistogram::of_image(&filled(10, 10, 0, 0, 255));
        assert_eq!(0.0, histogram_score(&a, &b));
    }

    #[test]
    fn score_is_symmetric() {
        let conf = FeatureConf::default();
        let matcher = MatchConf::default();
        let a = screen("a", noise_image(128, 128, 1), &conf);
        let b = screen("b", noise_image(128, 128, 2), &conf);

        assert_eq!(matcher.score(&a, &b), matcher.score(&b, &a));
    }

    #[test]
    fn identical_screens_score_high() {
        let conf = FeatureConf::default();
        let matcher = MatchConf::default();
        let img = noise_image(128, 128, 5);
        let a = screen("a", img.clone(), &conf);
        let b = screen("b", img, &conf);

        let score = matcher.score(&a, &b);
        assert!(score > 0.9, "score {score} too low for identical screens");
    }

    #[test]
    fn score_stays_in_unit_range() {
        let conf = FeatureConf::default();
        let matcher = MatchConf::default();
        let a = screen("a", noise_image(128, 128, 10), &conf);
        let b = screen("b", noise_image(128, 128, 11), &conf);

        let score = matcher.score(&a, &b);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn mixed_feature_types_compare_by_histogram() {
        let conf = FeatureConf::default();
        let matcher = MatchConf::default();
        // One textured screen, one uniform screen of similar color content.
        let textured = screen("t", noise_image(128, 128, 4), &conf);
        let uniform = screen("u", filled(128, 128, 128, 128, 128), &conf);
        assert!(uniform.features().is_histogram());

        let score = matcher.score(&textured, &uniform);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn empty_descriptor_sets_score_zero() {
        let matcher = MatchConf::default();
        assert_eq!(0.0, matcher.match_score(&[], &[]));
    }
}
