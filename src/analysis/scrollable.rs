use clap::Args;

use super::similarity::MatchConf;
use super::Screen;
use crate::utils::imgutils;
use crate::utils::math::{mean_of, Stats};

/// Average seed similarity a group needs to count as one scrolled screen.
pub const DEFAULT_SCROLL_SIMILARITY: f64 = 0.4;
/// Grayscale standard deviation above which the seed's bottom region is
/// considered to hold scrollable content rather than a flat footer.
pub const DEFAULT_BOTTOM_STDDEV: f64 = 25.0;
/// Groups smaller than this are duplicates, not scroll sequences.
pub const MIN_SCROLLABLE_GROUP: usize = 3;

/// The bottom region starts at this fraction of the seed's height.
const BOTTOM_FRACTION: f64 = 0.75;

#[derive(Args, Debug)]
pub struct ScrollCli {
    /// Minimum average similarity to the seed for a scrollable group
    #[arg(long, default_value_t = DEFAULT_SCROLL_SIMILARITY)]
    scroll_similarity: f64,

    /// Minimum bottom-region standard deviation for scrollable content
    #[arg(long, default_value_t = DEFAULT_BOTTOM_STDDEV)]
    bottom_stddev: f64,
}

impl ScrollCli {
    pub fn to_conf(&self) -> ScrollConf {
        ScrollConf::default()
            .scroll_similarity(self.scroll_similarity)
            .bottom_stddev(self.bottom_stddev)
    }
}

pub struct ScrollConf {
    scroll_similarity: f64,
    bottom_stddev: f64,
}

impl Default for ScrollConf {
    fn default() -> Self {
        Self {
            scroll_similarity: DEFAULT_SCROLL_SIMILARITY,
            bottom_stddev: DEFAULT_BOTTOM_STDDEV,
        }
    }
}

impl ScrollConf {
    pub fn scroll_similarity(mut self, similarity: f64) -> Self {
        self.scroll_similarity = similarity;
        self
    }

    pub fn bottom_stddev(mut self, stddev: f64) -> Self {
        self.bottom_stddev = stddev;
        self
    }

    /// Decides whether a group of similar screens is one scrollable screen
    /// photographed at different scroll offsets.
    ///
    /// Groups under [`MIN_SCROLLABLE_GROUP`] never qualify. Larger groups
    /// qualify when their members stay similar enough to the seed on
    /// average and either the seed's bottom region is busy or the group is
    /// large.
    pub fn is_scrollable(&self, seed: &Screen, others: &[&Screen], matcher: &MatchConf) -> bool {
        let size = others.len() + 1;
        if size < MIN_SCROLLABLE_GROUP {
            return false;
        }

        let scores: Vec<f64> = others.iter().map(|o| matcher.score(seed, o)).collect();
        let average = mean_of(&scores);
        let stddev = bottom_region_stddev(seed);
        log::debug!(
            target: "scroll",
            "{}: avg similarity {average:.3}, bottom stddev {stddev:.1}, {size} members",
            seed.name()
        );

        // The size gate above makes the second disjunct always true.
        average > self.scroll_similarity
            && (stddev > self.bottom_stddev || size >= MIN_SCROLLABLE_GROUP)
    }
}

/// Grayscale standard deviation of the bottom quarter of the screen.
fn bottom_region_stddev(screen: &Screen) -> f64 {
    let height = screen.image().height();
    let start = (height as f64 * BOTTOM_FRACTION) as u32;
    let bottom = imgutils::crop_rows(screen.image(), start, height);
    let gray = imgutils::grayscale(&bottom);

    let mut stats = Stats::new();
    stats.extend(gray.pixels().map(|p| p[0] as f64));
    stats.std_dev()
}
