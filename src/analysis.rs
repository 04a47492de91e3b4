use image::RgbImage;

use self::features::{FeatureConf, ScreenFeatures};

pub mod features;
pub mod grouping;
pub mod scrollable;
pub mod similarity;

/// One cleaned screenshot with its precomputed descriptors.
pub struct Screen {
    name: String,
    image: RgbImage,
    features: ScreenFeatures,
}

impl Screen {
    pub fn new(name: String, image: RgbImage, conf: &FeatureConf) -> Self {
        let features = conf.extract(&image);
        Self {
            name,
            image,
            features,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn features(&self) -> &ScreenFeatures {
        &self.features
    }
}
