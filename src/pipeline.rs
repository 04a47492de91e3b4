use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, WrapErr};
use image::RgbImage;
use rayon::prelude::*;

use crate::analysis::features::FeatureConf;
use crate::analysis::grouping::GroupingConf;
use crate::analysis::scrollable::ScrollConf;
use crate::analysis::similarity::MatchConf;
use crate::analysis::Screen;
use crate::cleanup::CleanupConf;
use crate::manifest::{self, ScreenRecord, MANIFEST_FILENAME};
use crate::naming;
use crate::utils::fsutils;

/// Number of screenshots held decoded in memory at once.
pub const DEFAULT_BATCH_SIZE: usize = 15;
/// Path prefix manifest entries use to refer to the processed screens.
pub const DEFAULT_ASSET_PREFIX: &str = "assets/screens";
/// Subdirectory the untouched originals are moved into.
pub const BACKUP_DIR_NAME: &str = "backup";

pub struct PipelineConf {
    screens_dir: PathBuf,
    batch_size: usize,
    asset_prefix: String,
    cleanup: CleanupConf,
    features: FeatureConf,
    matching: MatchConf,
    grouping: GroupingConf,
    scrollable: ScrollConf,
}

impl PipelineConf {
    pub fn new(screens_dir: PathBuf) -> Self {
        Self {
            screens_dir,
            batch_size: DEFAULT_BATCH_SIZE,
            asset_prefix: DEFAULT_ASSET_PREFIX.to_owned(),
            cleanup: CleanupConf::default(),
            features: FeatureConf::default(),
            matching: MatchConf::default(),
            grouping: GroupingConf::default(),
            scrollable: ScrollConf::default(),
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn asset_prefix(mut self, prefix: String) -> Self {
        self.asset_prefix = prefix;
        self
    }

    pub fn cleanup(mut self, conf: CleanupConf) -> Self {
        self.cleanup = conf;
        self
    }

    pub fn features(mut self, conf: FeatureConf) -> Self {
        self.features = conf;
        self
    }

    pub fn matching(mut self, conf: MatchConf) -> Self {
        self.matching = conf;
        self
    }

    pub fn grouping(mut self, conf: GroupingConf) -> Self {
        self.grouping = conf;
        self
    }

    pub fn scrollable(mut self, conf: ScrollConf) -> Self {
        self.scrollable = conf;
        self
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub dropped: usize,
    pub static_screens: usize,
    pub scrollable_screens: usize,
}

/// Runs the whole pipeline over one directory of screenshots.
///
/// Originals are backed up first, then cleaned, renamed and re-encoded in
/// batches, analyzed for similarity, and finally described in a manifest
/// next to them. Unreadable images are logged and dropped, they never
/// abort the run.
pub fn run(conf: &PipelineConf) -> eyre::Result<RunStats> {
    let files = fsutils::image_files(&conf.screens_dir)
        .wrap_err_with(|| format!("failed to list {:?}", conf.screens_dir))?;
    if files.is_empty() {
        log::error!(target: "pipeline", "no images found in {:?}", conf.screens_dir);
        return Ok(RunStats::default());
    }
    log::info!(
        target: "pipeline",
        "processing {} screenshot(s) from {:?}",
        files.len(),
        conf.screens_dir
    );

    backup_originals(&conf.screens_dir, &files)?;

    let mut stats = RunStats::default();
    let mut screens: Vec<Screen> = Vec::with_capacity(files.len());

    // Seeded with every pending input so a normalized name never overwrites
    // a file that has not been processed yet.
    let mut taken: HashSet<String> = files
        .iter()
        .filter_map(|f| f.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    let batches: Vec<&[PathBuf]> = files.chunks(conf.batch_size.max(1)).collect();
    for (i, batch) in batches.iter().enumerate() {
        log::info!(
            target: "pipeline",
            "batch {}/{} ({} image(s))",
            i + 1,
            batches.len(),
            batch.len()
        );

        let decoded: Vec<(&Path, RgbImage)> = batch
            .iter()
            .filter_map(|path| match image::open(path) {
                Ok(img) => Some((path.as_path(), img.to_rgb8())),
                Err(e) => {
                    log::warn!(target: "pipeline", "could not decode {path:?}: {e}");
                    stats.dropped += 1;
                    None
                }
            })
            .collect();

        let cleaned: Vec<(&Path, RgbImage)> = decoded
            .into_par_iter()
            .map(|(path, img)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let out = conf.cleanup.clean_screenshot(&name, &img);
                (path, out)
            })
            .collect();

        let mut saved: Vec<(String, RgbImage)> = Vec::with_capacity(cleaned.len());
        for (path, img) in cleaned {
            let original = path.file_name().unwrap_or_default().to_string_lossy();
            // This file is processed now, its old name is free again.
            taken.remove(original.as_ref());
            let name = naming::dedup(&naming::normalize(&original), &taken);

            let target = conf.screens_dir.join(&name);
            if let Err(e) = img.save(&target) {
                log::warn!(target: "pipeline", "could not save {target:?}: {e}");
                stats.dropped += 1;
                continue;
            }
            if target != path {
                if let Err(e) = fs::remove_file(path) {
                    log::warn!(target: "pipeline", "could not remove the original {path:?}: {e}");
                }
            }

            taken.insert(name.clone());
            saved.push((name, img));
        }

        screens.par_extend(
            saved
                .into_par_iter()
                .map(|(name, img)| Screen::new(name, img, &conf.features)),
        );
    }
    stats.processed = screens.len();

    let groups = conf.grouping.group(&screens, &conf.matching);
    let records = manifest::build_records(
        &screens,
        &groups,
        &conf.asset_prefix,
        &conf.scrollable,
        &conf.matching,
    );
    for record in &records {
        match record {
            ScreenRecord::Static { .. } => stats.static_screens += 1,
            ScreenRecord::Scrollable { .. } => stats.scrollable_screens += 1,
        }
    }

    let manifest_path = conf.screens_dir.join(MANIFEST_FILENAME);
    let file = File::create(&manifest_path)
        .wrap_err_with(|| format!("failed to create {manifest_path:?}"))?;
    serde_json::to_writer_pretty(file, &records)
        .wrap_err_with(|| format!("failed to write {manifest_path:?}"))?;

    log::info!(
        target: "pipeline",
        "done: {} processed, {} dropped, {} static, {} scrollable",
        stats.processed,
        stats.dropped,
        stats.static_screens,
        stats.scrollable_screens
    );
    Ok(stats)
}

/// Copies every original into the backup directory before anything mutates
/// the screens directory.
fn backup_originals(screens_dir: &Path, files: &[PathBuf]) -> eyre::Result<()> {
    let backup_dir = screens_dir.join(BACKUP_DIR_NAME);
    fs::create_dir_all(&backup_dir)
        .wrap_err_with(|| format!("failed to create {backup_dir:?}"))?;

    for file in files {
        let target = backup_dir.join(file.file_name().unwrap_or_default());
        fs::copy(file, &target)
            .wrap_err_with(|| format!("failed to back up {file:?} to {target:?}"))?;
    }
    log::info!(target: "pipeline", "backed up {} original(s) to {backup_dir:?}", files.len());
    Ok(())
}
