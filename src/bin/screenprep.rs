use std::{ffi::OsString, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use screenprep::{
    analysis::{
        features::FeatureCli, grouping::GroupingCli, scrollable::ScrollCli,
        similarity::MatchCli,
    },
    bin_common::{init_eyre, init_logger},
    cleanup::CleanupCli,
    pipeline::{self, PipelineConf, DEFAULT_ASSET_PREFIX, DEFAULT_BATCH_SIZE},
    utils::fsutils::read_optional_file,
};

#[derive(Parser, Debug)]
#[command()]
/// Cleans up a directory of app screenshots and writes a screens manifest.
///
/// This uses rayon, so the `RAYON_NUM_THREADS` environment variable might be of interest.
struct Cli {
    #[command(flatten)]
    cleanup_args: CleanupCli,

    #[command(flatten)]
    feature_args: FeatureCli,

    #[command(flatten)]
    match_args: MatchCli,

    #[command(flatten)]
    grouping_args: GroupingCli,

    #[command(flatten)]
    scroll_args: ScrollCli,

    /// Directory with the screenshots to process
    #[arg(long, short = 's', default_value = "src/assets/screens")]
    screens_dir: PathBuf,

    /// How many screenshots to hold decoded in memory at once
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Path prefix used for the screens in the manifest
    #[arg(long, default_value = DEFAULT_ASSET_PREFIX)]
    asset_prefix: String,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".screenpreprc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(
                flags
                    .split_whitespace()
                    .map(|s| std::ffi::OsStr::new(s).to_owned()),
            );
        }
    }

    Ok(Cli::parse_from(args))
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref())?;

    log::debug!("CLI arguments: {cli:#?}");

    let conf = PipelineConf::new(cli.screens_dir)
        .batch_size(cli.batch_size)
        .asset_prefix(cli.asset_prefix)
        .cleanup(cli.cleanup_args.to_conf())
        .features(cli.feature_args.to_conf())
        .matching(cli.match_args.to_conf())
        .grouping(cli.grouping_args.to_conf())
        .scrollable(cli.scroll_args.to_conf());

    let stats = pipeline::run(&conf).wrap_err("the pipeline failed")?;
    log::info!(
        "all done: {} screen(s) processed, {} dropped, {} static, {} scrollable",
        stats.processed,
        stats.dropped,
        stats.static_screens,
        stats.scrollable_screens
    );

    Ok(())
}
