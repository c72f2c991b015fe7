use anyhow::Result;
use clap::Parser;
use log::info;

use credits_preprocess::config::{Cli, PipelineConfig};
use credits_preprocess::env_loader;
use credits_preprocess::pipeline;

fn main() -> Result<()> {
    // .env must be applied before the logger reads RUST_LOG and clap reads DATA_PATH
    env_loader::load_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_cli(Cli::parse())?;
    let summary = pipeline::run(&config)?;

    if summary.skipped {
        info!("Nothing to do, outputs in {:?} are up to date.", config.data_path);
    } else {
        info!(
            "Wrote {} cast people, {} cast links, {} crew people, {} crew links and {} movies to {:?}.",
            summary.cast_people,
            summary.cast_links,
            summary.crew_people,
            summary.crew_links,
            summary.movies_kept,
            config.data_path
        );
        info!(
            "Dropped {} duplicated-id rows and {} corrupted-budget rows from the metadata.",
            summary.duplicate_movie_rows, summary.corrupted_budget_rows
        );
    }
    Ok(())
}
