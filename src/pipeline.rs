use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;

use crate::completion::{
    self, CAST_INFO_FILE, CAST_MOVIE_RELATIONSHIP_FILE, CREW_INFO_FILE,
    CREW_MOVIE_RELATIONSHIP_FILE, MOVIES_FILE,
};
use crate::config::PipelineConfig;
use crate::credits::normalize_credits_with_progress;
use crate::errors::Result;
use crate::metadata::{sanitize_movies_with_progress, SanitizeStats};
use crate::models::{CreditsTables, MovieTable};
use crate::table_io::{self, StagedOutputs};

/// What a run did, for the final log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: bool,
    pub cast_people: usize,
    pub cast_links: usize,
    pub crew_people: usize,
    pub crew_links: usize,
    pub movies_kept: usize,
    pub duplicate_movie_rows: usize,
    pub corrupted_budget_rows: usize,
}

impl RunSummary {
    fn skipped() -> Self {
        RunSummary {
            skipped: true,
            ..Default::default()
        }
    }

    fn completed(credits: &CreditsTables, movies: &MovieTable, stats: SanitizeStats) -> Self {
        RunSummary {
            skipped: false,
            cast_people: credits.cast_info.len(),
            cast_links: credits.cast_movie_relationship.len(),
            crew_people: credits.crew_info.len(),
            crew_links: credits.crew_movie_relationship.len(),
            movies_kept: movies.rows.len(),
            duplicate_movie_rows: stats.duplicate_rows,
            corrupted_budget_rows: stats.corrupted_budget_rows,
        }
    }
}

fn row_progress(progress: &MultiProgress, len: usize, label: &str) -> ProgressBar {
    let bar = progress.add(ProgressBar::new(len as u64));
    let template = format!("  {:<8} {{bar:40.cyan/blue}} {{pos}}/{{len}} rows [{{elapsed_precise}}]", label);
    bar.set_style(
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar
}

/// Runs both pipelines and writes the five output tables.
///
/// Nothing is written unless both transformations succeed; if every output
/// already exists (and `force` is off) the run returns immediately.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    info!("Data preprocessing has started...");
    config.validate()?;

    if !config.force && completion::outputs_complete(&config.data_path) {
        info!("Your files are already processed! Exiting...");
        return Ok(RunSummary::skipped());
    }

    let credits_rows = table_io::read_credits(&config.credits_path())?;
    let movies = table_io::read_movies(&config.movies_metadata_path())?;

    let progress = MultiProgress::new();
    let credits_bar = row_progress(&progress, credits_rows.len(), "credits");
    let movies_bar = row_progress(&progress, movies.rows.len(), "movies");

    let (credits, sanitized) = if config.sequential {
        (
            normalize_credits_with_progress(&credits_rows, &credits_bar),
            sanitize_movies_with_progress(movies, &movies_bar),
        )
    } else {
        rayon::join(
            || normalize_credits_with_progress(&credits_rows, &credits_bar),
            || sanitize_movies_with_progress(movies, &movies_bar),
        )
    };
    credits_bar.finish_and_clear();
    movies_bar.finish_and_clear();
    let credits = credits?;
    let (movies, stats) = sanitized?;

    info!("Almost done... writing output tables");
    write_outputs(config, &credits, &movies)?;

    let summary = RunSummary::completed(&credits, &movies, stats);
    info!("Done! {:?}", summary);
    Ok(summary)
}

fn write_outputs(config: &PipelineConfig, credits: &CreditsTables, movies: &MovieTable) -> Result<()> {
    let mut staged = StagedOutputs::new();
    staged.write_rows(&config.output_path(CAST_INFO_FILE), credits.cast_info.as_slice())?;
    staged.write_rows(
        &config.output_path(CAST_MOVIE_RELATIONSHIP_FILE),
        credits.cast_movie_relationship.as_slice(),
    )?;
    staged.write_rows(&config.output_path(CREW_INFO_FILE), credits.crew_info.as_slice())?;
    staged.write_rows(
        &config.output_path(CREW_MOVIE_RELATIONSHIP_FILE),
        credits.crew_movie_relationship.as_slice(),
    )?;
    staged.write_movies(&config.output_path(MOVIES_FILE), movies)?;
    staged.commit()
}
