//! Movie metadata sanitizing.

use indicatif::ProgressBar;
use log::{info, warn};
use std::collections::HashMap;

use crate::errors::{PreprocessError, Result};
use crate::json_encoder::encode_record_list;
use crate::literal::parse_record_list;
use crate::models::{MovieColumns, MovieTable, RawMovieRow};

/// Image file names leaked into the budget column in the source data.
pub const CORRUPTED_BUDGET_MARKER: &str = ".jpg";

/// Row counts removed by each filtering step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub duplicate_rows: usize,
    pub corrupted_budget_rows: usize,
}

/// Keeps only rows whose id occurs exactly once in the input. Every copy of
/// a repeated id is dropped, not just the extras.
pub fn drop_duplicate_ids(rows: Vec<RawMovieRow>, id_column: usize) -> Vec<RawMovieRow> {
    let key = |row: &RawMovieRow| -> String {
        row.fields
            .get(id_column)
            .map(|id| id.trim().to_string())
            .unwrap_or_default()
    };
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        *counts.entry(key(row)).or_insert(0) += 1;
    }
    rows.into_iter()
        .filter(|row| counts.get(&key(row)).copied() == Some(1))
        .collect()
}

/// Re-encodes list-literal genre text as canonical JSON text.
pub fn reencode_genres(genres_text: &str) -> Result<String> {
    let records = parse_record_list(genres_text).map_err(|source| PreprocessError::Parse {
        context: "genres".to_string(),
        source,
    })?;
    encode_record_list(&records).map_err(|source| PreprocessError::Encode {
        context: "genres".to_string(),
        source,
    })
}

pub fn has_corrupted_budget(budget: &str) -> bool {
    budget.contains(CORRUPTED_BUDGET_MARKER)
}

fn field<'a>(row: &'a RawMovieRow, column: usize, name: &str, row_index: usize) -> Result<&'a str> {
    row.fields
        .get(column)
        .map(String::as_str)
        .ok_or_else(|| PreprocessError::missing_field(format!("movies_metadata row {}", row_index), name))
}

pub fn sanitize_movies(table: MovieTable) -> Result<(MovieTable, SanitizeStats)> {
    sanitize_movies_with_progress(table, &ProgressBar::hidden())
}

/// Deduplicates ids, rewrites genres and drops corrupted budgets, in that
/// order. Surviving rows keep their input order and untouched columns.
pub fn sanitize_movies_with_progress(
    table: MovieTable,
    progress: &ProgressBar,
) -> Result<(MovieTable, SanitizeStats)> {
    let MovieColumns { id, genres, budget } = table.columns()?;
    let total = table.rows.len();
    info!("Sanitizing metadata for {} movies...", total);

    let unique = drop_duplicate_ids(table.rows, id);
    let duplicate_rows = total - unique.len();
    if duplicate_rows > 0 {
        warn!("Dropped {} rows sharing a duplicated movie id.", duplicate_rows);
    }

    progress.set_length(unique.len() as u64);
    let mut rows = Vec::with_capacity(unique.len());
    for (row_index, mut row) in unique.into_iter().enumerate() {
        let movie_id = field(&row, id, "id", row_index)?;
        let encoded = reencode_genres(field(&row, genres, "genres", row_index)?).map_err(|err| match err {
            PreprocessError::Parse { source, .. } => PreprocessError::Parse {
                context: format!("genres of movie {}", movie_id),
                source,
            },
            other => other,
        })?;
        row.fields[genres] = encoded;
        rows.push(row);
        progress.inc(1);
    }

    let before_budget = rows.len();
    let mut kept = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.into_iter().enumerate() {
        if !has_corrupted_budget(field(&row, budget, "budget", row_index)?) {
            kept.push(row);
        }
    }
    let corrupted_budget_rows = before_budget - kept.len();
    if corrupted_budget_rows > 0 {
        warn!("Dropped {} rows with an image path in the budget column.", corrupted_budget_rows);
    }

    info!("Metadata sanitized: {} of {} movies kept.", kept.len(), total);
    Ok((
        MovieTable {
            headers: table.headers,
            rows: kept,
        },
        SanitizeStats {
            duplicate_rows,
            corrupted_budget_rows,
        },
    ))
}
