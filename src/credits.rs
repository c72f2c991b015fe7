//! Credits normalization: cast/crew lists embedded in the credits table are
//! truncated, tagged with their movie, flattened and split into identity
//! and relationship tables.

use indicatif::ProgressBar;
use log::{debug, info};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

use crate::errors::{PreprocessError, Result};
use crate::literal::parse_record_list;
use crate::models::{
    CastRelationship, CreditRole, CreditsTables, CrewRelationship, PersonCreditEntry,
    PersonIdentity, RawCreditsRow,
};

/// Cast and crew entries retained for a single movie.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedCredits {
    pub movie_id: i64,
    pub cast: Vec<PersonCreditEntry>,
    pub crew: Vec<PersonCreditEntry>,
}

/// Parses one credit list, keeps its leading entries and tags them.
fn parse_credit_list(movie_id: i64, role: CreditRole, text: &str) -> Result<Vec<PersonCreditEntry>> {
    let records = parse_record_list(text).map_err(|source| PreprocessError::Parse {
        context: format!("{} of movie {}", role.as_str(), movie_id),
        source,
    })?;
    Ok(records
        .into_iter()
        .take(role.retained())
        .map(|fields| PersonCreditEntry::new(movie_id, role, fields))
        .collect())
}

pub fn parse_and_tag(row: &RawCreditsRow) -> Result<TaggedCredits> {
    Ok(TaggedCredits {
        movie_id: row.movie_id,
        cast: parse_credit_list(row.movie_id, CreditRole::Cast, &row.cast_text)?,
        crew: parse_credit_list(row.movie_id, CreditRole::Crew, &row.crew_text)?,
    })
}

/// Flattens per-movie lists into one entry per (movie, person), skipping
/// movies whose list is empty. Movie order, then list order, is kept.
pub fn explode(tagged: Vec<TaggedCredits>) -> (Vec<PersonCreditEntry>, Vec<PersonCreditEntry>) {
    let mut cast = Vec::new();
    let mut crew = Vec::new();
    for movie in tagged {
        if !movie.cast.is_empty() {
            cast.extend(movie.cast);
        }
        if !movie.crew.is_empty() {
            crew.extend(movie.crew);
        }
    }
    (cast, crew)
}

/// Projects `{id, name, gender}` keeping the first entry seen for each id.
pub fn person_identities(entries: &[PersonCreditEntry]) -> Result<Vec<PersonIdentity>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut identities = Vec::new();
    for entry in entries {
        let id = entry.field("id")?;
        // Keyed on the JSON text so 42 and "42" stay distinct.
        if !seen.insert(id.to_string()) {
            continue;
        }
        identities.push(PersonIdentity {
            id: entry.cell("id")?,
            name: entry.cell("name")?,
            gender: entry.cell("gender")?,
        });
    }
    Ok(identities)
}

pub fn cast_relationships(entries: &[PersonCreditEntry]) -> Result<Vec<CastRelationship>> {
    entries
        .iter()
        .map(|entry| {
            Ok(CastRelationship {
                actor_id: entry.cell("id")?,
                movie_id: entry.movie_id,
                character: entry.cell(CreditRole::Cast.detail_field())?,
            })
        })
        .collect()
}

pub fn crew_relationships(entries: &[PersonCreditEntry]) -> Result<Vec<CrewRelationship>> {
    entries
        .iter()
        .map(|entry| {
            let department = match entry.field(CreditRole::Crew.detail_field())? {
                Value::String(s) => s.to_uppercase(),
                _ => String::new(),
            };
            Ok(CrewRelationship {
                actor_id: entry.cell("id")?,
                movie_id: entry.movie_id,
                department,
            })
        })
        .collect()
}

/// Runs the full credits normalization over `rows`.
pub fn normalize_credits(rows: &[RawCreditsRow]) -> Result<CreditsTables> {
    normalize_credits_with_progress(rows, &ProgressBar::hidden())
}

/// Same as [`normalize_credits`], ticking `progress` once per input row.
///
/// Rows are parsed in parallel; the indexed collect keeps input order, so
/// first-seen deduplication sees exactly the sequential order.
pub fn normalize_credits_with_progress(
    rows: &[RawCreditsRow],
    progress: &ProgressBar,
) -> Result<CreditsTables> {
    info!("Normalizing credits for {} movies...", rows.len());
    let tagged = rows
        .par_iter()
        .map(|row| {
            let tagged = parse_and_tag(row);
            progress.inc(1);
            tagged
        })
        .collect::<Result<Vec<_>>>()?;

    let (cast, crew) = explode(tagged);
    debug!("Exploded {} cast and {} crew entries.", cast.len(), crew.len());

    let tables = CreditsTables {
        cast_info: person_identities(&cast)?,
        cast_movie_relationship: cast_relationships(&cast)?,
        crew_info: person_identities(&crew)?,
        crew_movie_relationship: crew_relationships(&crew)?,
    };
    info!(
        "Credits normalized: {} cast people, {} cast links, {} crew people, {} crew links.",
        tables.cast_info.len(),
        tables.cast_movie_relationship.len(),
        tables.crew_info.len(),
        tables.crew_movie_relationship.len()
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_member(id: i64, name: &str, character: &str) -> String {
        format!(
            "{{'cast_id': {id}, 'character': '{character}', 'gender': 2, 'id': {id}, 'name': '{name}', 'order': 0}}"
        )
    }

    fn crew_member(id: i64, name: &str, department: &str) -> String {
        format!(
            "{{'department': '{department}', 'gender': 0, 'id': {id}, 'job': 'Job', 'name': '{name}'}}"
        )
    }

    fn row(movie_id: i64, cast: &[String], crew: &[String]) -> RawCreditsRow {
        RawCreditsRow {
            movie_id,
            cast_text: format!("[{}]", cast.join(", ")),
            crew_text: format!("[{}]", crew.join(", ")),
        }
    }

    #[test]
    fn truncates_to_top_billed_entries() {
        let cast: Vec<String> = (1..=8).map(|i| cast_member(i, "Actor", "Role")).collect();
        let crew: Vec<String> = (101..=105).map(|i| crew_member(i, "Crew", "Sound")).collect();
        let tables = normalize_credits(&[row(10, &cast, &crew)]).unwrap();

        let cast_ids: Vec<&str> = tables
            .cast_movie_relationship
            .iter()
            .map(|r| r.actor_id.as_str())
            .collect();
        assert_eq!(cast_ids, vec!["1", "2", "3", "4", "5"]);
        let crew_ids: Vec<&str> = tables
            .crew_movie_relationship
            .iter()
            .map(|r| r.actor_id.as_str())
            .collect();
        assert_eq!(crew_ids, vec!["101", "102", "103"]);
    }

    #[test]
    fn deduplicates_people_across_movies() {
        let rows: Vec<RawCreditsRow> = [1, 2, 3]
            .iter()
            .map(|&movie| row(movie, &[cast_member(42, "Tom Hanks", "Woody")], &[]))
            .collect();
        let tables = normalize_credits(&rows).unwrap();

        assert_eq!(
            tables.cast_info,
            vec![PersonIdentity {
                id: "42".to_string(),
                name: "Tom Hanks".to_string(),
                gender: "2".to_string(),
            }]
        );
        let movies: Vec<i64> = tables
            .cast_movie_relationship
            .iter()
            .filter(|r| r.actor_id == "42")
            .map(|r| r.movie_id)
            .collect();
        assert_eq!(movies, vec![1, 2, 3]);
    }

    #[test]
    fn first_seen_identity_wins() {
        let rows = vec![
            row(1, &[cast_member(7, "First Name", "A")], &[]),
            row(2, &[cast_member(7, "Later Name", "B")], &[]),
        ];
        let tables = normalize_credits(&rows).unwrap();
        assert_eq!(tables.cast_info.len(), 1);
        assert_eq!(tables.cast_info[0].name, "First Name");
    }

    #[test]
    fn empty_cast_still_contributes_crew() {
        let rows = vec![row(5, &[], &[crew_member(9, "Director", "Directing")])];
        let tables = normalize_credits(&rows).unwrap();
        assert!(tables.cast_movie_relationship.is_empty());
        assert!(tables.cast_info.is_empty());
        assert_eq!(tables.crew_movie_relationship.len(), 1);
        assert_eq!(tables.crew_movie_relationship[0].movie_id, 5);
    }

    #[test]
    fn upper_cases_department() {
        let rows = vec![row(5, &[], &[crew_member(9, "Someone", "director")])];
        let tables = normalize_credits(&rows).unwrap();
        assert_eq!(tables.crew_movie_relationship[0].department, "DIRECTOR");
    }

    #[test]
    fn malformed_cast_is_parse_error() {
        let bad = RawCreditsRow {
            movie_id: 3,
            cast_text: "[{'id': 1, 'name': 'x'".to_string(),
            crew_text: "[]".to_string(),
        };
        let err = normalize_credits(&[bad]).unwrap_err();
        assert!(matches!(err, PreprocessError::Parse { .. }));
    }

    #[test]
    fn missing_character_is_schema_error() {
        let rows = vec![RawCreditsRow {
            movie_id: 3,
            cast_text: "[{'id': 1, 'name': 'x', 'gender': 1}]".to_string(),
            crew_text: "[]".to_string(),
        }];
        let err = normalize_credits(&rows).unwrap_err();
        assert!(matches!(err, PreprocessError::Schema { .. }));
    }

    #[test]
    fn missing_department_is_schema_error() {
        let rows = vec![RawCreditsRow {
            movie_id: 4,
            cast_text: "[]".to_string(),
            crew_text: "[{'id': 9, 'name': 'y', 'gender': 0, 'job': 'Director'}]".to_string(),
        }];
        let err = normalize_credits(&rows).unwrap_err();
        assert!(matches!(err, PreprocessError::Schema { .. }));
        assert!(err.to_string().contains("department"));
    }

    #[test]
    fn deduplicates_crew_across_movies() {
        let rows = vec![
            row(1, &[], &[crew_member(9, "Composer", "Sound")]),
            row(2, &[], &[crew_member(9, "Composer", "Sound")]),
        ];
        let tables = normalize_credits(&rows).unwrap();

        assert_eq!(tables.crew_info.len(), 1);
        assert_eq!(tables.crew_info[0].id, "9");
        let links: Vec<(i64, &str)> = tables
            .crew_movie_relationship
            .iter()
            .map(|r| (r.movie_id, r.department.as_str()))
            .collect();
        assert_eq!(links, vec![(1, "SOUND"), (2, "SOUND")]);
    }

    #[test]
    fn entries_beyond_truncation_are_not_checked() {
        let mut cast: Vec<String> = (1..=5).map(|i| cast_member(i, "Actor", "Role")).collect();
        cast.push("{'id': 99}".to_string());
        let tables = normalize_credits(&[row(1, &cast, &[])]).unwrap();
        assert_eq!(tables.cast_movie_relationship.len(), 5);
    }
}
