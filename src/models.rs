use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{PreprocessError, Result};
use crate::literal::Record;

// Raw input rows
#[derive(Debug, Clone, Deserialize)]
pub struct RawCreditsRow {
    #[serde(rename = "id")]
    pub movie_id: i64,
    #[serde(rename = "cast")]
    pub cast_text: String,
    #[serde(rename = "crew")]
    pub crew_text: String,
}

/// One row of the movie metadata table, every column kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMovieRow {
    pub fields: Vec<String>,
}

/// Positions of the columns the sanitizer interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieColumns {
    pub id: usize,
    pub genres: usize,
    pub budget: usize,
}

impl MovieColumns {
    pub fn locate(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PreprocessError::missing_field("movies_metadata header", name))
        };
        Ok(MovieColumns {
            id: find("id")?,
            genres: find("genres")?,
            budget: find("budget")?,
        })
    }
}

/// The movie metadata table. Also the shape of the cleaned output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawMovieRow>,
}

impl MovieTable {
    pub fn columns(&self) -> Result<MovieColumns> {
        MovieColumns::locate(&self.headers)
    }
}

/// Which credit list an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditRole {
    Cast,
    Crew,
}

impl CreditRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CreditRole::Cast => "cast",
            CreditRole::Crew => "crew",
        }
    }

    /// Number of leading entries kept per movie.
    pub fn retained(self) -> usize {
        match self {
            CreditRole::Cast => 5,
            CreditRole::Crew => 3,
        }
    }

    /// The role-specific field projected into the relationship table.
    pub fn detail_field(self) -> &'static str {
        match self {
            CreditRole::Cast => "character",
            CreditRole::Crew => "department",
        }
    }
}

/// A parsed cast or crew record tagged with its owning movie.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonCreditEntry {
    pub movie_id: i64,
    pub role: CreditRole,
    pub fields: Record,
}

impl PersonCreditEntry {
    pub fn new(movie_id: i64, role: CreditRole, mut fields: Record) -> Self {
        fields.insert("movie_id".to_string(), Value::from(movie_id));
        PersonCreditEntry {
            movie_id,
            role,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Result<&Value> {
        self.fields.get(name).ok_or_else(|| {
            PreprocessError::missing_field(
                format!("{} entry for movie {}", self.role.as_str(), self.movie_id),
                name,
            )
        })
    }

    /// Text form of a field as it appears in an output cell.
    pub fn cell(&self, name: &str) -> Result<String> {
        self.field(name).map(render_cell)
    }
}

/// Renders a parsed value as a CSV cell: text verbatim, `None` as an empty
/// cell, booleans in their literal spelling.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Rows that can be written as a table with a fixed header.
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

// Output rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonIdentity {
    pub id: String,
    pub name: String,
    pub gender: String,
}

impl TableRow for PersonIdentity {
    const HEADERS: &'static [&'static str] = &["id", "name", "gender"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastRelationship {
    pub actor_id: String,
    pub movie_id: i64,
    pub character: String,
}

impl TableRow for CastRelationship {
    const HEADERS: &'static [&'static str] = &["actor_id", "movie_id", "character"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewRelationship {
    pub actor_id: String,
    pub movie_id: i64,
    pub department: String, // upper-cased
}

impl TableRow for CrewRelationship {
    const HEADERS: &'static [&'static str] = &["actor_id", "movie_id", "department"];
}

/// The four tables produced from the credits input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditsTables {
    pub cast_info: Vec<PersonIdentity>,
    pub cast_movie_relationship: Vec<CastRelationship>,
    pub crew_info: Vec<PersonIdentity>,
    pub crew_movie_relationship: Vec<CrewRelationship>,
}
