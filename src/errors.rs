use std::path::PathBuf;
use thiserror::Error;

use crate::literal::LiteralError;

pub type Result<T> = std::result::Result<T, PreprocessError>;

/// Fatal conditions for a preprocessing run. None of them are retried:
/// every variant stems from the environment or from malformed input.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: LiteralError,
    },

    #[error("Schema error in {context}: {message}")]
    Schema { context: String, message: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to encode {context} as JSON: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PreprocessError {
    pub fn missing_field(context: impl Into<String>, field: &str) -> Self {
        Self::Schema {
            context: context.into(),
            message: format!("missing field `{}`", field),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
