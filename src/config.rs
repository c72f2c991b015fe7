use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use crate::errors::{PreprocessError, Result};

pub const CREDITS_FILE: &str = "credits.csv";
pub const MOVIES_METADATA_FILE: &str = "movies_metadata.csv";

/// Normalize the movie credits dataset into relational tables.
#[derive(Debug, Clone, Parser)]
#[command(name = "preprocess", version)]
pub struct Cli {
    /// Directory holding credits.csv and movies_metadata.csv; outputs are written there too
    #[arg(long, env = "DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Recompute even if every output table already exists
    #[arg(long)]
    pub force: bool,

    /// Run the credits and metadata pipelines one after the other
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    pub force: bool,
    pub sequential: bool,
}

impl PipelineConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            data_path: data_path.into(),
            force: false,
            sequential: false,
        }
    }

    pub fn from_cli(cli: Cli) -> Result<Self> {
        let data_path = cli.data_path.ok_or_else(|| {
            PreprocessError::Config("DATA_PATH is not set and --data-path was not given".to_string())
        })?;
        info!("DATA_PATH={:?}", data_path);
        Ok(PipelineConfig {
            data_path,
            force: cli.force,
            sequential: cli.sequential,
        })
    }

    pub fn credits_path(&self) -> PathBuf {
        self.data_path.join(CREDITS_FILE)
    }

    pub fn movies_metadata_path(&self) -> PathBuf {
        self.data_path.join(MOVIES_METADATA_FILE)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.data_path.join(file_name)
    }

    /// Fails unless the data directory and both input tables exist.
    pub fn validate(&self) -> Result<()> {
        if !self.data_path.is_dir() {
            return Err(PreprocessError::Config(format!(
                "Invalid path to data: {:?}",
                self.data_path
            )));
        }
        for input in [self.credits_path(), self.movies_metadata_path()] {
            if !input.is_file() {
                return Err(PreprocessError::Config(format!(
                    "Data folder {:?} does not contain the input file {:?}",
                    self.data_path,
                    file_name(&input)
                )));
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cli_flags_map_to_config() {
        let cli = Cli::try_parse_from(["preprocess", "--data-path", "/tmp/data", "--force"]).unwrap();
        let config = PipelineConfig::from_cli(cli).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/data"));
        assert!(config.force);
        assert!(!config.sequential);
        assert_eq!(config.credits_path(), PathBuf::from("/tmp/data/credits.csv"));
    }

    #[test]
    fn missing_data_path_is_config_error() {
        let cli = Cli {
            data_path: None,
            force: false,
            sequential: false,
        };
        assert!(matches!(
            PipelineConfig::from_cli(cli),
            Err(PreprocessError::Config(_))
        ));
    }

    #[test]
    fn validate_requires_directory_and_inputs() {
        let temp = tempdir().unwrap();
        let missing = PipelineConfig::new(temp.path().join("nope"));
        assert!(matches!(missing.validate(), Err(PreprocessError::Config(_))));

        let config = PipelineConfig::new(temp.path());
        std::fs::write(config.credits_path(), "id,cast,crew\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(MOVIES_METADATA_FILE));

        std::fs::write(config.movies_metadata_path(), "id,genres,budget\n").unwrap();
        assert!(config.validate().is_ok());
    }
}
