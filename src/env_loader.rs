use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const ENV_FILES: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found next to the working directory.
/// Variables already set in the process environment take precedence.
pub fn load_env() {
    for path in ENV_FILES.iter().map(Path::new) {
        if !path.exists() {
            continue;
        }
        match load_env_from_file(path) {
            Ok(count) => {
                info!("Loaded {} environment variables from {:?}", count, path);
                return;
            }
            Err(e) => warn!("Failed to load environment from {:?}: {:#}", path, e),
        }
    }
    info!("No .env file found, using environment variables from system");
}

/// Applies `KEY=value` lines from `file_path`, returning how many were set.
pub fn load_env_from_file(file_path: &Path) -> Result<usize> {
    let file = File::open(file_path).with_context(|| format!("Could not open env file {:?}", file_path))?;
    let mut applied = 0;
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read line from env file")?;
        if let Some((key, value)) = parse_env_line(&line) {
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
                debug!("Set env var from file: {} = {}", key, value);
                applied += 1;
            }
        }
    }
    Ok(applied)
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim().trim_matches('"').trim_matches('\'')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_env_lines() {
        assert_eq!(parse_env_line("DATA_PATH=/data"), Some(("DATA_PATH", "/data")));
        assert_eq!(parse_env_line("export DATA_PATH = \"/data x\""), Some(("DATA_PATH", "/data x")));
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line("   "), None);
        assert_eq!(parse_env_line("no_separator"), None);
    }

    #[test]
    fn system_environment_wins() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".env");
        std::fs::write(
            &path,
            "PREPROCESS_ENV_TEST_NEW=from_file\nPREPROCESS_ENV_TEST_SET=from_file\n",
        )
        .unwrap();
        std::env::set_var("PREPROCESS_ENV_TEST_SET", "from_system");

        let applied = load_env_from_file(&path).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(std::env::var("PREPROCESS_ENV_TEST_NEW").unwrap(), "from_file");
        assert_eq!(std::env::var("PREPROCESS_ENV_TEST_SET").unwrap(), "from_system");
    }
}
