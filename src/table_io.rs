use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::errors::{PreprocessError, Result};
use crate::models::{MovieTable, RawCreditsRow, RawMovieRow, TableRow};

/// Reads the credits table. A row whose `id` is not an integer, or a
/// missing `cast`/`crew` column, is a schema error.
pub fn read_credits(path: &Path) -> Result<Vec<RawCreditsRow>> {
    info!("Reading credits from {:?}", path);
    let mut reader = csv::Reader::from_path(path).map_err(|e| PreprocessError::csv(path, e))?;
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RawCreditsRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) => {
                return Err(PreprocessError::Schema {
                    context: format!("credits row {}", index + 1),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(PreprocessError::csv(path, err)),
        }
    }
    info!("Read {} credits rows.", rows.len());
    Ok(rows)
}

/// Reads the movie metadata table with every column kept as text.
///
/// Rows that end early (the shape of the image-path corruption in the
/// budget column) are padded with empty cells to the header width. Rows
/// with more cells than the header are a schema error.
pub fn read_movies(path: &Path) -> Result<MovieTable> {
    info!("Reading movie metadata from {:?}", path);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PreprocessError::csv(path, e))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PreprocessError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let width = headers.len();
    let mut rows = Vec::new();
    let mut padded = 0usize;
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PreprocessError::csv(path, e))?;
        if record.len() > width {
            return Err(PreprocessError::Schema {
                context: format!("movies_metadata row {}", index + 1),
                message: format!("{} cells for {} columns", record.len(), width),
            });
        }
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        if fields.len() < width {
            fields.resize(width, String::new());
            padded += 1;
        }
        rows.push(RawMovieRow { fields });
    }
    if padded > 0 {
        warn!("Padded {} short movie metadata rows with empty cells.", padded);
    }
    info!("Read {} movie metadata rows.", rows.len());
    Ok(MovieTable { headers, rows })
}

/// Output tables written next to their final location and moved into place
/// together by [`StagedOutputs::commit`]. Dropping without committing
/// removes whatever was staged.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    staged: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, final_path: &Path) -> PathBuf {
        let staging = final_path.with_extension("csv.partial");
        self.staged.push((staging.clone(), final_path.to_path_buf()));
        staging
    }

    pub fn write_rows<R: TableRow>(&mut self, final_path: &Path, rows: &[R]) -> Result<usize> {
        let staging = self.stage(final_path);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&staging)
            .map_err(|e| PreprocessError::csv(&staging, e))?;
        writer
            .write_record(R::HEADERS)
            .map_err(|e| PreprocessError::csv(&staging, e))?;
        for row in rows {
            writer
                .serialize(row)
                .map_err(|e| PreprocessError::csv(&staging, e))?;
        }
        writer.flush().map_err(|e| PreprocessError::io(&staging, e))?;
        debug!("Staged {} rows for {:?}", rows.len(), final_path);
        Ok(rows.len())
    }

    pub fn write_movies(&mut self, final_path: &Path, table: &MovieTable) -> Result<usize> {
        let staging = self.stage(final_path);
        let mut writer = csv::Writer::from_path(&staging).map_err(|e| PreprocessError::csv(&staging, e))?;
        writer
            .write_record(&table.headers)
            .map_err(|e| PreprocessError::csv(&staging, e))?;
        for row in &table.rows {
            writer
                .write_record(&row.fields)
                .map_err(|e| PreprocessError::csv(&staging, e))?;
        }
        writer.flush().map_err(|e| PreprocessError::io(&staging, e))?;
        debug!("Staged {} rows for {:?}", table.rows.len(), final_path);
        Ok(table.rows.len())
    }

    /// Moves every staged table to its final name.
    pub fn commit(mut self) -> Result<()> {
        for (staging, final_path) in &self.staged {
            std::fs::rename(staging, final_path).map_err(|e| PreprocessError::io(final_path, e))?;
            info!("Wrote {:?}", final_path);
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedOutputs {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (staging, _) in &self.staged {
            if staging.exists() {
                if let Err(e) = std::fs::remove_file(staging) {
                    warn!("Could not remove staging file {:?}: {}", staging, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrewRelationship, PersonIdentity};
    use tempfile::tempdir;

    #[test]
    fn reads_credits_rows() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("credits.csv");
        std::fs::write(
            &path,
            "cast,crew,id\n\"[{'id': 1, 'name': 'A, B'}]\",[],862\n",
        )
        .unwrap();
        let rows = read_credits(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].movie_id, 862);
        assert_eq!(rows[0].cast_text, "[{'id': 1, 'name': 'A, B'}]");
        assert_eq!(rows[0].crew_text, "[]");
    }

    #[test]
    fn non_integer_movie_id_is_schema_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("credits.csv");
        std::fs::write(&path, "cast,crew,id\n[],[],abc\n").unwrap();
        assert!(matches!(
            read_credits(&path),
            Err(PreprocessError::Schema { .. })
        ));
    }

    #[test]
    fn movie_table_passes_fields_through() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("movies_metadata.csv");
        let output = temp.path().join("movies.csv");
        let text = "budget,genres,id,overview\n0,[],1,\"Quoted, text\"\n";
        std::fs::write(&input, text).unwrap();

        let table = read_movies(&input).unwrap();
        assert_eq!(table.rows[0].fields[3], "Quoted, text");

        let mut staged = StagedOutputs::new();
        staged.write_movies(&output, &table).unwrap();
        assert!(!output.exists());
        staged.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), text);
    }

    #[test]
    fn short_movie_rows_are_padded_to_header_width() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("movies_metadata.csv");
        let output = temp.path().join("movies.csv");
        std::fs::write(
            &input,
            "adult,budget,genres,id,title,video\n - Written by X,/ff9.jpg,\"[{'id': 1, 'name': 'C'}]\",1997-08-20\n",
        )
        .unwrap();

        let table = read_movies(&input).unwrap();
        assert_eq!(table.rows[0].fields.len(), 6);
        assert_eq!(table.rows[0].fields[1], "/ff9.jpg");
        assert_eq!(table.rows[0].fields[4], "");

        let mut staged = StagedOutputs::new();
        staged.write_movies(&output, &table).unwrap();
        staged.commit().unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.ends_with(",1997-08-20,,\n"));
    }

    #[test]
    fn long_movie_rows_are_schema_errors() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("movies_metadata.csv");
        std::fs::write(&input, "budget,genres,id\n0,[],1,extra\n").unwrap();
        assert!(matches!(
            read_movies(&input),
            Err(PreprocessError::Schema { .. })
        ));
    }

    #[test]
    fn empty_tables_still_get_headers() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("crew_movie_relationship.csv");
        let mut staged = StagedOutputs::new();
        staged.write_rows::<CrewRelationship>(&path, &[]).unwrap();
        staged.commit().unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "actor_id,movie_id,department\n"
        );
    }

    #[test]
    fn uncommitted_outputs_are_removed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cast_info.csv");
        {
            let mut staged = StagedOutputs::new();
            let rows = vec![PersonIdentity {
                id: "1".to_string(),
                name: "A".to_string(),
                gender: "0".to_string(),
            }];
            staged.write_rows(&path, rows.as_slice()).unwrap();
        }
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
