use log::{debug, info};
use std::path::Path;

pub const CAST_INFO_FILE: &str = "cast_info.csv";
pub const CAST_MOVIE_RELATIONSHIP_FILE: &str = "cast_movie_relationship.csv";
pub const CREW_INFO_FILE: &str = "crew_info.csv";
pub const CREW_MOVIE_RELATIONSHIP_FILE: &str = "crew_movie_relationship.csv";
pub const MOVIES_FILE: &str = "movies.csv";

/// Every table a completed run leaves in the data directory.
pub const OUTPUT_FILES: [&str; 5] = [
    CAST_INFO_FILE,
    CAST_MOVIE_RELATIONSHIP_FILE,
    CREW_INFO_FILE,
    CREW_MOVIE_RELATIONSHIP_FILE,
    MOVIES_FILE,
];

/// True when all output tables already exist, meaning a previous run
/// finished and this one has nothing to do.
pub fn outputs_complete(data_path: &Path) -> bool {
    let missing: Vec<&str> = OUTPUT_FILES
        .iter()
        .copied()
        .filter(|name| !data_path.join(name).exists())
        .collect();
    if missing.is_empty() {
        info!("All output tables already present in {:?}.", data_path);
        true
    } else {
        debug!("Output tables not yet present: {:?}", missing);
        false
    }
}
