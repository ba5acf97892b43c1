use std::path::PathBuf;
use takeoff_core::error::TakeoffError;
use takeoff_core::vector::{measure_vector_paths, VectorPage};

use crate::output;

pub fn run(
    paths_file: PathBuf,
    scale: Option<String>,
    paper: Option<String>,
    config: Option<PathBuf>,
    output_format: &str,
) -> Result<(), TakeoffError> {
    let options = super::takeoff_options(1, scale.as_deref(), paper.as_deref(), config.as_deref())?;

    let content = std::fs::read_to_string(&paths_file)?;
    let page: VectorPage = serde_json::from_str(&content)?;
    let measurement = measure_vector_paths(&page, &options);

    match output_format {
        "json" => output::json::print(&measurement)?,
        _ => output::table::print_vector(&measurement),
    }

    Ok(())
}
