pub mod cable;
pub mod config;
pub mod extract;
pub mod overlay;
pub mod vector;

use std::path::Path;
use takeoff_core::config::{load_config, EngineConfig, TakeoffOptions};
use takeoff_core::error::TakeoffError;
use takeoff_core::model::PaperSize;

/// Accept `100` or `1:100`.
pub fn parse_scale(arg: &str) -> Result<u32, TakeoffError> {
    let digits = arg.trim();
    let digits = digits.strip_prefix("1:").unwrap_or(digits).trim();
    match digits.parse::<u32>() {
        Ok(ratio) if ratio > 0 => Ok(ratio),
        _ => Err(TakeoffError::InvalidInputs(format!(
            "scale '{}' is not a ratio like 100 or 1:100",
            arg
        ))),
    }
}

pub fn parse_paper(arg: &str) -> Result<PaperSize, TakeoffError> {
    PaperSize::from_str_loose(arg).ok_or_else(|| {
        TakeoffError::InvalidInputs(format!("paper size '{}' is not one of A0-A4", arg))
    })
}

pub fn engine_config(path: Option<&Path>) -> Result<EngineConfig, TakeoffError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(EngineConfig::default()),
    }
}

pub fn takeoff_options(
    page: usize,
    scale: Option<&str>,
    paper: Option<&str>,
    config: Option<&Path>,
) -> Result<TakeoffOptions, TakeoffError> {
    Ok(TakeoffOptions {
        page,
        scale_override: scale.map(parse_scale).transpose()?,
        paper_override: paper.map(parse_paper).transpose()?,
        config: engine_config(config)?,
    })
}
