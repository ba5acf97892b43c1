use crate::error::TakeoffError;
use crate::model::PaperSize;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the measurement engine.
///
/// Distances are in drawing-native units (PDF points for the pdftotext
/// backend) unless the field name says metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max vertical offset between a word and its phrase anchor.
    pub phrase_vertical_tolerance: f64,
    /// Max horizontal gap between a phrase's right edge and the next word.
    pub phrase_horizontal_gap: f64,
    /// Annotation pairs closer than this on both axes are the same point.
    pub segment_noise_threshold: f64,
    /// Length assigned to a tray run whose annotations yield no measured length.
    pub minimum_run_metres: f64,
    /// Stock length tray is sold in.
    pub wholesaler_length_metres: f64,
    /// Cable supply unit.
    pub drum_length_metres: f64,
    /// A drop belongs to a run if it lies within this distance on both axes.
    pub drop_tolerance: f64,
    /// Turns sharper than this (radians) count as a bend.
    pub bend_angle_threshold: f64,
    pub default_scale_ratio: u32,
    pub default_paper_size: PaperSize,
    /// Endpoints closer than this join two vector paths into one run.
    pub path_merge_distance: f64,
    /// Vector paths shorter than this are drawing noise.
    pub min_fragment_length: f64,
    /// Merged vector runs shorter than this are discarded.
    pub min_vector_run_metres: f64,
    pub colour_saturation_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            phrase_vertical_tolerance: 5.0,
            phrase_horizontal_gap: 30.0,
            segment_noise_threshold: 20.0,
            minimum_run_metres: 10.0,
            wholesaler_length_metres: 3.0,
            drum_length_metres: 100.0,
            drop_tolerance: 100.0,
            bend_angle_threshold: std::f64::consts::FRAC_PI_4,
            default_scale_ratio: 100,
            default_paper_size: PaperSize::A0,
            path_merge_distance: 5.0,
            min_fragment_length: 5.0,
            min_vector_run_metres: 0.5,
            colour_saturation_threshold: 0.15,
        }
    }
}

/// Load an engine config from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, TakeoffError> {
    let content = std::fs::read_to_string(path).map_err(|e| TakeoffError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|e| TakeoffError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse an engine config from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<EngineConfig, TakeoffError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that every length and threshold is usable.
pub fn validate_config(config: &EngineConfig) -> Result<(), TakeoffError> {
    let positive = [
        ("phrase_vertical_tolerance", config.phrase_vertical_tolerance),
        ("phrase_horizontal_gap", config.phrase_horizontal_gap),
        ("segment_noise_threshold", config.segment_noise_threshold),
        ("wholesaler_length_metres", config.wholesaler_length_metres),
        ("drum_length_metres", config.drum_length_metres),
        ("drop_tolerance", config.drop_tolerance),
        ("bend_angle_threshold", config.bend_angle_threshold),
        ("path_merge_distance", config.path_merge_distance),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(TakeoffError::ConfigInvalid(format!(
                "{} must be a positive number (got {})",
                name, value
            )));
        }
    }

    let non_negative = [
        ("minimum_run_metres", config.minimum_run_metres),
        ("min_fragment_length", config.min_fragment_length),
        ("min_vector_run_metres", config.min_vector_run_metres),
        ("colour_saturation_threshold", config.colour_saturation_threshold),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(TakeoffError::ConfigInvalid(format!(
                "{} must not be negative (got {})",
                name, value
            )));
        }
    }

    if config.bend_angle_threshold >= std::f64::consts::PI {
        return Err(TakeoffError::ConfigInvalid(
            "bend_angle_threshold must be below pi".into(),
        ));
    }

    if config.default_scale_ratio == 0 {
        return Err(TakeoffError::ConfigInvalid(
            "default_scale_ratio must not be zero".into(),
        ));
    }

    Ok(())
}

/// Per-invocation settings for a takeoff run.
#[derive(Debug, Clone)]
pub struct TakeoffOptions {
    /// 1-based page of the drawing to measure.
    pub page: usize,
    /// Scale ratio forced by the caller (the `100` of `1:100`).
    pub scale_override: Option<u32>,
    pub paper_override: Option<PaperSize>,
    pub config: EngineConfig,
}

impl Default for TakeoffOptions {
    fn default() -> Self {
        Self {
            page: 1,
            scale_override: None,
            paper_override: None,
            config: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config_str(r#"{ "segment_noise_threshold": 12.5 }"#).unwrap();
        assert_eq!(config.segment_noise_threshold, 12.5);
        assert_eq!(config.phrase_horizontal_gap, 30.0);
        assert_eq!(config.default_paper_size, PaperSize::A0);
    }

    #[test]
    fn test_zero_stock_length_rejected() {
        assert!(parse_config_str(r#"{ "wholesaler_length_metres": 0 }"#).is_err());
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(parse_config_str(r#"{ "default_scale_ratio": 0 }"#).is_err());
    }

    #[test]
    fn test_straight_line_bend_threshold_rejected() {
        assert!(parse_config_str(r#"{ "bend_angle_threshold": 3.2 }"#).is_err());
    }

    #[test]
    fn test_paper_size_from_json() {
        let config = parse_config_str(r#"{ "default_paper_size": "A1" }"#).unwrap();
        assert_eq!(config.default_paper_size, PaperSize::A1);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }
}
