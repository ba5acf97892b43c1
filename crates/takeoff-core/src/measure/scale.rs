use crate::config::EngineConfig;
use crate::measure::outcome::{ScaleResolution, ScaleSource};
use crate::model::{PaperSize, ScaleDetection};

const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Real-world metres represented by one drawing unit.
pub fn metres_per_unit(paper_width_mm: f64, page_width_units: f64, scale_ratio: u32) -> f64 {
    (paper_width_mm / page_width_units) * f64::from(scale_ratio) / 1000.0
}

/// Pick the scale and paper size for a page and derive the conversion factor.
///
/// Precedence: caller override, then what the drawing declares, then the
/// configured default. Every fallback is reported in `notes`.
pub fn resolve_scale(
    detected: &ScaleDetection,
    scale_override: Option<u32>,
    paper_override: Option<PaperSize>,
    page_width: f64,
    config: &EngineConfig,
    notes: &mut Vec<String>,
) -> ScaleResolution {
    let (scale_ratio, scale_source) = match (scale_override.filter(|r| *r > 0), detected.scale_ratio) {
        (Some(ratio), _) => (ratio, ScaleSource::Override),
        (None, Some(ratio)) => (ratio, ScaleSource::Detected),
        (None, None) => {
            notes.push(format!(
                "Scale not found on drawing; assuming 1:{}",
                config.default_scale_ratio
            ));
            tracing::warn!(
                default = config.default_scale_ratio,
                "scale not detected, using default"
            );
            (config.default_scale_ratio, ScaleSource::Default)
        }
    };

    let (paper_size, paper_source) = match (paper_override, detected.paper_size) {
        (Some(paper), _) => (paper, ScaleSource::Override),
        (None, Some(paper)) => (paper, ScaleSource::Detected),
        (None, None) => {
            notes.push(format!(
                "Paper size not found on drawing; assuming {}",
                config.default_paper_size
            ));
            tracing::warn!(
                default = %config.default_paper_size,
                "paper size not detected, using default"
            );
            (config.default_paper_size, ScaleSource::Default)
        }
    };

    let metres_per_unit = if page_width.is_finite() && page_width > 0.0 {
        metres_per_unit(paper_size.width_mm(), page_width, scale_ratio)
    } else {
        // No usable page width: treat drawing units as true-size PDF points.
        notes.push("Page width unknown; measuring drawing units as printed points".into());
        MM_PER_POINT * f64::from(scale_ratio) / 1000.0
    };

    ScaleResolution {
        scale_ratio,
        scale_source,
        paper_size,
        paper_source,
        metres_per_unit,
    }
}
