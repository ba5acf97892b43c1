pub mod phrases;
pub mod recognizers;

use crate::config::EngineConfig;
use crate::extraction::PositionedWord;
use crate::model::{DropAnnotation, RunAnnotation, ScaleDetection};
use phrases::{assemble_phrases, reading_order, Phrase};
use recognizers::{detect_scale, find_drops, recognize_run};

/// Everything the annotation parser recognised on one page.
#[derive(Debug, Clone, Default)]
pub struct ParsedDrawing {
    pub phrases: Vec<Phrase>,
    pub runs: Vec<RunAnnotation>,
    pub drops: Vec<DropAnnotation>,
    pub scale: ScaleDetection,
}

/// Parse a page's words into run, drop and scale facts.
///
/// Phrases that match nothing are not an error; a drawing with no
/// containment on it yields an empty `ParsedDrawing`.
pub fn parse_drawing(words: &[PositionedWord], config: &EngineConfig) -> ParsedDrawing {
    let ordered = reading_order(words, config.phrase_vertical_tolerance);
    let phrases = assemble_phrases(
        &ordered,
        config.phrase_vertical_tolerance,
        config.phrase_horizontal_gap,
    );

    let runs: Vec<RunAnnotation> = phrases.iter().filter_map(recognize_run).collect();

    let all_text = ordered
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let scale = detect_scale(&all_text);

    let drops = find_drops(&ordered);

    tracing::debug!(
        words = words.len(),
        phrases = phrases.len(),
        runs = runs.len(),
        drops = drops.len(),
        scale_ratio = ?scale.scale_ratio,
        paper_size = ?scale.paper_size,
        "parsed drawing annotations"
    );

    ParsedDrawing {
        phrases,
        runs,
        drops,
        scale,
    }
}
