pub mod config;
pub mod error;
pub mod extraction;
pub mod lifecycle;
pub mod measure;
pub mod model;
pub mod overlay;
pub mod parsing;
pub mod questions;
pub mod vector;

pub use config::TakeoffOptions;

use extraction::{PageWords, WordExtractor};
use measure::cable::compute_cable_summary;
use measure::fittings::summarize_fittings;
use measure::outcome::{CableSummary, TakeoffResult};
use measure::runs::build_tray_runs;
use measure::scale::resolve_scale;
use model::{ScaleDetection, UserInputs};
use std::collections::BTreeMap;

/// Main API entry point: measure the tray runs on one page of a drawing.
///
/// Never fails. An extractor error becomes a result carrying only the
/// extraction-failed question, so every drawing yields something an
/// operator can review.
pub fn takeoff_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn WordExtractor,
    drawing_ref: &str,
    options: &TakeoffOptions,
) -> TakeoffResult {
    match extractor.extract_words(pdf_bytes, options.page) {
        Ok(page) => takeoff_words(&page, drawing_ref, options),
        Err(e) => {
            tracing::warn!(
                drawing = drawing_ref,
                backend = extractor.backend_name(),
                error = %e,
                "word extraction failed"
            );
            let mut result = dead_end_result(drawing_ref, options.page, 0.0, 0.0);
            result
                .drawing_notes
                .push(format!("Text extraction failed ({}): {}", extractor.backend_name(), e));
            result
                .questions
                .push(questions::extraction_failed_question(&e.to_string()));
            result
        }
    }
}

/// Measure a page whose words are already extracted.
pub fn takeoff_words(page: &PageWords, drawing_ref: &str, options: &TakeoffOptions) -> TakeoffResult {
    if page.words.is_empty() {
        tracing::warn!(drawing = drawing_ref, page = page.page_number, "page has no text layer");
        let mut result =
            dead_end_result(drawing_ref, page.page_number, page.page_width, page.page_height);
        result
            .drawing_notes
            .push("No text layer found; the drawing may be scanned or flattened".into());
        result.questions.push(questions::no_text_question());
        return result;
    }

    let config = &options.config;
    let parsed = parsing::parse_drawing(&page.words, config);

    let mut notes = Vec::new();
    let scale = resolve_scale(
        &parsed.scale,
        options.scale_override,
        options.paper_override,
        page.page_width,
        config,
        &mut notes,
    );

    let tray_runs = build_tray_runs(&parsed.runs, &parsed.drops, scale.metres_per_unit, config);
    tracing::debug!(
        runs = tray_runs.len(),
        metres_per_unit = scale.metres_per_unit,
        "grouped tray runs"
    );

    if parsed.runs.is_empty() {
        notes.push("No tray run annotations recognised on this page".into());
    }
    for run in &tray_runs {
        if run.segments.is_empty() {
            notes.push(format!(
                "{}mm {} tray: no measurable span between annotations; assumed {} m",
                run.size_mm, run.tray_type, run.length_metres
            ));
        }
    }

    let fitting_summary = summarize_fittings(&tray_runs);
    let questions = questions::generate_questions(&parsed.runs);

    let result = TakeoffResult {
        drawing_ref: drawing_ref.to_string(),
        page_number: page.page_number,
        page_width: page.page_width,
        page_height: page.page_height,
        detected: parsed.scale,
        scale: Some(scale),
        tray_runs,
        fitting_summary,
        questions,
        drawing_notes: notes,
        has_text_layer: true,
        total_text_elements: page.words.len(),
        phrase_count: parsed.phrases.len(),
        run_annotation_count: parsed.runs.len(),
        drop_annotation_count: parsed.drops.len(),
    };

    tracing::info!(
        drawing = drawing_ref,
        page = result.page_number,
        runs = result.tray_runs.len(),
        total_metres = result.total_tray_metres(),
        questions = result.questions.len(),
        "takeoff complete"
    );

    result
}

/// Cable estimate for a finished result under the given inputs.
pub fn cable_for_result(
    result: &TakeoffResult,
    inputs: &UserInputs,
    options: &TakeoffOptions,
) -> CableSummary {
    compute_cable_summary(&result.tray_runs, inputs, &options.config)
}

fn dead_end_result(
    drawing_ref: &str,
    page_number: usize,
    page_width: f64,
    page_height: f64,
) -> TakeoffResult {
    TakeoffResult {
        drawing_ref: drawing_ref.to_string(),
        page_number,
        page_width,
        page_height,
        detected: ScaleDetection::default(),
        scale: None,
        tray_runs: Vec::new(),
        fitting_summary: BTreeMap::new(),
        questions: Vec::new(),
        drawing_notes: Vec::new(),
        has_text_layer: false,
        total_text_elements: 0,
        phrase_count: 0,
        run_annotation_count: 0,
        drop_annotation_count: 0,
    }
}
