use crate::model::{RunAnnotation, TrayDuty, TrayType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NO_TEXT_ID: &str = "no-text";
pub const EXTRACTION_FAILED_ID: &str = "extraction-failed";
pub const TRAY_FILTER_ID: &str = "tray-filter";
pub const TRAY_DUTY_ID: &str = "tray-duty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    YesNo,
    Choice,
    /// Nothing to decide beyond acknowledging a dead end.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

impl QuestionOption {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A clarification the operator may answer. Questions are data: the
/// engine returns them and never waits on an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// The page had no text layer, typically a scanned or flattened drawing.
pub fn no_text_question() -> Question {
    Question {
        id: NO_TEXT_ID.into(),
        prompt: "No text could be read from this drawing. It may be scanned or flattened; \
                 tray annotations cannot be measured automatically."
            .into(),
        kind: QuestionKind::Skip,
        options: vec![QuestionOption::new("skip", "Skip this drawing")],
        default: Some("skip".into()),
    }
}

/// The word extractor failed outright.
pub fn extraction_failed_question(reason: &str) -> Question {
    Question {
        id: EXTRACTION_FAILED_ID.into(),
        prompt: format!("Text extraction failed for this drawing: {}", reason),
        kind: QuestionKind::Skip,
        options: vec![
            QuestionOption::new("skip", "Skip this drawing"),
            QuestionOption::new("retry", "Retry extraction"),
        ],
        default: Some("skip".into()),
    }
}

/// Pick the default answer for the tray filter: LV when present, else the
/// most annotated type (first in type order on a tie).
fn default_filter(counts: &BTreeMap<TrayType, usize>) -> Option<TrayType> {
    if counts.contains_key(&TrayType::Lv) {
        return Some(TrayType::Lv);
    }
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(t, _)| *t)
}

/// Questions for a page whose text was analysed.
///
/// A filter question appears only when more than one tray type was found.
/// The duty question is always asked since duty cannot be read off a
/// drawing.
pub fn generate_questions(annotations: &[RunAnnotation]) -> Vec<Question> {
    let mut questions = Vec::new();

    let mut counts: BTreeMap<TrayType, usize> = BTreeMap::new();
    for a in annotations {
        *counts.entry(a.tray_type).or_default() += 1;
    }

    if counts.len() > 1 {
        let mut options: Vec<QuestionOption> = counts
            .iter()
            .map(|(t, n)| {
                let plural = if *n == 1 { "" } else { "s" };
                QuestionOption::new(t.as_str(), format!("{} only ({} annotation{})", t, n, plural))
            })
            .collect();
        options.push(QuestionOption::new("all", "All tray types"));

        let types: Vec<&str> = counts.keys().map(|t| t.as_str()).collect();
        questions.push(Question {
            id: TRAY_FILTER_ID.into(),
            prompt: format!(
                "Several tray types were found ({}). Which should the cable estimate cover?",
                types.join(", ")
            ),
            kind: QuestionKind::Choice,
            options,
            default: default_filter(&counts).map(|t| t.as_str().to_string()),
        });
    }

    questions.push(Question {
        id: TRAY_DUTY_ID.into(),
        prompt: "What duty rating should the tray be?".into(),
        kind: QuestionKind::Choice,
        options: [TrayDuty::Light, TrayDuty::Medium, TrayDuty::Heavy]
            .into_iter()
            .map(|d| {
                let label = match d {
                    TrayDuty::Light => "Light duty",
                    TrayDuty::Medium => "Medium duty",
                    TrayDuty::Heavy => "Heavy duty",
                };
                QuestionOption::new(d.as_str(), label)
            })
            .collect(),
        default: Some(TrayDuty::default().as_str().into()),
    });

    questions
}
