use crate::extraction::PositionedWord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Words judged to sit on one visual line, joined with single spaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    /// Anchor: top-left of the first word.
    pub x: f64,
    pub y: f64,
    /// Right edge of the rightmost word.
    pub end_x: f64,
}

/// Order words top-to-bottom, then left-to-right.
///
/// Words are banded into rows: a word belongs to the open row while its `y`
/// is within `row_tolerance` of the row's first word. Each row is then
/// sorted by `x`, so baseline jitter never reorders a line.
pub fn reading_order(words: &[PositionedWord], row_tolerance: f64) -> Vec<&PositionedWord> {
    let mut by_y: Vec<&PositionedWord> = words.iter().collect();
    by_y.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut ordered = Vec::with_capacity(by_y.len());
    let mut row: Vec<&PositionedWord> = Vec::new();
    for word in by_y {
        let new_row = row.first().is_some_and(|anchor| word.y - anchor.y >= row_tolerance);
        if new_row {
            flush_row(&mut row, &mut ordered);
        }
        row.push(word);
    }
    flush_row(&mut row, &mut ordered);
    ordered
}

fn flush_row<'a>(row: &mut Vec<&'a PositionedWord>, out: &mut Vec<&'a PositionedWord>) {
    row.sort_by(|a, b| compare_in_row(a, b));
    out.append(row);
}

fn compare_in_row(a: &PositionedWord, b: &PositionedWord) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// Merge reading-ordered words into phrases.
///
/// A word joins the open phrase when it is within `vertical_tolerance` of
/// the phrase anchor, starts at or right of the anchor, and starts less
/// than `horizontal_gap` past the phrase's right edge.
pub fn assemble_phrases(
    words: &[&PositionedWord],
    vertical_tolerance: f64,
    horizontal_gap: f64,
) -> Vec<Phrase> {
    let mut phrases = Vec::new();
    let mut current: Option<Phrase> = None;

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(phrase) = current.as_mut() {
            let same_line = (word.y - phrase.y).abs() < vertical_tolerance;
            let close = word.x >= phrase.x && word.x - phrase.end_x < horizontal_gap;
            if same_line && close {
                phrase.text.push(' ');
                phrase.text.push_str(text);
                phrase.end_x = phrase.end_x.max(word.right());
                continue;
            }
        }

        if let Some(done) = current.take() {
            phrases.push(done);
        }
        current = Some(Phrase {
            text: text.to_string(),
            x: word.x,
            y: word.y,
            end_x: word.right(),
        });
    }

    if let Some(done) = current {
        phrases.push(done);
    }

    phrases
}
