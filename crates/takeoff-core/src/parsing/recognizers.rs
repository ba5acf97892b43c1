use crate::extraction::PositionedWord;
use crate::model::{is_known_size, DropAnnotation, PaperSize, RunAnnotation, ScaleDetection, TrayType};
use crate::parsing::phrases::Phrase;
use regex::Regex;
use std::sync::LazyLock;

/// `[NEW] <size> [MM] <type> [CABLE] TRAY`
static RUN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:NEW\s+)?(\d+)\s*(?:MM\s+)?([A-Z]+)\s+(?:CABLE\s+)?TRAY\b")
        .expect("valid run regex")
});

/// `@<mm>` installation height.
static HEIGHT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\s*(\d+(?:\.\d+)?)").expect("valid height regex"));

/// `1:<ratio>`, optionally spaced around the colon.
static SCALE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\s*:\s*(\d+)\b").expect("valid scale regex"));

/// Recognise a tray run annotation in a phrase.
///
/// Returns None unless both the size and the type belong to the known
/// sets: a missed annotation costs less than a phantom tray run.
pub fn recognize_run(phrase: &Phrase) -> Option<RunAnnotation> {
    RUN_PATTERN.captures_iter(&phrase.text).find_map(|caps| {
        let size_mm: u32 = caps.get(1)?.as_str().parse().ok()?;
        if !is_known_size(size_mm) {
            return None;
        }
        let tray_type = TrayType::from_token(caps.get(2)?.as_str())?;
        Some(RunAnnotation {
            size_mm,
            tray_type,
            height_metres: recognize_height(&phrase.text),
            x: phrase.x,
            y: phrase.y,
            end_x: phrase.end_x,
        })
    })
}

/// Installation height in metres from an `@<mm>` suffix.
pub fn recognize_height(text: &str) -> Option<f64> {
    let caps = HEIGHT_PATTERN.captures(text)?;
    let millimetres: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(millimetres / 1000.0)
}

/// Scale ratio and paper size declared anywhere in the page text.
pub fn detect_scale(text: &str) -> ScaleDetection {
    let scale_ratio = SCALE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|ratio| *ratio > 0);

    let paper_size = text.split_whitespace().find_map(|token| {
        let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        PaperSize::from_str_loose(token)
    });

    ScaleDetection {
        scale_ratio,
        paper_size,
    }
}

/// Find drop annotations: three consecutive words mentioning DROP together
/// with LEVEL or COLUMN. The window's first word anchors the drop.
///
/// A matched window is consumed whole, so one annotation is never counted
/// twice by overlapping windows.
pub fn find_drops(words: &[&PositionedWord]) -> Vec<DropAnnotation> {
    let mut drops = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let window = &words[i..(i + 3).min(words.len())];
        let joined: String = window
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        let upper = joined.to_uppercase();

        if upper.contains("DROP") && (upper.contains("LEVEL") || upper.contains("COLUMN")) {
            drops.push(DropAnnotation {
                x: window[0].x,
                y: window[0].y,
                text: joined,
            });
            i += window.len();
        } else {
            i += 1;
        }
    }

    drops
}
