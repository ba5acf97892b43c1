//! Measurement of tray runs drawn as coloured vector lines.
//!
//! Some drawings carry containment as coloured polylines on a layer of
//! their own instead of (or as well as) text annotations. Paths are
//! filtered by stroke colour, stitched together where their endpoints
//! meet, and measured with the same scale resolution as the text engine.

use crate::config::TakeoffOptions;
use crate::measure::outcome::ScaleResolution;
use crate::measure::scale::resolve_scale;
use crate::model::ScaleDetection;
use crate::parsing::recognizers::detect_scale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stroked path as read from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokedPath {
    /// Stroke colour components in 0..=1: one (grey), three (RGB) or four
    /// (CMYK).
    pub colour: Vec<f64>,
    pub points: Vec<[f64; 2]>,
}

/// Input for a vector measurement of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPage {
    pub page_width: f64,
    pub page_height: f64,
    /// Page text, searched for a scale and paper size.
    #[serde(default)]
    pub text: Option<String>,
    pub paths: Vec<StrokedPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub length_metres: f64,
}

/// A merged polyline of one colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRun {
    pub colour: String,
    pub length_metres: f64,
    pub length_units: f64,
    pub segment_count: usize,
    pub bbox: BoundingBox,
    pub midpoint: Point,
    pub segments: Vec<VectorSegment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColourSummary {
    pub run_count: usize,
    pub total_length_metres: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMeasurement {
    pub page_width: f64,
    pub page_height: f64,
    pub scale: ScaleResolution,
    /// Coloured paths that survived the colour and fragment filters.
    pub total_coloured_paths: usize,
    /// Longest first.
    pub runs: Vec<VectorRun>,
    pub colour_summary: BTreeMap<String, ColourSummary>,
    pub notes: Vec<String>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> (f64, f64, f64) {
    ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// True for strokes that are neither near-black, near-white nor grey.
pub fn is_coloured(r: f64, g: f64, b: f64, saturation_threshold: f64) -> bool {
    let brightness = (r + g + b) / 3.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let saturation = if max > 0.0 { (max - min) / max } else { 0.0 };
    brightness > 0.08 && brightness < 0.94 && saturation > saturation_threshold
}

fn stroke_rgb(colour: &[f64]) -> Option<(f64, f64, f64)> {
    match *colour {
        [grey] => Some((grey, grey, grey)),
        [r, g, b] => Some((r, g, b)),
        [c, m, y, k] => Some(cmyk_to_rgb(c, m, y, k)),
        _ => None,
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

fn polyline_length(points: &[[f64; 2]]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Greedily stitch same-coloured polylines whose endpoints lie within
/// `merge_distance`. Each pass walks the remaining paths once, extending
/// the current run at either end; passes repeat until nothing joins.
fn merge_connected(mut remaining: Vec<Vec<[f64; 2]>>, merge_distance: f64) -> Vec<Vec<[f64; 2]>> {
    let mut merged = Vec::new();

    while !remaining.is_empty() {
        let mut current = remaining.remove(0);
        let mut changed = true;

        while changed {
            changed = false;
            let mut unjoined = Vec::new();
            for candidate in remaining {
                let (Some(&c_start), Some(&c_end)) = (candidate.first(), candidate.last()) else {
                    continue;
                };
                let (Some(&cur_start), Some(&cur_end)) = (current.first(), current.last()) else {
                    unjoined.push(candidate);
                    continue;
                };

                if distance(cur_end, c_start) < merge_distance {
                    current.extend_from_slice(&candidate[1..]);
                } else if distance(cur_end, c_end) < merge_distance {
                    current.extend(candidate[..candidate.len() - 1].iter().rev());
                } else if distance(cur_start, c_start) < merge_distance {
                    let mut joined: Vec<[f64; 2]> = candidate[1..].iter().rev().copied().collect();
                    joined.extend_from_slice(&current);
                    current = joined;
                } else if distance(cur_start, c_end) < merge_distance {
                    let mut joined = candidate[..candidate.len() - 1].to_vec();
                    joined.extend_from_slice(&current);
                    current = joined;
                } else {
                    unjoined.push(candidate);
                    continue;
                }
                changed = true;
            }
            remaining = unjoined;
        }

        merged.push(current);
    }

    merged
}

fn bounding_box(points: &[[f64; 2]]) -> BoundingBox {
    let mut bbox = BoundingBox {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        y1: f64::NEG_INFINITY,
    };
    for p in points {
        bbox.x0 = bbox.x0.min(p[0]);
        bbox.y0 = bbox.y0.min(p[1]);
        bbox.x1 = bbox.x1.max(p[0]);
        bbox.y1 = bbox.y1.max(p[1]);
    }
    bbox
}

fn midpoint(points: &[[f64; 2]]) -> Point {
    let n = points.len().max(1) as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    Point {
        x: round_to(sx / n, 1),
        y: round_to(sy / n, 1),
    }
}

/// Measure coloured vector runs on one page.
pub fn measure_vector_paths(page: &VectorPage, options: &TakeoffOptions) -> VectorMeasurement {
    let config = &options.config;
    let mut notes = Vec::new();

    let detected = page
        .text
        .as_deref()
        .map(detect_scale)
        .unwrap_or_else(ScaleDetection::default);
    let scale = resolve_scale(
        &detected,
        options.scale_override,
        options.paper_override,
        page.page_width,
        config,
        &mut notes,
    );

    let mut by_colour: BTreeMap<String, Vec<Vec<[f64; 2]>>> = BTreeMap::new();
    let mut total_coloured_paths = 0;
    for path in &page.paths {
        let Some((r, g, b)) = stroke_rgb(&path.colour) else {
            continue;
        };
        if !is_coloured(r, g, b, config.colour_saturation_threshold) || path.points.len() < 2 {
            continue;
        }
        if polyline_length(&path.points) < config.min_fragment_length {
            continue;
        }
        total_coloured_paths += 1;
        by_colour
            .entry(rgb_to_hex(r, g, b))
            .or_default()
            .push(path.points.clone());
    }

    let mut runs = Vec::new();
    let mut colour_summary: BTreeMap<String, ColourSummary> = BTreeMap::new();

    for (colour, paths) in by_colour {
        for points in merge_connected(paths, config.path_merge_distance) {
            let length_units = polyline_length(&points);
            let length_metres = round_to(length_units * scale.metres_per_unit, 2);
            if length_metres < config.min_vector_run_metres {
                continue;
            }

            let segments: Vec<VectorSegment> = points
                .windows(2)
                .map(|w| VectorSegment {
                    x1: round_to(w[0][0], 1),
                    y1: round_to(w[0][1], 1),
                    x2: round_to(w[1][0], 1),
                    y2: round_to(w[1][1], 1),
                    length_metres: round_to(distance(w[0], w[1]) * scale.metres_per_unit, 2),
                })
                .collect();

            let summary = colour_summary.entry(colour.clone()).or_default();
            summary.run_count += 1;
            summary.total_length_metres += length_metres;

            runs.push(VectorRun {
                colour: colour.clone(),
                length_metres,
                length_units: round_to(length_units, 2),
                segment_count: segments.len(),
                bbox: bounding_box(&points),
                midpoint: midpoint(&points),
                segments,
            });
        }
    }

    for summary in colour_summary.values_mut() {
        summary.total_length_metres = round_to(summary.total_length_metres, 2);
    }
    runs.sort_by(|a, b| b.length_metres.total_cmp(&a.length_metres));

    tracing::debug!(
        coloured_paths = total_coloured_paths,
        runs = runs.len(),
        colours = colour_summary.len(),
        "measured vector paths"
    );

    VectorMeasurement {
        page_width: page.page_width,
        page_height: page.page_height,
        scale,
        total_coloured_paths,
        runs,
        colour_summary,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::PaperSize;

    const RED: [f64; 3] = [0.9, 0.1, 0.1];
    const BLUE: [f64; 3] = [0.1, 0.2, 0.8];

    fn path(colour: &[f64], points: &[[f64; 2]]) -> StrokedPath {
        StrokedPath {
            colour: colour.to_vec(),
            points: points.to_vec(),
        }
    }

    fn options() -> TakeoffOptions {
        TakeoffOptions {
            page: 1,
            scale_override: None,
            paper_override: None,
            config: EngineConfig::default(),
        }
    }

    #[test]
    fn test_colour_helpers() {
        assert_eq!(rgb_to_hex(1.0, 0.0, 0.5), "#ff007f");
        assert_eq!(cmyk_to_rgb(0.0, 1.0, 1.0, 0.0), (1.0, 0.0, 0.0));
        assert!(is_coloured(0.9, 0.1, 0.1, 0.15));
        assert!(!is_coloured(0.5, 0.5, 0.5, 0.15));
        assert!(!is_coloured(0.0, 0.0, 0.0, 0.15));
        assert!(!is_coloured(0.99, 0.97, 0.98, 0.15));
    }

    #[test]
    fn test_touching_paths_merge_into_one_run() {
        let page = VectorPage {
            page_width: 1000.0,
            page_height: 700.0,
            text: Some("LAYOUT SCALE 1:100 A0".into()),
            paths: vec![
                path(&RED, &[[100.0, 100.0], [200.0, 100.0]]),
                path(&RED, &[[300.0, 100.0], [202.0, 100.0]]),
                path(&RED, &[[100.0, 198.0], [100.0, 102.0]]),
            ],
        };
        let m = measure_vector_paths(&page, &options());
        assert_eq!(m.total_coloured_paths, 3);
        assert_eq!(m.runs.len(), 1);
        let run = &m.runs[0];
        assert_eq!(run.colour, "#e51919");
        assert_eq!(run.segment_count, 3);
        assert_eq!(run.length_units, 298.0);
        // 298 units at 0.1189 m per unit
        assert_eq!(run.length_metres, 35.43);
        assert_eq!(m.colour_summary["#e51919"].run_count, 1);
        assert!(m.notes.is_empty());
    }

    #[test]
    fn test_grey_and_tiny_paths_ignored() {
        let page = VectorPage {
            page_width: 1000.0,
            page_height: 700.0,
            text: None,
            paths: vec![
                path(&[0.5], &[[0.0, 0.0], [500.0, 0.0]]),
                path(&RED, &[[0.0, 0.0], [3.0, 0.0]]),
                path(&[0.1, 0.2, 0.3, 0.4, 0.5], &[[0.0, 0.0], [500.0, 0.0]]),
            ],
        };
        let m = measure_vector_paths(&page, &options());
        assert_eq!(m.total_coloured_paths, 0);
        assert!(m.runs.is_empty());
        assert_eq!(m.notes.len(), 2);
    }

    #[test]
    fn test_short_runs_dropped_and_sorted_longest_first() {
        let page = VectorPage {
            page_width: 1000.0,
            page_height: 700.0,
            text: None,
            paths: vec![
                path(&BLUE, &[[0.0, 0.0], [100.0, 0.0]]),
                path(&RED, &[[0.0, 500.0], [400.0, 500.0]]),
                path(&RED, &[[0.0, 300.0], [4.5, 300.0], [4.5, 302.0]]),
            ],
        };
        // At 1:20 the 6.5 unit red fragment is 0.15 m.
        let opts = TakeoffOptions {
            scale_override: Some(20),
            ..options()
        };
        let m = measure_vector_paths(&page, &opts);
        assert_eq!(m.total_coloured_paths, 3);
        assert_eq!(m.runs.len(), 2);
        assert!(m.runs[0].length_metres > m.runs[1].length_metres);
        assert_eq!(m.runs[0].colour, rgb_to_hex(0.9, 0.1, 0.1));
    }

    #[test]
    fn test_overrides_beat_detected_scale() {
        let page = VectorPage {
            page_width: 841.0,
            page_height: 594.0,
            text: Some("SCALE 1:100 A0".into()),
            paths: vec![path(&BLUE, &[[0.0, 0.0], [100.0, 0.0]])],
        };
        let opts = TakeoffOptions {
            scale_override: Some(50),
            paper_override: Some(PaperSize::A1),
            ..options()
        };
        let m = measure_vector_paths(&page, &opts);
        assert_eq!(m.scale.scale_ratio, 50);
        assert_eq!(m.scale.paper_size, PaperSize::A1);
        // 841 mm over 841 units at 1:50: 0.05 m per unit
        assert_eq!(m.runs[0].length_metres, 5.0);
    }

    #[test]
    fn test_reversed_start_join_keeps_all_points() {
        let merged = merge_connected(
            vec![
                vec![[10.0, 0.0], [20.0, 0.0]],
                vec![[10.0, 1.0], [10.0, 50.0], [0.0, 50.0]],
            ],
            5.0,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            vec![[0.0, 50.0], [10.0, 50.0], [10.0, 0.0], [20.0, 0.0]]
        );
    }
}
