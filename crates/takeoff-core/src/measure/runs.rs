use crate::config::EngineConfig;
use crate::measure::outcome::{TrayRun, TraySegment};
use crate::model::{DropAnnotation, RunAnnotation, TrayType};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Group run annotations by (size, type) and measure each group.
///
/// Output order is by size, then type, so the same annotations always
/// produce the same runs.
pub fn build_tray_runs(
    annotations: &[RunAnnotation],
    drops: &[DropAnnotation],
    metres_per_unit: f64,
    config: &EngineConfig,
) -> Vec<TrayRun> {
    let mut groups: BTreeMap<(u32, TrayType), Vec<&RunAnnotation>> = BTreeMap::new();
    for annotation in annotations {
        groups
            .entry((annotation.size_mm, annotation.tray_type))
            .or_default()
            .push(annotation);
    }

    groups
        .into_iter()
        .map(|((size_mm, tray_type), mut group)| {
            group.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.x.total_cmp(&b.x)));
            measure_group(size_mm, tray_type, &group, drops, metres_per_unit, config)
        })
        .collect()
}

fn measure_group(
    size_mm: u32,
    tray_type: TrayType,
    group: &[&RunAnnotation],
    drops: &[DropAnnotation],
    metres_per_unit: f64,
    config: &EngineConfig,
) -> TrayRun {
    let noise = config.segment_noise_threshold;
    let mut segments = Vec::new();
    let mut measured = 0.0;

    for pair in group.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if !exceeds_noise(dx, dy, noise) {
            continue;
        }
        let length = dx.hypot(dy) * metres_per_unit;
        measured += length;
        segments.push(TraySegment {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            length_metres: round1(length),
        });
    }

    let length_metres = if measured > 0.0 {
        round1(measured)
    } else {
        config.minimum_run_metres
    };

    let drop_count = drops
        .iter()
        .filter(|d| {
            group.iter().any(|a| {
                (d.x - a.x).abs() <= config.drop_tolerance
                    && (d.y - a.y).abs() <= config.drop_tolerance
            })
        })
        .count();

    TrayRun {
        id: run_id(size_mm, tray_type),
        size_mm,
        tray_type,
        length_metres,
        height_metres: group.iter().find_map(|a| a.height_metres),
        wholesaler_lengths: wholesaler_lengths(length_metres, config.wholesaler_length_metres),
        t_pieces: 0,
        cross_pieces: 0,
        bends_90: count_bends(group, config.bend_angle_threshold),
        drops: drop_count as u32,
        annotation_count: group.len(),
        segments,
    }
}

pub fn run_id(size_mm: u32, tray_type: TrayType) -> String {
    format!("tray-{}-{}", size_mm, tray_type.as_str().to_lowercase())
}

/// Stock lengths needed to cover a run.
pub fn wholesaler_lengths(length_metres: f64, stock_length_metres: f64) -> u32 {
    (length_metres / stock_length_metres).ceil().max(0.0) as u32
}

fn exceeds_noise(dx: f64, dy: f64, noise: f64) -> bool {
    dx.abs() > noise || dy.abs() > noise
}

/// Count direction changes sharper than `threshold` at interior annotations.
///
/// T-pieces and crosses cannot be told apart from bends by angle alone, so
/// every change of direction is reported as a 90 degree bend.
fn count_bends(group: &[&RunAnnotation], threshold: f64) -> u32 {
    let mut bends = 0;
    for w in group.windows(3) {
        let (prev, cur, next) = (w[0], w[1], w[2]);
        let (in_dx, in_dy) = (cur.x - prev.x, cur.y - prev.y);
        let (out_dx, out_dy) = (next.x - cur.x, next.y - cur.y);
        // Coincident labels have no direction to turn from.
        if (in_dx == 0.0 && in_dy == 0.0) || (out_dx == 0.0 && out_dy == 0.0) {
            continue;
        }
        let turn = normalize_angle(out_dy.atan2(out_dx) - in_dy.atan2(in_dx));
        if turn.abs() > threshold {
            bends += 1;
        }
    }
    bends
}

/// Wrap an angle into (-pi, pi].
fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(size_mm: u32, tray_type: TrayType, x: f64, y: f64) -> RunAnnotation {
        RunAnnotation {
            size_mm,
            tray_type,
            height_metres: None,
            x,
            y,
            end_x: x + 60.0,
        }
    }

    // A0 at 1:100 on a 1000-unit-wide page.
    const FACTOR: f64 = 1189.0 / 1000.0 * 100.0 / 1000.0;

    #[test]
    fn test_two_annotations_one_segment() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 150.0, 100.0),
        ];
        let runs = build_tray_runs(&annotations, &[], FACTOR, &EngineConfig::default());
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.segments.len(), 1);
        assert_eq!(run.segments[0].length_metres, 5.9);
        assert_eq!(run.length_metres, 5.9);
        assert_eq!(run.wholesaler_lengths, 2);
        assert_eq!(run.id, "tray-100-lv");
    }

    #[test]
    fn test_single_annotation_gets_minimum() {
        let annotations = vec![ann(150, TrayType::Fa, 10.0, 10.0)];
        let runs = build_tray_runs(&annotations, &[], FACTOR, &EngineConfig::default());
        assert_eq!(runs[0].length_metres, 10.0);
        assert_eq!(runs[0].wholesaler_lengths, 4);
        assert!(runs[0].segments.is_empty());
    }

    #[test]
    fn test_close_pair_is_noise() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 115.0, 110.0),
        ];
        let runs = build_tray_runs(&annotations, &[], FACTOR, &EngineConfig::default());
        assert!(runs[0].segments.is_empty());
        assert_eq!(runs[0].length_metres, 10.0);
    }

    #[test]
    fn test_groups_by_size_and_type() {
        let annotations = vec![
            ann(300, TrayType::Lv, 0.0, 0.0),
            ann(100, TrayType::Fa, 0.0, 0.0),
            ann(100, TrayType::Lv, 0.0, 0.0),
            ann(100, TrayType::Lv, 500.0, 0.0),
        ];
        let runs = build_tray_runs(&annotations, &[], FACTOR, &EngineConfig::default());
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["tray-100-lv", "tray-100-fa", "tray-300-lv"]);
        assert_eq!(runs[0].annotation_count, 2);
    }

    #[test]
    fn test_sorted_by_y_then_x() {
        let annotations = vec![
            ann(100, TrayType::Lv, 400.0, 300.0),
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 100.0, 300.0),
        ];
        let runs = build_tray_runs(&annotations, &[], 1.0, &EngineConfig::default());
        let segs = &runs[0].segments;
        assert_eq!(segs.len(), 2);
        assert_eq!((segs[0].x1, segs[0].y1), (100.0, 100.0));
        assert_eq!((segs[0].x2, segs[0].y2), (100.0, 300.0));
        assert_eq!((segs[1].x2, segs[1].y2), (400.0, 300.0));
        assert_eq!(runs[0].length_metres, 500.0);
    }

    #[test]
    fn test_right_angle_counts_as_bend() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 100.0, 300.0),
            ann(100, TrayType::Lv, 400.0, 300.0),
        ];
        let runs = build_tray_runs(&annotations, &[], 1.0, &EngineConfig::default());
        assert_eq!(runs[0].bends_90, 1);
        assert_eq!(runs[0].t_pieces, 0);
        assert_eq!(runs[0].cross_pieces, 0);
    }

    #[test]
    fn test_short_leg_still_turns() {
        // The first leg is too short to measure but still sets a direction.
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 110.0, 100.0),
            ann(100, TrayType::Lv, 110.0, 400.0),
        ];
        let runs = build_tray_runs(&annotations, &[], 1.0, &EngineConfig::default());
        assert_eq!(runs[0].segments.len(), 1);
        assert_eq!(runs[0].bends_90, 1);
    }

    #[test]
    fn test_coincident_labels_do_not_turn() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 100.0, 400.0),
        ];
        let runs = build_tray_runs(&annotations, &[], 1.0, &EngineConfig::default());
        assert_eq!(runs[0].bends_90, 0);
    }

    #[test]
    fn test_straight_run_has_no_bends() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(100, TrayType::Lv, 110.0, 300.0),
            ann(100, TrayType::Lv, 120.0, 500.0),
        ];
        let runs = build_tray_runs(&annotations, &[], 1.0, &EngineConfig::default());
        assert_eq!(runs[0].bends_90, 0);
    }

    #[test]
    fn test_drop_shared_between_classes() {
        let annotations = vec![
            ann(100, TrayType::Lv, 100.0, 100.0),
            ann(150, TrayType::Fa, 180.0, 120.0),
            ann(300, TrayType::Lv, 900.0, 900.0),
        ];
        let drops = vec![DropAnnotation {
            x: 150.0,
            y: 110.0,
            text: "DROP TO LEVEL".into(),
        }];
        let runs = build_tray_runs(&annotations, &drops, 1.0, &EngineConfig::default());
        let by_id = |id: &str| runs.iter().find(|r| r.id == id).unwrap().drops;
        assert_eq!(by_id("tray-100-lv"), 1);
        assert_eq!(by_id("tray-150-fa"), 1);
        assert_eq!(by_id("tray-300-lv"), 0);
    }

    #[test]
    fn test_first_height_in_reading_order() {
        let mut low = ann(100, TrayType::Lv, 100.0, 500.0);
        low.height_metres = Some(3.0);
        let mut high = ann(100, TrayType::Lv, 100.0, 100.0);
        high.height_metres = Some(12.5);
        let runs = build_tray_runs(&[low, high], &[], 1.0, &EngineConfig::default());
        assert_eq!(runs[0].height_metres, Some(12.5));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let annotations = vec![
            ann(100, TrayType::Lv, 13.7, 100.2),
            ann(100, TrayType::Lv, 200.1, 100.9),
            ann(100, TrayType::Lv, 200.4, 377.3),
            ann(225, TrayType::Data, 50.0, 50.0),
        ];
        let config = EngineConfig::default();
        let first = build_tray_runs(&annotations, &[], FACTOR, &config);
        let second = build_tray_runs(&annotations, &[], FACTOR, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_wholesaler_lengths() {
        assert_eq!(wholesaler_lengths(10.0, 3.0), 4);
        assert_eq!(wholesaler_lengths(9.0, 3.0), 3);
        assert_eq!(wholesaler_lengths(0.1, 3.0), 1);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
    }
}
