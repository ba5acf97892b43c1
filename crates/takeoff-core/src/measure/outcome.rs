use crate::model::{PaperSize, ScaleDetection, TrayDuty, TrayType};
use crate::questions::Question;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A measured line between two consecutive annotations of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraySegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub length_metres: f64,
}

/// All annotations of one (size, type) class on a drawing.
///
/// Two physically separate runs of the same class end up in one
/// `TrayRun`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrayRun {
    /// Stable across re-extraction: `tray-<size>-<type>`.
    pub id: String,
    pub size_mm: u32,
    pub tray_type: TrayType,
    pub length_metres: f64,
    pub height_metres: Option<f64>,
    pub wholesaler_lengths: u32,
    pub t_pieces: u32,
    pub cross_pieces: u32,
    pub bends_90: u32,
    pub drops: u32,
    pub annotation_count: usize,
    pub segments: Vec<TraySegment>,
}

/// Fittings and stock lengths for one tray size across all types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittingSummary {
    pub length_metres: f64,
    pub wholesaler_lengths: u32,
    pub t_pieces: u32,
    pub cross_pieces: u32,
    pub bends_90: u32,
    pub drops: u32,
    /// Joins between stock lengths; inferred, never read off the drawing.
    pub couplers: u32,
}

/// Where a scale parameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSource {
    Override,
    Detected,
    Default,
}

/// The scale actually applied to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleResolution {
    pub scale_ratio: u32,
    pub scale_source: ScaleSource,
    pub paper_size: PaperSize,
    pub paper_source: ScaleSource,
    pub metres_per_unit: f64,
}

impl ScaleResolution {
    /// `1:<ratio>` label.
    pub fn scale_label(&self) -> String {
        format!("1:{}", self.scale_ratio)
    }
}

/// Cable estimate derived from tray runs and operator inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableSummary {
    pub tray_filter: Option<TrayType>,
    pub tray_duty: TrayDuty,
    pub runs_included: usize,
    pub route_length_metres: Decimal,
    pub drop_count: u32,
    pub drop_allowance_metres: Decimal,
    pub first_point_metres: Decimal,
    pub additional_allowance_metres: Decimal,
    pub total_cable_metres: Decimal,
    pub drums: u32,
}

/// Everything the engine produced for one drawing page.
///
/// Superseded by re-extraction, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoffResult {
    pub drawing_ref: String,
    pub page_number: usize,
    pub page_width: f64,
    pub page_height: f64,
    pub detected: ScaleDetection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleResolution>,
    pub tray_runs: Vec<TrayRun>,
    pub fitting_summary: BTreeMap<String, FittingSummary>,
    pub questions: Vec<Question>,
    pub drawing_notes: Vec<String>,
    pub has_text_layer: bool,
    pub total_text_elements: usize,
    pub phrase_count: usize,
    pub run_annotation_count: usize,
    pub drop_annotation_count: usize,
}

impl TakeoffResult {
    /// Total tray length across all runs, metres.
    pub fn total_tray_metres(&self) -> f64 {
        self.tray_runs.iter().map(|r| r.length_metres).sum()
    }
}
