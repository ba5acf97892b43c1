use crate::measure::fittings::size_label;
use crate::measure::outcome::TrayRun;
use quick_xml::escape::escape;
use std::collections::BTreeMap;

const FALLBACK_COLOUR: &str = "#7f7f7f";

/// Stroke colour for a tray size.
pub fn size_colour(size_mm: u32) -> &'static str {
    match size_mm {
        50 => "#17becf",
        75 => "#bcbd22",
        100 => "#1f77b4",
        150 => "#ff7f0e",
        225 => "#2ca02c",
        300 => "#d62728",
        450 => "#9467bd",
        600 => "#8c564b",
        750 => "#e377c2",
        900 => "#393b79",
        _ => FALLBACK_COLOUR,
    }
}

#[derive(Default)]
struct LegendEntry {
    length_metres: f64,
    wholesaler_lengths: u32,
}

/// Render tray runs as an SVG overlay sized to the drawing page.
///
/// Coordinates are drawing units, so the document can sit directly on top
/// of the page it was measured from. Empty input gives an empty document.
pub fn render_overlay(runs: &[TrayRun], page_width: f64, page_height: f64) -> String {
    let width = if page_width.is_finite() && page_width > 0.0 { page_width } else { 0.0 };
    let height = if page_height.is_finite() && page_height > 0.0 { page_height } else { 0.0 };

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );
    svg.push('\n');

    if runs.is_empty() {
        svg.push_str("</svg>\n");
        return svg;
    }

    let stroke_width = (width / 400.0).max(1.5);
    let font_size = (width / 150.0).max(8.0);

    let mut legend: BTreeMap<u32, LegendEntry> = BTreeMap::new();

    for run in runs {
        let colour = size_colour(run.size_mm);
        let entry = legend.entry(run.size_mm).or_default();
        entry.length_metres += run.length_metres;
        entry.wholesaler_lengths += run.wholesaler_lengths;

        svg.push_str(&format!(r#"  <g id="{}">"#, escape(run.id.as_str())));
        svg.push('\n');
        for seg in &run.segments {
            svg.push_str(&format!(
                r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}" stroke-linecap="round" opacity="0.8"/>"#,
                seg.x1, seg.y1, seg.x2, seg.y2, colour, stroke_width
            ));
            svg.push('\n');
            svg.push_str(&format!(
                r#"    <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="{:.1}" fill="{}" text-anchor="middle">{:.1} m</text>"#,
                (seg.x1 + seg.x2) / 2.0,
                (seg.y1 + seg.y2) / 2.0 - stroke_width * 2.0,
                font_size,
                colour,
                seg.length_metres
            ));
            svg.push('\n');
        }
        svg.push_str("  </g>\n");
    }

    push_legend(&mut svg, &legend, font_size);
    svg.push_str("</svg>\n");
    svg
}

fn push_legend(svg: &mut String, legend: &BTreeMap<u32, LegendEntry>, font_size: f64) {
    let row = font_size * 1.6;
    let pad = font_size;
    let box_width = font_size * 22.0;
    let box_height = pad * 2.0 + row * (legend.len() as f64 + 1.0);

    svg.push_str(r#"  <g id="legend">"#);
    svg.push('\n');
    svg.push_str(&format!(
        r##"    <rect x="{pad:.1}" y="{pad:.1}" width="{box_width:.1}" height="{box_height:.1}" fill="#ffffff" fill-opacity="0.9" stroke="#333333"/>"##
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"    <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="{:.1}" font-weight="bold">Cable tray</text>"#,
        pad * 2.0,
        pad * 2.0 + font_size,
        font_size
    ));
    svg.push('\n');

    for (i, (size_mm, entry)) in legend.iter().enumerate() {
        let y = pad * 2.0 + row * (i as f64 + 1.0);
        let label = format!(
            "{} tray: {:.1} m ({} stock lengths)",
            size_label(*size_mm),
            entry.length_metres,
            entry.wholesaler_lengths
        );
        svg.push_str(&format!(
            r#"    <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            pad * 2.0,
            y + font_size * 0.2,
            font_size * 1.5,
            font_size,
            size_colour(*size_mm)
        ));
        svg.push('\n');
        svg.push_str(&format!(
            r#"    <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="{:.1}">{}</text>"#,
            pad * 2.0 + font_size * 2.0,
            y + font_size,
            font_size,
            escape(label.as_str())
        ));
        svg.push('\n');
    }
    svg.push_str("  </g>\n");
}
