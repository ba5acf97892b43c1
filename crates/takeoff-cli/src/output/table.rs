use takeoff_core::measure::outcome::{CableSummary, ScaleSource, TakeoffResult};
use takeoff_core::vector::VectorMeasurement;

fn source_label(source: ScaleSource) -> &'static str {
    match source {
        ScaleSource::Override => "override",
        ScaleSource::Detected => "detected",
        ScaleSource::Default => "default",
    }
}

pub fn print_result(result: &TakeoffResult) {
    println!(
        "=== {} (page {}) ===\n",
        result.drawing_ref, result.page_number
    );

    if let Some(scale) = &result.scale {
        println!(
            "  Scale: {} ({}), paper {} ({}), {:.6} m/unit",
            scale.scale_label(),
            source_label(scale.scale_source),
            scale.paper_size,
            source_label(scale.paper_source),
            scale.metres_per_unit
        );
    }
    println!(
        "  Text: {} word(s), {} phrase(s), {} run annotation(s), {} drop(s)\n",
        result.total_text_elements,
        result.phrase_count,
        result.run_annotation_count,
        result.drop_annotation_count
    );

    if result.tray_runs.is_empty() {
        println!("  No tray runs measured.\n");
    } else {
        println!(
            "  {:<16} {:>8} {:>7} {:>7} {:>6} {:>6} {:>8}",
            "Run", "Length", "Lengths", "Bends", "Drops", "Annot", "Height"
        );
        for run in &result.tray_runs {
            let height = run
                .height_metres
                .map(|h| format!("{:.2} m", h))
                .unwrap_or_else(|| "-".into());
            println!(
                "  {:<16} {:>6.1} m {:>7} {:>7} {:>6} {:>6} {:>8}",
                run.id,
                run.length_metres,
                run.wholesaler_lengths,
                run.bends_90,
                run.drops,
                run.annotation_count,
                height
            );
        }
        println!("  Total: {:.1} m\n", result.total_tray_metres());

        println!("  Fittings by size:");
        for (size, f) in &result.fitting_summary {
            println!(
                "    {:<6} {:>6.1} m  {} stock length(s), {} coupler(s), {} bend(s), {} tee(s), {} cross(es), {} drop(s)",
                size,
                f.length_metres,
                f.wholesaler_lengths,
                f.couplers,
                f.bends_90,
                f.t_pieces,
                f.cross_pieces,
                f.drops
            );
        }
        println!();
    }

    if !result.drawing_notes.is_empty() {
        println!("  Notes:");
        for note in &result.drawing_notes {
            println!("    - {}", note);
        }
        println!();
    }

    if !result.questions.is_empty() {
        println!("  Questions:");
        for q in &result.questions {
            let options: Vec<&str> = q.options.iter().map(|o| o.value.as_str()).collect();
            let default = q
                .default
                .as_deref()
                .map(|d| format!(" [default: {}]", d))
                .unwrap_or_default();
            println!("    [{}] {}", q.id, q.prompt);
            println!("      options: {}{}", options.join(" / "), default);
        }
    }
}

pub fn print_cable(result: &TakeoffResult, summary: &CableSummary) {
    let filter = summary
        .tray_filter
        .map(|t| t.to_string())
        .unwrap_or_else(|| "all".into());
    println!("=== Cable estimate: {} ===\n", result.drawing_ref);
    println!(
        "  Filter: {} ({} run(s)), duty: {}\n",
        filter, summary.runs_included, summary.tray_duty
    );
    println!("  Route length:          {:>8} m", summary.route_length_metres);
    println!(
        "  Drop allowance:        {:>8} m  ({} drop(s))",
        summary.drop_allowance_metres, summary.drop_count
    );
    println!("  First point:           {:>8} m", summary.first_point_metres);
    println!(
        "  Additional allowance:  {:>8} m",
        summary.additional_allowance_metres
    );
    println!("  Total cable:           {:>8} m", summary.total_cable_metres);
    println!("  Drums:                 {:>8}", summary.drums);
}

pub fn print_vector(m: &VectorMeasurement) {
    println!(
        "=== Vector runs: {} x {} ===\n",
        m.page_width, m.page_height
    );
    println!(
        "  Scale: {} ({}), paper {} ({}), {} coloured path(s)\n",
        m.scale.scale_label(),
        source_label(m.scale.scale_source),
        m.scale.paper_size,
        source_label(m.scale.paper_source),
        m.total_coloured_paths
    );

    if m.runs.is_empty() {
        println!("  No coloured runs found.");
        return;
    }

    for run in &m.runs {
        println!(
            "  {}  {:>8.2} m  {:>3} segment(s)  at ({:.1}, {:.1})",
            run.colour, run.length_metres, run.segment_count, run.midpoint.x, run.midpoint.y
        );
    }
    println!();
    for (colour, s) in &m.colour_summary {
        println!(
            "  {}: {} run(s), {:.2} m",
            colour, s.run_count, s.total_length_metres
        );
    }
    for note in &m.notes {
        println!("  note: {}", note);
    }
}
