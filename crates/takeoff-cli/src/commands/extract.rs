use std::path::PathBuf;
use takeoff_core::error::TakeoffError;
use takeoff_core::extraction::pdftotext::PdftotextExtractor;
use takeoff_core::overlay::render_overlay;

use crate::output;

pub struct ExtractArgs {
    pub pdf_file: PathBuf,
    pub page: usize,
    pub scale: Option<String>,
    pub paper: Option<String>,
    pub config: Option<PathBuf>,
    pub output_format: String,
    pub out: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
}

pub fn run(args: ExtractArgs) -> Result<(), TakeoffError> {
    let options = super::takeoff_options(
        args.page,
        args.scale.as_deref(),
        args.paper.as_deref(),
        args.config.as_deref(),
    )?;

    // takeoff_pdf turns extractor errors into a reviewable result, so a
    // missing pdftotext is reported here instead.
    if !PdftotextExtractor::is_available() {
        return Err(TakeoffError::PdftotextNotFound);
    }

    let pdf_bytes = std::fs::read(&args.pdf_file)?;
    tracing::info!(
        file = %args.pdf_file.display(),
        bytes = pdf_bytes.len(),
        page = options.page,
        "extracting drawing"
    );
    let drawing_ref = args
        .pdf_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.pdf_file.display().to_string());

    let extractor = PdftotextExtractor::new();
    let result = takeoff_core::takeoff_pdf(&pdf_bytes, &extractor, &drawing_ref, &options);

    if let Some(path) = &args.out {
        output::json::write(&result, path)?;
        eprintln!(
            "{} tray run(s), {:.1} m total, written to {}",
            result.tray_runs.len(),
            result.total_tray_metres(),
            path.display()
        );
    }

    if let Some(path) = &args.overlay {
        let svg = render_overlay(&result.tray_runs, result.page_width, result.page_height);
        std::fs::write(path, svg)?;
        eprintln!("Overlay written to {}", path.display());
    }

    match args.output_format.as_str() {
        "json" => output::json::print(&result)?,
        _ => output::table::print_result(&result),
    }

    Ok(())
}
