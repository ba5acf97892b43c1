use std::path::Path;
use takeoff_core::error::TakeoffError;
use takeoff_core::overlay::render_overlay;

pub fn run(result_file: &Path, out: &Path) -> Result<(), TakeoffError> {
    let result = super::cable::load_result(result_file)?;
    let svg = render_overlay(&result.tray_runs, result.page_width, result.page_height);
    std::fs::write(out, svg)?;
    eprintln!(
        "Overlay of {} tray run(s) written to {}",
        result.tray_runs.len(),
        out.display()
    );
    Ok(())
}
