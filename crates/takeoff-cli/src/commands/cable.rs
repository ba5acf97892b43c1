use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use takeoff_core::error::TakeoffError;
use takeoff_core::measure::cable::compute_cable_summary;
use takeoff_core::measure::outcome::TakeoffResult;
use takeoff_core::model::UserInputs;
use takeoff_core::questions::{TRAY_DUTY_ID, TRAY_FILTER_ID};

use crate::output;

pub struct CableArgs {
    pub result_file: PathBuf,
    pub filter: Option<String>,
    pub duty: Option<String>,
    pub drop_metres: Option<String>,
    pub first_point_metres: Option<String>,
    pub circuits: Option<u32>,
    pub additional_percent: Option<String>,
    pub config: Option<PathBuf>,
    pub output_format: String,
}

fn decimal_arg(name: &str, value: &str) -> Result<Decimal, TakeoffError> {
    Decimal::from_str(value.trim())
        .map_err(|_| TakeoffError::InvalidInputs(format!("{} '{}' is not a number", name, value)))
}

pub fn load_result(path: &Path) -> Result<TakeoffResult, TakeoffError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn run(args: CableArgs) -> Result<(), TakeoffError> {
    let config = super::engine_config(args.config.as_deref())?;
    let result = load_result(&args.result_file)?;

    let mut inputs = UserInputs::default();
    if let Some(filter) = &args.filter {
        inputs.apply_answer(TRAY_FILTER_ID, filter)?;
    }
    if let Some(duty) = &args.duty {
        inputs.apply_answer(TRAY_DUTY_ID, duty)?;
    }
    if let Some(v) = &args.drop_metres {
        inputs.drop_metres_per_fitting = decimal_arg("drop-metres", v)?;
    }
    if let Some(v) = &args.first_point_metres {
        inputs.first_point_run_metres = decimal_arg("first-point-metres", v)?;
    }
    if let Some(n) = args.circuits {
        inputs.number_of_circuits = n;
    }
    if let Some(v) = &args.additional_percent {
        inputs.additional_cable_percent = decimal_arg("additional-percent", v)?;
    }
    inputs.validate()?;

    let summary = compute_cable_summary(&result.tray_runs, &inputs, &config);

    match args.output_format.as_str() {
        "json" => output::json::print(&summary)?,
        _ => output::table::print_cable(&result, &summary),
    }

    Ok(())
}
