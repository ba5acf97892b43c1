use crate::config::EngineConfig;
use crate::measure::outcome::{CableSummary, TrayRun};
use crate::model::UserInputs;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Tray run length as an exact decimal, in tenths of a metre.
fn metres_to_decimal(metres: f64) -> Decimal {
    Decimal::new((metres * 10.0).round() as i64, 1)
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Derive the cable estimate for the runs selected by the inputs' filter.
///
/// Pure: the same runs and inputs always give the same summary. Negative
/// inputs count as zero so every total grows with every input.
pub fn compute_cable_summary(
    runs: &[TrayRun],
    inputs: &UserInputs,
    config: &EngineConfig,
) -> CableSummary {
    let included: Vec<&TrayRun> = runs
        .iter()
        .filter(|r| inputs.tray_filter.map_or(true, |t| r.tray_type == t))
        .collect();

    let route_length: Decimal = included
        .iter()
        .map(|r| metres_to_decimal(r.length_metres))
        .sum();
    let drop_count: u32 = included.iter().map(|r| r.drops).sum();

    let drop_allowance = Decimal::from(drop_count) * non_negative(inputs.drop_metres_per_fitting);
    let first_point =
        Decimal::from(inputs.number_of_circuits) * non_negative(inputs.first_point_run_metres);
    let subtotal = route_length + drop_allowance + first_point;
    let additional =
        subtotal * non_negative(inputs.additional_cable_percent) / Decimal::ONE_HUNDRED;

    let total = (subtotal + additional)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);

    let drum_length = Decimal::from_f64_retain(config.drum_length_metres)
        .filter(|d| *d > Decimal::ZERO)
        .unwrap_or(Decimal::ONE_HUNDRED);
    let drums = (total / drum_length).ceil().to_u32().unwrap_or(0);

    CableSummary {
        tray_filter: inputs.tray_filter,
        tray_duty: inputs.tray_duty,
        runs_included: included.len(),
        route_length_metres: route_length,
        drop_count,
        drop_allowance_metres: drop_allowance,
        first_point_metres: first_point,
        additional_allowance_metres: additional
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize(),
        total_cable_metres: total,
        drums,
    }
}
