use takeoff_core::config::EngineConfig;
use takeoff_core::error::TakeoffError;

use crate::output;

pub fn run() -> Result<(), TakeoffError> {
    output::json::print(&EngineConfig::default())
}
