use serde::Serialize;
use takeoff_core::error::TakeoffError;

pub fn print<T: Serialize>(value: &T) -> Result<(), TakeoffError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn write<T: Serialize>(value: &T, path: &std::path::Path) -> Result<(), TakeoffError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
