use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::AutocamsError;

/// Parse the capture start from a night directory name such as
/// `AB1234_20240305_180012_123456`. The date is the third `_` token counted
/// from the end and the time the second, so station ids are free to contain
/// underscores.
pub fn parse_night_start(name: &str) -> Result<NaiveDateTime> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 4 {
        return Err(AutocamsError::BadNightName(name.to_string()).into());
    }
    let date = parts[parts.len() - 3];
    let time = parts[parts.len() - 2];
    NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), "%Y%m%d_%H%M%S")
        .map_err(|_| AutocamsError::BadNightName(name.to_string()).into())
}

/// Station prefix of a night directory name (everything before the date).
pub fn parse_night_station(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() < 4 {
        return Err(AutocamsError::BadNightName(name.to_string()).into());
    }
    Ok(parts[..parts.len() - 3].join("_"))
}

/// Remote archive name: `YYYY_MM_DD_CCCCCC_hh_mm_ss_NN.zip`.
pub fn archive_file_name(start: &NaiveDateTime, cams_id: u32, sequence_id: u32) -> String {
    format!(
        "{}_{:06}_{}_{:02}.zip",
        start.format("%Y_%m_%d"),
        cams_id,
        start.format("%H_%M_%S"),
        sequence_id
    )
}

/// The calendar month before `(year, month)`.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Months to reconcile for a run on `today`: last month first, then this one.
pub fn months_to_reconcile(today: NaiveDate) -> [(i32, u32); 2] {
    let current = (today.year(), today.month());
    [previous_month(current.0, current.1), current]
}

/// Split a comma-separated station list, dropping blanks.
pub fn parse_station_list(input: &str) -> Vec<String> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
