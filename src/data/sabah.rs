//! Sabah row filters for spreadsheet data.

use std::path::Path;

use crate::data::spreadsheet::{self, Row};
use crate::data::DataError;

const SABAH_NAMES: [&str; 3] = ["Sabah", "SABAH", "sabah"];

pub const MIN_LAT: f64 = 4.0;
pub const MAX_LAT: f64 = 7.5;
pub const MIN_LON: f64 = 115.0;
pub const MAX_LON: f64 = 119.5;

pub fn is_sabah_state(value: &str) -> bool {
    SABAH_NAMES.contains(&value.trim())
}

/// Approximate bounding box of the state, inclusive
pub fn in_sabah_bounds(lat: f64, lon: f64) -> bool {
    (MIN_LAT..=MAX_LAT).contains(&lat) && (MIN_LON..=MAX_LON).contains(&lon)
}

pub fn filter_by_state(rows: Vec<Row>, state_column: &str) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| {
            row.get(state_column)
                .and_then(|c| c.as_text())
                .map_or(false, |s| is_sabah_state(&s))
        })
        .collect()
}

/// Keep rows whose coordinate columns parse and fall inside the state
pub fn filter_by_coordinates(rows: Vec<Row>, lat_column: &str, lon_column: &str) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| {
            let lat = row.get(lat_column).and_then(|c| c.as_f64());
            let lon = row.get(lon_column).and_then(|c| c.as_f64());
            match (lat, lon) {
                (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => in_sabah_bounds(lat, lon),
                _ => false,
            }
        })
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct SabahFilter<'a> {
    pub state_column: Option<&'a str>,
    pub coordinate_columns: Option<(&'a str, &'a str)>,
}

/// Read a spreadsheet and keep only Sabah rows
pub fn read_sabah_rows(path: &Path, filter: &SabahFilter) -> Result<Vec<Row>, DataError> {
    let rows = spreadsheet::read_rows(path)?;
    Ok(apply(rows, filter))
}

pub fn apply(mut rows: Vec<Row>, filter: &SabahFilter) -> Vec<Row> {
    if let Some(column) = filter.state_column {
        rows = filter_by_state(rows, column);
    }
    if let Some((lat, lon)) = filter.coordinate_columns {
        rows = filter_by_coordinates(rows, lat, lon);
    }
    rows
}
