//! Spreadsheet rows: first sheet, first row as header.
//!
//! Column lookup is two-pass. [`ColumnAliases`] matches header names against
//! known fragments; [`infer_column`] falls back to looking at cell values.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use indexmap::IndexMap;
use tracing::debug;

use crate::data::DataError;

/// Rows inspected by value-based column inference
pub const INFER_ROWS: usize = 5;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Numeric value, parsing trimmed text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty | Cell::Bool(_) => None,
        }
    }

    /// Trimmed text form; numbers are formatted without a trailing `.0`
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One data row keyed by header, in sheet column order
pub type Row = IndexMap<String, Cell>;

/// Read the first sheet of an `.xlsx`, `.xls` or `.ods` workbook
pub fn read_rows(path: &Path) -> Result<Vec<Row>, DataError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::NoSheets(path.to_path_buf()))??;
    let rows = rows_from_range(&range);
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn rows_from_range(range: &Range<Data>) -> Vec<Row> {
    rows_from_grid(
        range
            .rows()
            .map(|r| r.iter().map(Cell::from).collect())
            .collect(),
    )
}

/// Turn a header row plus data rows into keyed rows. Columns with a blank
/// header are dropped and fully blank rows skipped.
pub fn rows_from_grid(grid: Vec<Vec<Cell>>) -> Vec<Row> {
    let mut grid = grid.into_iter();
    let Some(header) = grid.next() else {
        return Vec::new();
    };
    let header: Vec<Option<String>> = header.iter().map(Cell::as_text).collect();

    grid.filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .map(|cells| {
            header
                .iter()
                .zip(cells.into_iter().chain(std::iter::repeat(Cell::Empty)))
                .filter_map(|(name, cell)| name.clone().map(|n| (n, cell)))
                .collect()
        })
        .collect()
}

/// Header names of the first row, in column order
pub fn headers(rows: &[Row]) -> Vec<&str> {
    rows.first()
        .map(|row| row.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Field name to header-fragment table. A header matches a field when its
/// lowercase form contains any of the field's fragments.
#[derive(Clone, Debug)]
pub struct ColumnAliases {
    fields: Vec<(&'static str, &'static [&'static str])>,
}

impl ColumnAliases {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, name: &'static str, fragments: &'static [&'static str]) -> Self {
        self.fields.push((name, fragments));
        self
    }

    /// First matching header for each field that has one
    pub fn resolve(&self, headers: &[&str]) -> IndexMap<&'static str, String> {
        let mut found = IndexMap::new();
        for (field, fragments) in &self.fields {
            let hit = headers.iter().find(|h| {
                let lower = h.to_lowercase();
                fragments.iter().any(|f| lower.contains(f))
            });
            if let Some(header) = hit {
                found.insert(*field, header.to_string());
            }
        }
        found
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::new()
    }
}

/// Value-based column inference: the first header, in column order, whose
/// cell satisfies `looks_like` in any of the first [`INFER_ROWS`] rows.
pub fn infer_column(rows: &[Row], looks_like: impl Fn(&Cell) -> bool) -> Option<String> {
    rows.iter().take(INFER_ROWS).find_map(|row| {
        row.iter()
            .find(|(_, cell)| looks_like(cell))
            .map(|(header, _)| header.clone())
    })
}

/// Case-insensitive exact header lookup
pub fn find_header<'a>(row: &'a Row, names: &[&str]) -> Option<&'a Cell> {
    row.iter()
        .find(|(header, _)| names.iter().any(|n| header.trim().eq_ignore_ascii_case(n)))
        .map(|(_, cell)| cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Vec<Cell>> {
        vec![
            vec!["Negeri".into(), "Daerah".into(), "Populasi (2020)".into()],
            vec!["Sabah".into(), "Kota Kinabalu".into(), Cell::Number(500_425.0)],
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
            vec!["Sabah".into(), "Sandakan".into()],
        ]
    }

    #[test]
    fn test_rows_from_grid() {
        let rows = rows_from_grid(grid());
        assert_eq!(rows.len(), 2);
        assert_eq!(headers(&rows), vec!["Negeri", "Daerah", "Populasi (2020)"]);
        assert_eq!(rows[0]["Populasi (2020)"].as_f64(), Some(500_425.0));
        assert_eq!(rows[1]["Populasi (2020)"], Cell::Empty);
    }

    #[test]
    fn test_cell_text_forms() {
        assert_eq!(Cell::Number(12.0).as_text().as_deref(), Some("12"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::Text("  ".into()).as_text(), None);
        assert_eq!(Cell::Text(" 42 ".into()).as_f64(), Some(42.0));
    }

    #[test]
    fn test_aliases_match_fragments() {
        let aliases = ColumnAliases::new()
            .field("state", &["state", "negeri"])
            .field("population", &["population", "populasi", "pop"])
            .field("area", &["area", "keluasan"]);
        let resolved = aliases.resolve(&["Negeri", "Daerah", "Populasi (2020)"]);
        assert_eq!(resolved["state"], "Negeri");
        assert_eq!(resolved["population"], "Populasi (2020)");
        assert!(!resolved.contains_key("area"));
    }

    #[test]
    fn test_infer_column_by_value() {
        let rows = rows_from_grid(vec![
            vec!["A".into(), "B".into(), "C".into()],
            vec!["x".into(), "Sabah".into(), Cell::Number(3_418_785.0)],
        ]);
        assert_eq!(
            infer_column(&rows, |c| c.as_text().as_deref() == Some("Sabah")),
            Some("B".to_string())
        );
        assert_eq!(
            infer_column(&rows, |c| matches!(c, Cell::Number(n) if *n > 1000.0)),
            Some("C".to_string())
        );
        assert_eq!(infer_column(&rows, |c| c.as_f64() == Some(-1.0)), None);
    }

    #[test]
    fn test_find_header_ignores_case() {
        let rows = rows_from_grid(vec![
            vec!["Latitude".into()],
            vec![Cell::Number(5.98)],
        ]);
        assert_eq!(find_header(&rows[0], &["lat", "latitude"]).and_then(Cell::as_f64), Some(5.98));
    }
}
