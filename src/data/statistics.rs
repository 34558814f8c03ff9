//! Per-district statistics rows and the state-level tourism and water tables.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::data::spreadsheet::{find_header, Cell, Row};

#[derive(Clone, Debug, PartialEq)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistrictStatistic {
    pub district: String,
    /// Every column except district and state
    pub statistics: IndexMap<String, StatValue>,
    pub population: Option<f64>,
    pub area: Option<f64>,
    pub density: Option<f64>,
}

impl DistrictStatistic {
    pub fn from_row(row: &Row) -> Self {
        let statistics = row
            .iter()
            .filter(|(k, _)| {
                let k = k.to_lowercase();
                k != "district" && k != "state"
            })
            .filter_map(|(k, cell)| {
                let value = match cell.as_f64() {
                    Some(n) => StatValue::Number(n),
                    None => StatValue::Text(cell.as_text()?),
                };
                Some((k.clone(), value))
            })
            .collect();

        let number = |names: &[&str]| -> Option<f64> {
            let cell = find_header(row, names)?;
            Some(cell.as_f64().unwrap_or(0.0))
        };

        Self {
            district: find_header(row, &["district"])
                .and_then(Cell::as_text)
                .unwrap_or_default(),
            statistics,
            population: number(&["population", "pop"]),
            area: number(&["area"]),
            density: number(&["density"]),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StatValue> {
        self.statistics.get(key)
    }
}

pub fn process_district_statistics(rows: &[Row]) -> Vec<DistrictStatistic> {
    rows.iter().map(DistrictStatistic::from_row).collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsSummary {
    pub total_districts: usize,
    pub total_population: f64,
    pub total_area: f64,
    /// Mean over districts that report a non-zero density
    pub average_density: f64,
}

pub fn summarize(data: &[DistrictStatistic]) -> StatisticsSummary {
    let mut summary = StatisticsSummary {
        total_districts: data.len(),
        ..StatisticsSummary::default()
    };
    let mut density_count = 0;
    for district in data {
        summary.total_population += district.population.unwrap_or(0.0);
        summary.total_area += district.area.unwrap_or(0.0);
        if let Some(density) = district.density.filter(|d| *d != 0.0) {
            summary.average_density += density;
            density_count += 1;
        }
    }
    if density_count > 0 {
        summary.average_density /= density_count as f64;
    }
    summary
}

/// Statistic for a district, matched case-insensitively
pub fn statistic<'a>(data: &'a [DistrictStatistic], district: &str, key: &str) -> Option<&'a StatValue> {
    data.iter()
        .find(|d| d.district.eq_ignore_ascii_case(district))
        .and_then(|d| d.get(key))
}

/// Every statistic key, first-seen order
pub fn statistic_keys(data: &[DistrictStatistic]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for key in data.iter().flat_map(|d| d.statistics.keys()) {
        if !keys.contains(&key.as_str()) {
            keys.push(key);
        }
    }
    keys
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TourismRow {
    pub state: String,
    pub hotels: u32,
    pub rooms: u32,
    pub tourist_arrivals: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WaterRow {
    pub state: String,
    pub water_access_percent: f64,
    pub water_scarcity_percent: f64,
}

/// Scarcity band used for fill color and panel highlighting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScarcityBand {
    High,
    Medium,
    Low,
}

impl ScarcityBand {
    pub fn of(percent: f64) -> Self {
        if percent > 20.0 {
            ScarcityBand::High
        } else if percent > 10.0 {
            ScarcityBand::Medium
        } else {
            ScarcityBand::Low
        }
    }
}

/// Tourism rows by hotel count, most first
pub fn tourism_by_hotels(rows: &[TourismRow]) -> Vec<&TourismRow> {
    let mut sorted: Vec<&TourismRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.hotels.cmp(&a.hotels));
    sorted
}

/// Water rows by scarcity, worst first
pub fn water_by_scarcity(rows: &[WaterRow]) -> Vec<&WaterRow> {
    let mut sorted: Vec<&WaterRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.water_scarcity_percent.total_cmp(&a.water_scarcity_percent));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spreadsheet::rows_from_grid;

    fn data() -> Vec<DistrictStatistic> {
        let rows = rows_from_grid(vec![
            vec![
                "District".into(),
                "State".into(),
                "Population".into(),
                "Area".into(),
                "Density".into(),
                "Region".into(),
            ],
            vec![
                "Kota Kinabalu".into(),
                "Sabah".into(),
                Cell::Number(500_000.0),
                Cell::Number(350.0),
                Cell::Number(1428.6),
                "West Coast".into(),
            ],
            vec![
                "Tongod".into(),
                "Sabah".into(),
                "40000".into(),
                Cell::Number(10_000.0),
                Cell::Empty,
                "Interior".into(),
            ],
        ]);
        process_district_statistics(&rows)
    }

    #[test]
    fn test_statistics_extracted() {
        let data = data();
        assert_eq!(data[0].district, "Kota Kinabalu");
        assert_eq!(data[0].get("Population"), Some(&StatValue::Number(500_000.0)));
        assert_eq!(data[0].get("Region"), Some(&StatValue::Text("West Coast".into())));
        assert!(data[0].get("State").is_none());
        assert_eq!(data[1].population, Some(40_000.0));
        assert!(data[1].get("Density").is_none());
    }

    #[test]
    fn test_summary_averages_reported_densities() {
        let summary = summarize(&data());
        assert_eq!(summary.total_districts, 2);
        assert_eq!(summary.total_population, 540_000.0);
        assert_eq!(summary.total_area, 10_350.0);
        assert_eq!(summary.average_density, 1428.6);
    }

    #[test]
    fn test_lookup_and_keys() {
        let data = data();
        assert_eq!(
            statistic(&data, "tongod", "Area"),
            Some(&StatValue::Number(10_000.0))
        );
        assert!(statistic(&data, "Keningau", "Area").is_none());
        assert_eq!(
            statistic_keys(&data),
            vec!["Population", "Area", "Density", "Region"]
        );
    }

    #[test]
    fn test_scarcity_bands_and_sorting() {
        assert_eq!(ScarcityBand::of(25.0), ScarcityBand::High);
        assert_eq!(ScarcityBand::of(20.0), ScarcityBand::Medium);
        assert_eq!(ScarcityBand::of(10.0), ScarcityBand::Low);

        let rows: Vec<WaterRow> = serde_json::from_str(
            r#"[{"state":"Sabah","water_access_percent":80.0,"water_scarcity_percent":22.5},
                {"state":"Johor","water_access_percent":97.0,"water_scarcity_percent":4.1},
                {"state":"Kelantan","water_access_percent":70.0,"water_scarcity_percent":30.0}]"#,
        )
        .unwrap();
        let states: Vec<_> = water_by_scarcity(&rows).iter().map(|r| r.state.as_str()).collect();
        assert_eq!(states, vec!["Kelantan", "Sabah", "Johor"]);
    }
}
