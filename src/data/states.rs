//! Malaysian state names, areas and population aggregation.

use std::path::Path;

use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, Value};
use indexmap::IndexMap;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::data::spreadsheet::{self, infer_column, Cell, ColumnAliases, Row};
use crate::data::DataError;

/// State code to full name
pub const STATE_NAMES: [(&str, &str); 16] = [
    ("JHR", "Johor"),
    ("KDH", "Kedah"),
    ("KTN", "Kelantan"),
    ("MLK", "Melaka"),
    ("NSN", "Negeri Sembilan"),
    ("PHG", "Pahang"),
    ("PRK", "Perak"),
    ("PLS", "Perlis"),
    ("PNG", "Pulau Pinang"),
    ("SBH", "Sabah"),
    ("SWK", "Sarawak"),
    ("SGR", "Selangor"),
    ("TRG", "Terengganu"),
    ("KUL", "WP Kuala Lumpur"),
    ("LBN", "WP Labuan"),
    ("PJY", "WP Putrajaya"),
];

/// Land area in km²
pub const STATE_AREAS: [(&str, f64); 16] = [
    ("Sarawak", 124173.9),
    ("Sabah", 74100.4),
    ("Pahang", 35929.9),
    ("Johor", 19088.1),
    ("Kelantan", 15036.4),
    ("Terengganu", 12957.3),
    ("Kedah", 9466.2),
    ("Selangor", 7907.8),
    ("Negeri Sembilan", 6658.5),
    ("Perak", 20875.7),
    ("Melaka", 1670.2),
    ("Pulau Pinang", 1059.2),
    ("Perlis", 813.1),
    ("WP Kuala Lumpur", 242.9),
    ("WP Labuan", 94.0),
    ("WP Putrajaya", 49.3),
];

/// Spellings seen in source spreadsheets
const NAME_VARIANTS: [(&str, &str); 22] = [
    ("W.P Kuala Lumpur", "WP Kuala Lumpur"),
    ("W.P. Kuala Lumpur", "WP Kuala Lumpur"),
    ("WP Kuala Lumpur", "WP Kuala Lumpur"),
    ("W.P KL", "WP Kuala Lumpur"),
    ("WP KL", "WP Kuala Lumpur"),
    ("KL", "WP Kuala Lumpur"),
    ("Kuala Lumpur", "WP Kuala Lumpur"),
    ("W.P Labuan", "WP Labuan"),
    ("W.P. Labuan", "WP Labuan"),
    ("WP Labuan", "WP Labuan"),
    ("Labuan", "WP Labuan"),
    ("W.P Putrajaya", "WP Putrajaya"),
    ("W.P. Putrajaya", "WP Putrajaya"),
    ("WP Putrajaya", "WP Putrajaya"),
    ("Putrajaya", "WP Putrajaya"),
    ("Penang", "Pulau Pinang"),
    ("Pulau Pinang", "Pulau Pinang"),
    ("P. Pinang", "Pulau Pinang"),
    ("Malacca", "Melaka"),
    ("Melaka", "Melaka"),
    ("N. Sembilan", "Negeri Sembilan"),
    ("Negeri Sembilan", "Negeri Sembilan"),
];

pub fn state_name(code: &str) -> Option<&'static str> {
    STATE_NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

pub fn state_code(name: &str) -> Option<&'static str> {
    STATE_NAMES.iter().find(|(_, n)| *n == name).map(|(c, _)| *c)
}

pub fn state_area(name: &str) -> Option<f64> {
    STATE_AREAS.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
}

/// Canonical state name for a spreadsheet spelling. Tries known variants,
/// then full names, then state codes; anything else is returned trimmed.
pub fn normalize_state_name(name: &str) -> String {
    let name = name.trim();
    let canonical = NAME_VARIANTS
        .iter()
        .find(|(k, _)| *k == name)
        .or_else(|| NAME_VARIANTS.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
        .map(|(_, v)| *v)
        .or_else(|| STATE_NAMES.iter().find(|(_, n)| *n == name).map(|(_, n)| *n))
        .or_else(|| {
            STATE_NAMES
                .iter()
                .find(|(_, n)| n.eq_ignore_ascii_case(name))
                .map(|(_, n)| *n)
        })
        .or_else(|| state_name(name));
    canonical.unwrap_or(name).to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatePopulation {
    pub state_name: String,
    pub state_code: String,
    pub population: u64,
    /// km²
    pub area: f64,
    /// People per km², two decimals
    pub density: f64,
}

fn looks_like_state(cell: &Cell) -> bool {
    let Some(value) = cell.as_text().map(|s| s.to_lowercase()) else {
        return false;
    };
    STATE_NAMES.iter().any(|(_, n)| {
        let n = n.to_lowercase();
        n.contains(&value) || value.contains(&n)
    })
}

fn looks_like_population(cell: &Cell) -> bool {
    cell.as_f64().map_or(false, |n| n > 1000.0)
}

/// Find the state and population columns: header fragments first, then
/// cell values
pub fn population_columns(rows: &[Row]) -> Option<(String, String)> {
    let aliases = ColumnAliases::new()
        .field("state", &["state", "negeri"])
        .field("population", &["population", "populasi", "pop"]);
    let mut resolved = aliases.resolve(&spreadsheet::headers(rows));

    let state = resolved
        .shift_remove("state")
        .or_else(|| infer_column(rows, looks_like_state));
    let population = resolved
        .shift_remove("population")
        .or_else(|| infer_column(rows, looks_like_population));
    state.zip(population)
}

/// Sum population per normalized state and derive density. Sorted by
/// population, largest first.
pub fn aggregate_population(rows: &[Row]) -> Vec<StatePopulation> {
    if rows.is_empty() {
        warn!("No rows in population spreadsheet");
        return Vec::new();
    }
    let Some((state_col, pop_col)) = population_columns(rows) else {
        error!(
            "Could not find state or population columns; available: {:?}",
            spreadsheet::headers(rows)
        );
        return Vec::new();
    };
    debug!("State column {:?}, population column {:?}", state_col, pop_col);

    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        let Some(state) = row.get(&state_col).and_then(Cell::as_text) else {
            continue;
        };
        let Some(population) = row.get(&pop_col).and_then(Cell::as_f64) else {
            continue;
        };
        if population.is_nan() || population <= 0.0 {
            continue;
        }
        *totals.entry(normalize_state_name(&state)).or_default() += population;
    }

    let mut result: Vec<StatePopulation> = totals
        .into_iter()
        .filter_map(|(state_name, population)| {
            let Some(area) = state_area(&state_name) else {
                warn!("No area data for state: {}", state_name);
                return None;
            };
            Some(StatePopulation {
                state_code: state_code(&state_name).unwrap_or_default().to_string(),
                population: population.round() as u64,
                area,
                density: (population / area * 100.0).round() / 100.0,
                state_name,
            })
        })
        .collect();
    result.sort_by(|a, b| b.population.cmp(&a.population));
    result
}

pub fn load_state_population(path: &Path) -> Result<Vec<StatePopulation>, DataError> {
    let rows = spreadsheet::read_rows(path)?;
    Ok(aggregate_population(&rows))
}

fn property_str<'a>(feature: &'a Feature, key: &str) -> Option<&'a str> {
    feature.property(key).and_then(|v| v.as_str())
}

/// Merge district polygons into one MultiPolygon feature per state code
pub fn aggregate_districts_to_states(districts: &[Feature]) -> Vec<Feature> {
    let mut groups: IndexMap<&str, Vec<&Feature>> = IndexMap::new();
    for district in districts {
        if let Some(code) = property_str(district, "state") {
            groups.entry(code).or_default().push(district);
        }
    }

    groups
        .into_iter()
        .filter_map(|(code, members)| {
            let polygons: Vec<_> = members
                .iter()
                .filter_map(|d| d.geometry.as_ref())
                .flat_map(|g| match &g.value {
                    Value::Polygon(rings) => vec![rings.clone()],
                    Value::MultiPolygon(polys) => polys.clone(),
                    _ => Vec::new(),
                })
                .collect();
            if polygons.is_empty() {
                return None;
            }
            let code_state = members[0]
                .property("code_state")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            let properties: JsonObject = json!({
                "name": state_name(code).unwrap_or(code),
                "stateCode": code,
                "code_state": code_state,
            })
            .as_object()
            .cloned()
            .unwrap_or_default();
            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::MultiPolygon(polygons))),
                id: Some(Id::String(code.to_lowercase())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spreadsheet::rows_from_grid;

    #[test]
    fn test_normalize_variants() {
        assert_eq!(normalize_state_name("W.P Kuala Lumpur"), "WP Kuala Lumpur");
        assert_eq!(normalize_state_name(" penang "), "Pulau Pinang");
        assert_eq!(normalize_state_name("SABAH"), "Sabah");
        assert_eq!(normalize_state_name("SWK"), "Sarawak");
        assert_eq!(normalize_state_name("Atlantis"), "Atlantis");
    }

    #[test]
    fn test_kuala_lumpur_row_contributes_exactly() {
        let rows = rows_from_grid(vec![
            vec!["State".into(), "Population".into()],
            vec!["W.P Kuala Lumpur".into(), Cell::Number(1_800_000.0)],
        ]);
        let result = aggregate_population(&rows);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].state_name, "WP Kuala Lumpur");
        assert_eq!(result[0].state_code, "KUL");
        assert_eq!(result[0].population, 1_800_000);
        assert_eq!(result[0].density, 7410.46);
    }

    #[test]
    fn test_aggregation_sums_and_sorts() {
        let rows = rows_from_grid(vec![
            vec!["Negeri".into(), "Daerah".into(), "Jumlah Pop".into()],
            vec!["Sabah".into(), "Kota Kinabalu".into(), Cell::Number(500_000.0)],
            vec!["Sabah".into(), "Sandakan".into(), Cell::Number(400_000.0)],
            vec!["Perlis".into(), "Kangar".into(), Cell::Number(250_000.0)],
            vec!["Perlis".into(), "Arau".into(), Cell::Number(-5.0)],
            vec!["Atlantis".into(), "Deep".into(), Cell::Number(10_000.0)],
        ]);
        let result = aggregate_population(&rows);
        let names: Vec<_> = result.iter().map(|s| s.state_name.as_str()).collect();
        assert_eq!(names, vec!["Sabah", "Perlis"]);
        assert_eq!(result[0].population, 900_000);
    }

    #[test]
    fn test_columns_inferred_from_values() {
        let rows = rows_from_grid(vec![
            vec!["Col A".into(), "Col B".into()],
            vec!["Johor".into(), Cell::Number(4_000_000.0)],
        ]);
        assert_eq!(
            population_columns(&rows),
            Some(("Col A".to_string(), "Col B".to_string()))
        );
        assert_eq!(aggregate_population(&rows)[0].population, 4_000_000);
    }

    #[test]
    fn test_unresolvable_columns_give_empty() {
        let rows = rows_from_grid(vec![
            vec!["X".into(), "Y".into()],
            vec!["abc".into(), Cell::Number(3.0)],
        ]);
        assert!(aggregate_population(&rows).is_empty());
    }

    #[test]
    fn test_districts_merge_into_states() {
        let district = |name: &str, state: &str, value: Value| Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: json!({ "name": name, "state": state, "code_state": 12 })
                .as_object()
                .cloned(),
            foreign_members: None,
        };
        let square = vec![vec![
            vec![116.0, 5.0],
            vec![117.0, 5.0],
            vec![117.0, 6.0],
            vec![116.0, 5.0],
        ]];
        let states = aggregate_districts_to_states(&[
            district("Kota Kinabalu", "SBH", Value::Polygon(square.clone())),
            district("Sandakan", "SBH", Value::MultiPolygon(vec![square.clone(), square])),
        ]);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].id, Some(Id::String("sbh".into())));
        assert_eq!(property_str(&states[0], "name"), Some("Sabah"));
        match &states[0].geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polys) => assert_eq!(polys.len(), 3),
            other => panic!("unexpected geometry {other:?}"),
        }
    }
}
