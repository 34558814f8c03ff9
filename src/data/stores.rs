//! Retail store rows: column aliasing, grouping and search.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use indexmap::IndexMap;
use serde_json::json;

use crate::data::spreadsheet::{find_header, Cell, Row};

const LAT: &[&str] = &["lat", "latitude"];
const LON: &[&str] = &["lon", "longitude"];
const NAME: &[&str] = &["name", "store"];
const ADDRESS: &[&str] = &["address", "location"];
const DISTRICT: &[&str] = &["district", "city"];
const STATE: &[&str] = &["state"];

/// Headers consumed into named fields rather than kept as extras
const RESERVED: &[&str] = &[
    "name", "address", "district", "state", "lat", "lon", "latitude", "longitude",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    pub name: String,
    pub address: String,
    pub district: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    /// Remaining columns, unchanged
    pub extra: IndexMap<String, Cell>,
}

impl Store {
    /// Build a store from a row; rows without parseable coordinates are
    /// rejected
    pub fn from_row(row: &Row) -> Option<Self> {
        let lat = find_header(row, LAT).and_then(Cell::as_f64)?;
        let lon = find_header(row, LON).and_then(Cell::as_f64)?;
        let text = |names: &[&str]| find_header(row, names).and_then(Cell::as_text);

        let extra = row
            .iter()
            .filter(|(k, _)| !RESERVED.contains(&k.to_lowercase().as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            name: text(NAME).unwrap_or_else(|| "Unknown Store".to_string()),
            address: text(ADDRESS).unwrap_or_default(),
            district: text(DISTRICT).unwrap_or_default(),
            state: text(STATE).unwrap_or_else(|| "Sabah".to_string()),
            lat,
            lon,
            extra,
        })
    }

    /// District, or `Unknown` when blank
    pub fn district_or_unknown(&self) -> &str {
        if self.district.is_empty() {
            "Unknown"
        } else {
            &self.district
        }
    }

    pub fn to_feature(&self) -> Feature {
        let mut properties: JsonObject = json!({
            "name": self.name,
            "address": self.address,
            "district": self.district,
            "state": self.state,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();
        for (key, cell) in &self.extra {
            let value = match cell {
                Cell::Number(n) => json!(n),
                Cell::Bool(b) => json!(b),
                other => json!(other.as_text()),
            };
            properties.insert(key.clone(), value);
        }
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![self.lon, self.lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

pub fn process_stores(rows: &[Row]) -> Vec<Store> {
    rows.iter().filter_map(Store::from_row).collect()
}

pub fn stores_by_district(stores: &[Store]) -> BTreeMap<String, Vec<&Store>> {
    let mut grouped: BTreeMap<String, Vec<&Store>> = BTreeMap::new();
    for store in stores {
        grouped
            .entry(store.district_or_unknown().to_string())
            .or_default()
            .push(store);
    }
    grouped
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoreSummary {
    pub total_stores: usize,
    /// Sorted
    pub districts: Vec<String>,
    pub stores_by_district: BTreeMap<String, usize>,
}

pub fn summarize(stores: &[Store]) -> StoreSummary {
    let stores_by_district: BTreeMap<String, usize> = stores_by_district(stores)
        .into_iter()
        .map(|(district, members)| (district, members.len()))
        .collect();
    StoreSummary {
        total_stores: stores.len(),
        districts: stores_by_district.keys().cloned().collect(),
        stores_by_district,
    }
}

/// Case-insensitive substring search over name, address and district
pub fn search<'a>(stores: &'a [Store], query: &str) -> Vec<&'a Store> {
    let query = query.to_lowercase();
    stores
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&query)
                || s.address.to_lowercase().contains(&query)
                || s.district.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn to_feature_collection(stores: &[Store]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: stores.iter().map(Store::to_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spreadsheet::rows_from_grid;

    fn rows() -> Vec<Row> {
        rows_from_grid(vec![
            vec![
                "Store".into(),
                "LATITUDE".into(),
                "Longitude".into(),
                "City".into(),
                "Opened".into(),
            ],
            vec![
                "Speedmart Inanam".into(),
                Cell::Number(5.99),
                Cell::Number(116.13),
                "Kota Kinabalu".into(),
                Cell::Number(2019.0),
            ],
            vec![
                "Speedmart Mile 4".into(),
                "5.85".into(),
                "118.07".into(),
                "Sandakan".into(),
                Cell::Empty,
            ],
            vec![Cell::Empty, Cell::Number(5.3), Cell::Number(116.1), Cell::Empty, Cell::Empty],
            vec!["No coords".into(), Cell::Empty, Cell::Number(116.0), "Tawau".into(), Cell::Empty],
        ])
    }

    #[test]
    fn test_aliases_and_defaults() {
        let stores = process_stores(&rows());
        assert_eq!(stores.len(), 3);
        assert_eq!(stores[0].name, "Speedmart Inanam");
        assert_eq!(stores[0].district, "Kota Kinabalu");
        assert_eq!(stores[0].state, "Sabah");
        assert_eq!(stores[1].lat, 5.85);
        assert_eq!(stores[2].name, "Unknown Store");
        assert_eq!(stores[0].extra.get("Opened"), Some(&Cell::Number(2019.0)));
        assert!(!stores[0].extra.contains_key("LATITUDE"));
    }

    #[test]
    fn test_summary_groups_unknown() {
        let stores = process_stores(&rows());
        let summary = summarize(&stores);
        assert_eq!(summary.total_stores, 3);
        assert_eq!(summary.districts, vec!["Kota Kinabalu", "Sandakan", "Unknown"]);
        assert_eq!(summary.stores_by_district["Unknown"], 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let stores = process_stores(&rows());
        assert_eq!(search(&stores, "SANDAKAN").len(), 1);
        assert_eq!(search(&stores, "speedmart").len(), 2);
        assert!(search(&stores, "zzz").is_empty());
    }

    #[test]
    fn test_features_keep_extras() {
        let stores = process_stores(&rows());
        let fc = to_feature_collection(&stores);
        assert_eq!(fc.features.len(), 3);
        assert_eq!(fc.features[0].property("Opened"), Some(&json!(2019.0)));
    }
}
