//! Data files: basemap loading, GeoJSON/JSON parsing and the spreadsheet-backed
//! datasets that feed the data-driven slides.

pub mod districts;
pub mod sabah;
pub mod spreadsheet;
pub mod states;
pub mod statistics;
pub mod stores;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::map::{Lod, MapRenderer};
use statistics::{TourismRow, WaterRow};
use states::StatePopulation;

/// Relative paths of the presentation datasets
pub const STATES_GEOJSON: &str = "geojson/my.json";
pub const DISTRICTS_GEOJSON: &str = "geojson/malaysia.district.geojson";
pub const TOURISM_JSON: &str = "statistics/tourism.json";
pub const WATER_JSON: &str = "statistics/water_scarcity.json";
pub const HOTELS_GEOJSON: &str = "hotels/sabah_hotels.geojson";
pub const STORES_GEOJSON: &str = "speedmart/sabah_speedmart.geojson";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet {0} has no sheets")]
    NoSheets(PathBuf),

    #[error("Could not find column: {0}")]
    MissingColumn(String),
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, DataError> {
    fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse any JSON file into `T`
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let mut bytes = read_bytes(path)?;
    simd_json::serde::from_slice(&mut bytes).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a GeoJSON file. A lone feature or geometry becomes a one-feature
/// collection.
pub fn load_feature_collection(path: &Path) -> Result<FeatureCollection, DataError> {
    let value: serde_json::Value = load_json(path)?;
    let geojson = GeoJson::from_json_value(value).map_err(Box::new)?;
    Ok(match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => single(feature),
        GeoJson::Geometry(geometry) => single(Feature::from(geometry)),
    })
}

fn single(feature: Feature) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![feature],
        foreign_members: None,
    }
}

/// Log and swallow a dataset failure
fn or_empty<T: Default>(name: &str, result: Result<T, DataError>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Dataset {} unavailable: {}", name, e);
        T::default()
    })
}

/// Everything the data-driven slides need, loaded once at startup
#[derive(Default)]
pub struct Datasets {
    pub tourism: Vec<TourismRow>,
    pub water: Vec<WaterRow>,
    pub hotels: Option<FeatureCollection>,
    pub stores: Option<FeatureCollection>,
    pub districts: Option<FeatureCollection>,
    pub population: Vec<StatePopulation>,
}

impl Datasets {
    pub fn load(data_dir: &Path, population_xlsx: Option<&Path>) -> Self {
        let optional = |name: &str, rel: &str| {
            let fc = or_empty(name, load_feature_collection(&data_dir.join(rel)).map(Some));
            fc.filter(|fc| !fc.features.is_empty())
        };

        let datasets = Self {
            tourism: or_empty("tourism", load_json(&data_dir.join(TOURISM_JSON))),
            water: or_empty("water scarcity", load_json(&data_dir.join(WATER_JSON))),
            hotels: optional("hotels", HOTELS_GEOJSON),
            stores: optional("stores", STORES_GEOJSON),
            districts: optional("districts", DISTRICTS_GEOJSON),
            population: population_xlsx
                .map(|path| or_empty("state population", states::load_state_population(path)))
                .unwrap_or_default(),
        };

        info!(
            "Datasets: {} tourism rows, {} water rows, {} hotels, {} stores, {} population rows",
            datasets.tourism.len(),
            datasets.water.len(),
            datasets.hotels.as_ref().map_or(0, |fc| fc.features.len()),
            datasets.stores.as_ref().map_or(0, |fc| fc.features.len()),
            datasets.population.len(),
        );
        datasets
    }
}

/// Load all available Natural Earth basemap data into the renderer
pub fn load_basemap(renderer: &mut MapRenderer, data_dir: &Path) {
    let coastline_files = [
        ("ne_110m_coastline.json", Lod::Low),
        ("ne_50m_coastline.json", Lod::Medium),
        ("ne_10m_coastline.json", Lod::High),
    ];
    for (filename, lod) in coastline_files {
        load_lines(&data_dir.join(filename), |line| renderer.add_coastline(line, lod));
    }

    let border_files = [
        ("ne_50m_borders.json", Lod::Medium),
        ("ne_10m_borders.json", Lod::High),
    ];
    for (filename, lod) in border_files {
        load_lines(&data_dir.join(filename), |line| renderer.add_border(line, lod));
    }

    load_lines(&data_dir.join("ne_10m_states.json"), |line| renderer.add_state(line));

    if !renderer.has_data() {
        info!("No basemap files in {}, using built-in outline", data_dir.display());
        generate_simple_world(renderer);
    }
}

fn load_lines<F>(path: &Path, mut add_line: F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    if !path.exists() {
        return;
    }
    match load_feature_collection(path) {
        Ok(fc) => {
            let mut count = 0;
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut |line| {
                    count += 1;
                    add_line(line)
                });
            }
            debug!("Loaded {} lines from {}", count, path.display());
        }
        Err(e) => warn!("Failed to load {}: {}", path.display(), e),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(Vec<(f64, f64)>),
{
    let to_line = |coords: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

/// Coarse outlines of Malaysia and its neighbours for when no basemap file is
/// available
pub fn generate_simple_world(renderer: &mut MapRenderer) {
    // Borneo
    renderer.add_coastline(
        vec![
            (109.0, 1.5), (109.6, 2.0), (111.0, 1.6), (111.4, 2.7),
            (113.0, 3.2), (114.0, 4.6), (115.0, 5.0), (115.4, 5.3),
            (116.0, 6.0), (116.8, 7.0), (117.3, 6.9), (117.7, 6.3),
            (118.1, 5.8), (119.2, 5.3), (118.3, 4.9), (118.0, 4.4),
            (117.6, 4.2), (117.8, 3.0), (118.0, 2.0), (119.0, 1.0),
            (117.8, 0.8), (117.4, -0.8), (116.6, -1.6), (116.3, -3.8),
            (114.6, -4.1), (113.0, -3.2), (111.7, -3.0), (110.2, -2.9),
            (110.0, -1.7), (109.1, -0.5), (109.0, 1.5),
        ],
        Lod::Low,
    );

    // Malay Peninsula
    renderer.add_coastline(
        vec![
            (100.1, 6.5), (100.4, 5.5), (100.4, 4.2), (100.8, 3.5),
            (101.3, 2.8), (102.0, 2.2), (103.4, 1.3), (104.2, 1.4),
            (103.8, 2.6), (103.4, 3.9), (103.4, 4.8), (102.5, 6.0),
            (102.1, 6.2), (101.3, 6.9), (100.1, 6.5),
        ],
        Lod::Low,
    );

    // Sumatra
    renderer.add_coastline(
        vec![
            (95.3, 5.6), (97.5, 5.2), (100.3, 2.3), (103.7, -0.9),
            (106.0, -3.2), (105.8, -5.8), (104.6, -5.9), (102.3, -4.0),
            (100.4, -1.0), (98.6, 1.7), (95.3, 5.6),
        ],
        Lod::Low,
    );

    // Mainland Southeast Asia
    renderer.add_coastline(
        vec![
            (100.1, 6.5), (99.0, 7.9), (98.3, 9.0), (98.5, 13.0),
            (100.0, 13.5), (101.0, 12.7), (102.5, 12.2), (104.8, 8.6),
            (106.8, 10.4), (109.2, 12.0), (108.8, 15.3), (106.6, 17.9),
            (105.7, 19.0), (107.5, 21.5), (110.0, 21.0),
        ],
        Lod::Low,
    );

    // Philippines (Palawan and Mindanao)
    renderer.add_coastline(
        vec![
            (117.2, 8.4), (118.6, 9.8), (119.5, 11.3), (119.3, 10.4),
            (117.8, 8.6), (117.2, 8.4),
        ],
        Lod::Low,
    );
    renderer.add_coastline(
        vec![
            (122.0, 7.0), (123.6, 7.8), (125.4, 9.8), (126.6, 7.3),
            (125.6, 5.6), (124.0, 6.2), (122.0, 7.0),
        ],
        Lod::Low,
    );

    // Sulawesi (north arm)
    renderer.add_coastline(
        vec![
            (120.0, 0.6), (122.0, 1.0), (124.9, 1.6), (125.0, 0.9),
            (121.5, 0.4), (120.0, -1.0), (119.5, -3.5), (120.5, -5.5),
        ],
        Lod::Low,
    );
}
