//! Static presentation data: facilities, capacities, flows, coverage and the
//! narrative script, plus builders that turn them into map sources.

pub mod capacity;
pub mod coverage;
pub mod facilities;
pub mod fleet;
pub mod flows;
pub mod remote;
pub mod replacement;
pub mod script;

use std::fmt;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Current,
    Future,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Current => "Current",
            Status::Future => "Future",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn feature(value: Value, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties.as_object().cloned().or_else(|| Some(JsonObject::new())),
        foreign_members: None,
    }
}

pub(crate) fn point(lon: f64, lat: f64, properties: serde_json::Value) -> Feature {
    feature(Value::Point(vec![lon, lat]), properties)
}

pub(crate) fn collection(features: impl IntoIterator<Item = Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: features.into_iter().collect(),
        foreign_members: None,
    }
}
