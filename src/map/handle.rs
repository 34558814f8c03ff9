use std::time::Duration;

use geojson::{FeatureCollection, JsonObject};
use thiserror::Error;

use crate::map::camera::{Camera, CameraTarget, Easing};
use crate::map::events::{EventKind, Listener, ListenerId};
use crate::map::style::{Filter, LayerGroup, SourceData, StyleLayer};

/// Errors from source/layer mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("Source already exists: {0}")]
    DuplicateSource(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Source not found: {0}")]
    UnknownSource(String),

    #[error("Layer not found: {0}")]
    UnknownLayer(String),

    #[error("Source {source_id} still used by layer {layer_id}")]
    SourceInUse { source_id: String, layer_id: String },
}

/// Canvas pixel position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Grab,
}

/// A feature hit by a query at a screen point
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFeature {
    pub layer_id: String,
    pub source_id: String,
    pub properties: Option<JsonObject>,
    /// Geographic anchor (lon, lat) of the hit
    pub anchor: (f64, f64),
}

impl RenderedFeature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }
}

/// Text bubble anchored to a map position
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub lon: f64,
    pub lat: f64,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyOptions {
    pub duration: Duration,
    pub easing: Easing,
    pub essential: bool,
}

impl Default for FlyOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            easing: Easing::default(),
            essential: true,
        }
    }
}

/// Geographic bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Everything slides, hooks and the host may do to a live map.
///
/// Adding an id that exists, or removing one that does not, is an error;
/// [`mount_group`] and [`unmount_group`] wrap these calls in existence checks.
pub trait MapHandle {
    fn is_loaded(&self) -> bool;

    fn has_source(&self, id: &str) -> bool;
    fn has_layer(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, data: &SourceData) -> Result<(), MapError>;
    fn remove_source(&mut self, id: &str) -> Result<(), MapError>;
    /// Replace the features of an existing source
    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError>;

    fn add_layer(&mut self, source_id: &str, layer: &StyleLayer) -> Result<(), MapError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;
    fn set_layer_visibility(&mut self, id: &str, visible: bool) -> Result<(), MapError>;
    fn set_filter(&mut self, id: &str, filter: Option<Filter>) -> Result<(), MapError>;

    fn camera(&self) -> Camera;
    /// Start an animated flight; returns immediately
    fn fly_to(&mut self, target: &CameraTarget, options: FlyOptions);
    fn jump_to(&mut self, target: &CameraTarget);
    fn fit_bounds(&mut self, bounds: Bounds, padding: usize);

    /// Features under `point`, limited to `layers` when given
    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: Option<&[String]>,
    ) -> Vec<RenderedFeature>;

    fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId;
    fn off(&mut self, id: ListenerId);

    fn set_cursor(&mut self, cursor: Cursor);
    fn show_popup(&mut self, popup: Popup);
    fn close_popup(&mut self);
}

/// Add a group's source and layers, skipping ids already on the map
pub fn mount_group(map: &mut dyn MapHandle, group: &LayerGroup) -> Result<(), MapError> {
    if !map.has_source(&group.id) {
        map.add_source(&group.id, &group.source)?;
    }
    for layer in &group.layers {
        if !map.has_layer(&layer.id) {
            map.add_layer(&group.id, layer)?;
        }
    }
    Ok(())
}

/// Remove a group's layers then its source, skipping ids not on the map
pub fn unmount_group(map: &mut dyn MapHandle, group: &LayerGroup) -> Result<(), MapError> {
    for layer in &group.layers {
        if map.has_layer(&layer.id) {
            map.remove_layer(&layer.id)?;
        }
    }
    if map.has_source(&group.id) {
        map.remove_source(&group.id)?;
    }
    Ok(())
}
