#![cfg(test)]

use geojson::FeatureCollection;

use crate::map::{
    Bounds, Camera, CameraTarget, Cursor, EventKind, Filter, FlyOptions, ListenerId, MapError, MapHandle, Popup,
    RenderedFeature, ScreenPoint, SourceData, StyleLayer,
};
use crate::map::events::{EventBus, HasEventBus, Listener};

/// Map double that records every mutating call and enforces id uniqueness
pub struct RecordingMap {
    pub sources: Vec<String>,
    pub layers: Vec<String>,
    pub calls: Vec<String>,
    pub flights: Vec<(CameraTarget, FlyOptions)>,
    pub camera: Camera,
    pub loaded: bool,
    pub cursor: Cursor,
    bus: EventBus,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            layers: Vec::new(),
            calls: Vec::new(),
            flights: Vec::new(),
            camera: Camera::new(0.0, 0.0, 1.0),
            loaded: true,
            cursor: Cursor::Default,
            bus: EventBus::new(),
        }
    }

    pub fn attached(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.iter().chain(&self.layers).cloned().collect();
        ids.sort();
        ids
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }
}

impl MapHandle for RecordingMap {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s == id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l == id)
    }

    fn add_source(&mut self, id: &str, _data: &SourceData) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.calls.push(format!("add_source:{}", id));
        self.sources.push(id.to_string());
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        if !self.has_source(id) {
            return Err(MapError::UnknownSource(id.to_string()));
        }
        self.calls.push(format!("remove_source:{}", id));
        self.sources.retain(|s| s != id);
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, _data: FeatureCollection) -> Result<(), MapError> {
        if !self.has_source(id) {
            return Err(MapError::UnknownSource(id.to_string()));
        }
        self.calls.push(format!("set_source_data:{}", id));
        Ok(())
    }

    fn add_layer(&mut self, source_id: &str, layer: &StyleLayer) -> Result<(), MapError> {
        if !self.has_source(source_id) {
            return Err(MapError::UnknownSource(source_id.to_string()));
        }
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id.clone()));
        }
        self.calls.push(format!("add_layer:{}", layer.id));
        self.layers.push(layer.id.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        if !self.has_layer(id) {
            return Err(MapError::UnknownLayer(id.to_string()));
        }
        self.calls.push(format!("remove_layer:{}", id));
        self.layers.retain(|l| l != id);
        Ok(())
    }

    fn set_layer_visibility(&mut self, id: &str, visible: bool) -> Result<(), MapError> {
        if !self.has_layer(id) {
            return Err(MapError::UnknownLayer(id.to_string()));
        }
        self.calls.push(format!("visibility:{}:{}", id, visible));
        Ok(())
    }

    fn set_filter(&mut self, id: &str, _filter: Option<Filter>) -> Result<(), MapError> {
        if !self.has_layer(id) {
            return Err(MapError::UnknownLayer(id.to_string()));
        }
        self.calls.push(format!("filter:{}", id));
        Ok(())
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn fly_to(&mut self, target: &CameraTarget, options: FlyOptions) {
        self.calls.push("fly_to".to_string());
        self.flights.push((*target, options));
        self.camera = self.camera.with_target(target);
    }

    fn jump_to(&mut self, target: &CameraTarget) {
        self.calls.push("jump_to".to_string());
        self.camera = self.camera.with_target(target);
    }

    fn fit_bounds(&mut self, _bounds: Bounds, _padding: usize) {
        self.calls.push("fit_bounds".to_string());
    }

    fn query_rendered_features(&self, _point: ScreenPoint, _layers: Option<&[String]>) -> Vec<RenderedFeature> {
        Vec::new()
    }

    fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.bus.on(kind, listener)
    }

    fn off(&mut self, id: ListenerId) {
        self.bus.off(id);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn show_popup(&mut self, _popup: Popup) {
        self.calls.push("show_popup".to_string());
    }

    fn close_popup(&mut self) {
        self.calls.push("close_popup".to_string());
    }
}

impl HasEventBus for RecordingMap {
    fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    fn as_handle(&mut self) -> &mut dyn MapHandle {
        self
    }
}
