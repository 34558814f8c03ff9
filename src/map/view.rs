use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use geojson::{Feature, FeatureCollection};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::data;
use crate::map::camera::{Camera, CameraTarget, Flight};
use crate::map::events::{self, EventBus, EventKind, HasEventBus, Listener, ListenerId, MapEvent};
use crate::map::handle::{
    Bounds, Cursor, FlyOptions, MapError, MapHandle, Popup, RenderedFeature, ScreenPoint,
};
use crate::map::renderer::{hit_test, DrawLayer, MapLayers, MapRenderer};
use crate::map::spatial::SourceIndex;
use crate::map::style::{Filter, SourceData, StyleLayer};
use crate::map::projection::Viewport;

/// Pointer reach for feature queries, in braille pixels
const QUERY_RADIUS_PX: f64 = 8.0;

struct SourceEntry {
    features: Rc<Vec<Feature>>,
    index: SourceIndex,
}

impl SourceEntry {
    fn new(features: Rc<Vec<Feature>>) -> Self {
        let index = SourceIndex::build(&features);
        Self { features, index }
    }
}

struct MountedLayer {
    source_id: String,
    style: StyleLayer,
}

/// The terminal map: basemap, sources, style layers, camera and events
pub struct MapView {
    pub renderer: MapRenderer,
    viewport: Viewport,
    pitch: f64,
    sources: IndexMap<String, SourceEntry>,
    layers: Vec<MountedLayer>,
    flight: Option<Flight>,
    /// Zoom level when the current flight started
    flight_start_zoom: f64,
    events: EventBus,
    queued: Vec<MapEvent>,
    url_cache: HashMap<String, Rc<Vec<Feature>>>,
    data_dir: PathBuf,
    loaded: bool,
    cursor: Cursor,
    popup: Option<Popup>,
    reduced_motion: bool,
}

impl MapView {
    pub fn new(renderer: MapRenderer, viewport: Viewport, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            viewport,
            pitch: 0.0,
            sources: IndexMap::new(),
            layers: Vec::new(),
            flight: None,
            flight_start_zoom: 0.0,
            events: EventBus::new(),
            queued: Vec::new(),
            url_cache: HashMap::new(),
            data_dir: data_dir.into(),
            loaded: false,
            cursor: Cursor::Default,
            popup: None,
            reduced_motion: false,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        self.reduced_motion = on;
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.style.id.as_str())
    }

    /// Mark the style as loaded; the caller then emits [`MapEvent::Ready`]
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Set the canvas size in braille pixels
    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Advance any camera flight by `dt`
    pub fn step(&mut self, dt: Duration) {
        let Some(flight) = self.flight.as_mut() else {
            return;
        };
        let camera = flight.step(dt);
        camera.apply_to(&mut self.viewport);
        self.pitch = camera.pitch;
        if flight.is_done() {
            self.flight = None;
            self.queue_move_end(self.flight_start_zoom);
        }
    }

    fn queue_move_end(&mut self, zoom_before: f64) {
        self.queued.push(MapEvent::MoveEnd);
        if (self.viewport.zoom_level() - zoom_before).abs() > 1e-6 {
            self.queued.push(MapEvent::ZoomEnd);
        }
    }

    /// Events produced by camera changes since the last call
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.queued)
    }

    /// Deliver an event to registered listeners
    pub fn emit(&mut self, event: &MapEvent) {
        events::dispatch(self, event);
    }

    pub fn listener_count(&self) -> usize {
        self.events.len()
    }

    // Interactive navigation interrupts any flight in progress

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.flight = None;
        let zoom = self.viewport.zoom_level();
        self.viewport.pan(dx, dy);
        self.queue_move_end(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.flight = None;
        let zoom = self.viewport.zoom_level();
        self.viewport.zoom_in();
        self.queue_move_end(zoom);
    }

    pub fn zoom_out(&mut self) {
        self.flight = None;
        let zoom = self.viewport.zoom_level();
        self.viewport.zoom_out();
        self.queue_move_end(zoom);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.flight = None;
        let zoom = self.viewport.zoom_level();
        self.viewport.zoom_in_at(px, py);
        self.queue_move_end(zoom);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.flight = None;
        let zoom = self.viewport.zoom_level();
        self.viewport.zoom_out_at(px, py);
        self.queue_move_end(zoom);
    }

    pub fn rotate(&mut self, degrees: f64) {
        self.flight = None;
        self.viewport.rotate(degrees);
        self.queued.push(MapEvent::MoveEnd);
    }

    pub fn reset_north(&mut self) {
        self.flight = None;
        self.viewport.bearing = 0.0;
        self.pitch = 0.0;
        self.queued.push(MapEvent::MoveEnd);
    }

    /// Geographic position under a canvas pixel
    pub fn unproject(&self, point: ScreenPoint) -> (f64, f64) {
        self.viewport.unproject(point.x, point.y)
    }

    /// Render the basemap and every mounted layer into a `cols` x `rows` area
    pub fn render(&self, cols: usize, rows: usize) -> MapLayers {
        let mut viewport = self.viewport.clone();
        viewport.width = cols * 2;
        viewport.height = rows * 4;

        let layers: Vec<DrawLayer> = self
            .layers
            .iter()
            .filter_map(|l| {
                let source = self.sources.get(&l.source_id)?;
                Some(DrawLayer {
                    style: &l.style,
                    features: source.features.as_slice(),
                })
            })
            .collect();

        self.renderer.render(cols, rows, &viewport, &layers)
    }

    /// Tear down all map state. Listeners, sources and layers are dropped.
    pub fn dispose(&mut self) {
        self.events.clear();
        self.layers.clear();
        self.sources.clear();
        self.url_cache.clear();
        self.flight = None;
        self.popup = None;
        self.queued.clear();
        self.loaded = false;
    }

    fn resolve_source(&mut self, id: &str, data: &SourceData) -> Rc<Vec<Feature>> {
        match data {
            SourceData::Inline(fc) => Rc::new(fc.features.clone()),
            SourceData::Url(path) => {
                if let Some(cached) = self.url_cache.get(path) {
                    return Rc::clone(cached);
                }
                let features = match data::load_feature_collection(&self.data_dir.join(path)) {
                    Ok(fc) => fc.features,
                    Err(e) => {
                        warn!("Source {} failed to load {}: {}", id, path, e);
                        Vec::new()
                    }
                };
                let features = Rc::new(features);
                self.url_cache.insert(path.clone(), Rc::clone(&features));
                features
            }
        }
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut MountedLayer, MapError> {
        self.layers
            .iter_mut()
            .find(|l| l.style.id == id)
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))
    }
}

impl MapHandle for MapView {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.style.id == id)
    }

    fn add_source(&mut self, id: &str, data: &SourceData) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        let features = self.resolve_source(id, data);
        debug!("Added source {} ({} features)", id, features.len());
        self.sources.insert(id.to_string(), SourceEntry::new(features));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source_id == id) {
            return Err(MapError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer.style.id.clone(),
            });
        }
        self.sources
            .shift_remove(id)
            .map(|_| debug!("Removed source {}", id))
            .ok_or_else(|| MapError::UnknownSource(id.to_string()))
    }

    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError> {
        let entry = self
            .sources
            .get_mut(id)
            .ok_or_else(|| MapError::UnknownSource(id.to_string()))?;
        *entry = SourceEntry::new(Rc::new(data.features));
        Ok(())
    }

    fn add_layer(&mut self, source_id: &str, layer: &StyleLayer) -> Result<(), MapError> {
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id.clone()));
        }
        if !self.has_source(source_id) {
            return Err(MapError::UnknownSource(source_id.to_string()));
        }
        debug!("Added layer {} on {}", layer.id, source_id);
        self.layers.push(MountedLayer {
            source_id: source_id.to_string(),
            style: layer.clone(),
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        let pos = self
            .layers
            .iter()
            .position(|l| l.style.id == id)
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))?;
        self.layers.remove(pos);
        debug!("Removed layer {}", id);
        Ok(())
    }

    fn set_layer_visibility(&mut self, id: &str, visible: bool) -> Result<(), MapError> {
        self.layer_mut(id)?.style.layout.visible = visible;
        Ok(())
    }

    fn set_filter(&mut self, id: &str, filter: Option<Filter>) -> Result<(), MapError> {
        self.layer_mut(id)?.style.filter = filter;
        Ok(())
    }

    fn camera(&self) -> Camera {
        Camera::from_viewport(&self.viewport, self.pitch)
    }

    fn fly_to(&mut self, target: &CameraTarget, options: FlyOptions) {
        let from = self.camera();
        let to = from.with_target(target);
        if options.duration.is_zero() || (self.reduced_motion && !options.essential) {
            self.jump_to(target);
            return;
        }
        self.flight_start_zoom = from.zoom;
        self.flight = Some(Flight::new(from, to, options.duration, options.easing));
    }

    fn jump_to(&mut self, target: &CameraTarget) {
        let from = self.camera();
        let to = from.with_target(target);
        self.flight = None;
        to.apply_to(&mut self.viewport);
        self.pitch = to.pitch;
        self.queue_move_end(from.zoom);
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: usize) {
        let zoom = self.viewport.zoom_level();
        self.flight = None;
        self.viewport.fit_bounds(
            bounds.min_lon,
            bounds.min_lat,
            bounds.max_lon,
            bounds.max_lat,
            padding,
        );
        self.queue_move_end(zoom);
    }

    fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: Option<&[String]>,
    ) -> Vec<RenderedFeature> {
        let (lon, lat) = self.viewport.unproject(point.x, point.y);
        let degrees_per_px = 360.0 / (self.viewport.zoom * self.viewport.width.max(1) as f64);
        let radius = QUERY_RADIUS_PX * degrees_per_px;
        let level = self.viewport.zoom_level();

        // Topmost layer first
        let mut hits = Vec::new();
        for layer in self.layers.iter().rev() {
            if let Some(ids) = layers {
                if !ids.iter().any(|id| *id == layer.style.id) {
                    continue;
                }
            }
            if !layer.style.visible_at(level) {
                continue;
            }
            let Some(source) = self.sources.get(&layer.source_id) else {
                continue;
            };
            for idx in source.index.candidates(lon, lat, radius) {
                let Some(feature) = source.features.get(idx) else {
                    continue;
                };
                if let Some(anchor) =
                    hit_test(feature, &layer.style, &self.viewport, (point.x, point.y))
                {
                    hits.push(RenderedFeature {
                        layer_id: layer.style.id.clone(),
                        source_id: layer.source_id.clone(),
                        properties: feature.properties.clone(),
                        anchor,
                    });
                }
            }
        }
        hits
    }

    fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.events.on(kind, listener)
    }

    fn off(&mut self, id: ListenerId) {
        self.events.off(id);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }
}

impl HasEventBus for MapView {
    fn bus(&mut self) -> &mut EventBus {
        &mut self.events
    }

    fn as_handle(&mut self) -> &mut dyn MapHandle {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::camera::CameraTarget;
    use crate::map::handle::{mount_group, unmount_group};
    use crate::map::style::{LayerGroup, LayerKind};
    use geojson::{Geometry, Value};
    use serde_json::json;
    use std::cell::Cell;

    fn view() -> MapView {
        MapView::new(
            MapRenderer::new(),
            Viewport::new(117.0, 5.5, crate::map::projection::zoom_factor(7.0), 160, 80),
            "does-not-exist",
        )
    }

    fn point_collection(lon: f64, lat: f64, name: &str) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
                id: None,
                properties: json!({ "name": name }).as_object().cloned(),
                foreign_members: None,
            }],
            foreign_members: None,
        }
    }

    fn stores() -> LayerGroup {
        LayerGroup::inline("stores", point_collection(117.0, 5.5, "Store 1"))
            .with_layer(StyleLayer::new("stores-points", LayerKind::Circle))
            .with_layer(StyleLayer::new("stores-labels", LayerKind::Symbol).text_field("name"))
    }

    #[test]
    fn test_duplicate_ids_are_errors() {
        let mut map = view();
        let group = stores();
        map.add_source("stores", &group.source).unwrap();
        assert_eq!(
            map.add_source("stores", &group.source),
            Err(MapError::DuplicateSource("stores".into()))
        );
        assert_eq!(
            map.add_layer("missing", &group.layers[0]),
            Err(MapError::UnknownSource("missing".into()))
        );
        assert_eq!(map.remove_layer("nope"), Err(MapError::UnknownLayer("nope".into())));
    }

    #[test]
    fn test_source_in_use_cannot_be_removed() {
        let mut map = view();
        mount_group(&mut map, &stores()).unwrap();
        assert!(matches!(
            map.remove_source("stores"),
            Err(MapError::SourceInUse { .. })
        ));
        unmount_group(&mut map, &stores()).unwrap();
        assert_eq!(map.source_ids().count(), 0);
        assert_eq!(map.layer_ids().count(), 0);
    }

    #[test]
    fn test_missing_url_source_is_empty() {
        let mut map = view();
        map.add_source("states", &SourceData::Url("geojson/my.json".into()))
            .unwrap();
        assert!(map.has_source("states"));
        let layers = map.render(80, 20);
        assert!(layers.overlays.is_empty());
    }

    #[test]
    fn test_query_respects_layer_filter() {
        let mut map = view();
        mount_group(&mut map, &stores()).unwrap();
        let center = ScreenPoint::new(80, 40);

        let all = map.query_rendered_features(center, None);
        assert!(all.iter().any(|f| f.layer_id == "stores-points"));

        let only = ["stores-points".to_string()];
        let hits = map.query_rendered_features(center, Some(&only));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].property_str("name"), Some("Store 1"));

        let far = map.query_rendered_features(ScreenPoint::new(2, 2), None);
        assert!(far.is_empty());
    }

    #[test]
    fn test_flight_ends_with_move_and_zoom_events() {
        let mut map = view();
        map.fly_to(
            &CameraTarget::at(116.07, 5.98, 8.0),
            FlyOptions {
                duration: Duration::from_millis(100),
                ..FlyOptions::default()
            },
        );
        assert!(map.is_flying());
        map.step(Duration::from_millis(50));
        assert!(map.take_events().is_empty());
        map.step(Duration::from_millis(60));
        assert!(!map.is_flying());
        assert_eq!(map.take_events(), vec![MapEvent::MoveEnd, MapEvent::ZoomEnd]);
        assert!((map.camera().zoom - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_reduced_motion_jumps_non_essential() {
        let mut map = view();
        map.set_reduced_motion(true);
        let options = FlyOptions {
            essential: false,
            ..FlyOptions::default()
        };
        map.fly_to(&CameraTarget::at(116.07, 5.98, 8.0), options);
        assert!(!map.is_flying());
        assert!((map.camera().center.x - 116.07).abs() < 1e-9);
    }

    #[test]
    fn test_listener_can_unsubscribe_during_dispatch() {
        let mut map = view();
        let fired = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let (f, slot) = (Rc::clone(&fired), Rc::clone(&id_slot));
        let id = map.on(
            EventKind::MoveEnd,
            Box::new(move |_, map| {
                f.set(f.get() + 1);
                if let Some(id) = slot.get() {
                    map.off(id);
                }
            }),
        );
        id_slot.set(Some(id));

        map.emit(&MapEvent::MoveEnd);
        map.emit(&MapEvent::MoveEnd);
        assert_eq!(fired.get(), 1);
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn test_dispose_drops_everything() {
        let mut map = view();
        mount_group(&mut map, &stores()).unwrap();
        map.on(EventKind::Click, Box::new(|_, _| {}));
        map.mark_loaded();
        map.dispose();
        assert!(!map.is_loaded());
        assert_eq!(map.listener_count(), 0);
        assert!(!map.has_layer("stores-points"));
    }
}
