//! Owns the map view for the lifetime of the app and lends it out per call.

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, warn};

use crate::data;
use crate::hooks::{InteractionHandlers, Interactions};
use crate::map::{
    mount_group, zoom_factor, Bounds, CameraTarget, LayerGroup, MapEvent, MapHandle, MapLayers, MapRenderer,
    MapView, ScreenPoint, Viewport,
};

/// Padding around fitted bounds, in braille pixels
const FIT_PADDING: usize = 8;

/// Built-in map controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    /// Zoom/rotate keys and the compass
    pub navigation: bool,
    /// Hide overlays to show the map alone
    pub fullscreen: bool,
    pub scale: bool,
    /// No terminal equivalent; requests are logged
    pub geolocate: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            navigation: true,
            fullscreen: false,
            scale: false,
            geolocate: false,
        }
    }
}

impl Controls {
    /// Parse a comma separated list such as `navigation,scale`
    pub fn parse(list: &str) -> Self {
        let mut controls = Controls {
            navigation: false,
            ..Controls::default()
        };
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "navigation" => controls.navigation = true,
                "fullscreen" => controls.fullscreen = true,
                "scale" => controls.scale = true,
                "geolocate" => controls.geolocate = true,
                other => warn!("Unknown map control: {}", other),
            }
        }
        controls
    }
}

pub struct MapOptions {
    pub initial_camera: CameraTarget,
    /// Basemap and layer data root
    pub data_dir: PathBuf,
    /// Fit the camera to these bounds once created
    pub bounds: Option<Bounds>,
    /// Groups mounted when the map is ready
    pub layers: Vec<LayerGroup>,
    pub controls: Controls,
    pub interactions: Option<InteractionHandlers>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            initial_camera: CameraTarget::at(0.0, 0.0, 2.0),
            data_dir: PathBuf::from("data"),
            bounds: None,
            layers: Vec::new(),
            controls: Controls::default(),
            interactions: None,
        }
    }
}

pub struct MapHost {
    view: Option<MapView>,
    layers: Vec<LayerGroup>,
    controls: Controls,
    handlers: Option<InteractionHandlers>,
    interactions: Interactions,
    fullscreen: bool,
    /// Last pointer position in braille pixels
    pointer: Option<ScreenPoint>,
    drag_from: Option<(u16, u16)>,
}

impl MapHost {
    /// Create the view sized for a `cols` x `rows` cell area
    pub fn new(options: MapOptions, cols: u16, rows: u16) -> Self {
        let mut renderer = MapRenderer::new();
        data::load_basemap(&mut renderer, &options.data_dir);

        let (lon, lat) = options.initial_camera.center.unwrap_or((0.0, 0.0));
        let zoom = options.initial_camera.zoom.unwrap_or(2.0);
        let viewport = Viewport::new(lon, lat, zoom_factor(zoom), cols as usize * 2, rows as usize * 4);
        let mut view = MapView::new(renderer, viewport, options.data_dir);
        view.jump_to(&options.initial_camera);
        if let Some(bounds) = options.bounds {
            view.fit_bounds(bounds, FIT_PADDING);
        }
        view.take_events();

        info!(
            "Map created at {:.4}, {:.4} zoom {:.1} (controls {:?})",
            lon, lat, zoom, options.controls
        );
        Self {
            view: Some(view),
            layers: options.layers,
            controls: options.controls,
            handlers: options.interactions,
            interactions: Interactions::new(),
            fullscreen: false,
            pointer: None,
            drag_from: None,
        }
    }

    /// Signal that the style is ready: mount the initial groups, bind
    /// map-level handlers and emit the ready event
    pub fn load(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if view.is_loaded() {
            return;
        }
        view.mark_loaded();
        for group in &self.layers {
            if let Err(e) = mount_group(&mut *view, group) {
                warn!("Initial group {} failed to mount: {}", group.id, e);
            }
        }
        self.interactions.sync(&mut *view, self.handlers.as_ref());
        view.emit(&MapEvent::Ready);
        debug!("Map ready with {} initial groups", self.layers.len());
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    /// The map as the handle slides and hooks work through
    pub fn handle(&mut self) -> Option<&mut dyn MapHandle> {
        self.view.as_mut().map(|v| v as &mut dyn MapHandle)
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Overlays are hidden in fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn pointer(&self) -> Option<ScreenPoint> {
        self.pointer
    }

    /// Resize to a `cols` x `rows` cell area
    pub fn resize(&mut self, cols: u16, rows: u16) {
        if let Some(view) = self.view.as_mut() {
            view.resize(cols as usize * 2, rows as usize * 4);
        }
    }

    /// Step camera animation and deliver the events it produced
    pub fn frame(&mut self, dt: Duration) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        view.step(dt);
        for event in view.take_events() {
            view.emit(&event);
        }
    }

    pub fn render(&self, cols: u16, rows: u16) -> Option<MapLayers> {
        self.view.as_ref().map(|v| v.render(cols as usize, rows as usize))
    }

    /// Handle a map control key. Returns whether it was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let controls = self.controls;
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => view.pan(0, -6),
            KeyCode::Down | KeyCode::Char('j') => view.pan(0, 6),
            KeyCode::Char('h') => view.pan(-10, 0),
            KeyCode::Char('l') => view.pan(10, 0),
            KeyCode::Char('+') | KeyCode::Char('=') if controls.navigation => view.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') if controls.navigation => view.zoom_out(),
            KeyCode::Char('[') if controls.navigation => view.rotate(-15.0),
            KeyCode::Char(']') if controls.navigation => view.rotate(15.0),
            KeyCode::Char('n') if controls.navigation => view.reset_north(),
            KeyCode::Char('f') if controls.fullscreen => {
                self.fullscreen = !self.fullscreen;
                debug!("Fullscreen {}", self.fullscreen);
            }
            KeyCode::Char('g') if controls.geolocate => {
                info!("Geolocation is not available in the terminal; ignoring");
            }
            _ => return false,
        }
        self.dispatch_queued();
        true
    }

    /// Pointer moved to map cell (`col`, `row`)
    pub fn pointer_move(&mut self, col: u16, row: u16) {
        let point = cell_center(col, row);
        self.pointer = Some(point);
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if let Some((from_col, from_row)) = self.drag_from {
            let dx = (from_col as i32 - col as i32) * 2;
            let dy = (from_row as i32 - row as i32) * 4;
            view.pan(dx, dy);
            self.drag_from = Some((col, row));
        }
        let (lon, lat) = view.unproject(point);
        view.emit(&MapEvent::PointerMove { point, lon, lat });
        self.dispatch_queued();
    }

    pub fn click(&mut self, col: u16, row: u16) {
        let point = cell_center(col, row);
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let (lon, lat) = view.unproject(point);
        view.emit(&MapEvent::Click { point, lon, lat });
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.drag_from = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.drag_from = None;
    }

    pub fn scroll(&mut self, col: u16, row: u16, zoom_in: bool) {
        if !self.controls.navigation {
            return;
        }
        let point = cell_center(col, row);
        if let Some(view) = self.view.as_mut() {
            if zoom_in {
                view.zoom_in_at(point.x, point.y);
            } else {
                view.zoom_out_at(point.x, point.y);
            }
        }
        self.dispatch_queued();
    }

    fn dispatch_queued(&mut self) {
        if let Some(view) = self.view.as_mut() {
            for event in view.take_events() {
                view.emit(&event);
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.view.is_none()
    }

    /// Release the map. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(mut view) = self.view.take() {
            self.interactions.teardown(&mut view);
            view.dispose();
            info!("Map disposed");
        }
    }
}

impl Drop for MapHost {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn cell_center(col: u16, row: u16) -> ScreenPoint {
    ScreenPoint::new(col as i32 * 2 + 1, row as i32 * 4 + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{collection, point};
    use crate::map::{LayerKind, StyleLayer};
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn options() -> MapOptions {
        MapOptions {
            initial_camera: CameraTarget::at(116.07, 5.98, 7.0),
            data_dir: PathBuf::from("does-not-exist"),
            layers: vec![LayerGroup::inline(
                "facilities",
                collection([point(116.07, 5.98, json!({ "name": "Kota Kinabalu DC" }))]),
            )
            .with_layer(StyleLayer::new("facility-points", LayerKind::Circle))],
            ..MapOptions::default()
        }
    }

    #[test]
    fn test_controls_parse() {
        let controls = Controls::parse("navigation, scale,bogus");
        assert!(controls.navigation && controls.scale);
        assert!(!controls.fullscreen && !controls.geolocate);
        assert_eq!(Controls::parse(""), Controls { navigation: false, ..Controls::default() });
    }

    #[test]
    fn test_new_falls_back_to_builtin_world() {
        let host = MapHost::new(options(), 80, 24);
        let view = host.view().unwrap();
        assert!(view.renderer.has_data());
        assert!(!view.is_loaded());
        assert!((view.camera().zoom - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_mounts_initial_groups_once() {
        let loads = Rc::new(Cell::new(0));
        let counter = Rc::clone(&loads);
        let handlers = InteractionHandlers::default().on_load(move |_| counter.set(counter.get() + 1));
        let mut host = MapHost::new(
            MapOptions {
                interactions: Some(handlers),
                ..options()
            },
            80,
            24,
        );
        host.load();
        host.load();
        let view = host.view().unwrap();
        assert!(view.is_loaded());
        assert!(view.has_source("facilities"));
        assert!(view.has_layer("facility-points"));
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_fit_bounds_on_create() {
        let host = MapHost::new(
            MapOptions {
                bounds: Some(Bounds::new(115.0, 4.0, 119.5, 7.5)),
                ..options()
            },
            80,
            24,
        );
        let camera = host.view().unwrap().camera();
        assert!((camera.center.x - 117.25).abs() < 0.5);
        assert!((camera.center.y - 5.75).abs() < 0.5);
    }

    #[test]
    fn test_control_keys() {
        let key = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        let mut host = MapHost::new(options(), 80, 24);
        let before = host.view().unwrap().camera().zoom;
        assert!(host.handle_key(&key('+')));
        assert!(host.view().unwrap().camera().zoom > before);

        // fullscreen and geolocate are off by default
        assert!(!host.handle_key(&key('f')));
        assert!(!host.handle_key(&key('g')));

        let mut host = MapHost::new(
            MapOptions {
                controls: Controls::parse("fullscreen,geolocate"),
                ..options()
            },
            80,
            24,
        );
        assert!(!host.handle_key(&key('+')));
        assert!(host.handle_key(&key('f')));
        assert!(host.is_fullscreen());
        assert!(host.handle_key(&key('g')));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut host = MapHost::new(options(), 80, 24);
        host.load();
        host.dispose();
        assert!(host.is_disposed());
        assert!(host.handle().is_none());
        host.dispose();
        host.frame(Duration::from_millis(16));
        assert!(host.render(80, 24).is_none());
    }
}
