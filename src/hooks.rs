//! Event bindings that subscribe a handler to the map and unsubscribe on
//! teardown or when the handler changes.
//!
//! Handlers are compared by `Rc` identity: passing the same `Rc` again keeps
//! the existing listener, passing a new one re-subscribes.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::map::{Cursor, EventKind, ListenerId, MapEvent, MapHandle, RenderedFeature};

/// Called with the triggering event and the features under the pointer
pub type FeatureHandler = Rc<dyn Fn(&MapEvent, &[RenderedFeature], &mut dyn MapHandle)>;

/// Called with the map after a camera or load event
pub type MapCallback = Rc<dyn Fn(&mut dyn MapHandle)>;

fn same_rc<T: ?Sized>(a: Option<&Rc<T>>, b: Option<&Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Click or hover binding that queries rendered features at the pointer
pub struct FeatureBinding {
    kind: EventKind,
    handler: Option<FeatureHandler>,
    layers: Option<Vec<String>>,
    listener: Option<ListenerId>,
}

impl FeatureBinding {
    pub fn click() -> Self {
        Self::new(EventKind::Click)
    }

    pub fn hover() -> Self {
        Self::new(EventKind::PointerMove)
    }

    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            handler: None,
            layers: None,
            listener: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    pub fn sync(
        &mut self,
        map: Option<&mut dyn MapHandle>,
        handler: Option<&FeatureHandler>,
        layers: Option<&[String]>,
    ) {
        let Some(map) = map else {
            // listeners die with the map
            self.listener = None;
            self.handler = None;
            return;
        };
        let unchanged = same_rc(self.handler.as_ref(), handler)
            && self.layers.as_deref() == layers
            && self.listener.is_some() == handler.is_some();
        if unchanged {
            return;
        }

        self.teardown(map);
        let Some(handler) = handler else {
            return;
        };
        self.handler = Some(Rc::clone(handler));
        self.layers = layers.map(<[String]>::to_vec);

        let handler = Rc::clone(handler);
        let layers = self.layers.clone();
        let id = map.on(
            self.kind,
            Box::new(move |event, map| {
                let Some(point) = event.point() else {
                    return;
                };
                let features = map.query_rendered_features(point, layers.as_deref());
                handler(event, &features, map);
            }),
        );
        debug!("Bound {:?} listener {:?}", self.kind, id);
        self.listener = Some(id);
    }

    pub fn teardown(&mut self, map: &mut dyn MapHandle) {
        if let Some(id) = self.listener.take() {
            map.off(id);
        }
        self.handler = None;
        self.layers = None;
    }
}

/// Move-end or zoom-end binding
pub struct CallbackBinding {
    kind: EventKind,
    callback: Option<MapCallback>,
    listener: Option<ListenerId>,
}

impl CallbackBinding {
    pub fn move_end() -> Self {
        Self::new(EventKind::MoveEnd)
    }

    pub fn zoom_end() -> Self {
        Self::new(EventKind::ZoomEnd)
    }

    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            callback: None,
            listener: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    pub fn sync(&mut self, map: Option<&mut dyn MapHandle>, callback: Option<&MapCallback>) {
        let Some(map) = map else {
            self.listener = None;
            self.callback = None;
            return;
        };
        if same_rc(self.callback.as_ref(), callback) && self.listener.is_some() == callback.is_some() {
            return;
        }

        self.teardown(map);
        let Some(callback) = callback else {
            return;
        };
        self.callback = Some(Rc::clone(callback));
        let callback = Rc::clone(callback);
        self.listener = Some(map.on(self.kind, Box::new(move |_, map| callback(map))));
    }

    pub fn teardown(&mut self, map: &mut dyn MapHandle) {
        if let Some(id) = self.listener.take() {
            map.off(id);
        }
        self.callback = None;
    }
}

/// Runs its callback once: immediately if the map is already loaded,
/// otherwise on the first ready event
#[derive(Default)]
pub struct LoadBinding {
    fired: Rc<Cell<bool>>,
    listener: Option<ListenerId>,
}

impl LoadBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    pub fn sync(&mut self, map: Option<&mut dyn MapHandle>, on_load: Option<&MapCallback>) {
        let (Some(map), Some(on_load)) = (map, on_load) else {
            return;
        };
        if self.fired.get() || self.listener.is_some() {
            return;
        }

        if map.is_loaded() {
            self.fired.set(true);
            on_load(map);
            return;
        }

        let fired = Rc::clone(&self.fired);
        let on_load = Rc::clone(on_load);
        self.listener = Some(map.on(
            EventKind::Ready,
            Box::new(move |_, map| {
                if !fired.replace(true) {
                    on_load(map);
                }
            }),
        ));
    }

    pub fn teardown(&mut self, map: &mut dyn MapHandle) {
        if let Some(id) = self.listener.take() {
            map.off(id);
        }
    }
}

/// Switches the cursor while the pointer is over a feature of the given layers
#[derive(Default)]
pub struct CursorBinding {
    layers: Vec<String>,
    listener: Option<ListenerId>,
}

impl CursorBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, map: Option<&mut dyn MapHandle>, cursor: Cursor, layers: &[String]) {
        let Some(map) = map else {
            self.listener = None;
            self.layers.clear();
            return;
        };
        // only layers present when binding are watched
        let present: Vec<String> = layers.iter().filter(|id| map.has_layer(id)).cloned().collect();
        if self.listener.is_some() && present == self.layers {
            return;
        }

        self.teardown(map);
        if present.is_empty() {
            return;
        }
        self.layers = present.clone();

        let hovering = Rc::new(Cell::new(false));
        self.listener = Some(map.on(
            EventKind::PointerMove,
            Box::new(move |event, map| {
                let Some(point) = event.point() else {
                    return;
                };
                let over = !map.query_rendered_features(point, Some(present.as_slice())).is_empty();
                if over != hovering.replace(over) {
                    map.set_cursor(if over { cursor } else { Cursor::Default });
                }
            }),
        ));
    }

    pub fn teardown(&mut self, map: &mut dyn MapHandle) {
        if let Some(id) = self.listener.take() {
            map.off(id);
        }
        self.layers.clear();
    }
}

/// Show or hide a layer if it is on the map. Returns whether it was.
pub fn set_layer_visible(map: &mut dyn MapHandle, layer_id: &str, visible: bool) -> bool {
    if !map.has_layer(layer_id) {
        return false;
    }
    map.set_layer_visibility(layer_id, visible).is_ok()
}

/// Handlers a slide can attach while it is shown
#[derive(Clone, Default)]
pub struct InteractionHandlers {
    pub on_click: Option<FeatureHandler>,
    pub on_hover: Option<FeatureHandler>,
    pub on_move_end: Option<MapCallback>,
    pub on_zoom_end: Option<MapCallback>,
    pub on_load: Option<MapCallback>,
    /// Restrict click and hover queries to these layers
    pub layers: Option<Vec<String>>,
}

impl InteractionHandlers {
    pub fn on_click(mut self, handler: impl Fn(&MapEvent, &[RenderedFeature], &mut dyn MapHandle) + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    pub fn on_hover(mut self, handler: impl Fn(&MapEvent, &[RenderedFeature], &mut dyn MapHandle) + 'static) -> Self {
        self.on_hover = Some(Rc::new(handler));
        self
    }

    pub fn on_move_end(mut self, callback: impl Fn(&mut dyn MapHandle) + 'static) -> Self {
        self.on_move_end = Some(Rc::new(callback));
        self
    }

    pub fn on_zoom_end(mut self, callback: impl Fn(&mut dyn MapHandle) + 'static) -> Self {
        self.on_zoom_end = Some(Rc::new(callback));
        self
    }

    pub fn on_load(mut self, callback: impl Fn(&mut dyn MapHandle) + 'static) -> Self {
        self.on_load = Some(Rc::new(callback));
        self
    }

    pub fn layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = Some(layers.into_iter().map(Into::into).collect());
        self
    }
}

impl fmt::Debug for InteractionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHandlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_hover", &self.on_hover.is_some())
            .field("on_move_end", &self.on_move_end.is_some())
            .field("on_zoom_end", &self.on_zoom_end.is_some())
            .field("on_load", &self.on_load.is_some())
            .field("layers", &self.layers)
            .finish()
    }
}

/// All bindings for one set of handlers. Clickable layers also get a
/// pointer cursor.
pub struct Interactions {
    click: FeatureBinding,
    hover: FeatureBinding,
    move_end: CallbackBinding,
    zoom_end: CallbackBinding,
    load: LoadBinding,
    cursor: CursorBinding,
}

impl Default for Interactions {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactions {
    pub fn new() -> Self {
        Self {
            click: FeatureBinding::click(),
            hover: FeatureBinding::hover(),
            move_end: CallbackBinding::move_end(),
            zoom_end: CallbackBinding::zoom_end(),
            load: LoadBinding::new(),
            cursor: CursorBinding::new(),
        }
    }

    pub fn sync(&mut self, map: &mut dyn MapHandle, handlers: Option<&InteractionHandlers>) {
        let Some(handlers) = handlers else {
            self.teardown(map);
            return;
        };
        let layers = handlers.layers.as_deref();
        self.click.sync(Some(&mut *map), handlers.on_click.as_ref(), layers);
        self.hover.sync(Some(&mut *map), handlers.on_hover.as_ref(), layers);
        self.move_end.sync(Some(&mut *map), handlers.on_move_end.as_ref());
        self.zoom_end.sync(Some(&mut *map), handlers.on_zoom_end.as_ref());
        self.load.sync(Some(&mut *map), handlers.on_load.as_ref());
        match (handlers.on_click.is_some(), layers) {
            (true, Some(layers)) => self.cursor.sync(Some(map), Cursor::Pointer, layers),
            _ => self.cursor.teardown(map),
        }
    }

    pub fn teardown(&mut self, map: &mut dyn MapHandle) {
        self.click.teardown(map);
        self.hover.teardown(map);
        self.move_end.teardown(map);
        self.zoom_end.teardown(map);
        self.load.teardown(map);
        self.cursor.teardown(map);
        self.load = LoadBinding::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{collection, point};
    use crate::map::{
        mount_group, zoom_factor, LayerGroup, LayerKind, MapRenderer, MapView, ScreenPoint, StyleLayer, Viewport,
    };
    use serde_json::json;
    use std::cell::RefCell;

    fn view() -> MapView {
        let mut map = MapView::new(
            MapRenderer::new(),
            Viewport::new(117.0, 5.5, zoom_factor(7.0), 160, 80),
            "does-not-exist",
        );
        let group = LayerGroup::inline("stores", collection([point(117.0, 5.5, json!({ "name": "Store 1" }))]))
            .with_layer(StyleLayer::new("stores-points", LayerKind::Circle));
        mount_group(&mut map, &group).unwrap();
        map
    }

    fn click(map: &mut MapView, x: i32, y: i32) {
        let point = ScreenPoint::new(x, y);
        let (lon, lat) = map.unproject(point);
        map.emit(&MapEvent::Click { point, lon, lat });
    }

    fn hover(map: &mut MapView, x: i32, y: i32) {
        let point = ScreenPoint::new(x, y);
        let (lon, lat) = map.unproject(point);
        map.emit(&MapEvent::PointerMove { point, lon, lat });
    }

    #[test]
    fn test_click_queries_bound_layers() {
        let mut map = view();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler: FeatureHandler = Rc::new(move |_, features, _| {
            sink.borrow_mut()
                .extend(features.iter().filter_map(|f| f.property_str("name").map(String::from)));
        });

        let mut binding = FeatureBinding::click();
        let layers = vec!["stores-points".to_string()];
        binding.sync(Some(&mut map), Some(&handler), Some(layers.as_slice()));
        click(&mut map, 80, 40);
        click(&mut map, 2, 2);
        assert_eq!(*seen.borrow(), vec!["Store 1".to_string()]);

        let other = vec!["elsewhere".to_string()];
        binding.sync(Some(&mut map), Some(&handler), Some(other.as_slice()));
        click(&mut map, 80, 40);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_same_handler_keeps_listener() {
        let mut map = view();
        let handler: FeatureHandler = Rc::new(|_, _, _| {});
        let mut binding = FeatureBinding::hover();

        binding.sync(Some(&mut map), Some(&handler), None);
        binding.sync(Some(&mut map), Some(&handler), None);
        assert_eq!(map.listener_count(), 1);

        let replacement: FeatureHandler = Rc::new(|_, _, _| {});
        binding.sync(Some(&mut map), Some(&replacement), None);
        assert_eq!(map.listener_count(), 1);

        binding.sync(Some(&mut map), None, None);
        assert_eq!(map.listener_count(), 0);
        assert!(!binding.is_bound());
    }

    #[test]
    fn test_load_fires_once() {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let on_load: MapCallback = Rc::new(move |_| counter.set(counter.get() + 1));

        let mut map = view();
        let mut binding = LoadBinding::new();
        binding.sync(Some(&mut map), Some(&on_load));
        assert_eq!(count.get(), 0);
        assert!(!binding.has_fired());
        map.mark_loaded();
        map.emit(&MapEvent::Ready);
        map.emit(&MapEvent::Ready);
        binding.sync(Some(&mut map), Some(&on_load));
        assert_eq!(count.get(), 1);
        assert!(binding.has_fired());

        let mut loaded = view();
        loaded.mark_loaded();
        let mut binding = LoadBinding::new();
        binding.sync(Some(&mut loaded), Some(&on_load));
        assert_eq!(count.get(), 2);
        assert_eq!(loaded.listener_count(), 0);
    }

    #[test]
    fn test_cursor_follows_hover() {
        let mut map = view();
        let mut binding = CursorBinding::new();
        binding.sync(
            Some(&mut map),
            Cursor::Pointer,
            &["stores-points".to_string(), "missing".to_string()],
        );
        hover(&mut map, 80, 40);
        assert_eq!(map.cursor(), Cursor::Pointer);
        hover(&mut map, 2, 2);
        assert_eq!(map.cursor(), Cursor::Default);
        binding.teardown(&mut map);
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn test_move_end_binding() {
        let mut map = view();
        let moved = Rc::new(Cell::new(false));
        let flag = Rc::clone(&moved);
        let callback: MapCallback = Rc::new(move |_| flag.set(true));
        let mut binding = CallbackBinding::move_end();
        binding.sync(Some(&mut map), Some(&callback));
        map.emit(&MapEvent::ZoomEnd);
        assert!(!moved.get());
        map.emit(&MapEvent::MoveEnd);
        assert!(moved.get());
    }

    #[test]
    fn test_interactions_teardown() {
        let mut map = view();
        let handlers = InteractionHandlers::default()
            .on_click(|_, _, _| {})
            .on_hover(|_, _, _| {})
            .on_zoom_end(|_| {})
            .layers(["stores-points"]);
        let mut interactions = Interactions::new();
        interactions.sync(&mut map, Some(&handlers));
        // click, hover, zoom end, cursor
        assert_eq!(map.listener_count(), 4);
        interactions.sync(&mut map, Some(&handlers));
        assert_eq!(map.listener_count(), 4);
        interactions.teardown(&mut map);
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn test_visibility_helper() {
        let mut map = view();
        assert!(set_layer_visible(&mut map, "stores-points", false));
        assert!(!set_layer_visible(&mut map, "missing", false));
        assert!(map.query_rendered_features(ScreenPoint::new(80, 40), None).is_empty());
    }
}
