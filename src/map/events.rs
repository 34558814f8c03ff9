//! Map events and the listener registry.

use crate::map::handle::{MapHandle, ScreenPoint};

#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    Click { point: ScreenPoint, lon: f64, lat: f64 },
    PointerMove { point: ScreenPoint, lon: f64, lat: f64 },
    Ready,
    MoveEnd,
    ZoomEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    PointerMove,
    Ready,
    MoveEnd,
    ZoomEnd,
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::Click { .. } => EventKind::Click,
            MapEvent::PointerMove { .. } => EventKind::PointerMove,
            MapEvent::Ready => EventKind::Ready,
            MapEvent::MoveEnd => EventKind::MoveEnd,
            MapEvent::ZoomEnd => EventKind::ZoomEnd,
        }
    }

    /// Screen position for pointer events
    pub fn point(&self) -> Option<ScreenPoint> {
        match self {
            MapEvent::Click { point, .. } | MapEvent::PointerMove { point, .. } => Some(*point),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listeners receive the event and the map it fired on
pub type Listener = Box<dyn FnMut(&MapEvent, &mut dyn MapHandle)>;

struct Entry {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

/// Listener registry. Dispatch takes the listener list out of the bus so a
/// listener can freely call back into the map, including `off`.
#[derive(Default)]
pub struct EventBus {
    entries: Vec<Entry>,
    next_id: u64,
    dispatching: bool,
    /// Removals requested while dispatching
    pending_off: Vec<ListenerId>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Entry { id, kind, listener });
        id
    }

    pub fn off(&mut self, id: ListenerId) {
        if self.dispatching {
            self.pending_off.push(id);
        }
        self.entries.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take the listeners for a dispatch round
    fn begin(&mut self) -> Vec<Entry> {
        self.dispatching = true;
        std::mem::take(&mut self.entries)
    }

    /// Put listeners back, keeping any registered during dispatch
    fn finish(&mut self, mut taken: Vec<Entry>) {
        let pending = std::mem::take(&mut self.pending_off);
        taken.retain(|e| !pending.contains(&e.id));
        taken.append(&mut self.entries);
        self.entries = taken;
        self.dispatching = false;
    }
}

/// Maps that own an [`EventBus`] expose it through this trait so that
/// [`dispatch`] can hand listeners a mutable map.
pub trait HasEventBus: MapHandle {
    fn bus(&mut self) -> &mut EventBus;
    fn as_handle(&mut self) -> &mut dyn MapHandle;
}

/// Deliver `event` to every listener of its kind
pub fn dispatch<M: HasEventBus>(map: &mut M, event: &MapEvent) {
    let mut taken = map.bus().begin();
    let kind = event.kind();
    for entry in taken.iter_mut() {
        if entry.kind == kind && !map.bus().pending_off.contains(&entry.id) {
            (entry.listener)(event, map.as_handle());
        }
    }
    map.bus().finish(taken);
}
