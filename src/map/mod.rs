mod geometry;
mod projection;
mod renderer;
mod spatial;

pub mod camera;
pub mod events;
pub mod handle;
pub mod style;
pub mod view;

pub use camera::{AnimationOptions, Camera, CameraTarget, Easing};
pub use events::{EventKind, ListenerId, MapEvent};
pub use handle::{
    mount_group, unmount_group, Bounds, Cursor, FlyOptions, MapError, MapHandle, Popup,
    RenderedFeature, ScreenPoint,
};
pub use projection::{zoom_factor, zoom_level, Viewport};
pub use renderer::{Glyph, Label, LineString, Lod, MapLayers, MapRenderer};
pub use spatial::{geometry_bbox, SourceIndex};
pub use style::{
    rgb, ColorRule, Filter, LayerGroup, LayerKind, LinePattern, Paint, SourceData, StyleLayer,
};
pub use view::MapView;
