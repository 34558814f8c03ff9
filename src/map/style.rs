//! Declarative layer styling: sources, style layers, paint and filters.

use geojson::{Feature, FeatureCollection, JsonObject};
use ratatui::style::Color;
use serde_json::Value as JsonValue;

/// Build a terminal color from a `0xRRGGBB` literal
pub const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Where a source's features come from
#[derive(Clone, Debug)]
pub enum SourceData {
    /// Features supplied directly by the slide
    Inline(FeatureCollection),
    /// Path of a GeoJSON file, relative to the data directory
    Url(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
    Heatmap,
    FillExtrusion,
}

/// Feature color: a constant or a `match` on one property
#[derive(Clone, Debug)]
pub enum ColorRule {
    Constant(Color),
    Match {
        property: String,
        cases: Vec<(String, Color)>,
        fallback: Color,
    },
}

impl ColorRule {
    pub fn resolve(&self, properties: Option<&JsonObject>) -> Color {
        match self {
            ColorRule::Constant(color) => *color,
            ColorRule::Match {
                property,
                cases,
                fallback,
            } => properties
                .and_then(|p| p.get(property))
                .and_then(|v| v.as_str())
                .and_then(|value| cases.iter().find(|(k, _)| k == value))
                .map(|(_, color)| *color)
                .unwrap_or(*fallback),
        }
    }
}

impl Default for ColorRule {
    fn default() -> Self {
        ColorRule::Constant(Color::White)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinePattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LinePattern {
    /// Whether the pixel at `step` along a line is drawn
    #[inline(always)]
    pub fn is_on(self, step: u32) -> bool {
        match self {
            LinePattern::Solid => true,
            LinePattern::Dashed => step % 6 < 4,
            LinePattern::Dotted => step % 3 == 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Paint {
    pub color: ColorRule,
    /// 0.0..=1.0, drives stipple density for fills
    pub opacity: f32,
    pub width: f32,
    pub radius: f32,
    pub pattern: LinePattern,
    /// Heatmap density stops, ascending
    pub ramp: Vec<(f32, Color)>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: ColorRule::default(),
            opacity: 1.0,
            width: 1.0,
            radius: 3.0,
            pattern: LinePattern::Solid,
            ramp: Vec::new(),
        }
    }
}

impl Paint {
    pub fn color(color: Color) -> Self {
        Self {
            color: ColorRule::Constant(color),
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule: ColorRule) -> Self {
        self.color = rule;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_pattern(mut self, pattern: LinePattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_ramp(mut self, ramp: Vec<(f32, Color)>) -> Self {
        self.ramp = ramp;
        self
    }

    /// Color for a normalized heatmap density
    pub fn ramp_color(&self, density: f32) -> Color {
        self.ramp
            .iter()
            .rev()
            .find(|(stop, _)| density >= *stop)
            .map(|(_, c)| *c)
            .unwrap_or_else(|| self.color.resolve(None))
    }
}

#[derive(Clone, Debug)]
pub struct Layout {
    /// Property rendered by symbol layers
    pub text_field: Option<String>,
    /// Label offset in character rows below the anchor
    pub text_offset: i32,
    pub visible: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            text_field: None,
            text_offset: 1,
            visible: true,
        }
    }
}

/// Property filter evaluated per feature
#[derive(Clone, Debug)]
pub enum Filter {
    Eq(String, JsonValue),
    In(String, Vec<JsonValue>),
    Has(String),
    Not(Box<Filter>),
    All(Vec<Filter>),
}

impl Filter {
    pub fn eq(property: &str, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(property.to_string(), value.into())
    }

    pub fn matches(&self, feature: &Feature) -> bool {
        match self {
            Filter::Eq(key, value) => feature.property(key) == Some(value),
            Filter::In(key, values) => feature
                .property(key)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Filter::Has(key) => feature.contains_property(key),
            Filter::Not(inner) => !inner.matches(feature),
            Filter::All(filters) => filters.iter().all(|f| f.matches(feature)),
        }
    }
}

/// One renderable layer drawn from a source
#[derive(Clone, Debug)]
pub struct StyleLayer {
    pub id: String,
    pub kind: LayerKind,
    pub paint: Paint,
    pub layout: Layout,
    pub filter: Option<Filter>,
    pub minzoom: Option<f64>,
    pub maxzoom: Option<f64>,
}

impl StyleLayer {
    pub fn new(id: &str, kind: LayerKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            paint: Paint::default(),
            layout: Layout::default(),
            filter: None,
            minzoom: None,
            maxzoom: None,
        }
    }

    pub fn paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn text_field(mut self, property: &str) -> Self {
        self.layout.text_field = Some(property.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.layout.visible = false;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn minzoom(mut self, zoom: f64) -> Self {
        self.minzoom = Some(zoom);
        self
    }

    pub fn maxzoom(mut self, zoom: f64) -> Self {
        self.maxzoom = Some(zoom);
        self
    }

    /// Zoom range check: `minzoom <= zoom < maxzoom`
    pub fn visible_at(&self, zoom: f64) -> bool {
        self.layout.visible
            && self.minzoom.map_or(true, |min| zoom >= min)
            && self.maxzoom.map_or(true, |max| zoom < max)
    }
}

/// A named source plus the style layers drawn from it
#[derive(Clone, Debug)]
pub struct LayerGroup {
    pub id: String,
    pub source: SourceData,
    pub layers: Vec<StyleLayer>,
}

impl LayerGroup {
    pub fn new(id: &str, source: SourceData) -> Self {
        Self {
            id: id.to_string(),
            source,
            layers: Vec::new(),
        }
    }

    pub fn inline(id: &str, features: FeatureCollection) -> Self {
        Self::new(id, SourceData::Inline(features))
    }

    pub fn url(id: &str, path: &str) -> Self {
        Self::new(id, SourceData::Url(path.to_string()))
    }

    pub fn with_layer(mut self, layer: StyleLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.id.as_str())
    }
}
