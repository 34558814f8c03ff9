use geojson::{Feature, Value};
use ratatui::style::Color;
use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{
    draw_circle, draw_line, draw_patterned_line, draw_thick_line, fill_polygon, point_in_ring,
    segment_distance,
};
use crate::map::projection::Viewport;
use crate::map::style::{LayerKind, StyleLayer};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom factor
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Basemap toggles
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_coastlines: bool,
    pub show_borders: bool,
    pub show_states: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_coastlines: true,
            show_borders: true,
            show_states: true,
            show_labels: true,
        }
    }
}

/// Text placed on the map grid (character coordinates)
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: Color,
}

/// A single colored cell (heatmap shading)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub col: u16,
    pub row: u16,
    pub ch: char,
    pub color: Color,
}

/// Rendered output, back to front: basemap, style layers, glyphs, labels
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub states: BrailleCanvas,
    /// One canvas per (layer, color) in draw order
    pub overlays: Vec<(Color, BrailleCanvas)>,
    pub glyphs: Vec<Glyph>,
    pub labels: Vec<Label>,
}

/// One style layer paired with its source's features
#[derive(Clone, Copy)]
pub struct DrawLayer<'a> {
    pub style: &'a StyleLayer,
    pub features: &'a [Feature],
}

/// Screen-space shapes for one feature
struct Projected {
    color: Color,
    polygons: Vec<Vec<Vec<(i32, i32)>>>,
    lines: Vec<Vec<(i32, i32)>>,
    points: Vec<(i32, i32)>,
    label: Option<String>,
}

fn project_path(viewport: &Viewport, coords: &[Vec<f64>]) -> Vec<(i32, i32)> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| viewport.project(c[0], c[1]))
        .collect()
}

fn collect_shapes(value: &Value, viewport: &Viewport, out: &mut Projected) {
    match value {
        Value::Point(p) if p.len() >= 2 => out.points.push(viewport.project(p[0], p[1])),
        Value::Point(_) => {}
        Value::MultiPoint(ps) => out.points.extend(project_path(viewport, ps)),
        Value::LineString(line) => out.lines.push(project_path(viewport, line)),
        Value::MultiLineString(lines) => {
            out.lines
                .extend(lines.iter().map(|l| project_path(viewport, l)));
        }
        Value::Polygon(rings) => out
            .polygons
            .push(rings.iter().map(|r| project_path(viewport, r)).collect()),
        Value::MultiPolygon(polys) => {
            for rings in polys {
                out.polygons
                    .push(rings.iter().map(|r| project_path(viewport, r)).collect());
            }
        }
        Value::GeometryCollection(geoms) => {
            for g in geoms {
                collect_shapes(&g.value, viewport, out);
            }
        }
    }
}

/// Label anchor for any projected shape: first point, else bbox center
fn anchor(shapes: &Projected) -> Option<(i32, i32)> {
    if let Some(&p) = shapes.points.first() {
        return Some(p);
    }
    let all = shapes
        .polygons
        .iter()
        .flat_map(|rings| rings.first())
        .chain(shapes.lines.iter())
        .flatten();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
    let mut any = false;
    for &(x, y) in all {
        any = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    any.then(|| ((min_x + max_x) / 2, (min_y + max_y) / 2))
}

/// Stipple spacing for a fill opacity
fn fill_spacing(opacity: f32) -> i32 {
    if opacity >= 0.9 {
        1
    } else if opacity >= 0.6 {
        2
    } else if opacity >= 0.35 {
        3
    } else {
        4
    }
}

/// Circle radius in braille pixels for a paint radius
fn circle_pixels(radius: f32) -> i32 {
    ((radius / 3.0).round() as i32).clamp(1, 4)
}

fn canvas_for(overlays: &mut Vec<(Color, BrailleCanvas)>, start: usize, color: Color, cols: usize, rows: usize) -> &mut BrailleCanvas {
    let idx = match overlays[start..].iter().position(|(c, _)| *c == color) {
        Some(i) => start + i,
        None => {
            overlays.push((color, BrailleCanvas::new(cols, rows)));
            overlays.len() - 1
        }
    };
    &mut overlays[idx].1
}

/// Map renderer: multi-resolution basemap plus style layers
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub states: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            states: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the given LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let tiers = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low; 3],
        };
        tiers
            .into_iter()
            .find(|t| !t.is_empty())
            .map(|t| t.as_slice())
            .unwrap_or(&[])
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn add_state(&mut self, line: LineString) {
        self.states.push(line);
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        if lod == Lod::High && !self.borders_high.is_empty() {
            &self.borders_high
        } else {
            &self.borders_medium
        }
    }

    /// Render basemap and style layers for a `cols` x `rows` character area.
    /// The viewport must already be sized to `cols * 2` x `rows * 4` pixels.
    pub fn render(&self, cols: usize, rows: usize, viewport: &Viewport, layers: &[DrawLayer]) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let mut out = MapLayers {
            coastlines: BrailleCanvas::new(cols, rows),
            borders: BrailleCanvas::new(cols, rows),
            states: BrailleCanvas::new(cols, rows),
            overlays: Vec::new(),
            glyphs: Vec::new(),
            labels: Vec::new(),
        };

        if self.settings.show_coastlines {
            for line in self.coastlines(lod) {
                draw_linestring(&mut out.coastlines, line, viewport);
            }
        }
        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut out.borders, line, viewport);
            }
        }
        // Admin-1 outlines only when zoomed into a region
        if self.settings.show_states && viewport.zoom >= 4.0 {
            for line in &self.states {
                draw_linestring(&mut out.states, line, viewport);
            }
        }

        let level = viewport.zoom_level();
        for layer in layers {
            if !layer.style.visible_at(level) {
                continue;
            }
            match layer.style.kind {
                LayerKind::Heatmap => render_heatmap(layer, viewport, cols, rows, &mut out.glyphs),
                _ => self.render_layer(layer, viewport, cols, rows, &mut out),
            }
        }

        out
    }

    fn render_layer(&self, layer: &DrawLayer, viewport: &Viewport, cols: usize, rows: usize, out: &mut MapLayers) {
        let style = layer.style;
        let projected: Vec<Projected> = layer
            .features
            .par_iter()
            .filter(|f| style.filter.as_ref().map_or(true, |flt| flt.matches(f)))
            .filter_map(|f| {
                let geometry = f.geometry.as_ref()?;
                let mut shapes = Projected {
                    color: style.paint.color.resolve(f.properties.as_ref()),
                    polygons: Vec::new(),
                    lines: Vec::new(),
                    points: Vec::new(),
                    label: style
                        .layout
                        .text_field
                        .as_ref()
                        .and_then(|key| f.property(key))
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())),
                };
                collect_shapes(&geometry.value, viewport, &mut shapes);
                Some(shapes)
            })
            .collect();

        let start = out.overlays.len();
        for shapes in &projected {
            match style.kind {
                LayerKind::Fill | LayerKind::FillExtrusion => {
                    let spacing = if style.kind == LayerKind::FillExtrusion {
                        1
                    } else {
                        fill_spacing(style.paint.opacity)
                    };
                    let canvas = canvas_for(&mut out.overlays, start, shapes.color, cols, rows);
                    for rings in &shapes.polygons {
                        fill_polygon(canvas, rings, spacing);
                    }
                }
                LayerKind::Line => {
                    let canvas = canvas_for(&mut out.overlays, start, shapes.color, cols, rows);
                    let paths = shapes.polygons.iter().flatten().chain(shapes.lines.iter());
                    for path in paths {
                        draw_path(canvas, path, viewport, style);
                    }
                }
                LayerKind::Circle => {
                    let canvas = canvas_for(&mut out.overlays, start, shapes.color, cols, rows);
                    let radius = circle_pixels(style.paint.radius);
                    for &(x, y) in &shapes.points {
                        if viewport.is_visible(x, y) {
                            draw_circle(canvas, x, y, radius);
                        }
                    }
                }
                LayerKind::Symbol => {
                    if !self.settings.show_labels {
                        continue;
                    }
                    let (Some(text), Some((x, y))) = (&shapes.label, anchor(shapes)) else {
                        continue;
                    };
                    if x < 0 || y < 0 || !viewport.is_visible(x, y) {
                        continue;
                    }
                    let row = (y / 4 + style.layout.text_offset).max(0);
                    let col = (x / 2 - text.chars().count() as i32 / 2).max(0);
                    out.labels.push(Label {
                        col: col as u16,
                        row: row as u16,
                        text: text.clone(),
                        color: shapes.color,
                    });
                }
                LayerKind::Heatmap => {}
            }
        }
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a basemap linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);
        if let Some((prev_x, prev_y)) = prev {
            // Skip wrap-around segments that cross the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}

/// Draw a projected style-layer path with the layer's width and dash pattern
fn draw_path(canvas: &mut BrailleCanvas, path: &[(i32, i32)], viewport: &Viewport, style: &StyleLayer) {
    let pattern = style.paint.pattern;
    let thick = style.paint.width >= 2.5;
    for pair in path.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        if !viewport.line_might_be_visible((x0, y0), (x1, y1)) {
            continue;
        }
        if thick {
            draw_thick_line(canvas, x0, y0, x1, y1, pattern);
        } else {
            draw_patterned_line(canvas, x0, y0, x1, y1, pattern);
        }
    }
}

const HEAT_SHADES: [char; 4] = ['░', '▒', '▓', '█'];

/// Heatmap: point density per character cell, shaded by the layer's ramp
fn render_heatmap(layer: &DrawLayer, viewport: &Viewport, cols: usize, rows: usize, glyphs: &mut Vec<Glyph>) {
    if cols == 0 || rows == 0 {
        return;
    }
    let mut density = vec![0f32; cols * rows];
    let style = layer.style;

    for feature in layer.features {
        if !style.filter.as_ref().map_or(true, |f| f.matches(feature)) {
            continue;
        }
        let Some(Value::Point(p)) = feature.geometry.as_ref().map(|g| &g.value) else {
            continue;
        };
        if p.len() < 2 {
            continue;
        }
        let (px, py) = viewport.project(p[0], p[1]);
        let (cx, cy) = (px.div_euclid(2), py.div_euclid(4));
        // 3x3 kernel, center weighted
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || y < 0 || x >= cols as i32 || y >= rows as i32 {
                    continue;
                }
                let w = if dx == 0 && dy == 0 { 1.0 } else { 0.35 };
                density[y as usize * cols + x as usize] += w;
            }
        }
    }

    let max = density.iter().cloned().fold(0f32, f32::max);
    if max <= 0.0 {
        return;
    }
    for (idx, &d) in density.iter().enumerate() {
        let t = d / max;
        if t < 0.05 {
            continue;
        }
        let shade = ((t * HEAT_SHADES.len() as f32) as usize).min(HEAT_SHADES.len() - 1);
        glyphs.push(Glyph {
            col: (idx % cols) as u16,
            row: (idx / cols) as u16,
            ch: HEAT_SHADES[shade],
            color: style.paint.ramp_color(t),
        });
    }
}

/// Pixel tolerance for pointer hits on lines and points
const HIT_TOLERANCE: f64 = 3.0;

/// Whether `feature`, drawn by `style`, covers the screen point. Returns the
/// geographic anchor of the hit.
pub fn hit_test(feature: &Feature, style: &StyleLayer, viewport: &Viewport, point: (i32, i32)) -> Option<(f64, f64)> {
    if !style.filter.as_ref().map_or(true, |f| f.matches(feature)) {
        return None;
    }
    let geometry = feature.geometry.as_ref()?;
    let (lon, lat) = viewport.unproject(point.0, point.1);
    hit_value(&geometry.value, style, viewport, point, (lon, lat))
}

fn hit_value(value: &Value, style: &StyleLayer, viewport: &Viewport, point: (i32, i32), geo: (f64, f64)) -> Option<(f64, f64)> {
    let near = |c: &Vec<f64>| {
        let (px, py) = viewport.project(c[0], c[1]);
        let reach = circle_pixels(style.paint.radius) as f64 + HIT_TOLERANCE;
        segment_distance(point, (px, py), (px, py)) <= reach
    };
    let on_path = |coords: &Vec<Vec<f64>>| {
        let path = project_path(viewport, coords);
        path.windows(2)
            .any(|w| segment_distance(point, w[0], w[1]) <= HIT_TOLERANCE)
    };
    let in_polygon = |rings: &Vec<Vec<Vec<f64>>>| match rings.split_first() {
        Some((outer, holes)) => {
            point_in_ring(geo.0, geo.1, outer) && !holes.iter().any(|h| point_in_ring(geo.0, geo.1, h))
        }
        None => false,
    };

    match (style.kind, value) {
        (_, Value::GeometryCollection(geoms)) => {
            return geoms
                .iter()
                .find_map(|g| hit_value(&g.value, style, viewport, point, geo));
        }
        (_, Value::Point(p)) if p.len() >= 2 => near(p).then(|| (p[0], p[1])),
        (_, Value::MultiPoint(ps)) => ps
            .iter()
            .filter(|p| p.len() >= 2)
            .find(|p| near(*p))
            .map(|p| (p[0], p[1])),
        (LayerKind::Line, Value::Polygon(rings)) => rings.iter().any(|r| on_path(r)).then_some(geo),
        (LayerKind::Line, Value::MultiPolygon(polys)) => polys
            .iter()
            .flatten()
            .any(|r| on_path(r))
            .then_some(geo),
        (_, Value::Polygon(rings)) => in_polygon(rings).then_some(geo),
        (_, Value::MultiPolygon(polys)) => polys.iter().any(|p| in_polygon(p)).then_some(geo),
        (_, Value::LineString(line)) => on_path(line).then_some(geo),
        (_, Value::MultiLineString(lines)) => lines.iter().any(|l| on_path(l)).then_some(geo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::projection::zoom_factor;
    use crate::map::style::{Paint, StyleLayer};
    use geojson::Geometry;
    use serde_json::json;

    fn feature(value: Value, props: serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: props.as_object().cloned(),
            foreign_members: None,
        }
    }

    fn sabah_view() -> Viewport {
        Viewport::new(117.0, 5.5, zoom_factor(7.0), 160, 80)
    }

    #[test]
    fn test_lod_selection() {
        assert_eq!(Lod::from_zoom(1.0), Lod::Low);
        assert_eq!(Lod::from_zoom(4.0), Lod::Medium);
        assert_eq!(Lod::from_zoom(20.0), Lod::High);
    }

    #[test]
    fn test_circle_layer_draws_in_color() {
        let renderer = MapRenderer::new();
        let features = vec![feature(Value::Point(vec![117.0, 5.5]), json!({}))];
        let style = StyleLayer::new("dots", LayerKind::Circle).paint(Paint::color(Color::Green));
        let layers = renderer.render(80, 20, &sabah_view(), &[DrawLayer { style: &style, features: &features }]);
        assert_eq!(layers.overlays.len(), 1);
        assert_eq!(layers.overlays[0].0, Color::Green);
        assert!(!layers.overlays[0].1.is_blank());
    }

    #[test]
    fn test_zoom_range_hides_layer() {
        let renderer = MapRenderer::new();
        let features = vec![feature(Value::Point(vec![117.0, 5.5]), json!({}))];
        let style = StyleLayer::new("dots", LayerKind::Circle).minzoom(10.0);
        let layers = renderer.render(80, 20, &sabah_view(), &[DrawLayer { style: &style, features: &features }]);
        assert!(layers.overlays.is_empty());
    }

    #[test]
    fn test_symbol_layer_emits_label() {
        let renderer = MapRenderer::new();
        let features = vec![feature(Value::Point(vec![117.0, 5.5]), json!({ "name": "Sandakan" }))];
        let style = StyleLayer::new("labels", LayerKind::Symbol).text_field("name");
        let layers = renderer.render(80, 20, &sabah_view(), &[DrawLayer { style: &style, features: &features }]);
        assert_eq!(layers.labels.len(), 1);
        assert_eq!(layers.labels[0].text, "Sandakan");
        assert_eq!(layers.labels[0].row, 11);
    }

    #[test]
    fn test_heatmap_peaks_at_cluster() {
        let renderer = MapRenderer::new();
        let features: Vec<Feature> = (0..5)
            .map(|_| feature(Value::Point(vec![117.0, 5.5]), json!({})))
            .chain(std::iter::once(feature(Value::Point(vec![116.0, 6.0]), json!({}))))
            .collect();
        let style = StyleLayer::new("heat", LayerKind::Heatmap);
        let layers = renderer.render(80, 20, &sabah_view(), &[DrawLayer { style: &style, features: &features }]);
        let peak = layers
            .glyphs
            .iter()
            .find(|g| g.col == 40 && g.row == 10)
            .map(|g| g.ch);
        assert_eq!(peak, Some('█'));
    }

    #[test]
    fn test_hit_test_polygon_and_point() {
        let vp = sabah_view();
        let square = feature(
            Value::Polygon(vec![vec![
                vec![116.5, 5.0],
                vec![117.5, 5.0],
                vec![117.5, 6.0],
                vec![116.5, 6.0],
                vec![116.5, 5.0],
            ]]),
            json!({ "name": "Sabah" }),
        );
        let fill = StyleLayer::new("fill", LayerKind::Fill);
        assert!(hit_test(&square, &fill, &vp, (80, 40)).is_some());
        assert!(hit_test(&square, &fill, &vp, (2, 2)).is_none());

        let dot = feature(Value::Point(vec![117.0, 5.5]), json!({}));
        let circle = StyleLayer::new("dot", LayerKind::Circle);
        assert_eq!(hit_test(&dot, &circle, &vp, (81, 41)), Some((117.0, 5.5)));
    }
}
