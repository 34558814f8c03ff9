use std::collections::HashMap;

use geojson::{Feature, Value};

type Cell = (i32, i32);

#[inline(always)]
fn to_cell(lon: f64, lat: f64, cell_size: f64) -> Cell {
    (
        (lon / cell_size).floor() as i32,
        (lat / cell_size).floor() as i32,
    )
}

/// Spatial hash grid for point items. Divides the world into square cells
/// for fast radius lookups.
pub struct SpatialGrid<T> {
    cells: HashMap<Cell, Vec<usize>>,
    items: Vec<T>,
    /// Cell size in degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
        }
    }

    /// Insert an item at a geographic position
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);
        self.cells
            .entry(to_cell(lon, lat, self.cell_size))
            .or_default()
            .push(idx);
    }

    /// Items in cells overlapping a radius around a point (indices, may include
    /// items slightly outside the radius)
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let (cx, cy) = to_cell(lon, lat, self.cell_size);
        let r = (radius_degrees / self.cell_size).ceil() as i32;

        let mut results = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Conservative bbox index for shapes: each shape is inserted into every cell
/// its bounding box overlaps, so queries never miss but may over-report.
pub struct FeatureGrid {
    cells: HashMap<Cell, Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    pub fn insert_bbox(&mut self, idx: usize, bbox: (f64, f64, f64, f64)) {
        let (min_lon, min_lat, max_lon, max_lat) = bbox;
        let min_cell = to_cell(min_lon, min_lat, self.cell_size);
        let max_cell = to_cell(max_lon, max_lat, self.cell_size);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                self.cells.entry((x, y)).or_default().push(idx);
            }
        }
    }

    /// Append candidate indices for a point; may contain duplicates
    pub fn query_point_into(&self, lon: f64, lat: f64, results: &mut Vec<usize>) {
        if let Some(indices) = self.cells.get(&to_cell(lon, lat, self.cell_size)) {
            results.extend_from_slice(indices);
        }
    }
}

/// Bounding box of any GeoJSON geometry value
pub fn geometry_bbox(value: &Value) -> Option<(f64, f64, f64, f64)> {
    let mut bbox: Option<(f64, f64, f64, f64)> = None;
    let mut extend = |p: &Vec<f64>| {
        if p.len() < 2 {
            return;
        }
        let (lon, lat) = (p[0], p[1]);
        bbox = Some(match bbox {
            None => (lon, lat, lon, lat),
            Some((a, b, c, d)) => (a.min(lon), b.min(lat), c.max(lon), d.max(lat)),
        });
    };
    visit_positions(value, &mut extend);
    bbox
}

fn visit_positions(value: &Value, f: &mut impl FnMut(&Vec<f64>)) {
    match value {
        Value::Point(p) => f(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().for_each(|p| f(p)),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| f(p))
        }
        Value::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(|p| f(p)),
        Value::GeometryCollection(geoms) => {
            for g in geoms {
                visit_positions(&g.value, f);
            }
        }
    }
}

/// Hit-test index over one source's features: points in a [`SpatialGrid`],
/// everything else in a [`FeatureGrid`].
pub struct SourceIndex {
    points: SpatialGrid<usize>,
    shapes: FeatureGrid,
}

impl SourceIndex {
    pub fn build(features: &[Feature]) -> Self {
        let mut points = SpatialGrid::new(0.25);
        let mut shapes = FeatureGrid::new(0.5);
        for (idx, feature) in features.iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            match &geometry.value {
                Value::Point(p) if p.len() >= 2 => points.insert(p[0], p[1], idx),
                value => {
                    if let Some(bbox) = geometry_bbox(value) {
                        shapes.insert_bbox(idx, bbox);
                    }
                }
            }
        }
        Self { points, shapes }
    }

    /// Candidate feature indices near (lon, lat), deduplicated
    pub fn candidates(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let mut results: Vec<usize> = self
            .points
            .query_radius(lon, lat, radius_degrees)
            .into_iter()
            .filter_map(|i| self.points.get(i).copied())
            .collect();
        self.shapes.query_point_into(lon, lat, &mut results);
        results.sort_unstable();
        results.dedup();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Geometry;

    fn feature(value: Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    #[test]
    fn test_radius_query_finds_nearby_points() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(116.0, 5.9, "kk");
        grid.insert(118.1, 5.8, "sandakan");
        let hits = grid.query_radius(116.1, 5.95, 0.5);
        assert!(hits.iter().any(|&i| grid.get(i) == Some(&"kk")));
        assert!(!hits.iter().any(|&i| grid.get(i) == Some(&"sandakan")));
    }

    #[test]
    fn test_bbox_of_polygon() {
        let poly = Value::Polygon(vec![vec![
            vec![115.0, 4.0],
            vec![119.5, 4.0],
            vec![119.5, 7.5],
            vec![115.0, 4.0],
        ]]);
        assert_eq!(geometry_bbox(&poly), Some((115.0, 4.0, 119.5, 7.5)));
    }

    #[test]
    fn test_source_index_mixes_points_and_shapes() {
        let features = vec![
            feature(Value::Point(vec![119.0, 7.0])),
            feature(Value::LineString(vec![vec![116.0, 5.0], vec![118.0, 6.0]])),
        ];
        let index = SourceIndex::build(&features);
        assert_eq!(index.candidates(119.0, 7.0, 0.1), vec![0]);
        assert_eq!(index.candidates(117.2, 5.6, 0.1), vec![1]);
    }
}
