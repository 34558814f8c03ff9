use std::f64::consts::PI;

/// Equatorial circumference in meters (Web Mercator sphere)
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Zoom factor bounds (factor 1.0 fits the whole world across the canvas)
const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 4096.0;

/// Normalized Web Mercator x in 0..1
#[inline(always)]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Normalized Web Mercator y in 0..1 (0 at the north edge)
#[inline(always)]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.051_128, 85.051_128) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline(always)]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Convert a web-map zoom level into the canvas zoom factor
pub fn zoom_factor(level: f64) -> f64 {
    2f64.powf(level) / 4.0
}

/// Inverse of [`zoom_factor`]
pub fn zoom_level(factor: f64) -> f64 {
    (factor * 4.0).log2()
}

/// Viewport representing the visible map area, zoom and rotation
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom factor (1.0 = whole world across the canvas width)
    pub zoom: f64,
    /// Rotation in degrees, clockwise from north
    pub bearing: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            bearing: 0.0,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Current zoom expressed as a web-map zoom level
    pub fn zoom_level(&self) -> f64 {
        zoom_level(self.zoom)
    }

    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    #[inline(always)]
    fn rotation(&self) -> (f64, f64) {
        let rad = self.bearing.to_radians();
        (rad.sin(), rad.cos())
    }

    /// Pan the viewport by pixel delta (screen space, honors rotation)
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (lon, lat) = self.unproject(
            self.width as i32 / 2 + dx,
            self.height as i32 / 2 + dy,
        );
        self.center_lon = lon;
        self.center_lat = lat;

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        // Clamp latitude
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor towards a specific pixel location
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        // Geographic point under the pointer stays put
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Rotate by `degrees`, keeping bearing in (-180, 180]
    pub fn rotate(&mut self, degrees: f64) {
        let mut bearing = (self.bearing + degrees).rem_euclid(360.0);
        if bearing > 180.0 {
            bearing -= 360.0;
        }
        self.bearing = bearing;
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let (sin, cos) = self.rotation();

        // Undo the screen rotation
        let sx = px as f64 - self.width as f64 / 2.0;
        let sy = py as f64 - self.height as f64 / 2.0;
        let rx = sx * cos - sy * sin;
        let ry = sx * sin + sy * cos;

        let x = rx / scale + mercator_x(self.center_lon);
        let y = ry / scale + mercator_y(self.center_lat);

        (x * 360.0 - 180.0, inverse_mercator_y(y))
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let dx = (mercator_x(lon) - mercator_x(self.center_lon)) * scale;
        let dy = (mercator_y(lat) - mercator_y(self.center_lat)) * scale;

        // Bearing rotates the map counter-clockwise on screen
        let (sin, cos) = self.rotation();
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;

        let px = (rx + self.width as f64 / 2.0).round() as i32;
        let py = (ry + self.height as f64 / 2.0).round() as i32;

        (px, py)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10
            && px < self.width as i32 + 10
            && py >= -10
            && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }

    /// Geographic bounds of the visible area: (min_lon, min_lat, max_lon, max_lat)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width as i32, self.height as i32);
        [(0, 0), (w, 0), (0, h), (w, h)]
            .iter()
            .map(|&(x, y)| self.unproject(x, y))
            .fold(
                (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
                |(a, b, c, d), (lon, lat)| (a.min(lon), b.min(lat), c.max(lon), d.max(lat)),
            )
    }

    /// Center and zoom so that the bounds fill the canvas minus `padding` pixels.
    /// Resets bearing to north-up.
    pub fn fit_bounds(&mut self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64, padding: usize) {
        let (x0, x1) = (mercator_x(min_lon), mercator_x(max_lon));
        let (y0, y1) = (mercator_y(max_lat), mercator_y(min_lat));

        let span_x = (x1 - x0).abs().max(1e-9);
        let span_y = (y1 - y0).abs().max(1e-9);
        let usable_w = self.width.saturating_sub(padding * 2).max(1) as f64;
        let usable_h = self.height.saturating_sub(padding * 2).max(1) as f64;
        let width = self.width.max(1) as f64;

        let zoom = (usable_w / (span_x * width)).min(usable_h / (span_y * width));
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_lon = (x0 + x1) / 2.0 * 360.0 - 180.0;
        self.center_lat = inverse_mercator_y((y0 + y1) / 2.0);
        self.bearing = 0.0;
    }

    /// Ground resolution at the viewport center
    pub fn meters_per_pixel(&self) -> f64 {
        EARTH_CIRCUMFERENCE_M * self.center_lat.to_radians().cos() / self.scale().max(1.0)
    }

    /// Scale bar: a round distance that fits in `max_px` pixels.
    /// Returns the bar length in pixels and its label.
    pub fn scale_bar(&self, max_px: usize) -> (usize, String) {
        let mpp = self.meters_per_pixel();
        let max_m = mpp * max_px as f64;
        if max_m <= 0.0 || !max_m.is_finite() {
            return (0, String::new());
        }

        let magnitude = 10f64.powf(max_m.log10().floor());
        let nice = [5.0, 2.0, 1.0]
            .iter()
            .map(|m| m * magnitude)
            .find(|&d| d <= max_m)
            .unwrap_or(magnitude);

        let label = if nice >= 1000.0 {
            format!("{} km", nice / 1000.0)
        } else {
            format!("{} m", nice)
        };
        ((nice / mpp).round() as usize, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_unproject_inverts_project_with_bearing() {
        let mut vp = Viewport::new(116.07, 5.98, zoom_factor(8.0), 320, 160);
        vp.bearing = -20.0;
        let (px, py) = vp.project(116.5, 6.2);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 116.5).abs() < 0.05);
        assert!((lat - 6.2).abs() < 0.05);
    }

    #[test]
    fn test_bearing_rotates_east_point() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 200, 200);
        let (east_x, _) = vp.project(30.0, 0.0);
        assert!(east_x > 100);
        vp.bearing = 90.0;
        // Facing east, a point to the east is straight up the screen
        let (x, y) = vp.project(30.0, 0.0);
        assert_eq!(x, 100);
        assert!(y < 100);
    }

    #[test]
    fn test_zoom_level_round_trip() {
        assert_eq!(zoom_factor(2.0), 1.0);
        assert!((zoom_level(zoom_factor(5.5)) - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_fit_bounds_contains_corners() {
        let mut vp = Viewport::world(320, 160);
        vp.fit_bounds(115.0, 4.0, 119.5, 7.5, 8);
        for (lon, lat) in [(115.0, 4.0), (119.5, 7.5)] {
            let (px, py) = vp.project(lon, lat);
            assert!(px >= 0 && px <= 320, "px {px}");
            assert!(py >= 0 && py <= 160, "py {py}");
        }
    }

    #[test]
    fn test_rotate_wraps() {
        let mut vp = Viewport::world(100, 100);
        vp.rotate(170.0);
        vp.rotate(20.0);
        assert!((vp.bearing + 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_bar_is_round() {
        let vp = Viewport::new(116.0, 5.9, zoom_factor(8.0), 320, 160);
        let (px, label) = vp.scale_bar(40);
        assert!(px > 0 && px <= 40);
        assert!(label.ends_with("km") || label.ends_with(" m"));
    }
}
