//! Camera state and animated flights between camera targets.

use glam::DVec2;
use std::time::Duration;

use crate::map::projection::{zoom_factor, Viewport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
    EaseOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationOptions {
    pub duration: Option<Duration>,
    pub easing: Easing,
    /// Non-essential flights are skipped when reduced motion is on
    pub essential: Option<bool>,
}

/// Desired camera; `None` fields keep the current value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraTarget {
    pub center: Option<(f64, f64)>,
    pub zoom: Option<f64>,
    pub pitch: Option<f64>,
    pub bearing: Option<f64>,
    pub animation: Option<AnimationOptions>,
}

impl CameraTarget {
    pub fn at(lon: f64, lat: f64, zoom: f64) -> Self {
        Self {
            center: Some((lon, lat)),
            zoom: Some(zoom),
            pitch: Some(0.0),
            bearing: Some(0.0),
            animation: None,
        }
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        let mut animation = self.animation.unwrap_or_default();
        animation.duration = Some(duration);
        self.animation = Some(animation);
        self
    }
}

/// Resolved camera: center (lon, lat), zoom level, pitch, bearing in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub center: DVec2,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Camera {
    pub fn new(lon: f64, lat: f64, zoom: f64) -> Self {
        Self {
            center: DVec2::new(lon, lat),
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    /// Camera with the target's fields applied over this one
    pub fn with_target(&self, target: &CameraTarget) -> Self {
        Self {
            center: target
                .center
                .map(|(lon, lat)| DVec2::new(lon, lat))
                .unwrap_or(self.center),
            zoom: target.zoom.unwrap_or(self.zoom),
            pitch: target.pitch.unwrap_or(self.pitch).clamp(0.0, 85.0),
            bearing: target.bearing.unwrap_or(self.bearing),
        }
    }

    pub fn from_viewport(viewport: &Viewport, pitch: f64) -> Self {
        Self {
            center: DVec2::new(viewport.center_lon, viewport.center_lat),
            zoom: viewport.zoom_level(),
            pitch,
            bearing: viewport.bearing,
        }
    }

    /// Write position, zoom and bearing into a viewport (pitch has no planar equivalent)
    pub fn apply_to(&self, viewport: &mut Viewport) {
        viewport.center_lon = self.center.x;
        viewport.center_lat = self.center.y;
        viewport.zoom = zoom_factor(self.zoom);
        viewport.bearing = self.bearing;
    }

    fn lerp(&self, to: &Camera, t: f64) -> Camera {
        // Shortest way round for bearing
        let mut delta = (to.bearing - self.bearing).rem_euclid(360.0);
        if delta > 180.0 {
            delta -= 360.0;
        }
        Camera {
            center: self.center.lerp(to.center, t),
            zoom: self.zoom + (to.zoom - self.zoom) * t,
            pitch: self.pitch + (to.pitch - self.pitch) * t,
            bearing: self.bearing + delta * t,
        }
    }
}

/// An in-progress camera flight, stepped by the frame loop
#[derive(Clone, Debug)]
pub struct Flight {
    from: Camera,
    to: Camera,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Flight {
    pub fn new(from: Camera, to: Camera, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn destination(&self) -> Camera {
        self.to
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advance by `dt` and return the interpolated camera
    pub fn step(&mut self, dt: Duration) -> Camera {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.is_done() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(&self.to, self.easing.apply(t))
    }
}
