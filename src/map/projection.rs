use std::f64::consts::PI;

use egui::{pos2, vec2, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Fixed drawing surface the world is laid out on. Widgets scale it to
/// whatever space they are given.
pub const CANVAS_SIZE: Vec2 = vec2(800.0, 450.0);

/// Pixels per radian. With the canvas above this fits the inhabited
/// world, cropping polar regions.
pub const MERCATOR_SCALE: f64 = 120.0;

/// Latitude where Web Mercator squares off the world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Default for Coordinate {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Spherical Mercator with a fixed scale, centred horizontally and pushed
/// down so the southern hemisphere's mining regions get room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    scale: f64,
    translate: (f64, f64),
    canvas: Vec2,
}

impl Default for MercatorProjection {
    fn default() -> Self {
        Self::for_canvas(CANVAS_SIZE)
    }
}

impl MercatorProjection {
    pub fn for_canvas(canvas: Vec2) -> Self {
        Self {
            scale: MERCATOR_SCALE,
            translate: (canvas.x as f64 / 2.0, canvas.y as f64 / 1.5),
            canvas,
        }
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas
    }

    /// `None` when the input or the result is not finite.
    pub fn project_xy(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lambda = lon.to_radians();
        let phi = lat.to_radians();
        let x = self.translate.0 + self.scale * lambda;
        let y = self.translate.1 - self.scale * (PI / 4.0 + phi / 2.0).tan().ln();
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Exact inverse of [`Self::project_xy`]. Longitude is wrapped into
    /// [-180, 180] so pins dragged off the edge stay valid.
    pub fn unproject_xy(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lambda = (x - self.translate.0) / self.scale;
        let phi = 2.0 * ((self.translate.1 - y) / self.scale).exp().atan() - PI / 2.0;
        let lon = wrap_longitude(lambda.to_degrees());
        let lat = phi.to_degrees().clamp(-90.0, 90.0);
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }

    /// Canvas position of a pin. Anything unprojectable lands on the
    /// origin instead of failing.
    pub fn project(&self, coordinate: Coordinate) -> Pos2 {
        self.project_xy(coordinate.longitude, coordinate.latitude)
            .map(|(x, y)| pos2(x as f32, y as f32))
            .unwrap_or(Pos2::ZERO)
    }

    /// Like [`Self::project`] but clamps latitude first, for polygon
    /// vertices that touch the poles.
    pub fn project_clamped(&self, lon: f64, lat: f64) -> Pos2 {
        let lat = if lat.is_nan() {
            lat
        } else {
            lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
        };
        self.project(Coordinate::new(lat, lon))
    }

    pub fn unproject(&self, pos: Pos2) -> Option<Coordinate> {
        self.unproject_xy(pos.x as f64, pos.y as f64)
            .map(|(lon, lat)| Coordinate::new(lat, lon))
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    // Rounding noise at exactly +/-180 must not flip a pin to the other edge.
    if lon.abs() <= 180.0 + 1e-9 {
        lon.clamp(-180.0, 180.0)
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}
