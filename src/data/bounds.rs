//! Geographic points and rectangles
//!
//! A `Bounds` is described the way map widgets describe a visible region: by its
//! northeast and southwest corners. Containment is inclusive on every edge, and
//! a box whose southwest longitude is east of its northeast longitude is treated
//! as crossing the antimeridian.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the point lies on the globe (lat within ±90, lng within ±180)
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in kilometres (haversine)
    pub fn distance_km(&self, other: LatLng) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A rectangular geographic bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

impl Bounds {
    pub const fn new(northeast: LatLng, southwest: LatLng) -> Self {
        Self {
            northeast,
            southwest,
        }
    }

    /// Builds a box from its southwest and northeast coordinates
    pub const fn from_corners(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Self {
        Self::new(LatLng::new(ne_lat, ne_lng), LatLng::new(sw_lat, sw_lng))
    }

    /// Builds a box of the given spans centered on `center`
    pub fn around(center: LatLng, lat_span: f64, lng_span: f64) -> Self {
        let half_lat = lat_span / 2.0;
        let half_lng = lng_span / 2.0;
        Self::new(
            LatLng::new(clamp_lat(center.lat + half_lat), wrap_lng(center.lng + half_lng)),
            LatLng::new(clamp_lat(center.lat - half_lat), wrap_lng(center.lng - half_lng)),
        )
    }

    pub fn northwest(&self) -> LatLng {
        LatLng::new(self.northeast.lat, self.southwest.lng)
    }

    pub fn southeast(&self) -> LatLng {
        LatLng::new(self.southwest.lat, self.northeast.lng)
    }

    /// The four corners used by the cache coverage check, in the order
    /// northeast, southwest, northwest, southeast
    pub fn corners(&self) -> [LatLng; 4] {
        [
            self.northeast,
            self.southwest,
            self.northwest(),
            self.southeast(),
        ]
    }

    /// Whether the box wraps across the 180th meridian
    pub fn crosses_antimeridian(&self) -> bool {
        self.southwest.lng > self.northeast.lng
    }

    pub fn lat_span(&self) -> f64 {
        self.northeast.lat - self.southwest.lat
    }

    pub fn lng_span(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.northeast.lng + 360.0 - self.southwest.lng
        } else {
            self.northeast.lng - self.southwest.lng
        }
    }

    pub fn center(&self) -> LatLng {
        let lat = (self.northeast.lat + self.southwest.lat) / 2.0;
        let lng = wrap_lng(self.southwest.lng + self.lng_span() / 2.0);
        LatLng::new(lat, lng)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: LatLng) -> bool {
        if point.lat < self.southwest.lat || point.lat > self.northeast.lat {
            return false;
        }
        if self.crosses_antimeridian() {
            point.lng >= self.southwest.lng || point.lng <= self.northeast.lng
        } else {
            point.lng >= self.southwest.lng && point.lng <= self.northeast.lng
        }
    }

    /// Returns a copy grown by `margin` degrees on every side
    ///
    /// Latitude is clamped at the poles. Longitude wraps, so a box grown over
    /// the 180th meridian becomes a crossing box; one grown past a full turn
    /// covers every longitude.
    pub fn expanded(&self, margin: f64) -> Self {
        let (sw_lng, ne_lng) = if self.lng_span() + 2.0 * margin >= 360.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_lng(self.southwest.lng - margin),
                wrap_lng(self.northeast.lng + margin),
            )
        };
        Self::new(
            LatLng::new(clamp_lat(self.northeast.lat + margin), ne_lng),
            LatLng::new(clamp_lat(self.southwest.lat - margin), sw_lng),
        )
    }

    /// Returns a copy moved by the given offsets
    ///
    /// The spans are kept; near a pole the box stops at the pole instead of
    /// being cut short.
    pub fn translated(&self, d_lat: f64, d_lng: f64) -> Self {
        let center = self.center();
        Self::around_on_globe(
            LatLng::new(center.lat + d_lat, center.lng + d_lng),
            self.lat_span(),
            self.lng_span(),
        )
    }

    /// Returns a copy with both spans multiplied by `factor`, keeping the center
    /// unless that would push the box past a pole
    pub fn scaled(&self, factor: f64) -> Self {
        Self::around_on_globe(
            self.center(),
            self.lat_span() * factor,
            (self.lng_span() * factor).min(360.0),
        )
    }

    /// Like [`Bounds::around`], but moves the center away from the poles so
    /// that the full latitude span fits
    fn around_on_globe(center: LatLng, lat_span: f64, lng_span: f64) -> Self {
        let half_lat = (lat_span / 2.0).clamp(0.0, 90.0);
        let lat = center.lat.clamp(-90.0 + half_lat, 90.0 - half_lat);
        Self::around(LatLng::new(lat, center.lng), lat_span, lng_span)
    }
}

fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}
