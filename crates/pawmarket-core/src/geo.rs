//! Great-circle distance between two coordinates.
//!
//! Used to turn a dispatch origin and a delivery address into the distance the
//! delivery-fee service prices against.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine distance from `self` to `other`, in kilometers.
    #[must_use]
    pub fn distance_km_to(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Haversine distance in kilometers. Always `>= 0`, full precision.
#[must_use]
pub fn distance_km(origin_lat: f64, origin_lon: f64, dest_lat: f64, dest_lon: f64) -> f64 {
    let phi1 = origin_lat.to_radians();
    let phi2 = dest_lat.to_radians();
    let d_phi = (dest_lat - origin_lat).to_radians();
    let d_lambda = (dest_lon - origin_lon).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Rounds a distance to one decimal place for display only.
#[must_use]
pub fn round_for_display(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
