//! Great-circle distance between places.

use serde::{Deserialize, Serialize};

use crate::core::GeoPoint;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Outcome of a distance computation.
///
/// A geometry gap never faults the pipeline: it is recorded as
/// `Unavailable` and counts as 0 meters wherever a number is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "meters", rename_all = "snake_case")]
pub enum Distance {
    Computed(f64),
    Unavailable,
}

impl Distance {
    pub fn meters(&self) -> f64 {
        match self {
            Distance::Computed(m) => *m,
            Distance::Unavailable => 0.0,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Distance::Computed(_))
    }
}

/// Haversine great-circle distance in meters.
pub fn haversine_m(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // clamp: rounding can push `a` a hair past 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().atan2((1.0 - a).clamp(0.0, 1.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Distance between two optional points, degrading to `Unavailable` when
/// either side is missing or not a finite coordinate pair.
pub fn distance_between(from: Option<GeoPoint>, to: Option<GeoPoint>) -> Distance {
    match (from, to) {
        (Some(a), Some(b)) if a.is_valid() && b.is_valid() => {
            let meters = haversine_m(a, b);
            if meters.is_finite() {
                Distance::Computed(meters)
            } else {
                Distance::Unavailable
            }
        }
        _ => Distance::Unavailable,
    }
}
