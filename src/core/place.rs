use serde::{Deserialize, Serialize};

use crate::core::lenient;

/// A coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point from loosely-parsed coordinates. Any missing or
    /// non-finite component yields `None`.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// Both components are finite numbers
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A business/place as seen by the ranking engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    /// Opaque provider identifier (unique per place)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Formatted address, when the provider returns one
    #[serde(default)]
    pub address: String,

    /// Average rating (0.0-5.0)
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub rating: f64,

    /// Number of user reviews
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub review_count: u64,

    /// Coordinates; absent when the lookup omitted geometry
    #[serde(default)]
    pub location: Option<GeoPoint>,

    /// Provider category tags (e.g. "restaurant", "point_of_interest")
    #[serde(default)]
    pub types: Vec<String>,
}

impl Place {
    /// Create a new Place with required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            rating: 0.0,
            review_count: 0,
            location: None,
            types: Vec::new(),
        }
    }

    pub fn with_rating(mut self, rating: f64, review_count: u64) -> Self {
        self.rating = rating;
        self.review_count = review_count;
        self
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(GeoPoint::new(lat, lng));
        self
    }

    /// Location, if present and numerically usable
    pub fn usable_location(&self) -> Option<GeoPoint> {
        self.location.filter(GeoPoint::is_valid)
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        if self.address.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.address)
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_creation() {
        let place = Place::new("abc", "Pizzeria Roma")
            .with_rating(4.5, 200)
            .with_location(45.07, 7.68);
        assert_eq!(place.id, "abc");
        assert_eq!(place.rating, 4.5);
        assert_eq!(place.review_count, 200);
        assert_eq!(place.location, Some(GeoPoint::new(45.07, 7.68)));
    }

    #[test]
    fn test_from_parts_rejects_partial_or_nan() {
        assert!(GeoPoint::from_parts(Some(1.0), None).is_none());
        assert!(GeoPoint::from_parts(None, Some(1.0)).is_none());
        assert!(GeoPoint::from_parts(Some(f64::NAN), Some(1.0)).is_none());
        assert_eq!(GeoPoint::from_parts(Some(1.0), Some(2.0)), Some(GeoPoint::new(1.0, 2.0)));
    }

    #[test]
    fn test_usable_location_filters_nan() {
        let place = Place::new("x", "X").with_location(f64::NAN, 7.0);
        assert!(place.location.is_some());
        assert!(place.usable_location().is_none());
    }

    #[test]
    fn test_lenient_json_ingestion() {
        let place = Place::from_json(r#"{"id": "p1", "rating": "n/a", "review_count": null}"#).unwrap();
        assert_eq!(place.rating, 0.0);
        assert_eq!(place.review_count, 0);
        assert!(place.location.is_none());
    }

    #[test]
    fn test_display_name() {
        let mut place = Place::new("p1", "Bar Centrale");
        assert_eq!(place.display_name(), "Bar Centrale");
        place.address = "Via Roma 1".to_string();
        assert_eq!(place.display_name(), "Bar Centrale (Via Roma 1)");
    }
}
