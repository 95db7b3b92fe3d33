pub mod google;

use async_trait::async_trait;
use crate::core::{GeoPoint, Place};
use crate::error::Result;

pub use google::GooglePlacesProvider;

/// Category-scoped search around a point
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub location: GeoPoint,
    pub radius_m: u32,
    pub category: String,
    pub keyword: Option<String>,
    pub language: String,
}

/// Free-text search biased towards a point
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    pub query: String,
    pub location: GeoPoint,
    pub radius_m: u32,
    pub language: String,
}

/// Trait for places data providers
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Authoritative details for one place
    async fn details(&self, place_id: &str) -> Result<Place>;

    /// Nearby search scoped by category/keyword
    async fn nearby_search(&self, request: &NearbyRequest) -> Result<Vec<Place>>;

    /// Broader text search
    async fn text_search(&self, request: &TextSearchRequest) -> Result<Vec<Place>>;

    /// Get provider name
    fn name(&self) -> &str;
}
