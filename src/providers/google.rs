use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::core::{lenient, GeoPoint, Place};
use crate::providers::{NearbyRequest, PlacesProvider, TextSearchRequest};
use crate::error::{Result, PlaceRankError};

const PROVIDER: &str = "google";
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const DETAILS_FIELDS: &str = "name,formatted_address,geometry,rating,user_ratings_total,types,place_id";

/// Google Places web service provider
pub struct GooglePlacesProvider {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<RawPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<RawPlace>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawPlace {
    #[serde(default, deserialize_with = "lenient::or_default")]
    place_id: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    name: String,
    #[serde(default, deserialize_with = "lenient::or_none")]
    formatted_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    vicinity: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    geometry: Option<RawGeometry>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    rating: f64,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    user_ratings_total: u64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(default, deserialize_with = "lenient::or_none")]
    location: Option<RawLatLng>,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    lng: Option<f64>,
}

impl RawPlace {
    fn into_place(self) -> Place {
        let location = self
            .geometry
            .and_then(|g| g.location)
            .and_then(|loc| GeoPoint::from_parts(loc.lat, loc.lng));

        Place {
            id: self.place_id,
            name: self.name,
            address: self.formatted_address.or(self.vicinity).unwrap_or_default(),
            rating: self.rating,
            review_count: self.user_ratings_total,
            location,
            types: self.types,
        }
    }
}

impl GooglePlacesProvider {
    /// Create new provider against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider against another endpoint (proxies, mocks)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: "it".to_string(),
        })
    }

    /// Response language for details lookups
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn provider_error(message: impl Into<String>) -> PlaceRankError {
        PlaceRankError::Provider {
            provider: PROVIDER.to_string(),
            message: message.into(),
        }
    }

    fn status_error(status: &str, message: Option<String>) -> PlaceRankError {
        match message {
            Some(msg) => Self::provider_error(format!("{}: {}", status, msg)),
            None => Self::provider_error(status),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::provider_error(format!("{} request failed: {}", what, e)))?;

        if !response.status().is_success() {
            return Err(Self::provider_error(format!("{}: HTTP {}", what, response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| Self::provider_error(format!("{}: invalid JSON: {}", what, e)))
    }

    async fn search(&self, url: &str, what: &str) -> Result<Vec<Place>> {
        let body: SearchResponse = self.get_json(url, what).await?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            other => return Err(Self::status_error(other, body.error_message)),
        }

        let total = body.results.len();
        let places: Vec<Place> = body
            .results
            .into_iter()
            .filter(|raw| !raw.place_id.is_empty())
            .map(RawPlace::into_place)
            .collect();

        if places.len() < total {
            tracing::debug!("Dropped {} {} results without place_id", total - places.len(), what);
        }

        Ok(places)
    }

    fn location_param(location: &GeoPoint) -> String {
        format!("{},{}", location.lat, location.lng)
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesProvider {
    async fn details(&self, place_id: &str) -> Result<Place> {
        let url = format!(
            "{}/details/json?place_id={}&fields={}&language={}&key={}",
            self.base_url,
            urlencoding::encode(place_id),
            urlencoding::encode(DETAILS_FIELDS),
            urlencoding::encode(&self.language),
            urlencoding::encode(&self.api_key),
        );

        let body: DetailsResponse = self.get_json(&url, "details").await?;

        match body.status.as_str() {
            "OK" => {}
            "NOT_FOUND" | "ZERO_RESULTS" => return Err(PlaceRankError::NotFound(place_id.to_string())),
            other => return Err(Self::status_error(other, body.error_message)),
        }

        let mut place = body
            .result
            .ok_or_else(|| PlaceRankError::NotFound(place_id.to_string()))?
            .into_place();

        // details may omit place_id when the field mask is trimmed
        if place.id.is_empty() {
            place.id = place_id.to_string();
        }

        Ok(place)
    }

    async fn nearby_search(&self, request: &NearbyRequest) -> Result<Vec<Place>> {
        let mut url = format!(
            "{}/nearbysearch/json?location={}&radius={}&type={}&language={}&key={}",
            self.base_url,
            urlencoding::encode(&Self::location_param(&request.location)),
            request.radius_m,
            urlencoding::encode(&request.category),
            urlencoding::encode(&request.language),
            urlencoding::encode(&self.api_key),
        );
        if let Some(keyword) = request.keyword.as_deref().filter(|k| !k.is_empty()) {
            url.push_str("&keyword=");
            url.push_str(&urlencoding::encode(keyword));
        }

        self.search(&url, "nearby search").await
    }

    async fn text_search(&self, request: &TextSearchRequest) -> Result<Vec<Place>> {
        let url = format!(
            "{}/textsearch/json?query={}&location={}&radius={}&language={}&key={}",
            self.base_url,
            urlencoding::encode(&request.query),
            urlencoding::encode(&Self::location_param(&request.location)),
            request.radius_m,
            urlencoding::encode(&request.language),
            urlencoding::encode(&self.api_key),
        );

        self.search(&url, "text search").await
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
