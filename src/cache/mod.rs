pub mod sqlite;

use async_trait::async_trait;
use crate::core::Place;
use crate::error::Result;

pub use sqlite::SqliteCache;

/// Trait for place-details cache implementations
#[async_trait]
pub trait PlaceCache: Send + Sync {
    /// Get cached details by place id; expired entries read as a miss
    async fn get(&self, place_id: &str) -> Result<Option<CachedPlace>>;

    /// Save place details
    async fn save(&self, place: &Place) -> Result<()>;

    /// Increment cache hit counter
    async fn increment_hit(&self, place_id: &str) -> Result<()>;

    /// Get cache statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Clear entries older than `max_age_hours`
    async fn cleanup(&self, max_age_hours: i64) -> Result<u64>;
}

/// Cached place with metadata
#[derive(Debug, Clone)]
pub struct CachedPlace {
    pub place: Place,
    pub hit_count: i32,
    pub cached_at: chrono::DateTime<chrono::Utc>,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: u64,
    pub total_hits: u64,
    pub avg_hit_count: f64,
    pub oldest_entry: Option<chrono::DateTime<chrono::Utc>>,
    pub newest_entry: Option<chrono::DateTime<chrono::Utc>>,
}
