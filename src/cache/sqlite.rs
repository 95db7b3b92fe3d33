use rusqlite::{Connection, params, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::cache::{PlaceCache, CachedPlace, CacheStats};
use crate::core::Place;
use crate::error::{Result, PlaceRankError};

/// SQLite-backed place-details cache with a time-to-live.
///
/// ```sql
/// CREATE TABLE place_cache (
///     place_id TEXT PRIMARY KEY,
///     place_data TEXT NOT NULL,
///     hit_count INTEGER DEFAULT 0,
///     cached_at TEXT NOT NULL      -- RFC 3339, UTC, microseconds
/// );
/// ```
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SqliteCache {
    /// Default freshness window for place details
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Create new SQLite cache with the default TTL
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_ttl(db_path, Duration::hours(Self::DEFAULT_TTL_HOURS)).await
    }

    pub async fn with_ttl(db_path: &str, ttl: Duration) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS place_cache (
                place_id TEXT PRIMARY KEY,
                place_data TEXT NOT NULL,
                hit_count INTEGER DEFAULT 0,
                cached_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_place_cached_at ON place_cache(cached_at)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PlaceRankError::Cache("connection mutex poisoned".to_string()))
    }

    fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn boundary(conn: &Connection, sql: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(raw.as_deref().and_then(Self::parse_timestamp))
    }
}

#[async_trait]
impl PlaceCache for SqliteCache {
    async fn get(&self, place_id: &str) -> Result<Option<CachedPlace>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT place_data, hit_count, cached_at FROM place_cache WHERE place_id = ?",
                params![place_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((place_json, hit_count, cached_at_raw)) = row else {
            return Ok(None);
        };

        let Some(cached_at) = Self::parse_timestamp(&cached_at_raw) else {
            tracing::warn!("Unparseable cache timestamp for {}: {}", place_id, cached_at_raw);
            return Ok(None);
        };

        if Utc::now() - cached_at > self.ttl {
            tracing::debug!("Cache entry for {} expired", place_id);
            return Ok(None);
        }

        let place: Place = match serde_json::from_str(&place_json) {
            Ok(place) => place,
            Err(e) => {
                tracing::warn!("Corrupt cache entry for {}: {}", place_id, e);
                return Ok(None);
            }
        };

        Ok(Some(CachedPlace {
            place,
            hit_count,
            cached_at,
        }))
    }

    async fn save(&self, place: &Place) -> Result<()> {
        let place_json = serde_json::to_string(place)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO place_cache (place_id, place_data, hit_count, cached_at)
             VALUES (?1, ?2, COALESCE((SELECT hit_count FROM place_cache WHERE place_id = ?1), 0), ?3)",
            params![place.id, place_json, Self::timestamp(Utc::now())],
        )?;

        Ok(())
    }

    async fn increment_hit(&self, place_id: &str) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE place_cache SET hit_count = hit_count + 1 WHERE place_id = ?",
            params![place_id],
        )?;

        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let conn = self.lock()?;

        let total_entries: u64 = conn.query_row("SELECT COUNT(*) FROM place_cache", [], |row| row.get(0))?;

        let total_hits: u64 = conn.query_row(
            "SELECT COALESCE(SUM(hit_count), 0) FROM place_cache",
            [],
            |row| row.get(0),
        )?;

        let avg_hit_count = if total_entries > 0 {
            total_hits as f64 / total_entries as f64
        } else {
            0.0
        };

        // RFC 3339 UTC strings sort chronologically
        let oldest_entry = Self::boundary(&conn, "SELECT MIN(cached_at) FROM place_cache")?;
        let newest_entry = Self::boundary(&conn, "SELECT MAX(cached_at) FROM place_cache")?;

        Ok(CacheStats {
            total_entries,
            total_hits,
            avg_hit_count,
            oldest_entry,
            newest_entry,
        })
    }

    async fn cleanup(&self, max_age_hours: i64) -> Result<u64> {
        if max_age_hours < 0 {
            return Err(PlaceRankError::Cache(format!(
                "max age must not be negative, got {} hours",
                max_age_hours
            )));
        }

        let cutoff = Duration::try_hours(max_age_hours)
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| PlaceRankError::Cache(format!("max age of {} hours is out of range", max_age_hours)))?;

        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM place_cache WHERE cached_at <= ?",
            params![Self::timestamp(cutoff)],
        )?;

        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str) -> Place {
        Place::new(id, "Pizzeria Roma")
            .with_rating(4.5, 200)
            .with_location(45.07, 7.68)
    }

    #[tokio::test]
    async fn test_cache_create() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert!(stats.oldest_entry.is_none());
    }

    #[tokio::test]
    async fn test_cache_save_and_get() {
        let cache = SqliteCache::new(":memory:").await.unwrap();

        cache.save(&place("p1")).await.unwrap();

        let cached = cache.get("p1").await.unwrap().unwrap();
        assert_eq!(cached.place, place("p1"));
        assert_eq!(cached.hit_count, 0);
        assert!(cache.get("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = SqliteCache::with_ttl(":memory:", Duration::zero()).await.unwrap();
        cache.save(&place("p1")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(cache.get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_hit_count() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        cache.save(&place("p1")).await.unwrap();
        cache.increment_hit("p1").await.unwrap();
        cache.increment_hit("p1").await.unwrap();

        cache.save(&place("p1").with_rating(4.9, 210)).await.unwrap();

        let cached = cache.get("p1").await.unwrap().unwrap();
        assert_eq!(cached.hit_count, 2);
        assert_eq!(cached.place.rating, 4.9);
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let cache = SqliteCache::new(":memory:").await.unwrap();

        cache.save(&place("p1")).await.unwrap();
        cache.save(&place("p2")).await.unwrap();

        cache.increment_hit("p1").await.unwrap();
        cache.increment_hit("p1").await.unwrap();
        cache.increment_hit("p2").await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_hits, 3);
        assert_eq!(stats.avg_hit_count, 1.5);
        assert!(stats.oldest_entry.is_some());
        assert!(stats.newest_entry.is_some());
    }

    #[tokio::test]
    async fn test_cache_cleanup() {
        let cache = SqliteCache::new(":memory:").await.unwrap();

        cache.save(&place("old")).await.unwrap();

        // 0 hours = everything
        let deleted = cache.cleanup(0).await.unwrap();
        assert_eq!(deleted, 1);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_entries() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        cache.save(&place("fresh")).await.unwrap();

        assert_eq!(cache.cleanup(24).await.unwrap(), 0);
        assert_eq!(cache.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_cleanup_rejects_negative_age() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        cache.save(&place("fresh")).await.unwrap();

        let err = cache.cleanup(-1).await.unwrap_err();
        assert!(matches!(err, PlaceRankError::Cache(_)));
        assert_eq!(cache.stats().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_cleanup_out_of_range_age_is_an_error() {
        let cache = SqliteCache::new(":memory:").await.unwrap();
        cache.save(&place("fresh")).await.unwrap();

        // representable as a duration, but not as a date
        assert!(matches!(cache.cleanup(10_000_000_000).await, Err(PlaceRankError::Cache(_))));
        assert!(matches!(cache.cleanup(i64::MAX).await, Err(PlaceRankError::Cache(_))));
        assert_eq!(cache.stats().await.unwrap().total_entries, 1);
    }
}
