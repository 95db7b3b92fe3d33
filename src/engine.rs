use crate::cache::{CacheStats, PlaceCache, SqliteCache};
use crate::classify::{Classification, RuleTable};
use crate::config::EngineConfig;
use crate::core::{ComparativeAnalysis, GeoPoint, Place, RankPosition, RankReport, SearchStrategy};
use crate::error::{ConfigError, Result};
use crate::providers::{GooglePlacesProvider, NearbyRequest, PlacesProvider, TextSearchRequest};
use crate::ranking::{CompositeRanker, Ranker};
use std::sync::Arc;
use std::time::Instant;

/// Main ranking orchestrator.
///
/// Holds every collaborator explicitly; there is no shared mutable state,
/// so one engine can serve overlapping requests.
pub struct RankingEngine {
    cache: Arc<dyn PlaceCache>,
    provider: Arc<dyn PlacesProvider>,
    ranker: Arc<dyn Ranker>,
    rules: Arc<RuleTable>,
    options: EngineOptions,
}

/// Ranking request
#[derive(Debug, Clone)]
pub struct RankQuery {
    pub place_id: String,
    /// What the user typed; classification falls back to the place name
    pub text: Option<String>,
    pub use_cache: bool,
}

impl RankQuery {
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            text: None,
            use_cache: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Search/report tuning
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub search_radius_m: u32,
    pub language: String,
    pub min_nearby_results: usize,
    pub display_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            search_radius_m: 10_000,
            language: "it".to_string(),
            min_nearby_results: 1,
            display_limit: 7,
        }
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            search_radius_m: config.search_radius_m,
            language: config.language.clone(),
            min_nearby_results: config.min_nearby_results,
            display_limit: config.display_limit,
        }
    }
}

impl RankingEngine {
    /// Create an engine from explicit collaborators
    pub fn new(
        cache: Arc<dyn PlaceCache>,
        provider: Arc<dyn PlacesProvider>,
        rules: Arc<RuleTable>,
        options: EngineOptions,
    ) -> Self {
        Self {
            cache,
            provider,
            ranker: Arc::new(CompositeRanker::new()),
            rules,
            options,
        }
    }

    /// Wire the default stack (SQLite cache, Google provider) from configuration
    pub async fn from_config(config: &EngineConfig) -> Result<Self> {
        let ttl = chrono::Duration::try_hours(config.cache_ttl_hours)
            .filter(|ttl| *ttl >= chrono::Duration::zero())
            .ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "PLACERANK_CACHE_TTL_HOURS".to_string(),
                reason: format!("{} hours is out of range", config.cache_ttl_hours),
            })?;
        let cache = Arc::new(SqliteCache::with_ttl(&config.db_path, ttl).await?);

        let provider = match &config.base_url {
            Some(base_url) => GooglePlacesProvider::with_base_url(&config.api_key, base_url)?,
            None => GooglePlacesProvider::new(&config.api_key)?,
        }
        .with_language(&config.language);

        let rules = match &config.rules_path {
            Some(path) => {
                tracing::info!("📖 Loading rule table from {}", path.display());
                RuleTable::from_path(path)?
            }
            None => RuleTable::builtin()?,
        };

        Ok(Self::new(cache, Arc::new(provider), Arc::new(rules), EngineOptions::from(config)))
    }

    /// Swap the ranking heuristic
    pub fn with_ranker(mut self, ranker: Arc<dyn Ranker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Classify free text and provider tags with the engine's rule table
    pub fn classify<S: AsRef<str>>(&self, text: &str, api_types: &[S]) -> Classification {
        self.rules.classify(text, api_types)
    }

    /// Estimate the local search position of a place
    pub async fn rank(&self, query: RankQuery) -> Result<RankReport> {
        let start = Instant::now();

        let (target, from_cache) = self.target_details(&query).await?;

        let text = query
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&target.name);
        let classification = self.rules.classify(text, target.types.as_slice());
        tracing::debug!(
            "Classified '{}' as {} ({:?})",
            text,
            classification.category,
            classification.source
        );

        let (candidates, search_strategy) = match target.usable_location() {
            Some(center) => self.fetch_candidates(center, &classification).await,
            None => {
                tracing::warn!("⚠️ {} has no location, skipping competitor search", target.id);
                (Vec::new(), SearchStrategy::None)
            }
        };

        let outcome = self.ranker.rank(&target, &candidates);

        let outranking = outcome.outranking_preview(self.options.display_limit).to_vec();
        let analysis = ComparativeAnalysis::compute(&target, &outranking);

        let report = RankReport {
            target,
            classification,
            position: outcome.position,
            outranking,
            total_ahead: outcome.total_ahead(),
            total_ranked: outcome.len(),
            search_strategy,
            analysis,
            from_cache,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            ranking_method: self.ranker.name().to_string(),
        };

        if let RankPosition::Ranked(_) = report.position {
            tracing::info!("📊 {}", report.display());
        }

        Ok(report)
    }

    async fn target_details(&self, query: &RankQuery) -> Result<(Place, bool)> {
        if query.use_cache {
            match self.cache.get(&query.place_id).await {
                Ok(Some(cached)) => {
                    if let Err(e) = self.cache.increment_hit(&query.place_id).await {
                        tracing::warn!("Failed to bump cache hit for {}: {}", query.place_id, e);
                    }
                    return Ok((cached.place, true));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Cache lookup failed for {}: {}", query.place_id, e),
            }
        }

        let place = self.provider.details(&query.place_id).await?;

        if query.use_cache {
            if let Err(e) = self.cache.save(&place).await {
                tracing::warn!("Failed to save to cache: {}", e);
            }
        }

        Ok((place, false))
    }

    /// Nearby search first; text search when it fails or comes back thin.
    async fn fetch_candidates(
        &self,
        center: GeoPoint,
        classification: &Classification,
    ) -> (Vec<Place>, SearchStrategy) {
        let nearby = NearbyRequest {
            location: center,
            radius_m: self.options.search_radius_m,
            category: classification.category.clone(),
            keyword: Some(classification.keyword.clone()).filter(|k| !k.is_empty()),
            language: self.options.language.clone(),
        };

        match self.provider.nearby_search(&nearby).await {
            Ok(results) if results.len() >= self.options.min_nearby_results.max(1) => {
                tracing::debug!("Provider {} nearby search returned {} results", self.provider.name(), results.len());
                return (results, SearchStrategy::Nearby);
            }
            Ok(results) => {
                tracing::debug!("Nearby search returned only {} results, trying text search", results.len());
            }
            Err(e) => {
                tracing::warn!("Nearby search failed, trying text search: {}", e);
            }
        }

        let text = TextSearchRequest {
            query: classification.search_term().to_string(),
            location: center,
            radius_m: self.options.search_radius_m,
            language: self.options.language.clone(),
        };

        match self.provider.text_search(&text).await {
            Ok(results) => (results, SearchStrategy::Text),
            Err(e) => {
                tracing::warn!("Text search failed, ranking without competitors: {}", e);
                (Vec::new(), SearchStrategy::Text)
            }
        }
    }

    /// Get cache statistics
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats().await
    }

    /// Drop cache entries older than `max_age_hours`
    pub async fn cleanup_cache(&self, max_age_hours: i64) -> Result<u64> {
        self.cache.cleanup(max_age_hours).await
    }
}
