//! # PlaceRank
//!
//! Estimates where a local business ranks against nearby competitors:
//! - Data-driven category classification (free text + provider tags)
//! - Composite rating / review volume / distance scoring
//! - Haversine great-circle distances
//! - SQLite caching of place details
//! - Google Places provider, CLI and HTTP API
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use placerank::{config, RankQuery, RankingEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = config::load_config()?;
//!     let engine = RankingEngine::from_config(&config).await?;
//!
//!     let report = engine
//!         .rank(RankQuery::new("ChIJ...").with_text("pizzeria da mario"))
//!         .await?;
//!
//!     println!("{} is {} of {}", report.target.name, report.position, report.total_ranked);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod geo;
pub mod providers;
pub mod ranking;

// Re-export primary types
pub use crate::core::{GeoPoint, Place, RankPosition, RankReport, SearchStrategy};
pub use cache::PlaceCache;
pub use classify::{Classification, RuleTable};
pub use config::EngineConfig;
pub use engine::{EngineOptions, RankQuery, RankingEngine};
pub use error::{PlaceRankError, Result};
pub use ranking::{CompositeRanker, RankOutcome, Ranker, ScoredPlace};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
