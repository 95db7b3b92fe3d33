use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classify::Classification;
use crate::core::Place;
use crate::ranking::ScoredPlace;

/// Target's 1-based rank, or unknown when ranking could not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum RankPosition {
    Ranked(usize),
    Unknown,
}

impl RankPosition {
    pub fn as_number(&self) -> Option<usize> {
        match self {
            RankPosition::Ranked(pos) => Some(*pos),
            RankPosition::Unknown => None,
        }
    }
}

impl fmt::Display for RankPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankPosition::Ranked(pos) => write!(f, "{pos}º"),
            RankPosition::Unknown => write!(f, "—"),
        }
    }
}

/// Which search produced the candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// Category-scoped nearby search
    Nearby,
    /// Broader text search fallback
    Text,
    /// No search ran (target had no location)
    None,
}

/// How the target compares to the competitors listed ahead of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    BelowAverage,
    OnPar,
}

/// Averages of the displayed outranking competitors vs. the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub avg_rating: f64,
    pub avg_review_count: f64,
    pub rating_delta: f64,
    pub review_delta: f64,
    pub trend: Trend,
    pub needs_attention: bool,
}

impl ComparativeAnalysis {
    const RATING_GAP: f64 = -0.2;
    const REVIEW_GAP: f64 = -20.0;

    /// `None` when there is nobody to compare against
    pub fn compute(target: &Place, competitors: &[ScoredPlace]) -> Option<Self> {
        if competitors.is_empty() {
            return None;
        }
        let n = competitors.len() as f64;
        let avg_rating = competitors.iter().map(|c| c.place.rating).sum::<f64>() / n;
        let avg_review_count = competitors.iter().map(|c| c.place.review_count as f64).sum::<f64>() / n;
        let rating_delta = target.rating - avg_rating;
        let review_delta = target.review_count as f64 - avg_review_count;

        let trend = if rating_delta < Self::RATING_GAP {
            Trend::BelowAverage
        } else {
            Trend::OnPar
        };

        Some(Self {
            avg_rating,
            avg_review_count,
            rating_delta,
            review_delta,
            trend,
            needs_attention: rating_delta < Self::RATING_GAP || review_delta < Self::REVIEW_GAP,
        })
    }
}

/// Ranking report with target, position and competitors ahead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankReport {
    /// The ranked business (authoritative details record)
    pub target: Place,

    /// Category used to scope the competitor search
    pub classification: Classification,

    pub position: RankPosition,

    /// Competitors ahead of the target, truncated for display
    #[serde(default)]
    pub outranking: Vec<ScoredPlace>,

    /// Size of the full outranking set
    pub total_ahead: usize,

    /// Entities ranked, target included
    pub total_ranked: usize,

    pub search_strategy: SearchStrategy,

    #[serde(default)]
    pub analysis: Option<ComparativeAnalysis>,

    /// Whether target details came from cache
    pub from_cache: bool,

    /// Request latency in milliseconds
    pub latency_ms: f64,

    /// Ranking method used
    pub ranking_method: String,
}

impl RankReport {
    pub fn is_ranked(&self) -> bool {
        matches!(self.position, RankPosition::Ranked(_))
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        format!(
            "{} - {} of {} [{} / {:?}] {} ahead",
            self.target.name,
            self.position,
            self.total_ranked,
            self.classification.category,
            self.search_strategy,
            self.total_ahead,
        )
    }
}

/// Human-readable distance: meters below 1 km, one-decimal km above.
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() {
        return String::new();
    }
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Distance;

    fn competitor(rating: f64, reviews: u64) -> ScoredPlace {
        ScoredPlace::new(
            Place::new("c", "C").with_rating(rating, reviews),
            Distance::Computed(100.0),
            0.0,
        )
    }

    #[test]
    fn test_position_display() {
        assert_eq!(RankPosition::Ranked(3).to_string(), "3º");
        assert_eq!(RankPosition::Unknown.to_string(), "—");
        assert_eq!(RankPosition::Unknown.as_number(), None);
    }

    #[test]
    fn test_position_serialization() {
        let json = serde_json::to_string(&RankPosition::Ranked(2)).unwrap();
        assert_eq!(json, r#"{"status":"ranked","value":2}"#);
        let json = serde_json::to_string(&RankPosition::Unknown).unwrap();
        assert_eq!(json, r#"{"status":"unknown"}"#);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(299.6), "300 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(2345.0), "2.3 km");
    }

    #[test]
    fn test_analysis_below_average() {
        let target = Place::new("t", "T").with_rating(4.0, 50);
        let analysis = ComparativeAnalysis::compute(&target, &[competitor(4.6, 100), competitor(4.8, 300)]).unwrap();

        assert!((analysis.avg_rating - 4.7).abs() < 1e-9);
        assert_eq!(analysis.avg_review_count, 200.0);
        assert_eq!(analysis.trend, Trend::BelowAverage);
        assert!(analysis.needs_attention);
    }

    #[test]
    fn test_analysis_on_par() {
        let target = Place::new("t", "T").with_rating(4.6, 200);
        let analysis = ComparativeAnalysis::compute(&target, &[competitor(4.7, 190)]).unwrap();
        assert_eq!(analysis.trend, Trend::OnPar);
        assert!(!analysis.needs_attention);
    }

    #[test]
    fn test_analysis_requires_competitors() {
        let target = Place::new("t", "T");
        assert!(ComparativeAnalysis::compute(&target, &[]).is_none());
    }
}
