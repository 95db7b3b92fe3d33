pub mod composite;
pub mod score;

use serde::{Deserialize, Serialize};

use crate::core::{Place, RankPosition};
use crate::geo::Distance;

pub use composite::CompositeRanker;
pub use score::ScoreWeights;

/// Trait for ranking implementations
pub trait Ranker: Send + Sync {
    /// Rank `target` against `candidates`. Never fails: data gaps degrade
    /// to defaults and a target without location yields `RankPosition::Unknown`.
    fn rank(&self, target: &Place, candidates: &[Place]) -> RankOutcome;

    /// Get ranker name for logging
    fn name(&self) -> &str;
}

/// Place with its distance from the target and composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPlace {
    pub place: Place,
    pub distance: Distance,
    pub score: f64,
}

impl ScoredPlace {
    pub fn new(place: Place, distance: Distance, score: f64) -> Self {
        Self { place, distance, score }
    }

    pub fn distance_m(&self) -> f64 {
        self.distance.meters()
    }
}

/// Full result of one ranking run
#[derive(Debug, Clone, PartialEq)]
pub struct RankOutcome {
    pub position: RankPosition,
    /// Every entity (target included) sorted by descending score
    pub ranked: Vec<ScoredPlace>,
}

impl RankOutcome {
    /// Outcome when ranking could not run at all
    pub fn unknown() -> Self {
        Self {
            position: RankPosition::Unknown,
            ranked: Vec::new(),
        }
    }

    /// All entities strictly ahead of the target
    pub fn outranking(&self) -> &[ScoredPlace] {
        match self.position {
            RankPosition::Ranked(pos) => {
                let ahead = pos.saturating_sub(1).min(self.ranked.len());
                &self.ranked[..ahead]
            }
            RankPosition::Unknown => &[],
        }
    }

    /// The first `limit` outranking entities, for display
    pub fn outranking_preview(&self, limit: usize) -> &[ScoredPlace] {
        let ahead = self.outranking();
        &ahead[..ahead.len().min(limit)]
    }

    pub fn total_ahead(&self) -> usize {
        self.outranking().len()
    }

    /// Number of ranked entities, target included
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// The target's own scored entry
    pub fn target(&self) -> Option<&ScoredPlace> {
        match self.position {
            RankPosition::Ranked(pos) => pos.checked_sub(1).and_then(|idx| self.ranked.get(idx)),
            RankPosition::Unknown => None,
        }
    }
}
