use std::collections::HashSet;

use crate::core::{Place, RankPosition};
use crate::geo::{distance_between, Distance};
use crate::ranking::{RankOutcome, Ranker, ScoreWeights, ScoredPlace};

/// Rating/reviews/distance composite ranker
#[derive(Debug, Clone, Default)]
pub struct CompositeRanker {
    weights: ScoreWeights,
}

impl CompositeRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Merge the target into the candidate list by id.
    ///
    /// Duplicate candidates keep their first occurrence. The target record
    /// replaces a same-id candidate in place, otherwise it is appended.
    fn merge<'a>(target: &'a Place, candidates: &'a [Place]) -> Vec<&'a Place> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len() + 1);
        let mut merged: Vec<&Place> = Vec::with_capacity(candidates.len() + 1);

        for candidate in candidates {
            if !seen.insert(candidate.id.as_str()) {
                continue;
            }
            if candidate.id == target.id {
                merged.push(target);
            } else {
                merged.push(candidate);
            }
        }

        if !seen.contains(target.id.as_str()) {
            merged.push(target);
        }

        merged
    }
}

impl Ranker for CompositeRanker {
    fn rank(&self, target: &Place, candidates: &[Place]) -> RankOutcome {
        let Some(origin) = target.usable_location() else {
            tracing::warn!("Target {} has no usable location, rank unknown", target.id);
            return RankOutcome::unknown();
        };

        let mut ranked: Vec<ScoredPlace> = Self::merge(target, candidates)
            .into_iter()
            .map(|place| {
                let distance = if place.id == target.id {
                    Distance::Computed(0.0)
                } else {
                    distance_between(Some(origin), place.location)
                };
                let score = self.weights.score(place.rating, place.review_count, distance.meters());
                ScoredPlace::new(place.clone(), distance, score)
            })
            .collect();

        // stable: equal scores keep input order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let position = ranked
            .iter()
            .position(|entry| entry.place.id == target.id)
            .map(|idx| RankPosition::Ranked(idx + 1))
            .unwrap_or(RankPosition::Unknown);

        tracing::debug!(
            "Ranked {} entities for {}: {:?}",
            ranked.len(),
            target.id,
            position
        );

        RankOutcome { position, ranked }
    }

    fn name(&self) -> &str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ~300m north of the origin
    const LAT_300M: f64 = 45.0 + 300.0 / 111_195.0;

    fn target() -> Place {
        Place::new("target", "Trattoria Da Mario")
            .with_rating(4.5, 200)
            .with_location(45.0, 9.0)
    }

    #[test]
    fn test_candidate_outranks_target() {
        let ranker = CompositeRanker::new();
        let candidate = Place::new("c1", "Pizzeria Roma")
            .with_rating(4.8, 500)
            .with_location(LAT_300M, 9.0);

        let outcome = ranker.rank(&target(), &[candidate]);

        assert_eq!(outcome.position, RankPosition::Ranked(2));
        assert_eq!(outcome.outranking().len(), 1);
        assert_eq!(outcome.outranking()[0].place.id, "c1");
        let ahead = &outcome.outranking()[0];
        assert!((ahead.distance_m() - 300.0).abs() < 1.0);
        assert!((ahead.score - 114.3).abs() < 0.1, "got {}", ahead.score);
        let own = outcome.target().unwrap();
        assert_eq!(own.distance, Distance::Computed(0.0));
        assert!((own.score - 105.9).abs() < 0.1, "got {}", own.score);
    }

    #[test]
    fn test_empty_candidates_is_rank_one() {
        let outcome = CompositeRanker::new().rank(&target(), &[]);
        assert_eq!(outcome.position, RankPosition::Ranked(1));
        assert!(outcome.outranking().is_empty());
        assert_eq!(outcome.len(), 1);
    }

    #[test]
    fn test_missing_target_location_is_unknown() {
        let mut t = target();
        t.location = None;
        let candidate = Place::new("c1", "Other").with_rating(5.0, 10).with_location(45.0, 9.0);

        let outcome = CompositeRanker::new().rank(&t, &[candidate]);

        assert_eq!(outcome.position, RankPosition::Unknown);
        assert!(outcome.outranking().is_empty());
    }

    #[test]
    fn test_target_record_wins_dedup() {
        let stale = Place::new("target", "Trattoria Da Mario")
            .with_rating(1.0, 3)
            .with_location(45.0, 9.0);
        let other = Place::new("c1", "Other").with_rating(3.0, 10).with_location(45.0, 9.0);

        let outcome = CompositeRanker::new().rank(&target(), &[stale, other]);

        let matches: Vec<_> = outcome.ranked.iter().filter(|e| e.place.id == "target").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].place.rating, 4.5);
        assert_eq!(matches[0].place.review_count, 200);
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.position, RankPosition::Ranked(1));
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let a = Place::new("a", "A").with_rating(4.9, 900).with_location(45.0, 9.0);
        let outcome = CompositeRanker::new().rank(&target(), &[a.clone(), a]);
        assert_eq!(outcome.len(), 2);
    }

    #[test]
    fn test_candidate_without_location_has_zero_distance() {
        let floating = Place::new("f", "Floating").with_rating(4.0, 50);
        let outcome = CompositeRanker::new().rank(&target(), &[floating]);
        let entry = outcome.ranked.iter().find(|e| e.place.id == "f").unwrap();
        assert_eq!(entry.distance, Distance::Unavailable);
        assert_eq!(entry.distance_m(), 0.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let t = Place::new("target", "T").with_rating(4.0, 10).with_location(45.0, 9.0);
        let a = Place::new("a", "A").with_rating(4.0, 10).with_location(45.0, 9.0);
        let b = Place::new("b", "B").with_rating(4.0, 10).with_location(45.0, 9.0);

        let outcome = CompositeRanker::new().rank(&t, &[a, b]);

        let ids: Vec<_> = outcome.ranked.iter().map(|e| e.place.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "target"]);
        assert_eq!(outcome.position, RankPosition::Ranked(3));
    }

    #[test]
    fn test_rank_is_idempotent() {
        let ranker = CompositeRanker::new();
        let candidates: Vec<Place> = (0..20)
            .map(|i| {
                Place::new(format!("c{i}"), format!("Place {i}"))
                    .with_rating((i % 6) as f64 * 0.9, i * 13)
                    .with_location(45.0 + i as f64 * 0.001, 9.0)
            })
            .collect();

        let first = ranker.rank(&target(), &candidates);
        let second = ranker.rank(&target(), &candidates);
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_calls_share_nothing() {
        let ranker = CompositeRanker::new();
        let candidates = vec![Place::new("c1", "C").with_rating(5.0, 900).with_location(45.0, 9.0)];
        let expected = ranker.rank(&target(), &candidates);

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| ranker.rank(&target(), &candidates)))
                .collect();
            for worker in workers {
                assert_eq!(worker.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_position_within_bounds() {
        let ranker = CompositeRanker::new();
        for n in 0..12u64 {
            let candidates: Vec<Place> = (0..n)
                .map(|i| {
                    Place::new(format!("c{i}"), "C")
                        .with_rating(5.0 - i as f64 * 0.4, 30 * i)
                        .with_location(45.01, 9.01)
                })
                .collect();
            match ranker.rank(&target(), &candidates).position {
                RankPosition::Ranked(pos) => assert!(pos >= 1 && pos as u64 <= n + 1),
                RankPosition::Unknown => panic!("target has a location"),
            }
        }
    }
}
