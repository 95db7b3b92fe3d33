use serde::{Deserialize, Serialize};

/// Weights of the composite visibility score:
///
/// `rating * rating_weight + ln(1 + reviews) * review_weight - (meters / meters_per_unit) * distance_penalty`
///
/// The default divides meters by 1000, i.e. the penalty is per kilometer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub rating_weight: f64,
    pub review_weight: f64,
    pub distance_penalty: f64,
    pub meters_per_unit: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rating_weight: 20.0,
            review_weight: 3.0,
            distance_penalty: 1.2,
            meters_per_unit: 1000.0,
        }
    }
}

impl ScoreWeights {
    /// Composite score for one entity.
    ///
    /// Non-finite or negative ratings and distances count as 0.
    pub fn score(&self, rating: f64, review_count: u64, distance_m: f64) -> f64 {
        let rating = sanitize(rating);
        let distance_m = sanitize(distance_m);

        let review_term = (review_count as f64).ln_1p();
        let distance_units = distance_m / self.meters_per_unit;

        rating * self.rating_weight + review_term * self.review_weight
            - distance_units * self.distance_penalty
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
