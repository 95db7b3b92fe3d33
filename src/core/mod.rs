pub mod lenient;
pub mod place;
pub mod rank_report;

pub use place::{GeoPoint, Place};
pub use rank_report::{format_distance, ComparativeAnalysis, RankPosition, RankReport, SearchStrategy, Trend};
