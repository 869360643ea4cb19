//! Blended spatial/textual relevance scoring.
//!
//! The divisor 100 and the additive 1 are fixed constants of the ranking
//! formula: they keep `spatial_score` in a bounded (if occasionally
//! negative) range. Both must be reproduced bit-for-bit so that rankings
//! stay stable across re-implementations.

use crate::geometry::{self, Location};
use rustc_hash::FxHashSet;

/// `1 - euclidean(q, o) / 100`, no great-circle correction: distance is
/// taken directly on raw `(lat, lon)` deltas.
pub fn spatial_score(query_location: Location, object_location: Location) -> f64 {
    1.0 - geometry::distance(query_location, object_location) / 100.0
}

/// Count of `positive` keywords present on `keywords` — multiplicity is by
/// the query's positive list, not by the object's keyword set.
pub fn textual_score(positive: &FxHashSet<String>, keywords: &FxHashSet<String>) -> f64 {
    positive.iter().filter(|kw| keywords.contains(*kw)).count() as f64
}

/// `lambda * spatial_score + (1 - lambda) * textual_score`.
pub fn score(
    query_location: Location,
    object_location: Location,
    positive: &FxHashSet<String>,
    keywords: &FxHashSet<String>,
    lambda_factor: f64,
) -> f64 {
    let spatial = spatial_score(query_location, object_location);
    let textual = textual_score(positive, keywords);
    lambda_factor * spatial + (1.0 - lambda_factor) * textual
}
