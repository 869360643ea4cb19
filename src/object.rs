//! The atomic indexed record and its keyword vocabulary.

use crate::geometry::Location;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A geo-tagged textual record.
///
/// `id` is externally assigned and only required to be unique within an
/// index; dense or sparse numbering both work since storage is a hash map,
/// not an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoObject {
    pub id: u64,
    pub location: Location,
    pub keywords: FxHashSet<String>,
    pub full_text: String,
}

impl GeoObject {
    /// Build an object, collapsing duplicate keywords on ingest.
    pub fn new(
        id: u64,
        location: Location,
        keywords: impl IntoIterator<Item = String>,
        full_text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            location,
            keywords: keywords.into_iter().collect(),
            full_text: full_text.into(),
        }
    }

    /// Whether any keyword in `terms` is present on this object.
    pub fn matches_any(&self, terms: &FxHashSet<String>) -> bool {
        self.keywords.iter().any(|kw| terms.contains(kw))
    }
}
