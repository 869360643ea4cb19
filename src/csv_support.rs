//! Trait boundary toward an external CSV ingestion loader. Parsing CSV
//! is out of scope for this crate — that's thin glue a caller owns —
//! but the boundary it plugs into is pinned here.
//!
//! This module pins only what a thin CSV binary needs from this crate:
//! an iterator of already-parsed [`GeoObject`] values, and a helper that
//! reproduces the original loader's `Keywords`/`Weights` column format
//! (Python list literals, e.g. `"['a', 'b']"`) closely enough for a
//! caller to reuse rather than reinvent.

use crate::object::GeoObject;

/// A source of fully-parsed objects ready for [`crate::Index::add_batch`].
/// A CSV-backed implementation maps `ObjectID, Latitude, Longitude,
/// Keywords, Weights, FullText` rows into this; this crate does not parse
/// CSV itself, only consumes the result.
pub trait GeoObjectSource {
    type Iter: Iterator<Item = GeoObject>;

    fn into_objects(self) -> Self::Iter;
}

impl<I: IntoIterator<Item = GeoObject>> GeoObjectSource for I {
    type Iter = I::IntoIter;

    fn into_objects(self) -> Self::Iter {
        self.into_iter()
    }
}

/// Parse a Python-style list literal (`"['a', 'b', 'c']"`) into its
/// elements, stripping brackets and both quote styles. Empty or malformed
/// input yields an empty list rather than an error, matching the source
/// loader's permissive behavior on a field that is otherwise out of this
/// crate's scope.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(',')
        .map(|term| term.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|term| !term.is_empty())
        .map(|term| term.to_string())
        .collect()
}
