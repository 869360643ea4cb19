//! Single-query resolution: candidate retrieval, predicate filtering, and
//! a bounded top-k min-heap.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use crate::error::{Result, SpatioError};
use crate::geometry::Location;
use crate::index::{Index, DEFAULT_RADIUS};
use crate::scorer;

/// A request to rank objects by blended spatial/textual relevance.
#[derive(Debug, Clone)]
pub struct SpatialQuery {
    pub query_id: u64,
    pub location: Location,
    pub positive_keywords: FxHashSet<String>,
    pub negative_keywords: FxHashSet<String>,
    pub k: usize,
    pub lambda_factor: f64,
}

impl SpatialQuery {
    /// Build a query, rejecting `k < 1` or `lambda_factor` outside `[0, 1]`.
    pub fn new(
        query_id: u64,
        location: Location,
        positive_keywords: impl IntoIterator<Item = String>,
        negative_keywords: impl IntoIterator<Item = String>,
        k: usize,
        lambda_factor: f64,
    ) -> Result<Self> {
        if k < 1 {
            return Err(SpatioError::InvalidQuery(format!("k must be >= 1, got {k}")));
        }
        if !(0.0..=1.0).contains(&lambda_factor) {
            return Err(SpatioError::InvalidQuery(format!(
                "lambda_factor must be in [0, 1], got {lambda_factor}"
            )));
        }
        Ok(Self {
            query_id,
            location,
            positive_keywords: positive_keywords.into_iter().collect(),
            negative_keywords: negative_keywords.into_iter().collect(),
            k,
            lambda_factor,
        })
    }
}

/// One ranked result: a typed alternative to a bare `(score, id, ...)`
/// tuple at the public API boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub id: u64,
    pub location: Location,
    pub full_text: String,
    pub score: f64,
}

/// `(score, id)` ordered so the lowest score is the *greatest* element —
/// combined with [`Reverse`] in the heap below this makes a textbook
/// max-heap behave as a size-bounded min-heap. Ties on score are broken
/// by ascending id, which keeps the heap (and therefore every output
/// ordering) deterministic regardless of hash-set iteration order
/// upstream.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredId {
    score: f64,
    id: u64,
}
impl Eq for ScoredId {}
impl PartialOrd for ScoredId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScoredId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| self.id.cmp(&other.id))
    }
}

/// A bounded top-k accumulator shared by the single-query and batch
/// engines: push every candidate's score, keep only the best `k`.
pub(crate) struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<ScoredId>>,
}

impl TopK {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Push a scored candidate, evicting the current minimum only if
    /// `score` is strictly greater — a tie keeps whichever candidate is
    /// already in the heap.
    pub(crate) fn push(&mut self, id: u64, score: f64) {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(ScoredId { score, id }));
            return;
        }
        if let Some(Reverse(min_item)) = self.heap.peek() {
            if score > min_item.score {
                self.heap.pop();
                self.heap.push(Reverse(ScoredId { score, id }));
            }
        }
    }

    /// Drain into descending-score order, ties broken by ascending id.
    pub(crate) fn into_sorted_ids(self) -> Vec<(u64, f64)> {
        let mut items: Vec<ScoredId> = self.heap.into_iter().map(|Reverse(x)| x).collect();
        items.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        items.into_iter().map(|s| (s.id, s.score)).collect()
    }
}

/// Resolve one query against `index`: candidate retrieval, then scoring
/// and a size-`k` top-k pass.
pub fn process_query(index: &Index, query: &SpatialQuery) -> Vec<QueryResult> {
    let candidates = index.get_candidates(
        query.location,
        &query.positive_keywords,
        &query.negative_keywords,
        DEFAULT_RADIUS,
    );
    let mut ids: Vec<u64> = candidates.into_iter().collect();
    ids.sort_unstable();

    let mut top_k = TopK::new(query.k);
    for id in ids {
        let Some(object) = index.get(id) else { continue };
        let score = scorer::score(
            query.location,
            object.location,
            &query.positive_keywords,
            &object.keywords,
            query.lambda_factor,
        );
        top_k.push(id, score);
    }

    top_k
        .into_sorted_ids()
        .into_iter()
        .filter_map(|(id, score)| {
            index.get(id).map(|object| QueryResult {
                id,
                location: object.location,
                full_text: object.full_text.clone(),
                score,
            })
        })
        .collect()
}
