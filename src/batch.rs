//! Batch query engine: group queries by proximity and keyword similarity,
//! fetch one shared candidate pool per group, resolve each member query
//! against it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::geometry::{self, Rectangle};
use crate::index::Index;
use crate::object::GeoObject;
use crate::query::{process_query, QueryResult, SpatialQuery, TopK};
use crate::scorer;

/// Above this workload size, spatial clustering switches from the greedy
/// single-linkage pass to complete-linkage agglomerative clustering.
const GREEDY_CLUSTERING_LIMIT: usize = 25;

/// Default spatial clustering distance, in lat/lon units.
pub const DEFAULT_LOC_THRESHOLD: f64 = 10.0;

/// Default keyword-Jaccard similarity threshold for grouping within a
/// spatial cluster.
pub const DEFAULT_KW_THRESHOLD: f64 = 0.5;

/// Tunables for [`process_batch_queries`]; `Default` matches the pinned
/// clustering constants documented on [`DEFAULT_LOC_THRESHOLD`] and
/// [`DEFAULT_KW_THRESHOLD`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub loc_threshold: f64,
    pub kw_threshold: f64,
    pub max_cluster_size: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            loc_threshold: DEFAULT_LOC_THRESHOLD,
            kw_threshold: DEFAULT_KW_THRESHOLD,
            max_cluster_size: None,
        }
    }
}

/// Jaccard similarity of two keyword sets; `1.0` when both are empty.
pub fn jaccard(a: &FxHashSet<String>, b: &FxHashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Resolve every query in `queries` against `index`, grouping by spatial
/// proximity then keyword similarity to amortise candidate retrieval.
/// Returns one result list per `query_id`, in the order `queries` were
/// given.
pub fn process_batch_queries(
    index: &Index,
    queries: &[SpatialQuery],
    options: BatchOptions,
) -> Vec<(u64, Vec<QueryResult>)> {
    let mut results: FxHashMap<u64, Vec<QueryResult>> = FxHashMap::default();

    let spatial_clusters = cluster_by_location(queries, options.loc_threshold);
    let spatial_clusters = apply_max_cluster_size(spatial_clusters, options.max_cluster_size);

    for cluster in spatial_clusters {
        for group in cluster_by_keyword(&cluster, queries, options.kw_threshold) {
            if group.len() == 1 {
                let q = &queries[group[0]];
                results.insert(q.query_id, process_query(index, q));
                continue;
            }
            resolve_group(index, queries, &group, &mut results);
        }
    }

    queries
        .iter()
        .map(|q| (q.query_id, results.remove(&q.query_id).unwrap_or_default()))
        .collect()
}

/// Stage 1: cluster query indices by location under `t_loc`.
fn cluster_by_location(queries: &[SpatialQuery], t_loc: f64) -> Vec<Vec<usize>> {
    if queries.len() <= GREEDY_CLUSTERING_LIMIT {
        greedy_single_linkage(queries, t_loc)
    } else {
        complete_linkage(queries, t_loc)
    }
}

/// Walk queries in input order, joining the first existing cluster whose
/// representative (its first member) is within `t_loc`; else open a new
/// cluster. Deterministic given input order.
fn greedy_single_linkage(queries: &[SpatialQuery], t_loc: f64) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    for (i, q) in queries.iter().enumerate() {
        let joined = clusters.iter_mut().find(|cluster| {
            let rep = &queries[cluster[0]];
            geometry::distance(rep.location, q.location) <= t_loc
        });
        match joined {
            Some(cluster) => cluster.push(i),
            None => clusters.push(vec![i]),
        }
    }
    clusters
}

/// Complete-linkage agglomerative clustering cut at height `t_loc`: the
/// two clusters with the smallest max-pairwise-distance are merged
/// repeatedly until no remaining pair is within `t_loc`.
///
/// This is a direct O(n^3) reference implementation — fine for the
/// moderate batch sizes this engine targets; a production-scale batch
/// would swap in a nearest-neighbour-chain algorithm without changing the
/// grouping semantics.
fn complete_linkage(queries: &[SpatialQuery], t_loc: f64) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = (0..queries.len()).map(|i| vec![i]).collect();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let d = complete_linkage_distance(&clusters[a], &clusters[b], queries);
                let is_better = match best {
                    None => true,
                    Some((_, _, best_d)) => d < best_d,
                };
                if is_better {
                    best = Some((a, b, d));
                }
            }
        }
        match best {
            Some((a, b, d)) if d <= t_loc => {
                let merged = {
                    let mut merged = clusters[a].clone();
                    merged.extend(clusters[b].iter().copied());
                    merged
                };
                // Remove the higher index first so the lower index stays valid.
                clusters.remove(b);
                clusters.remove(a);
                clusters.push(merged);
            }
            _ => break,
        }
    }
    clusters
}

fn complete_linkage_distance(a: &[usize], b: &[usize], queries: &[SpatialQuery]) -> f64 {
    a.iter()
        .flat_map(|&i| b.iter().map(move |&j| (i, j)))
        .map(|(i, j)| geometry::distance(queries[i].location, queries[j].location))
        .fold(0.0_f64, f64::max)
}

/// Split any cluster larger than `max_cluster_size` into contiguous
/// chunks, preserving enumeration order.
fn apply_max_cluster_size(clusters: Vec<Vec<usize>>, max_cluster_size: Option<usize>) -> Vec<Vec<usize>> {
    let Some(max_size) = max_cluster_size else {
        return clusters;
    };
    clusters
        .into_iter()
        .flat_map(|cluster| {
            cluster
                .chunks(max_size.max(1))
                .map(|chunk| chunk.to_vec())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Stage 2: within a spatial cluster, connect queries whose positive
/// keyword sets have Jaccard similarity `>= t_kw` and emit connected
/// components.
fn cluster_by_keyword(cluster: &[usize], queries: &[SpatialQuery], t_kw: f64) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(cluster.len());
    for a in 0..cluster.len() {
        for b in (a + 1)..cluster.len() {
            let sim = jaccard(
                &queries[cluster[a]].positive_keywords,
                &queries[cluster[b]].positive_keywords,
            );
            if sim >= t_kw {
                uf.union(a, b);
            }
        }
    }

    let mut groups: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for (local, &global) in cluster.iter().enumerate() {
        groups.entry(uf.find(local)).or_default().push(global);
    }
    let mut out: Vec<Vec<usize>> = groups.into_values().collect();
    out.sort_by_key(|g| g[0]);
    out
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Unified retrieval + per-query resolution for a multi-query group: one
/// shared candidate pool fetched over the group's bounding rectangle and
/// keyword superset, then scored and ranked independently per query.
fn resolve_group(
    index: &Index,
    queries: &[SpatialQuery],
    group: &[usize],
    results: &mut FxHashMap<u64, Vec<QueryResult>>,
) {
    let members: Vec<&SpatialQuery> = group.iter().map(|&i| &queries[i]).collect();

    let max_radius = members
        .iter()
        .map(|q| q.lambda_factor * 100.0)
        .fold(0.0_f64, f64::max);
    let rect = Rectangle::bounding(members.iter().map(|q| q.location)).expanded(max_radius);

    let positive_superset: FxHashSet<String> = members
        .iter()
        .flat_map(|q| q.positive_keywords.iter().cloned())
        .collect();
    let common_negatives: FxHashSet<String> = members
        .iter()
        .map(|q| &q.negative_keywords)
        .fold(None::<FxHashSet<String>>, |acc, neg| match acc {
            None => Some(neg.clone()),
            Some(acc) => Some(acc.intersection(neg).cloned().collect()),
        })
        .unwrap_or_default();

    let pool: Vec<(u64, &GeoObject)> = index
        .query_range(&rect)
        .into_iter()
        .filter_map(|id| index.get(id).map(|object| (id, object)))
        .filter(|(_, object)| {
            object.matches_any(&positive_superset) && !object.matches_any(&common_negatives)
        })
        .collect();

    for q in members {
        let mut top_k = TopK::new(q.k);
        for &(id, object) in &pool {
            if object.matches_any(&q.negative_keywords) {
                continue;
            }
            if !object.matches_any(&q.positive_keywords) {
                continue;
            }
            let score = scorer::score(
                q.location,
                object.location,
                &q.positive_keywords,
                &object.keywords,
                q.lambda_factor,
            );
            top_k.push(id, score);
        }
        let resolved: Vec<QueryResult> = top_k
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
            .collect();
        results.insert(q.query_id, resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn query(id: u64, loc: (f64, f64), positive: &[&str], negative: &[&str], k: usize, lambda: f64) -> SpatialQuery {
        SpatialQuery::new(id, loc, kw(positive), kw(negative), k, lambda).unwrap()
    }

    #[test]
    fn jaccard_of_two_empty_sets_is_one() {
        let empty = FxHashSet::default();
        assert_eq!(jaccard(&empty, &empty), 1.0);
    }

    #[test]
    fn jaccard_matches_known_overlap() {
        let a: FxHashSet<String> = kw(&["a", "b", "c"]).into_iter().collect();
        let b: FxHashSet<String> = kw(&["b", "c", "d"]).into_iter().collect();
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn greedy_clustering_groups_nearby_queries() {
        let queries = vec![
            query(1, (0.0, 0.0), &["a"], &[], 1, 0.5),
            query(2, (1.0, 1.0), &["a"], &[], 1, 0.5),
            query(3, (100.0, 100.0), &["a"], &[], 1, 0.5),
        ];
        let clusters = greedy_single_linkage(&queries, DEFAULT_LOC_THRESHOLD);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![0, 1]);
        assert_eq!(clusters[1], vec![2]);
    }

    #[test]
    fn max_cluster_size_splits_oversize_clusters() {
        let clusters = vec![vec![0, 1, 2, 3, 4]];
        let split = apply_max_cluster_size(clusters, Some(2));
        assert_eq!(split, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn batch_matches_serial_for_each_query() {
        let mut index = Index::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 4);
        for i in 0..30u64 {
            index.add(
                i,
                ((i % 17) as f64, (i % 11) as f64),
                kw(&["voice", "food"]),
                format!("o{i}"),
            );
        }
        let queries = vec![
            query(1, (1.0, 1.0), &["voice"], &[], 3, 0.5),
            query(2, (2.0, 2.0), &["voice"], &["food"], 3, 0.3),
            query(3, (150.0, 150.0), &["food"], &[], 2, 0.8),
        ];

        let batch = process_batch_queries(&index, &queries, BatchOptions::default());
        for q in &queries {
            let serial = process_query(&index, q);
            let batched = batch
                .iter()
                .find(|(id, _)| *id == q.query_id)
                .map(|(_, r)| r.clone())
                .unwrap();
            assert_eq!(serial, batched, "mismatch for query {}", q.query_id);
        }
    }

    #[test]
    fn single_query_group_takes_fast_path_and_matches_serial() {
        let mut index = Index::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 4);
        index.add(1, (10.0, 10.0), kw(&["voice"]), "a");
        index.add(2, (12.0, 10.0), kw(&["voice", "back"]), "b");

        let q = query(1, (10.0, 10.0), &["voice"], &["back"], 5, 0.5);
        let batch = process_batch_queries(&index, std::slice::from_ref(&q), BatchOptions::default());
        let serial = process_query(&index, &q);
        assert_eq!(batch[0].1, serial);
    }

    #[test]
    fn common_negatives_reject_shared_pool_candidates() {
        let mut index = Index::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 4);
        index.add(1, (1.0, 1.0), kw(&["voice", "spam"]), "a");
        index.add(2, (1.1, 1.1), kw(&["voice"]), "b");

        let queries = vec![
            query(10, (1.0, 1.0), &["voice"], &["spam"], 5, 0.5),
            query(11, (1.0, 1.0), &["voice"], &["spam"], 5, 0.5),
        ];
        let batch = process_batch_queries(&index, &queries, BatchOptions::default());
        for (_, results) in &batch {
            assert!(results.iter().all(|r| r.id != 1));
        }
    }
}
