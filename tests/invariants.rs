//! Structural invariants that span the index and quadtree together
//! (unit tests in each module cover the narrower cases).

use rustc_hash::FxHashSet;
use spatiokw::{Index, Rectangle};

fn kw(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn every_inserted_id_is_reachable_through_a_full_range_query() {
    let mut index = Index::new(Rectangle::new(0.0, 0.0, 300.0, 300.0), 3);
    let mut expected = FxHashSet::default();
    for i in 0..500u64 {
        let loc = ((i % 300) as f64, ((i * 7) % 300) as f64);
        index.add(i, loc, kw(&["x"]), format!("o{i}"));
        expected.insert(i);
    }

    let found: FxHashSet<u64> = index.query_range(&index.bounds()).into_iter().collect();
    assert_eq!(found, expected);
}

#[test]
fn query_range_results_all_lie_within_the_rectangle() {
    let mut index = Index::new(Rectangle::new(0.0, 0.0, 300.0, 300.0), 3);
    for i in 0..200u64 {
        let loc = ((i % 300) as f64, ((i * 11) % 300) as f64);
        index.add(i, loc, kw(&["x"]), format!("o{i}"));
    }

    let rect = Rectangle::new(50.0, 50.0, 150.0, 150.0);
    for id in index.query_range(&rect) {
        let object = index.get(id).unwrap();
        assert!(rect.contains(object.location));
    }
}

#[test]
fn point_on_universe_boundary_is_accepted_point_outside_is_rejected() {
    let mut index = Index::new(Rectangle::new(0.0, 0.0, 100.0, 100.0), 4);
    index.add(1, (0.0, 0.0), kw(&["x"]), "corner");
    index.add(2, (100.0, 100.0), kw(&["x"]), "far corner");
    index.add(3, (100.0001, 50.0), kw(&["x"]), "just outside");

    assert_eq!(index.len(), 2);
    assert!(index.get(1).is_some());
    assert!(index.get(2).is_some());
    assert!(index.get(3).is_none());
}

#[test]
fn k_larger_than_candidate_count_returns_the_whole_candidate_set() {
    use spatiokw::{process_query, SpatialQuery};

    let mut index = Index::new(Rectangle::new(0.0, 0.0, 200.0, 200.0), 4);
    for i in 0..4u64 {
        index.add(i, (i as f64, i as f64), kw(&["food"]), format!("o{i}"));
    }
    let query = SpatialQuery::new(1, (0.0, 0.0), kw(&["food"]), kw(&[]), 1000, 0.5).unwrap();
    assert_eq!(process_query(&index, &query).len(), 4);
}

#[test]
fn range_query_prunes_a_distant_object_by_default_radius() {
    use spatiokw::DEFAULT_RADIUS;

    let mut index = Index::new(Rectangle::new(0.0, 0.0, 300.0, 300.0), 4);
    index.add(1, (100.0, 100.0), kw(&["x"]), "far");

    let empty: FxHashSet<String> = FxHashSet::default();
    let positive: FxHashSet<String> = kw(&["x"]).into_iter().collect();
    assert!(index
        .get_candidates((0.0, 0.0), &positive, &empty, DEFAULT_RADIUS)
        .is_empty());
    assert_eq!(
        index
            .get_candidates((0.0, 0.0), &positive, &empty, 200.0)
            .into_iter()
            .collect::<Vec<_>>(),
        vec![1]
    );
}
