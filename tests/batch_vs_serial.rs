//! Batch and single-query resolution must agree: grouping queries for
//! shared candidate retrieval must never change any individual query's
//! ranked output.

use spatiokw::{process_batch_queries, process_query, BatchOptions, Index, Rectangle, SpatialQuery};

fn kw(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn corpus(n: u64) -> Index {
    let mut index = Index::new(Rectangle::new(0.0, 0.0, 1000.0, 1000.0), 16);
    for i in 0..n {
        // A deterministic pseudo-random spread, no RNG crate needed.
        let lat = ((i.wrapping_mul(2654435761)) % 1000) as f64;
        let lon = ((i.wrapping_mul(40503)) % 1000) as f64;
        let terms: &[&str] = match i % 5 {
            0 => &["voice", "food", "quiet"],
            1 => &["back", "food"],
            2 => &["voice"],
            3 => &["food", "quiet"],
            _ => &["back", "voice"],
        };
        index.add(i, (lat, lon), kw(terms), format!("object {i}"));
    }
    index
}

fn twenty_queries() -> Vec<SpatialQuery> {
    (0..20u64)
        .map(|i| {
            let loc = ((i * 47) % 1000) as f64;
            let lambda = (i as f64 % 5.0) / 4.0;
            let positive: &[&str] = match i % 3 {
                0 => &["voice"],
                1 => &["food", "quiet"],
                _ => &["back"],
            };
            let negative: &[&str] = if i % 4 == 0 { &["quiet"] } else { &[] };
            SpatialQuery::new(i, (loc, loc), kw(positive), kw(negative), 3 + (i as usize % 4), lambda)
                .unwrap()
        })
        .collect()
}

#[test]
fn process_batch_queries_equals_per_query_process_query() {
    let index = corpus(1000);
    let queries = twenty_queries();

    let batch = process_batch_queries(&index, &queries, BatchOptions::default());
    assert_eq!(batch.len(), queries.len());

    for query in &queries {
        let serial = process_query(&index, query);
        let (_, batched) = batch
            .iter()
            .find(|(id, _)| *id == query.query_id)
            .expect("every query_id must appear in batch output");
        assert_eq!(&serial, batched, "query {} diverged", query.query_id);
    }
}

#[test]
fn single_element_batch_equals_direct_resolution() {
    let index = corpus(200);
    let query = SpatialQuery::new(0, (10.0, 10.0), kw(&["voice"]), kw(&[]), 5, 0.6).unwrap();
    let batch = process_batch_queries(&index, std::slice::from_ref(&query), BatchOptions::default());
    let serial = process_query(&index, &query);
    assert_eq!(batch[0].1, serial);
}

#[test]
fn large_workload_uses_agglomerative_clustering_and_still_matches_serial() {
    // > 25 queries forces the complete-linkage clustering path.
    let index = corpus(500);
    let queries: Vec<SpatialQuery> = (0..40u64)
        .map(|i| {
            let loc = ((i * 13) % 500) as f64;
            SpatialQuery::new(i, (loc, loc), kw(&["voice", "food"]), kw(&[]), 4, 0.5).unwrap()
        })
        .collect();

    let batch = process_batch_queries(&index, &queries, BatchOptions::default());
    for query in &queries {
        let serial = process_query(&index, query);
        let (_, batched) = batch.iter().find(|(id, _)| *id == query.query_id).unwrap();
        assert_eq!(&serial, batched);
    }
}
