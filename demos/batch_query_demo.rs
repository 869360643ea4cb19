//! Batch Query Demo - amortising candidate retrieval across a workload.
//!
//! Demonstrates:
//! - building a workload of many queries clustered in space and keywords
//! - resolving them with [`process_batch_queries`] in one call
//! - confirming batch resolution agrees with per-query [`process_query`]

use spatiokw::{process_batch_queries, process_query, BatchOptions, Index, Rectangle, SpatialQuery};
use std::time::Instant;

fn main() -> spatiokw::Result<()> {
    println!("spatiokw: batch query demo");
    println!("===========================\n");

    let index = build_corpus(50_000);
    println!("indexed {} objects\n", index.len());

    let queries = build_workload(60);
    println!("workload: {} queries\n", queries.len());

    let start = Instant::now();
    let serial: Vec<_> = queries.iter().map(|q| process_query(&index, q)).collect();
    let serial_elapsed = start.elapsed();

    let start = Instant::now();
    let batch = process_batch_queries(&index, &queries, BatchOptions::default());
    let batch_elapsed = start.elapsed();

    let mut mismatches = 0;
    for (query, serial_results) in queries.iter().zip(serial.iter()) {
        let (_, batch_results) = batch
            .iter()
            .find(|(id, _)| *id == query.query_id)
            .expect("every query_id appears in the batch output");
        if batch_results != serial_results {
            mismatches += 1;
        }
    }

    println!("serial total:  {serial_elapsed:?}");
    println!("batch total:   {batch_elapsed:?}");
    println!("mismatches between batch and serial resolution: {mismatches}");

    Ok(())
}

fn build_corpus(n: u64) -> Index {
    let mut index = Index::with_default_capacity(Rectangle::new(0.0, 0.0, 1000.0, 1000.0));
    let records = (0..n).map(|i| {
        let lat = ((i.wrapping_mul(2654435761)) % 1000) as f64;
        let lon = ((i.wrapping_mul(40503)) % 1000) as f64;
        let keywords = match i % 4 {
            0 => vec!["voice".to_string(), "food".to_string()],
            1 => vec!["back".to_string()],
            2 => vec!["quiet".to_string(), "food".to_string()],
            _ => vec!["voice".to_string()],
        };
        (i, (lat, lon), keywords, format!("object {i}"))
    });
    index.add_batch(records);
    index
}

/// Three spatial clusters, each internally split by keyword similarity,
/// so the batch engine has real grouping work to do.
fn build_workload(n: u64) -> Vec<SpatialQuery> {
    let centers = [(100.0, 100.0), (500.0, 500.0), (900.0, 900.0)];
    (0..n)
        .map(|i| {
            let (clat, clon) = centers[(i as usize) % centers.len()];
            let jitter = (i % 5) as f64;
            let positive = if i % 2 == 0 {
                vec!["voice".to_string(), "food".to_string()]
            } else {
                vec!["quiet".to_string(), "food".to_string()]
            };
            SpatialQuery::new(
                i,
                (clat + jitter, clon + jitter),
                positive,
                vec![],
                8,
                0.5,
            )
            .unwrap()
        })
        .collect()
}
