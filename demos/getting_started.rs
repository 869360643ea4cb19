//! Getting Started - building an index and running single queries.
//!
//! Demonstrates:
//! - building an [`Index`] over a bounding box
//! - ingesting objects one at a time and via `add_batch`
//! - running a top-k query with a positive/negative keyword predicate
//! - saving and reloading the index

use spatiokw::{process_query, Index, Rectangle, Result, SpatialQuery};

fn main() -> Result<()> {
    println!("spatiokw: getting started");
    println!("==========================\n");

    demonstrate_single_inserts()?;
    demonstrate_batch_insert_and_query()?;
    demonstrate_save_and_load()?;

    println!("\nDone.");
    Ok(())
}

fn demonstrate_single_inserts() -> Result<()> {
    println!("1. Single inserts and a negative-keyword query");
    println!("-----------------------------------------------");

    let mut index = Index::with_default_capacity(Rectangle::new(0.0, 0.0, 200.0, 200.0));
    index.add(1, (10.0, 10.0), vec!["voice".to_string()], "a cozy diner");
    index.add(
        2,
        (12.0, 10.0),
        vec!["voice".to_string(), "back".to_string()],
        "a loud bar with back-alley access",
    );
    index.add(3, (50.0, 50.0), vec!["voice".to_string()], "a quiet cafe across town");

    let query = SpatialQuery::new(
        1,
        (10.0, 10.0),
        vec!["voice".to_string()],
        vec!["back".to_string()],
        2,
        0.5,
    )?;
    for result in process_query(&index, &query) {
        println!(
            "  #{} score={:.4} \"{}\"",
            result.id, result.score, result.full_text
        );
    }
    println!();
    Ok(())
}

fn demonstrate_batch_insert_and_query() -> Result<()> {
    println!("2. Batch insert over a larger corpus");
    println!("-------------------------------------");

    let mut index = Index::with_default_capacity(Rectangle::new(0.0, 0.0, 500.0, 500.0));
    let records = (0..2_000u64).map(|i| {
        let lat = (i % 500) as f64;
        let lon = ((i * 7) % 500) as f64;
        let keywords = if i % 3 == 0 {
            vec!["food".to_string(), "quiet".to_string()]
        } else {
            vec!["food".to_string()]
        };
        (i, (lat, lon), keywords, format!("listing #{i}"))
    });
    index.add_batch(records);
    println!("  indexed {} objects", index.len());

    let query = SpatialQuery::new(
        1,
        (250.0, 250.0),
        vec!["food".to_string(), "quiet".to_string()],
        vec![],
        5,
        0.7,
    )?;
    let results = process_query(&index, &query);
    println!("  top-{} results near (250, 250):", results.len());
    for result in &results {
        println!("    #{} score={:.4}", result.id, result.score);
    }
    println!();
    Ok(())
}

fn demonstrate_save_and_load() -> Result<()> {
    println!("3. Save and reload");
    println!("-------------------");

    let mut index = Index::with_default_capacity(Rectangle::new(0.0, 0.0, 200.0, 200.0));
    index.add(1, (10.0, 10.0), vec!["voice".to_string()], "a");
    index.add(2, (12.0, 10.0), vec!["voice".to_string()], "b");

    let dir = std::env::temp_dir().join("spatiokw-getting-started-demo");
    index.save(&dir)?;
    println!("  saved {} objects to {:?}", index.len(), dir);

    let loaded = Index::load(&dir)?;
    println!("  reloaded {} objects", loaded.len());
    std::fs::remove_dir_all(&dir).ok();

    Ok(())
}
