//! Top-k spatial-keyword search over a static, geo-tagged text corpus.
//!
//! Given a query point, positive and negative keyword predicates, a
//! result count `k`, and a spatial/textual blend `lambda_factor`, this
//! crate ranks a quadtree-indexed corpus and returns the `k` best
//! matches. A [`batch`] engine amortises candidate retrieval across
//! workloads of many queries that are close in space and share keywords.
//!
//! ```rust
//! use spatiokw::{Index, Rectangle, SpatialQuery, process_query};
//!
//! let mut index = Index::with_default_capacity(Rectangle::new(0.0, 0.0, 200.0, 200.0));
//! index.add(1, (10.0, 10.0), vec!["voice".to_string()], "a cozy diner");
//! index.add(2, (12.0, 10.0), vec!["voice".to_string(), "back".to_string()], "a loud bar");
//!
//! let query = SpatialQuery::new(
//!     1,
//!     (10.0, 10.0),
//!     vec!["voice".to_string()],
//!     vec!["back".to_string()],
//!     2,
//!     0.5,
//! )?;
//! let results = process_query(&index, &query);
//! assert_eq!(results[0].id, 1);
//! # Ok::<(), spatiokw::SpatioError>(())
//! ```

pub mod batch;
#[cfg(feature = "csv")]
pub mod csv_support;
pub mod error;
pub mod geometry;
pub mod index;
pub mod object;
pub mod query;
pub mod quadtree;
pub mod scorer;
mod timestamp;

pub use batch::{process_batch_queries, BatchOptions};
pub use error::{Result, SpatioError};
pub use geometry::{Location, Rectangle};
pub use index::{Index, IndexMetadata, DEFAULT_RADIUS};
pub use object::GeoObject;
pub use quadtree::{DEFAULT_CAPACITY, SUBDIVISION_FLOOR};
pub use query::{process_query, QueryResult, SpatialQuery};

#[cfg(feature = "csv")]
pub use csv_support::{parse_keyword_list, GeoObjectSource};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for callers building an index and running queries.
pub mod prelude {
    pub use crate::{
        process_batch_queries, process_query, BatchOptions, GeoObject, Index, Location, Rectangle,
        Result, SpatialQuery, SpatioError,
    };
}
