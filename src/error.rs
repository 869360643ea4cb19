//! Error taxonomy for index construction, persistence, and querying.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SpatioError>;

/// Everything that can go wrong building, persisting, or querying an index.
#[derive(Debug, thiserror::Error)]
pub enum SpatioError {
    /// An insert landed outside the index's universe bounds.
    ///
    /// Returned by [`crate::Index::try_add`] for callers that want to
    /// handle an out-of-bounds record themselves; [`crate::Index::add`]
    /// instead logs and drops it.
    #[error("location ({lat}, {lon}) is outside index bounds")]
    OutOfBounds { lat: f64, lon: f64 },

    /// `load` was pointed at a directory with no `metadata.json`.
    #[error("no index found at {0}: missing metadata.json")]
    IndexNotFound(PathBuf),

    /// `load` found files but could not make sense of their contents.
    #[error("index at {0} is corrupt: {1}")]
    IndexCorrupt(PathBuf, String),

    /// A query was malformed: `k < 1`, `lambda` outside `[0, 1]`, etc.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Filesystem I/O failed during `save` or `load`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `metadata.json` could not be parsed or serialized.
    #[error("metadata (de)serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A binary snapshot file could not be encoded or decoded.
    #[cfg(feature = "snapshot")]
    #[error("snapshot (de)serialization failed: {0}")]
    Snapshot(#[from] bincode::Error),
}
