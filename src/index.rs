//! Spatial-textual index: quadtree + object table + persistence.

use std::fs;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatioError};
use crate::geometry::{Location, Rectangle};
use crate::object::GeoObject;
use crate::quadtree::{QuadNode, DEFAULT_CAPACITY};
use crate::timestamp::now_iso8601;

/// Default side of the square used by [`Index::get_candidates`] (the
/// square spans `2 * radius`; a square rather than a circle keeps the
/// candidate boundary cheap to test and consistent with the scorer's
/// own axis-aligned distance).
pub const DEFAULT_RADIUS: f64 = 10.0;

/// The `metadata.json` sidecar: created/updated timestamps, the universe
/// bounds, and the object count at save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub created_at: String,
    pub updated_at: String,
    pub bounds: Rectangle,
    pub total_objects: usize,
}

/// Owns every [`QuadNode`] and [`GeoObject`] in the corpus.
///
/// Leaves hold only ids; every lookup that needs a location, keyword set,
/// or payload resolves it through `objects`, so the tree and the table can
/// never disagree about an object's content (only about which leaf thinks
/// it owns a stale id — see [`Index::add`] for the reinsertion policy).
pub struct Index {
    root: QuadNode,
    bounds: Rectangle,
    capacity: usize,
    objects: FxHashMap<u64, GeoObject>,
    metadata: IndexMetadata,
}

impl Index {
    /// Build an empty index over `bounds` with the given per-leaf `capacity`.
    pub fn new(bounds: Rectangle, capacity: usize) -> Self {
        let now = now_iso8601();
        Self {
            root: QuadNode::new(bounds, capacity),
            bounds,
            capacity,
            objects: FxHashMap::default(),
            metadata: IndexMetadata {
                created_at: now.clone(),
                updated_at: now,
                bounds,
                total_objects: 0,
            },
        }
    }

    /// Build an empty index over `bounds` with [`crate::quadtree::DEFAULT_CAPACITY`].
    pub fn with_default_capacity(bounds: Rectangle) -> Self {
        Self::new(bounds, DEFAULT_CAPACITY)
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Look up an object's authoritative record by id.
    pub fn get(&self, id: u64) -> Option<&GeoObject> {
        self.objects.get(&id)
    }

    /// Insert one object. Silently dropped (logged at `warn`) if
    /// `location` falls outside `bounds`: ingest errors are logged and
    /// skipped, not surfaced, so a bulk load isn't aborted by one bad row.
    ///
    /// Re-inserting an id already present **overwrites** the record in
    /// `objects` (the authoritative table). The quadtree leaf that held
    /// the previous id is left untouched — a second id-tagged slot now
    /// points at the same (updated) record — because removing a single id
    /// from a leaf's position would require tracking leaf identity per
    /// id, which this tree does not do. `query_range` naturally dedupes
    /// through the id set returned to callers, and `get_candidates`
    /// dedupes its output by construction (`FxHashSet<u64>`), so the
    /// stale duplicate entry never produces a duplicate result or a view
    /// of the old record. See DESIGN.md for the full rationale behind
    /// this choice over relocating the id within the tree.
    pub fn add(
        &mut self,
        id: u64,
        location: Location,
        keywords: impl IntoIterator<Item = String>,
        full_text: impl Into<String>,
    ) {
        if let Err(err) = self.try_add(id, location, keywords, full_text) {
            log::warn!("add: {err}; dropped");
        }
    }

    /// Checked form of [`Index::add`]: returns
    /// [`SpatioError::OutOfBounds`] instead of logging and dropping the
    /// record when `location` falls outside `bounds`.
    pub fn try_add(
        &mut self,
        id: u64,
        location: Location,
        keywords: impl IntoIterator<Item = String>,
        full_text: impl Into<String>,
    ) -> Result<()> {
        if !self.bounds.contains(location) {
            let (lat, lon) = location;
            return Err(SpatioError::OutOfBounds { lat, lon });
        }
        let object = GeoObject::new(id, location, keywords, full_text);
        // Insert into the object table first so `locate` (used to
        // redistribute a leaf's contents on subdivision) can resolve
        // every id, including the one being inserted right now, with a
        // single lookup.
        self.objects.insert(id, object);
        let locate = |lookup_id: u64| -> Location {
            self.objects
                .get(&lookup_id)
                .map(|o| o.location)
                .unwrap_or(location)
        };
        self.root.insert(id, location, &locate);
        self.metadata.total_objects = self.objects.len();
        self.metadata.updated_at = now_iso8601();
        Ok(())
    }

    /// Insert many objects, sorted by `(lat, lon)` first so the tree is
    /// built with spatial locality — observably identical to calling
    /// [`Index::add`] in a loop (out-of-bounds records are still dropped
    /// and logged the same way), just faster to build.
    pub fn add_batch(
        &mut self,
        records: impl IntoIterator<Item = (u64, Location, Vec<String>, String)>,
    ) {
        let mut records: Vec<_> = records.into_iter().collect();
        records.sort_by(|a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
        });
        for (id, location, keywords, full_text) in records {
            self.add(id, location, keywords, full_text);
        }
    }

    /// Candidate ids inside the axis-aligned square `[location ± radius]`
    /// whose keywords intersect `positive` and do not intersect
    /// `negative`.
    pub fn get_candidates(
        &self,
        location: Location,
        positive: &FxHashSet<String>,
        negative: &FxHashSet<String>,
        radius: f64,
    ) -> FxHashSet<u64> {
        let rect = Rectangle::square(location, radius);
        let mut ids = Vec::new();
        let locate = |id: u64| -> Location {
            self.objects.get(&id).map(|o| o.location).unwrap_or(location)
        };
        self.root.query_range(&rect, &locate, &mut ids);

        ids.into_iter()
            .filter(|id| {
                self.objects.get(id).is_some_and(|object| {
                    object.matches_any(positive) && !object.matches_any(negative)
                })
            })
            .collect()
    }

    /// All ids whose location lies inside `rect`, with no keyword
    /// filtering — the raw range query the batch engine uses to build a
    /// shared candidate pool across many queries at once. Deduped: a
    /// reinserted id that moved location (see [`Index::add`]) can leave
    /// two leaf slots behind, but it is still one authoritative object.
    pub fn query_range(&self, rect: &Rectangle) -> Vec<u64> {
        let mut out = Vec::new();
        let locate = |id: u64| -> Location {
            self.objects
                .get(&id)
                .map(|o| o.location)
                .unwrap_or((f64::NAN, f64::NAN))
        };
        self.root.query_range(rect, &locate, &mut out);
        let deduped: FxHashSet<u64> = out.into_iter().collect();
        deduped.into_iter().collect()
    }

    /// Write `metadata.json`, `objects.bin`, and `spatial_index.bin` into
    /// `directory` (created if missing).
    #[cfg(feature = "snapshot")]
    pub fn save(&self, directory: impl AsRef<Path>) -> Result<()> {
        let dir = directory.as_ref();
        fs::create_dir_all(dir)?;

        let metadata_path = dir.join("metadata.json");
        let metadata_json = serde_json::to_vec_pretty(&self.metadata)?;
        fs::write(metadata_path, metadata_json)?;

        let objects_bytes = bincode::serialize(&self.objects)?;
        fs::write(dir.join("objects.bin"), objects_bytes)?;

        let index_bytes = bincode::serialize(&self.root)?;
        fs::write(dir.join("spatial_index.bin"), index_bytes)?;

        Ok(())
    }

    /// Inverse of [`Index::save`]. Fails with [`SpatioError::IndexNotFound`]
    /// if `metadata.json` is absent, or [`SpatioError::IndexCorrupt`] if the
    /// binary dumps don't decode.
    #[cfg(feature = "snapshot")]
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        let dir = directory.as_ref();
        let metadata_path = dir.join("metadata.json");
        if !metadata_path.exists() {
            return Err(SpatioError::IndexNotFound(dir.to_path_buf()));
        }
        let metadata_json = fs::read(&metadata_path)?;
        let metadata: IndexMetadata = serde_json::from_slice(&metadata_json)?;

        let objects_path = dir.join("objects.bin");
        let objects_bytes = fs::read(&objects_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpatioError::IndexCorrupt(dir.to_path_buf(), "missing objects.bin".to_string())
            } else {
                SpatioError::Io(e)
            }
        })?;
        let objects: FxHashMap<u64, GeoObject> = bincode::deserialize(&objects_bytes)
            .map_err(|e| SpatioError::IndexCorrupt(dir.to_path_buf(), e.to_string()))?;

        let index_path = dir.join("spatial_index.bin");
        let index_bytes = fs::read(&index_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpatioError::IndexCorrupt(dir.to_path_buf(), "missing spatial_index.bin".to_string())
            } else {
                SpatioError::Io(e)
            }
        })?;
        let root: QuadNode = bincode::deserialize(&index_bytes)
            .map_err(|e| SpatioError::IndexCorrupt(dir.to_path_buf(), e.to_string()))?;

        let bounds = metadata.bounds;
        let capacity = root.capacity();
        Ok(Self {
            root,
            bounds,
            capacity,
            objects,
            metadata,
        })
    }
}
