//! Axis-aligned geometry over (lat, lon) coordinates.
//!
//! Coordinates are plain `f64` pairs rather than a general-purpose
//! projection type: the scorer operates directly on raw lat/lon deltas
//! (see [`crate::scorer`]), so there is no great-circle math anywhere in
//! this crate for a `geo::Point` abstraction to earn its keep.

use serde::{Deserialize, Serialize};

/// A query or object location, `(lat, lon)`.
pub type Location = (f64, f64);

/// A plain `[min_lat, min_lon, max_lat, max_lon]` array — the wire shape
/// pinned for `metadata.json`'s `bounds` field. [`Rectangle`] (de)serializes
/// through this rather than as a four-field struct so the persisted JSON
/// matches the external interface exactly.
type RectangleArray = [f64; 4];

/// Plain Euclidean distance between two locations — no great-circle
/// correction, taken directly on raw `(lat, lon)` deltas (see
/// [`crate::scorer`] and the batch engine's spatial clustering, both of
/// which share this notion of "distance").
pub fn distance(a: Location, b: Location) -> f64 {
    let dlat = a.0 - b.0;
    let dlon = a.1 - b.1;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// An axis-aligned rectangle, closed on all sides.
///
/// Invariant: `min_lat <= max_lat` and `min_lon <= max_lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "RectangleArray", from = "RectangleArray")]
pub struct Rectangle {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl From<Rectangle> for RectangleArray {
    fn from(r: Rectangle) -> Self {
        [r.min_lat, r.min_lon, r.max_lat, r.max_lon]
    }
}

impl From<RectangleArray> for Rectangle {
    fn from([min_lat, min_lon, max_lat, max_lon]: RectangleArray) -> Self {
        Rectangle::new(min_lat, min_lon, max_lat, max_lon)
    }
}

impl Rectangle {
    /// Build a rectangle from its four bounds, swapping min/max if given
    /// out of order so the invariant always holds.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat: min_lat.min(max_lat),
            min_lon: min_lon.min(max_lon),
            max_lat: min_lat.max(max_lat),
            max_lon: min_lon.max(max_lon),
        }
    }

    /// The square `[lat - radius, lon - radius] .. [lat + radius, lon + radius]`
    /// used by `get_candidates` — a square, not a circle, keeping the
    /// candidate boundary cheap to compute and test.
    pub fn square(center: Location, radius: f64) -> Self {
        let (lat, lon) = center;
        Self::new(lat - radius, lon - radius, lat + radius, lon + radius)
    }

    /// Midpoints used to subdivide this rectangle into four quadrants.
    pub fn midpoint(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Shorter of the two sides, used against the subdivision floor.
    pub fn shorter_side(&self) -> f64 {
        (self.max_lat - self.min_lat).min(self.max_lon - self.min_lon)
    }

    /// Whether `point` lies inside this rectangle (closed on all sides).
    pub fn contains(&self, point: Location) -> bool {
        let (lat, lon) = point;
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Whether this rectangle and `other` share any point.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(other.max_lat < self.min_lat
            || other.min_lat > self.max_lat
            || other.max_lon < self.min_lon
            || other.min_lon > self.max_lon)
    }

    /// Expand every side by `margin` (may be negative to shrink).
    pub fn expanded(&self, margin: f64) -> Rectangle {
        Rectangle::new(
            self.min_lat - margin,
            self.min_lon - margin,
            self.max_lat + margin,
            self.max_lon + margin,
        )
    }

    /// The smallest rectangle containing every point in `locations`.
    ///
    /// Panics if `locations` is empty; callers only invoke this for
    /// non-empty query groups.
    pub(crate) fn bounding(locations: impl IntoIterator<Item = Location>) -> Rectangle {
        let mut iter = locations.into_iter();
        let (lat0, lon0) = iter.next().expect("bounding() requires at least one point");
        let mut rect = Rectangle::new(lat0, lon0, lat0, lon0);
        for (lat, lon) in iter {
            rect.min_lat = rect.min_lat.min(lat);
            rect.min_lon = rect.min_lon.min(lon);
            rect.max_lat = rect.max_lat.max(lat);
            rect.max_lon = rect.max_lon.max(lon);
        }
        rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_closed_on_all_sides() {
        let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains((0.0, 0.0)));
        assert!(r.contains((10.0, 10.0)));
        assert!(!r.contains((10.0001, 5.0)));
    }

    #[test]
    fn intersects_detects_disjoint_rectangles() {
        let a = Rectangle::new(0.0, 0.0, 1.0, 1.0);
        let b = Rectangle::new(2.0, 2.0, 3.0, 3.0);
        assert!(!a.intersects(&b));
        let c = Rectangle::new(0.5, 0.5, 1.5, 1.5);
        assert!(a.intersects(&c));
    }

    #[test]
    fn midpoint_bisects_bounds() {
        let r = Rectangle::new(0.0, 0.0, 200.0, 200.0);
        assert_eq!(r.midpoint(), (100.0, 100.0));
    }

    #[test]
    fn bounding_covers_all_points() {
        let r = Rectangle::bounding([(1.0, 1.0), (-2.0, 5.0), (3.0, -1.0)]);
        assert_eq!(r, Rectangle::new(-2.0, -1.0, 3.0, 5.0));
    }
}
