//! Coordinate pair shared by storage and display spaces.
//!
//! A point is persisted as a two-element JSON array `[c1, c2]`. In geographic
//! space that is `[lat, lng]`; in planar space it is `[y, x]` in image units.
//! Either way `y` is the first element (vertical axis) and `x` the second
//! (horizontal axis), which keeps viewport math identical for both spaces.

use serde::{Deserialize, Serialize};

use crate::constants::COORD_SCALE;

/// A single polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    /// Vertical coordinate (latitude, or image row measured upward).
    pub y: f64,
    /// Horizontal coordinate (longitude, or image column).
    pub x: f64,
}

impl Point {
    /// Creates a point from its `[c1, c2]` components.
    pub fn new(y: f64, x: f64) -> Self {
        Self { y, x }
    }

    /// Returns the point as a `[c1, c2]` pair.
    pub fn to_pair(self) -> [f64; 2] {
        [self.y, self.x]
    }

    /// Returns this point with both components rounded to six decimals.
    pub fn rounded(self) -> Self {
        Self::new(round_coord(self.y), round_coord(self.x))
    }

    /// Returns this point shifted by the given offsets.
    pub fn offset(self, dy: f64, dx: f64) -> Self {
        Self::new(self.y + dy, self.x + dx)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True when both components are within `epsilon` of `other`.
    pub fn approx_eq(&self, other: &Point, epsilon: f64) -> bool {
        (self.y - other.y).abs() <= epsilon && (self.x - other.x).abs() <= epsilon
    }

    pub fn is_finite(&self) -> bool {
        self.y.is_finite() && self.x.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        p.to_pair()
    }
}

/// Rounds a coordinate to six decimal places.
///
/// Applied after every transform so repeated edit/save cycles do not drift.
pub fn round_coord(value: f64) -> f64 {
    let rounded = (value * COORD_SCALE).round() / COORD_SCALE;
    // Normalise -0.0 so serialized output stays stable.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rounds every point in a list.
pub fn round_points(points: &[Point]) -> Vec<Point> {
    points.iter().map(|p| p.rounded()).collect()
}
