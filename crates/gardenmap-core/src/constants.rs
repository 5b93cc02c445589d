//! Shared constants for geometry, rendering, and interaction.

/// Rounding scale: every stored or displayed coordinate keeps six decimals.
pub const COORD_SCALE: f64 = 1_000_000.0;

/// Tolerance used when comparing coordinates after a transform round trip.
pub const COORD_EPSILON: f64 = 1e-6;

/// Minimum number of vertices for a closed polygon.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Vertex count above which polygons are simplified before rendering.
pub const SIMPLIFY_THRESHOLD: usize = 100;

/// Default Ramer-Douglas-Peucker tolerance, in display units.
pub const SIMPLIFY_TOLERANCE: f64 = 0.00001;

/// Pointer movement per step (in container pixels) ignored as jitter.
pub const DRAG_THRESHOLD_PX: f64 = 2.0;

/// Shape substituted when a stored polygon cannot be read.
///
/// A small square near the null island, in `[lat, lng]` order, so a broken
/// record stays visible and selectable instead of taking the map down.
pub const FALLBACK_POLYGON: [[f64; 2]; 4] = [
    [0.0, 0.0],
    [0.0, 0.001],
    [0.001, 0.001],
    [0.001, 0.0],
];

/// Prefix of area ids derived from a persisted region.
pub const REGION_ID_PREFIX: &str = "region-";

/// Prefix of area ids allocated locally before the server assigns one.
pub const EPHEMERAL_ID_PREFIX: &str = "area-";

/// Default stroke colour for region outlines.
pub const DEFAULT_STROKE_COLOR: &str = "#2e7d32";

/// Default fill colour for region interiors.
pub const DEFAULT_FILL_COLOR: &str = "#66bb6a";

/// Default fill opacity.
pub const DEFAULT_FILL_OPACITY: f64 = 0.2;

/// Default stroke weight in pixels.
pub const DEFAULT_STROKE_WEIGHT: f64 = 2.0;
