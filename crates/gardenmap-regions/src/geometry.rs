//! Polygon point-list utilities: parsing, validation, centroid, simplification,
//! and serialization to the stored JSON and WKT formats.

use geo::{Contains, Coord, LineString, Polygon, Simplify};

use gardenmap_core::constants::{FALLBACK_POLYGON, MIN_POLYGON_POINTS, SIMPLIFY_THRESHOLD};
use gardenmap_core::{round_coord, GeometryError, Point};

/// Minimum sine of the angle between two edges for them to count as
/// non-collinear. Scale-free, so it works in degrees and pixels alike.
const COLLINEAR_SINE: f64 = 1e-9;

/// Outcome of reading a stored polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPolygon {
    pub points: Vec<Point>,
    /// Set when the stored value was unusable and the fallback shape was used.
    pub fallback_reason: Option<GeometryError>,
}

impl ParsedPolygon {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// The shape substituted for unreadable stored polygons.
pub fn fallback_polygon() -> Vec<Point> {
    FALLBACK_POLYGON.iter().map(|pair| Point::from(*pair)).collect()
}

/// Reads a stored polygon, never failing.
///
/// Missing, malformed, or under-3-point input yields [`fallback_polygon`] and
/// a warning, so one corrupted region cannot break the whole map.
pub fn parse(serialized: Option<&str>) -> ParsedPolygon {
    let result = match serialized {
        Some(raw) if !raw.trim().is_empty() => try_parse(raw),
        _ => Err(GeometryError::Malformed {
            reason: "polygon is missing".to_string(),
        }),
    };

    match result {
        Ok(points) => ParsedPolygon {
            points,
            fallback_reason: None,
        },
        Err(err) => {
            tracing::warn!("Using fallback polygon: {}", err);
            ParsedPolygon {
                points: fallback_polygon(),
                fallback_reason: Some(err),
            }
        }
    }
}

/// Strict variant of [`parse`]: decodes `[[c1, c2], ...]` and requires at
/// least three points.
pub fn try_parse(serialized: &str) -> Result<Vec<Point>, GeometryError> {
    let points: Vec<Point> =
        serde_json::from_str(serialized).map_err(|e| GeometryError::Malformed {
            reason: e.to_string(),
        })?;

    if points.len() < MIN_POLYGON_POINTS {
        return Err(GeometryError::TooFewPoints {
            required: MIN_POLYGON_POINTS,
            actual: points.len(),
        });
    }
    Ok(points)
}

/// Explains why a point list is not a usable polygon.
pub fn check(points: &[Point]) -> Result<(), GeometryError> {
    if points.len() < MIN_POLYGON_POINTS {
        return Err(GeometryError::TooFewPoints {
            required: MIN_POLYGON_POINTS,
            actual: points.len(),
        });
    }

    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite { index });
    }

    let origin = points[0];
    let Some(anchor) = points.iter().find(|p| !p.approx_eq(&origin, 0.0)) else {
        return Err(GeometryError::Degenerate);
    };

    let (ay, ax) = (anchor.y - origin.y, anchor.x - origin.x);
    let anchor_len = (ay * ay + ax * ax).sqrt();

    let spans_area = points.iter().any(|p| {
        let (by, bx) = (p.y - origin.y, p.x - origin.x);
        let len = (by * by + bx * bx).sqrt();
        if len == 0.0 {
            return false;
        }
        let cross = ax * by - ay * bx;
        (cross / (anchor_len * len)).abs() > COLLINEAR_SINE
    });

    if spans_area {
        Ok(())
    } else {
        Err(GeometryError::Degenerate)
    }
}

/// True iff the points form a closed polygon: at least three, not collinear.
pub fn validate(points: &[Point]) -> bool {
    check(points).is_ok()
}

/// Arithmetic mean of the vertices, rounded to six decimals.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_y, sum_x) = points
        .iter()
        .fold((0.0, 0.0), |(sy, sx), p| (sy + p.y, sx + p.x));
    Some(Point::new(round_coord(sum_y / n), round_coord(sum_x / n)))
}

/// Simplifies with the default vertex threshold.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    simplify_with_threshold(points, tolerance, SIMPLIFY_THRESHOLD)
}

/// Ramer-Douglas-Peucker simplification, applied only above `threshold`
/// vertices. Lossy; never returns fewer than three points.
pub fn simplify_with_threshold(points: &[Point], tolerance: f64, threshold: usize) -> Vec<Point> {
    if points.len() <= threshold {
        return points.to_vec();
    }

    let line: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let simplified: Vec<Point> = line
        .simplify(&tolerance)
        .0
        .into_iter()
        .map(|c| Point::new(c.y, c.x))
        .collect();

    if simplified.len() < MIN_POLYGON_POINTS {
        return points.to_vec();
    }
    tracing::debug!(
        "Simplified polygon from {} to {} points",
        points.len(),
        simplified.len()
    );
    simplified
}

/// Stored JSON form: `[[c1, c2], ...]`.
pub fn serialize(points: &[Point]) -> String {
    serde_json::to_string(points).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize polygon: {}", e);
        "[]".to_string()
    })
}

/// WKT form `POLYGON((x1 y1, ..., x1 y1))`, ring always closed.
///
/// WKT lists the horizontal axis first, so a `[lat, lng]` vertex is written
/// as `lng lat`.
pub fn serialize_wkt(points: &[Point]) -> String {
    let mut ring: Vec<String> = points.iter().map(|p| format!("{} {}", p.x, p.y)).collect();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if first != last {
            ring.push(format!("{} {}", first.x, first.y));
        }
    }
    format!("POLYGON(({}))", ring.join(", "))
}

/// Bounding box as `(min, max)` corners.
pub fn bounds(points: &[Point]) -> Option<(Point, Point)> {
    let first = points.first()?;
    let init = (*first, *first);
    Some(points.iter().fold(init, |(min, max), p| {
        (
            Point::new(min.y.min(p.y), min.x.min(p.x)),
            Point::new(max.y.max(p.y), max.x.max(p.x)),
        )
    }))
}

/// Shifts every point, rounding to six decimals.
pub fn translate(points: &[Point], dy: f64, dx: f64) -> Vec<Point> {
    points.iter().map(|p| p.offset(dy, dx).rounded()).collect()
}

/// True when `target` lies strictly inside the polygon.
pub fn contains(points: &[Point], target: &Point) -> bool {
    if points.len() < MIN_POLYGON_POINTS {
        return false;
    }
    let ring: LineString<f64> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    let polygon = Polygon::new(ring, vec![]);
    polygon.contains(&geo::Point::new(target.x, target.y))
}
