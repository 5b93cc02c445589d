//! Coordinate transformation between storage and display spaces.
//!
//! Regions are always stored as geographic `[lat, lng]` pairs. The map shows
//! them either in geographic space (identity) or in planar space, the pixel
//! grid of a schematic reference image. The planar mapping is the same
//! [`LinearProjection`] that places plant markers, so regions and markers stay
//! aligned on the schematic.

use std::fmt;
use std::sync::Arc;

use gardenmap_core::{round_coord, Point};
use gardenmap_settings::{GeoBounds, MapSettings, MapType};

/// Strategy for one display coordinate space.
pub trait CoordinateSpace: fmt::Debug + Send + Sync {
    /// Which map type this space serves.
    fn kind(&self) -> MapType;

    /// Maps one stored point into display coordinates, unrounded.
    fn point_to_display(&self, stored: Point) -> Point;

    /// Maps one display point back into storage coordinates, unrounded.
    fn point_to_storage(&self, display: Point) -> Point;

    /// Maps stored points into display coordinates, rounded to six decimals.
    fn to_display(&self, stored: &[Point]) -> Vec<Point> {
        warn_out_of_range(stored);
        stored
            .iter()
            .map(|p| self.point_to_display(*p).rounded())
            .collect()
    }

    /// Maps display points into storage coordinates, rounded to six decimals.
    fn to_storage(&self, display: &[Point]) -> Vec<Point> {
        display
            .iter()
            .map(|p| self.point_to_storage(*p).rounded())
            .collect()
    }
}

/// Geographic display space: stored coordinates are shown as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeographicSpace;

impl CoordinateSpace for GeographicSpace {
    fn kind(&self) -> MapType {
        MapType::Geographic
    }

    fn point_to_display(&self, stored: Point) -> Point {
        stored
    }

    fn point_to_storage(&self, display: Point) -> Point {
        display
    }
}

/// Linear mapping between geographic bounds and a reference image.
///
/// `y` grows from the image's bottom edge (south) upward, `x` from its left
/// edge (west) rightward. Marker placement calls [`LinearProjection::project`]
/// directly, so every consumer of the schematic shares this one formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearProjection {
    bounds: GeoBounds,
    image_width: f64,
    image_height: f64,
}

impl LinearProjection {
    pub fn new(bounds: GeoBounds, image_width: f64, image_height: f64) -> Self {
        Self {
            bounds,
            image_width,
            image_height,
        }
    }

    pub fn from_settings(map: &MapSettings) -> Self {
        Self::new(map.bounds, map.image_width, map.image_height)
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    /// Geographic `(lat, lng)` to image units.
    pub fn project(&self, lat: f64, lng: f64) -> Point {
        let y = (lat - self.bounds.south) / self.bounds.lat_span() * self.image_height;
        let x = (lng - self.bounds.west) / self.bounds.lng_span() * self.image_width;
        Point::new(y, x)
    }

    /// Image units back to geographic `[lat, lng]`.
    pub fn unproject(&self, planar: Point) -> Point {
        let lat = self.bounds.south + planar.y / self.image_height * self.bounds.lat_span();
        let lng = self.bounds.west + planar.x / self.image_width * self.bounds.lng_span();
        Point::new(lat, lng)
    }

    /// Where a point marker at `(lat, lng)` sits on the schematic.
    pub fn marker_position(&self, lat: f64, lng: f64) -> Point {
        self.project(lat, lng).rounded()
    }
}

/// Planar display space over a schematic reference image.
#[derive(Debug, Clone, Copy)]
pub struct PlanarSpace {
    projection: LinearProjection,
}

impl PlanarSpace {
    pub fn new(projection: LinearProjection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &LinearProjection {
        &self.projection
    }
}

impl CoordinateSpace for PlanarSpace {
    fn kind(&self) -> MapType {
        MapType::Planar
    }

    fn point_to_display(&self, stored: Point) -> Point {
        self.projection.project(stored.y, stored.x)
    }

    fn point_to_storage(&self, display: Point) -> Point {
        self.projection.unproject(display)
    }
}

/// The active display space, selected once from the map settings.
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    space: Arc<dyn CoordinateSpace>,
}

impl CoordinateTransformer {
    /// Picks the strategy matching the configured map type.
    pub fn for_map(map: &MapSettings) -> Self {
        match map.map_type {
            MapType::Geographic => Self::geographic(),
            MapType::Planar => Self::planar(LinearProjection::from_settings(map)),
        }
    }

    pub fn geographic() -> Self {
        Self {
            space: Arc::new(GeographicSpace),
        }
    }

    pub fn planar(projection: LinearProjection) -> Self {
        Self {
            space: Arc::new(PlanarSpace::new(projection)),
        }
    }

    pub fn kind(&self) -> MapType {
        self.space.kind()
    }

    pub fn space(&self) -> &dyn CoordinateSpace {
        self.space.as_ref()
    }

    pub fn to_display(&self, stored: &[Point]) -> Vec<Point> {
        self.space.to_display(stored)
    }

    pub fn to_storage(&self, display: &[Point]) -> Vec<Point> {
        self.space.to_storage(display)
    }
}

fn warn_out_of_range(stored: &[Point]) {
    // Passed through unchanged; see DESIGN.md on clamping.
    if let Some(p) = stored
        .iter()
        .find(|p| !(-90.0..=90.0).contains(&p.y) || !(-180.0..=180.0).contains(&p.x))
    {
        tracing::debug!(
            "Geographic coordinate out of range: [{}, {}]",
            round_coord(p.y),
            round_coord(p.x)
        );
    }
}
