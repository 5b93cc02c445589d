//! Conversion between persisted [`Region`]s and editor [`Area`]s.

use gardenmap_core::{Point, RegionIdError};
use gardenmap_settings::PathStyle;

use crate::coords::CoordinateSpace;
use crate::geometry;
use crate::model::{Area, AreaId, Region, RegionDto};

/// Builds an area from a stored region, projecting its polygon into
/// `display_space`. Unreadable polygons come through as the fallback shape.
pub fn to_area(region: &Region, display_space: &dyn CoordinateSpace) -> Area {
    let parsed = geometry::parse(region.polygon.as_deref());
    if parsed.is_fallback() {
        tracing::warn!("Region {} ({}) has an unreadable polygon", region.id, region.name);
    }

    let defaults = PathStyle::default();
    Area {
        name: region.name.clone(),
        description: region.description.clone().unwrap_or_default(),
        sector: region.sector.clone(),
        stroke_color: region.stroke_color.clone().unwrap_or(defaults.stroke_color),
        fill_color: region.fill_color.clone().unwrap_or(defaults.fill_color),
        fill_opacity: region.fill_opacity.unwrap_or(defaults.fill_opacity),
        stroke_weight: region.stroke_weight.unwrap_or(defaults.stroke_weight),
        ..Area::new(
            region_id_to_area_id(region.id),
            display_space.to_display(&parsed.points),
        )
    }
}

/// Builds the persist payload for an area.
///
/// `area.points` must already be in storage space; the caller converts with
/// [`CoordinateSpace::to_storage`] first. Centroid and WKT boundary are
/// derived here, never taken from elsewhere.
pub fn to_region_dto(area: &Area) -> RegionDto {
    let centroid = geometry::centroid(&area.points).unwrap_or(Point::new(0.0, 0.0));
    let description = area.description.trim();

    RegionDto {
        name: area.name.clone(),
        description: (!description.is_empty()).then(|| description.to_string()),
        polygon: geometry::serialize(&area.points),
        center_lat: centroid.y,
        center_lng: centroid.x,
        boundary: geometry::serialize_wkt(&area.points),
        sector: area.sector.clone(),
        fill_color: area.fill_color.clone(),
        stroke_color: area.stroke_color.clone(),
        fill_opacity: area.fill_opacity,
        stroke_weight: area.stroke_weight,
    }
}

/// `"region-42"` → `42`. Ephemeral or malformed ids are an error.
pub fn area_id_to_region_id(area_id: &str) -> Result<i64, RegionIdError> {
    area_id.parse::<AreaId>()?.region_id()
}

/// `42` → `region-42`.
pub fn region_id_to_area_id(id: i64) -> AreaId {
    AreaId::Region(id)
}
