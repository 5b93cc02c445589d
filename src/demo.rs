//! Headless walk through the editor: load, draw, name, edit, persist.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use gardenmap_core::Point;
use gardenmap_regions::{
    geometry, Confirmation, ContainerId, DrawingSession, EditedShape, InMemoryRegionGateway,
    InteractionMode, Region,
};
use gardenmap_settings::EditorConfig;

use crate::types::SessionSummary;

/// Fraction of the configured bounds, as a storage-space `[lat, lng]`.
fn inside(config: &EditorConfig, lat_frac: f64, lng_frac: f64) -> Point {
    let b = &config.map.bounds;
    Point::new(
        b.south + b.lat_span() * lat_frac,
        b.west + b.lng_span() * lng_frac,
    )
    .rounded()
}

fn seed_region(config: &EditorConfig) -> Region {
    let polygon = vec![
        inside(config, 0.1, 0.1),
        inside(config, 0.1, 0.4),
        inside(config, 0.4, 0.4),
        inside(config, 0.4, 0.1),
    ];
    let center = geometry::centroid(&polygon).unwrap_or(polygon[0]);
    Region {
        id: 1,
        name: "Rose Garden".to_string(),
        description: Some("Heritage roses".to_string()),
        polygon: Some(geometry::serialize(&polygon)),
        center_lat: center.y,
        center_lng: center.x,
        boundary: Some(geometry::serialize_wkt(&polygon)),
        sector: Some("North".to_string()),
        fill_color: None,
        stroke_color: None,
        fill_opacity: None,
        stroke_weight: None,
        specimen_count: 120,
        created_at: Some(Utc::now()),
        updated_at: None,
    }
}

/// Runs the demo against an in-memory backend and reports the result.
pub async fn run_demo(config: &EditorConfig) -> anyhow::Result<SessionSummary> {
    config.validate().context("Invalid editor configuration")?;

    let gateway = Arc::new(InMemoryRegionGateway::new());
    gateway.insert(seed_region(config));

    let mut session = DrawingSession::new(config, gateway.clone(), ContainerId(1));
    session.load_regions(&gateway.regions());
    tracing::info!("Demo session ready: {:?}", session);

    // Draw in display space, exactly as the toolkit would report it.
    session.set_mode(InteractionMode::Drawing);
    let drawn = session.transformer().to_display(&[
        inside(config, 0.6, 0.6),
        inside(config, 0.6, 0.9),
        inside(config, 0.9, 0.9),
        inside(config, 0.9, 0.6),
    ]);
    let Some(new_id) = session.on_shape_created(drawn) else {
        bail!("Drawn rectangle was rejected");
    };
    session.confirm(Confirmation::Save {
        name: "Sector A".to_string(),
        description: "Drawn by the demo".to_string(),
    });
    session.set_mode(InteractionMode::Editing);
    session.settle().await;

    // Nudge the seeded region and let the edit auto-save.
    let seeded = gardenmap_regions::region_id_to_area_id(1);
    let nudged = session
        .area(&seeded)
        .map(|area| {
            let span = geometry::bounds(&area.points)
                .map(|(min, max)| (max.y - min.y) * 0.1)
                .unwrap_or(0.0);
            geometry::translate(&area.points, span, 0.0)
        })
        .context("Seeded region missing from session")?;
    session.on_shapes_edited(vec![EditedShape {
        id: seeded,
        points: nudged,
    }]);
    session.settle().await;

    for event in session.take_events() {
        tracing::debug!("Session event: {:?}", event);
    }
    tracing::info!("Demo finished; drawn area was {}", new_id);

    Ok(SessionSummary::capture(&session, gateway.regions().len()))
}
