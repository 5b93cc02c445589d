//! # GardenMap Regions
//!
//! Region polygon editing for the garden map: drawing new regions, editing
//! and dragging existing ones, and keeping the editor's working copies in
//! sync with the backend.
//!
//! ## Core Components
//!
//! - **Coordinates**: storage ↔ display mapping for geographic and planar maps
//! - **Geometry**: parse, validate, centroid, simplify, serialize (JSON + WKT)
//! - **Render**: styled, interactive polygon handles with a per-factory cache
//! - **Drag**: whole-shape dragging on top of per-vertex toolkit editing
//! - **Bridge**: Region ↔ Area conversion and id translation
//! - **Session**: the View / Drawing / Editing / Deleting state machine
//! - **Gateway**: async create/update/delete against the region backend
//!
//! ## Architecture
//!
//! ```text
//! DrawingSession (mode, areas, confirmation)
//!   ├── CoordinateTransformer (active display space)
//!   ├── PolygonRenderFactory  (handles + RenderCache)
//!   ├── DraggablePolygonController per area (MapViewport)
//!   └── PersistenceQueue -> RegionGateway (background)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gardenmap_regions::{Confirmation, DrawingSession, InteractionMode};
//!
//! let mut session = DrawingSession::new(&config, gateway, ContainerId(1));
//! session.set_mode(InteractionMode::Drawing);
//! session.on_shape_created(points);
//! session.confirm(Confirmation::Save { name: "Sector A".into(), description: String::new() });
//! session.settle().await;
//! ```

pub mod bridge;
pub mod coords;
pub mod drag;
pub mod gateway;
pub mod geometry;
pub mod input;
pub mod model;
pub mod render;
pub mod session;
pub mod viewport;

pub use bridge::{area_id_to_region_id, region_id_to_area_id, to_area, to_region_dto};
pub use coords::{
    CoordinateSpace, CoordinateTransformer, GeographicSpace, LinearProjection, PlanarSpace,
};
pub use drag::{DragSignal, DragState, DraggablePolygonController};
pub use gateway::{
    GatewayCall, InMemoryRegionGateway, PersistOutcome, PersistenceQueue, RegionGateway,
};
pub use geometry::ParsedPolygon;
pub use input::{ContainerId, PointerEvent, PointerKind};
pub use model::{Area, AreaId, PendingKind, PendingOperation, PendingStatus, Region, RegionDto};
pub use render::{
    ClickCallback, HandleId, PolygonHandle, PolygonRenderFactory, RenderCache, StyleOptions,
};
pub use session::{Confirmation, DrawingSession, EditedShape, InteractionMode, SessionEvent};
pub use viewport::MapViewport;
