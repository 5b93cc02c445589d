//! Application-level types for the root crate

use gardenmap_regions::{Area, DrawingSession, PendingStatus};
use serde::Serialize;

/// One area as reported by the demo run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub id: String,
    pub name: String,
    pub vertices: usize,
    /// `None` once the backend has acknowledged the area.
    pub pending: Option<String>,
}

impl AreaSummary {
    pub fn from_area(area: &Area) -> Self {
        let pending = area.pending.as_ref().map(|op| match &op.status {
            PendingStatus::InFlight => format!("{:?} in flight", op.kind),
            PendingStatus::Failed(reason) => format!("{:?} failed: {}", op.kind, reason),
        });
        Self {
            id: area.id.to_string(),
            name: area.name.clone(),
            vertices: area.points.len(),
            pending,
        }
    }
}

/// Session state after the demo settles.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub version: String,
    pub map_type: String,
    pub areas: Vec<AreaSummary>,
    pub stored_regions: usize,
}

impl SessionSummary {
    pub fn capture(session: &DrawingSession, stored_regions: usize) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            map_type: session.transformer().kind().to_string(),
            areas: session.areas().iter().map(AreaSummary::from_area).collect(),
            stored_regions,
        }
    }
}
