//! Region (persisted) and Area (editor-local) entities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gardenmap_core::constants::{
    DEFAULT_FILL_COLOR, DEFAULT_FILL_OPACITY, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WEIGHT,
    EPHEMERAL_ID_PREFIX, REGION_ID_PREFIX,
};
use gardenmap_core::{Point, RegionIdError};
use gardenmap_settings::PathStyle;

/// A server-persisted garden region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// JSON `[[lat, lng], ...]` in storage space.
    pub polygon: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    /// WKT `POLYGON((lng lat, ...))`.
    #[serde(default)]
    pub boundary: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub fill_opacity: Option<f64>,
    #[serde(default)]
    pub stroke_weight: Option<f64>,
    /// Maintained by the specimen catalogue; never written by the editor.
    #[serde(default)]
    pub specimen_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Persist-ready region payload without server-owned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDto {
    pub name: String,
    pub description: Option<String>,
    pub polygon: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub boundary: String,
    pub sector: Option<String>,
    pub fill_color: String,
    pub stroke_color: String,
    pub fill_opacity: f64,
    pub stroke_weight: f64,
}

/// Identity of an area in the editor.
///
/// Renders as `region-<id>` once persisted and `area-<uuid>` before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaId {
    Region(i64),
    Ephemeral(Uuid),
}

impl AreaId {
    /// Allocates a fresh ephemeral id.
    pub fn ephemeral() -> Self {
        Self::Ephemeral(Uuid::new_v4())
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Region(_))
    }

    /// The server id, if this area has been persisted.
    pub fn region_id(&self) -> Result<i64, RegionIdError> {
        match self {
            Self::Region(id) => Ok(*id),
            Self::Ephemeral(_) => Err(RegionIdError::NotPersisted {
                area_id: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(id) => write!(f, "{}{}", REGION_ID_PREFIX, id),
            Self::Ephemeral(uuid) => write!(f, "{}{}", EPHEMERAL_ID_PREFIX, uuid),
        }
    }
}

impl FromStr for AreaId {
    type Err = RegionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RegionIdError::Malformed {
            area_id: s.to_string(),
        };

        if let Some(rest) = s.strip_prefix(REGION_ID_PREFIX) {
            // Digits only: reject signs, whitespace, and empty suffixes.
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            return rest.parse().map(Self::Region).map_err(|_| malformed());
        }
        if let Some(rest) = s.strip_prefix(EPHEMERAL_ID_PREFIX) {
            return Uuid::parse_str(rest)
                .map(Self::Ephemeral)
                .map_err(|_| malformed());
        }
        Err(malformed())
    }
}

impl Serialize for AreaId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AreaId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which backend call an area is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingKind {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingStatus {
    InFlight,
    Failed(String),
}

/// Optimistic save bookkeeping attached to an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Id the area carried when the create was issued.
    pub ephemeral_id: Option<AreaId>,
    pub kind: PendingKind,
    pub status: PendingStatus,
    /// Queue sequence of the call this record tracks. Outcomes carrying an
    /// older sequence belong to a superseded save.
    pub seq: u64,
}

impl PendingOperation {
    pub fn create(ephemeral_id: AreaId, seq: u64) -> Self {
        Self {
            ephemeral_id: Some(ephemeral_id),
            kind: PendingKind::Create,
            status: PendingStatus::InFlight,
            seq,
        }
    }

    pub fn update(seq: u64) -> Self {
        Self {
            ephemeral_id: None,
            kind: PendingKind::Update,
            status: PendingStatus::InFlight,
            seq,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PendingStatus::Failed(_))
    }
}

/// Editor-local working copy of a region polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub description: String,
    /// Vertices in the active display space.
    pub points: Vec<Point>,
    pub sector: Option<String>,
    pub stroke_color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_weight: f64,
    /// Pure UI state.
    #[serde(skip)]
    pub selected: bool,
    #[serde(skip)]
    pub pending: Option<PendingOperation>,
}

impl Area {
    /// Creates an unnamed area with default styling.
    pub fn new(id: AreaId, points: Vec<Point>) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            points,
            sector: None,
            stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            fill_opacity: DEFAULT_FILL_OPACITY,
            stroke_weight: DEFAULT_STROKE_WEIGHT,
            selected: false,
            pending: None,
        }
    }

    /// Applies a palette to the style fields.
    pub fn with_style(mut self, style: &PathStyle) -> Self {
        self.stroke_color = style.stroke_color.clone();
        self.fill_color = style.fill_color.clone();
        self.fill_opacity = style.fill_opacity;
        self.stroke_weight = style.stroke_weight;
        self
    }

    /// The area's own (unselected, unhovered) style.
    pub fn style(&self) -> PathStyle {
        PathStyle {
            stroke_color: self.stroke_color.clone(),
            fill_color: self.fill_color.clone(),
            fill_opacity: self.fill_opacity,
            stroke_weight: self.stroke_weight,
        }
    }
}
