//! Error handling for GardenMap
//!
//! Provides error types for each layer of the region editor:
//! - Geometry errors (invalid or degenerate point lists)
//! - Region id errors (translating editor ids to server ids)
//! - Persistence errors (backend create/update/delete)
//! - Configuration errors (loading and validating settings)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a point list cannot form a usable closed polygon.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Fewer vertices than a closed polygon needs
    #[error("Polygon needs at least {required} points, got {actual}")]
    TooFewPoints {
        /// Minimum number of points.
        required: usize,
        /// Number of points supplied.
        actual: usize,
    },

    /// All vertices lie on one line (or coincide)
    #[error("Polygon is degenerate: all points are collinear")]
    Degenerate,

    /// A coordinate is NaN or infinite
    #[error("Polygon contains a non-finite coordinate at index {index}")]
    NonFinite {
        /// Index of the offending point.
        index: usize,
    },

    /// Serialized polygon could not be decoded
    #[error("Malformed polygon data: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },
}

/// Region id translation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionIdError {
    /// The area has not been persisted yet, so it has no server id
    #[error("Area {area_id} has no persisted region id")]
    NotPersisted {
        /// The ephemeral area id.
        area_id: String,
    },

    /// The id does not follow either known area id format
    #[error("Unrecognised area id: {area_id}")]
    Malformed {
        /// The offending id.
        area_id: String,
    },
}

/// Persistence error type
///
/// Represents failures reported by the region backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The region does not exist on the server
    #[error("Region {id} not found")]
    NotFound {
        /// The requested region id.
        id: i64,
    },

    /// The server rejected the payload
    #[error("Region rejected: {reason}")]
    Rejected {
        /// The reason supplied by the server.
        reason: String,
    },

    /// Transport failed before a response arrived
    #[error("Transport error: {reason}")]
    Transport {
        /// The transport failure message.
        reason: String,
    },

    /// The background task running the call was dropped
    #[error("Persistence task aborted: {reason}")]
    Aborted {
        /// Why the task ended.
        reason: String,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// File extension is neither `.json` nor `.toml`
    #[error("Config file must be .json or .toml: {path}")]
    UnsupportedFormat {
        /// The offending path.
        path: String,
    },

    /// The file could not be parsed
    #[error("Invalid config: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },

    /// A value failed validation
    #[error("Invalid setting {setting}: {reason}")]
    InvalidValue {
        /// Dotted setting name.
        setting: String,
        /// Why the value is rejected.
        reason: String,
    },
}

/// Main error type for GardenMap
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Region id error
    #[error(transparent)]
    RegionId(#[from] RegionIdError),

    /// Persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a persistence error
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
