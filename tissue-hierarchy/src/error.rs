//! Error types for hierarchy assignment.

use thiserror::Error;

/// Hierarchy assignment errors.
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Geometry unusable for envelope/centroid computation (empty, degenerate,
    /// self-intersecting, non-polygonal).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Two input objects share an id.
    #[error("Duplicate object id: {0}")]
    DuplicateId(String),

    /// Label configuration is ill-defined or inconsistent with the data.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spatial index queried before it was built.
    #[error("Spatial index queried before build completed")]
    IndexNotBuilt,

    /// A child was committed to a second parent.
    #[error("Child {child} already assigned to {existing}, cannot assign to {attempted}")]
    AlreadyAssigned {
        child: String,
        existing: String,
        attempted: String,
    },

    /// The host hierarchy store rejected a write.
    #[error("Hierarchy store error: {0}")]
    Store(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for hierarchy operations.
pub type Result<T> = std::result::Result<T, HierarchyError>;
