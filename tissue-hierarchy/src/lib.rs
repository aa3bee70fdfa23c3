//! Spatial parent/child hierarchy assignment for tissue images.
//!
//! Given region annotations (follicles, PALS, red pulp, vessels, ...) and
//! detections (cells, small vessels) in one coordinate system, this crate
//! decides which region each object belongs to. Every child gets at most one
//! parent; a child enclosed by several regions goes to the one with the
//! highest configured priority.
//!
//! # Architecture
//!
//! ```text
//!   ObjectRecord (id, kind, label, WKT)
//!            │
//!            ▼
//!   Geometry adapter ── envelope, representative point, area ──► skipped objects
//!            │
//!            ▼
//!   Priority ordering ── parents (tiered) ───────────┐
//!            │                                       │
//!            └── children ──► R-tree (envelopes)     │
//!                                   │                │
//!                                   ▼                ▼
//!                          Assignment resolver (one parent at a time)
//!                                   │   ▲
//!                                   │   └── exclusivity set
//!                                   ▼
//!                          Assignment relation ──► Materializer ──► host store
//!                                   │
//!                                   ▼
//!                          Hierarchy summary
//! ```
//!
//! Containment is decided by the child's representative point (its centroid
//! by default) lying strictly inside the parent polygon. This is a policy,
//! not an approximation to be fixed: a child straddling a border goes to the
//! region holding its centre, and a child whose centroid falls outside its
//! own concave outline can be missed unless the interior-fallback policy is
//! selected.
//!
//! # Modules
//!
//! - [`config`]: Label priority and run configuration
//! - [`geometry`]: WKT parsing, envelopes and representative points
//! - [`object`]: Input records and loaded objects
//! - [`priority`]: Role partition and parent ordering
//! - [`index`]: R-tree candidate index over child envelopes
//! - [`exclusivity`]: At-most-one-parent claim set
//! - [`relation`]: The write-once parent→children relation
//! - [`resolver`]: Priority-ordered assignment
//! - [`materialize`]: Store materialization and summary reporting
//! - [`engine`]: End-to-end runs
//! - [`error`]: Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod exclusivity;
pub mod geometry;
pub mod index;
pub mod materialize;
pub mod object;
pub mod priority;
pub mod relation;
pub mod resolver;

pub use config::{
    HierarchyConfig, ParallelConfig, RepresentativePointPolicy, TierMode,
    DEFAULT_LOWEST_PRIORITY_LABEL, DEFAULT_STRUCTURAL_LABELS,
};
pub use engine::{HierarchyEngine, HierarchyRun};
pub use error::{HierarchyError, Result};
pub use exclusivity::ExclusivitySet;
pub use geometry::{contains_point, parse_wkt, Envelope, GeometryType, RegionGeometry};
pub use index::{CandidateIndex, ChildSlot, SpatialIndex};
pub use materialize::{
    ClassSummary, HierarchyStore, HierarchySummary, InMemoryHierarchy, Materializer,
    ParentSummary, TierSummary,
};
pub use object::{
    GeometricObject, LoadStats, ObjectId, ObjectKind, ObjectRecord, ObjectSet, SkippedObject,
};
pub use priority::{Partition, PriorityOrder, Role, Tier};
pub use relation::AssignmentRelation;
pub use resolver::{AssignmentResolver, Progress, Resolution, ResolveStats};
