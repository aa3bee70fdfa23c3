//! Static R-tree over child envelopes.
//!
//! Built once per run by bulk load, then read-only. A query returns every
//! child whose envelope intersects the query envelope: a conservative
//! superset that the resolver refines with the exact containment test.
//!
//! ```text
//!   SpatialIndex::new()  ──►  Empty ──build()──►  Built ──query()──► slots
//!                               │
//!                               └──query()──► Err(IndexNotBuilt)
//! ```

use crate::error::{HierarchyError, Result};
use crate::geometry::Envelope;
use rstar::{RTree, RTreeObject, AABB};

/// Dense position of a child candidate within one run.
pub type ChildSlot = usize;

/// Source of candidate children for a parent envelope.
///
/// The resolver only sees this trait, so tests can wrap the real index and
/// observe which envelopes were queried.
pub trait CandidateIndex {
    /// Slots of all children whose envelope intersects `envelope`, ascending.
    fn query(&self, envelope: &Envelope) -> Result<Vec<ChildSlot>>;
}

/// Index entry: one child envelope.
#[derive(Debug, Clone, Copy)]
struct IndexedEnvelope {
    aabb: AABB<[f64; 2]>,
    slot: ChildSlot,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

fn to_aabb(envelope: &Envelope) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [envelope.min_x, envelope.min_y],
        [envelope.max_x, envelope.max_y],
    )
}

enum IndexState {
    Empty,
    Built(RTree<IndexedEnvelope>),
}

/// Bulk-loaded spatial index over child envelopes.
pub struct SpatialIndex {
    state: IndexState,
}

impl SpatialIndex {
    /// Create an index that has not been built.
    pub fn new() -> Self {
        Self {
            state: IndexState::Empty,
        }
    }

    /// Create and build in one step.
    pub fn bulk_load<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Envelope, ChildSlot)>,
    {
        let mut index = Self::new();
        index.build(items);
        index
    }

    /// Build the index from `(envelope, slot)` pairs, replacing any previous
    /// contents.
    pub fn build<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (Envelope, ChildSlot)>,
    {
        let _span = tracing::info_span!("spatial_index_build").entered();
        let entries: Vec<IndexedEnvelope> = items
            .into_iter()
            .map(|(envelope, slot)| IndexedEnvelope {
                aabb: to_aabb(&envelope),
                slot,
            })
            .collect();
        let count = entries.len();
        self.state = IndexState::Built(RTree::bulk_load(entries));
        tracing::debug!(entries = count, "Spatial index built");
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, IndexState::Built(_))
    }

    /// Number of indexed entries (0 if not built).
    pub fn len(&self) -> usize {
        match &self.state {
            IndexState::Empty => 0,
            IndexState::Built(tree) => tree.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots of all entries intersecting `envelope`, ascending.
    pub fn query(&self, envelope: &Envelope) -> Result<Vec<ChildSlot>> {
        let tree = match &self.state {
            IndexState::Empty => return Err(HierarchyError::IndexNotBuilt),
            IndexState::Built(tree) => tree,
        };
        let mut slots: Vec<ChildSlot> = tree
            .locate_in_envelope_intersecting(&to_aabb(envelope))
            .map(|e| e.slot)
            .collect();
        slots.sort_unstable();
        Ok(slots)
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateIndex for SpatialIndex {
    fn query(&self, envelope: &Envelope) -> Result<Vec<ChildSlot>> {
        SpatialIndex::query(self, envelope)
    }
}
