//! Hierarchy materialization and reporting.
//!
//! The resolver produces an [`AssignmentRelation`] value and touches nothing
//! else. [`Materializer::apply`] is the one place that writes the relation
//! into a host-owned [`HierarchyStore`]. [`HierarchySummary`] condenses a run
//! into counts suitable for logging and export.

use crate::config::TierMode;
use crate::error::Result;
use crate::object::{GeometricObject, ObjectId};
use crate::priority::{Partition, Tier};
use crate::relation::AssignmentRelation;
use serde::Serialize;
use std::collections::BTreeMap;

/// Host object model that receives parent→children links.
pub trait HierarchyStore {
    /// Attach `children` to `parent`.
    fn add_children(&mut self, parent: &ObjectId, children: &[ObjectId]) -> Result<()>;
}

/// In-memory store, ordered by parent id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InMemoryHierarchy {
    children: BTreeMap<ObjectId, Vec<ObjectId>>,
}

impl InMemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children_of(&self, parent: &ObjectId) -> &[ObjectId] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of parents holding children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl HierarchyStore for InMemoryHierarchy {
    fn add_children(&mut self, parent: &ObjectId, children: &[ObjectId]) -> Result<()> {
        self.children
            .entry(parent.clone())
            .or_default()
            .extend_from_slice(children);
        Ok(())
    }
}

/// Writes an assignment relation into a store.
pub struct Materializer;

impl Materializer {
    /// Attach every committed child to its parent. Returns the number of
    /// child links written.
    pub fn apply<S>(relation: &AssignmentRelation, store: &mut S) -> Result<usize>
    where
        S: HierarchyStore + ?Sized,
    {
        let mut written = 0;
        for (parent, children) in relation.parents() {
            store.add_children(parent, children)?;
            written += children.len();
        }
        tracing::debug!(
            parents = relation.parent_count(),
            children = written,
            "Hierarchy materialized"
        );
        Ok(written)
    }
}

/// Counts for one priority tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierSummary {
    pub parents: usize,
    pub parents_with_children: usize,
    pub assigned: usize,
}

/// Counts for one parent classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassSummary {
    pub parents: usize,
    pub assigned: usize,
    /// Total area of the parents with this label.
    pub area: f64,
    /// Assigned children per unit of parent area.
    pub density: f64,
}

/// One parent's outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentSummary {
    pub id: ObjectId,
    pub classification: Option<String>,
    pub tier: Tier,
    pub children: usize,
    pub area: f64,
    pub density: f64,
}

/// Run-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchySummary {
    pub mode: TierMode,
    /// Parent candidates in the run.
    pub parents: usize,
    /// Parents actually resolved (fewer than `parents` if aborted).
    pub parents_processed: usize,
    /// Child candidates in the run.
    pub children: usize,
    pub assigned: usize,
    pub unassigned: usize,
    /// Input records excluded before resolution.
    pub skipped: usize,
    pub aborted: bool,
    pub per_tier: BTreeMap<Tier, TierSummary>,
    pub per_class: BTreeMap<String, ClassSummary>,
    /// In processing order.
    pub per_parent: Vec<ParentSummary>,
}

fn density(count: usize, area: f64) -> f64 {
    if area > 0.0 {
        count as f64 / area
    } else {
        0.0
    }
}

impl HierarchySummary {
    /// Summarize a run.
    ///
    /// Every tier that can hold parents in `mode` gets an entry, even if
    /// empty, so a report always shows the full breakdown.
    pub fn build(
        mode: TierMode,
        objects: &[GeometricObject],
        partition: &Partition,
        relation: &AssignmentRelation,
        parents_processed: usize,
        skipped: usize,
        aborted: bool,
    ) -> Self {
        let mut per_tier: BTreeMap<Tier, TierSummary> = match mode {
            TierMode::TwoTier => [(Tier::Structural, TierSummary::default())].into(),
            TierMode::ThreeTier => Tier::ALL
                .iter()
                .map(|&t| (t, TierSummary::default()))
                .collect(),
        };
        let mut per_class: BTreeMap<String, ClassSummary> = BTreeMap::new();
        let mut per_parent = Vec::with_capacity(partition.parents.len());

        for &(pos, tier) in &partition.parents {
            let Some(parent) = objects.get(pos) else {
                continue;
            };
            let count = relation.children_of(&parent.id).len();
            let area = parent.geometry.area();

            let t = per_tier.entry(tier).or_default();
            t.parents += 1;
            t.assigned += count;
            if count > 0 {
                t.parents_with_children += 1;
            }

            if let Some(label) = parent.label() {
                let c = per_class.entry(label.to_string()).or_default();
                c.parents += 1;
                c.assigned += count;
                c.area += area;
            }

            per_parent.push(ParentSummary {
                id: parent.id.clone(),
                classification: parent.classification.clone(),
                tier,
                children: count,
                area,
                density: density(count, area),
            });
        }

        for c in per_class.values_mut() {
            c.density = density(c.assigned, c.area);
        }

        let children = partition.children.len();
        let assigned = relation.len();
        Self {
            mode,
            parents: partition.parents.len(),
            parents_processed,
            children,
            assigned,
            unassigned: children.saturating_sub(assigned),
            skipped,
            aborted,
            per_tier,
            per_class,
            per_parent,
        }
    }

    /// Emit the summary through `tracing`.
    pub fn log(&self) {
        tracing::info!(
            mode = self.mode.as_str(),
            parents = self.parents,
            parents_processed = self.parents_processed,
            children = self.children,
            assigned = self.assigned,
            unassigned = self.unassigned,
            skipped = self.skipped,
            aborted = self.aborted,
            "Hierarchy assignment summary"
        );
        for (tier, t) in &self.per_tier {
            tracing::info!(
                tier = tier.as_str(),
                parents = t.parents,
                parents_with_children = t.parents_with_children,
                assigned = t.assigned,
                "Tier summary"
            );
        }
        for (label, c) in &self.per_class {
            tracing::debug!(
                class = %label,
                parents = c.parents,
                assigned = c.assigned,
                density = c.density,
                "Class summary"
            );
        }
    }
}
