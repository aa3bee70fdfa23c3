//! End-to-end hierarchy assignment run.
//!
//! [`HierarchyEngine`] wires the components together in their fixed order:
//! load → validate labels → partition roles → build index over children →
//! resolve parents in priority order → summarize. The result is a
//! [`HierarchyRun`] value; nothing outside the run is mutated until the
//! caller invokes [`HierarchyRun::materialize`].

use crate::config::HierarchyConfig;
use crate::error::Result;
use crate::exclusivity::ExclusivitySet;
use crate::index::SpatialIndex;
use crate::materialize::{HierarchyStore, HierarchySummary, Materializer};
use crate::object::{ObjectId, ObjectRecord, ObjectSet, SkippedObject};
use crate::priority::PriorityOrder;
use crate::relation::AssignmentRelation;
use crate::resolver::{AssignmentResolver, Progress, ResolveStats};
use serde::Serialize;
use std::ops::ControlFlow;

/// Result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyRun {
    pub relation: AssignmentRelation,
    pub summary: HierarchySummary,
    pub stats: ResolveStats,
    pub skipped: Vec<SkippedObject>,
    /// Child candidates left without a parent, in input order.
    pub unassigned: Vec<ObjectId>,
}

impl HierarchyRun {
    /// Write the relation into `store`. Returns the number of links written.
    pub fn materialize<S>(&self, store: &mut S) -> Result<usize>
    where
        S: HierarchyStore + ?Sized,
    {
        Materializer::apply(&self.relation, store)
    }
}

/// Hierarchy assignment engine for one configuration.
#[derive(Debug, Clone)]
pub struct HierarchyEngine {
    config: HierarchyConfig,
    order: PriorityOrder,
    resolver: AssignmentResolver,
}

impl HierarchyEngine {
    /// Create an engine. Fails if the label configuration is ill-formed.
    pub fn new(config: HierarchyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            order: PriorityOrder::new(&config),
            resolver: AssignmentResolver::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn priority(&self) -> &PriorityOrder {
        &self.order
    }

    /// Load records, skipping unusable ones.
    pub fn load<I>(&self, records: I) -> ObjectSet
    where
        I: IntoIterator<Item = ObjectRecord>,
    {
        let set = ObjectSet::load(records, &self.config);
        let stats = set.stats();
        tracing::info!(
            records = stats.records_processed,
            loaded = stats.objects_loaded,
            skipped = stats.records_skipped,
            multipolygons = stats.multipolygon_count,
            "Objects loaded"
        );
        set
    }

    /// Load and resolve.
    pub fn run<I>(&self, records: I) -> Result<HierarchyRun>
    where
        I: IntoIterator<Item = ObjectRecord>,
    {
        self.run_objects(self.load(records))
    }

    /// Resolve an already-loaded object set.
    pub fn run_objects(&self, set: ObjectSet) -> Result<HierarchyRun> {
        self.run_objects_with(set, |_| ControlFlow::Continue(()))
    }

    /// Resolve with a control callback consulted before each parent.
    ///
    /// See [`AssignmentResolver::resolve_with`]. An aborted run still yields
    /// a consistent partial relation and a summary with `aborted = true`.
    pub fn run_objects_with<F>(&self, set: ObjectSet, control: F) -> Result<HierarchyRun>
    where
        F: FnMut(&Progress) -> ControlFlow<()>,
    {
        let _span =
            tracing::info_span!("hierarchy_run", mode = self.config.mode.as_str()).entered();

        self.config.validate_against_labels(set.labels())?;

        let (objects, skipped) = set.into_parts();
        let partition = self.order.partition(&objects);
        tracing::info!(
            objects = objects.len(),
            parents = partition.parents.len(),
            children = partition.children.len(),
            "Roles partitioned"
        );

        let index = SpatialIndex::bulk_load(
            partition
                .children
                .iter()
                .enumerate()
                .map(|(slot, &pos)| (*objects[pos].geometry.envelope(), slot)),
        );
        let exclusivity = ExclusivitySet::with_capacity(partition.children.len());

        let resolution =
            self.resolver
                .resolve_with(&objects, &partition, &index, &exclusivity, control)?;

        let summary = HierarchySummary::build(
            self.config.mode,
            &objects,
            &partition,
            &resolution.relation,
            resolution.stats.parents_processed,
            skipped.len(),
            resolution.aborted,
        );

        let unassigned: Vec<ObjectId> = partition
            .children
            .iter()
            .enumerate()
            .filter(|&(slot, _)| !exclusivity.is_claimed(slot))
            .map(|(_, &pos)| objects[pos].id.clone())
            .collect();

        tracing::info!(
            assigned = summary.assigned,
            unassigned = summary.unassigned,
            skipped = summary.skipped,
            candidates = resolution.stats.candidates_returned,
            selectivity = resolution.stats.selectivity(),
            "Hierarchy resolved"
        );

        Ok(HierarchyRun {
            relation: resolution.relation,
            summary,
            stats: resolution.stats,
            skipped,
            unassigned,
        })
    }
}
