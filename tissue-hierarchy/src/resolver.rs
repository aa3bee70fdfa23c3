//! Assignment resolver.
//!
//! Walks parents strictly in priority order. For each parent:
//!
//! ```text
//!   parent envelope ──► CandidateIndex::query ──► candidate slots
//!                                                    │
//!                                  drop slots already in ExclusivitySet
//!                                                    │
//!                       exact test: parent contains child representative point
//!                            (rayon fan-out above `parallel.min_candidates`)
//!                                                    │
//!                          ExclusivitySet::try_claim ──► commit batch to relation
//! ```
//!
//! Parents are never processed concurrently: a child enclosed by two parents
//! must go to the earlier one, and that only holds if the earlier parent has
//! committed before the later one looks. Between two parents the relation and
//! the exclusivity set are consistent, so that is where a caller may abort.

use crate::config::{HierarchyConfig, ParallelConfig};
use crate::error::{HierarchyError, Result};
use crate::exclusivity::ExclusivitySet;
use crate::index::{CandidateIndex, ChildSlot};
use crate::object::GeometricObject;
use crate::priority::{Partition, Tier};
use crate::relation::AssignmentRelation;
use rayon::prelude::*;
use serde::Serialize;
use std::ops::ControlFlow;

/// Counters collected during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    /// Parents whose candidates were evaluated.
    pub parents_processed: usize,

    /// Candidate slots returned by the index (envelope overlaps).
    pub candidates_returned: usize,

    /// Candidates skipped because another parent already claimed them.
    pub already_claimed: usize,

    /// Exact point-in-polygon tests performed.
    pub exact_checks: usize,

    /// Candidates whose representative point lay outside the parent.
    pub rejected: usize,

    /// Children committed.
    pub assigned: usize,
}

impl ResolveStats {
    /// Fraction of index candidates that ended up assigned.
    pub fn selectivity(&self) -> f64 {
        if self.candidates_returned == 0 {
            0.0
        } else {
            self.assigned as f64 / self.candidates_returned as f64
        }
    }
}

/// Progress snapshot handed to the control callback before each parent.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub parents_done: usize,
    pub parents_total: usize,
    pub assigned: usize,
    pub next_tier: Tier,
}

/// Output of one resolution pass.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub relation: AssignmentRelation,
    pub stats: ResolveStats,
    /// The control callback stopped the run before every parent was seen.
    pub aborted: bool,
}

/// Resolves parent→child assignments.
#[derive(Debug, Clone)]
pub struct AssignmentResolver {
    parallel: ParallelConfig,
    progress_every: usize,
}

impl AssignmentResolver {
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            parallel: config.parallel.clone(),
            progress_every: config.progress_every,
        }
    }

    /// Resolve every parent in `partition` order.
    pub fn resolve<I>(
        &self,
        objects: &[GeometricObject],
        partition: &Partition,
        index: &I,
        exclusivity: &ExclusivitySet,
    ) -> Result<Resolution>
    where
        I: CandidateIndex + ?Sized,
    {
        self.resolve_with(objects, partition, index, exclusivity, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Resolve with a callback consulted before each parent.
    ///
    /// Returning `ControlFlow::Break` stops the run; the partial relation is
    /// returned with `aborted = true`.
    pub fn resolve_with<I, F>(
        &self,
        objects: &[GeometricObject],
        partition: &Partition,
        index: &I,
        exclusivity: &ExclusivitySet,
        mut control: F,
    ) -> Result<Resolution>
    where
        I: CandidateIndex + ?Sized,
        F: FnMut(&Progress) -> ControlFlow<()>,
    {
        let parents_total = partition.parents.len();
        let _span = tracing::info_span!(
            "resolve",
            parents = parents_total,
            children = partition.children.len()
        )
        .entered();

        if exclusivity.capacity() < partition.children.len() {
            return Err(HierarchyError::Internal(format!(
                "exclusivity set sized for {} children, run has {}",
                exclusivity.capacity(),
                partition.children.len()
            )));
        }

        let mut relation = AssignmentRelation::new();
        let mut stats = ResolveStats::default();
        let mut aborted = false;

        for (done, &(pos, tier)) in partition.parents.iter().enumerate() {
            let progress = Progress {
                parents_done: done,
                parents_total,
                assigned: stats.assigned,
                next_tier: tier,
            };
            if control(&progress).is_break() {
                tracing::info!(
                    parents_done = done,
                    parents_total,
                    assigned = stats.assigned,
                    "Resolution aborted"
                );
                aborted = true;
                break;
            }

            let parent = objects.get(pos).ok_or_else(|| {
                HierarchyError::Internal(format!("parent position {} out of range", pos))
            })?;

            let candidates = index.query(parent.geometry.envelope())?;
            let returned = candidates.len();
            stats.candidates_returned += returned;

            let unclaimed: Vec<ChildSlot> = candidates
                .into_iter()
                .filter(|&slot| !exclusivity.is_claimed(slot))
                .collect();
            stats.already_claimed += returned - unclaimed.len();

            let contained = self.contained(parent, &unclaimed, objects, &partition.children)?;
            stats.exact_checks += unclaimed.len();
            stats.rejected += unclaimed.len() - contained.len();

            let mut batch = Vec::with_capacity(contained.len());
            for slot in contained {
                if exclusivity.try_claim(slot) {
                    batch.push(objects[partition.children[slot]].id.clone());
                } else {
                    stats.already_claimed += 1;
                }
            }

            if !batch.is_empty() {
                tracing::debug!(
                    parent = %parent.id,
                    tier = tier.as_str(),
                    children = batch.len(),
                    "Committing children"
                );
            }
            stats.assigned += batch.len();
            relation.commit(&parent.id, batch)?;
            stats.parents_processed += 1;

            if self.progress_every > 0 && stats.parents_processed % self.progress_every == 0 {
                tracing::info!(
                    parents_done = stats.parents_processed,
                    parents_total,
                    assigned = stats.assigned,
                    "Resolution progress"
                );
            }
        }

        Ok(Resolution {
            relation,
            stats,
            aborted,
        })
    }

    /// Slots (in input order) whose representative point `parent` contains.
    fn contained(
        &self,
        parent: &GeometricObject,
        slots: &[ChildSlot],
        objects: &[GeometricObject],
        children: &[usize],
    ) -> Result<Vec<ChildSlot>> {
        let point_of = |slot: ChildSlot| -> Result<geo_types::Point<f64>> {
            children
                .get(slot)
                .and_then(|&pos| objects.get(pos))
                .map(|o| o.geometry.representative_point())
                .ok_or_else(|| {
                    HierarchyError::Internal(format!("child slot {} out of range", slot))
                })
        };

        if self.parallel.enabled && slots.len() >= self.parallel.min_candidates {
            // Order-preserving collect keeps the batch deterministic.
            let tested: Vec<(ChildSlot, bool)> = slots
                .par_iter()
                .map(|&slot| point_of(slot).map(|p| (slot, parent.geometry.contains_point(&p))))
                .collect::<Result<_>>()?;
            Ok(tested
                .into_iter()
                .filter_map(|(slot, inside)| {
                    if !inside {
                        tracing::trace!(
                            parent = %parent.id,
                            child_slot = slot,
                            "Candidate rejected"
                        );
                    }
                    inside.then_some(slot)
                })
                .collect())
        } else {
            let mut inside = Vec::new();
            for &slot in slots {
                if parent.geometry.contains_point(&point_of(slot)?) {
                    inside.push(slot);
                } else {
                    tracing::trace!(
                        parent = %parent.id,
                        child_slot = slot,
                        "Candidate rejected"
                    );
                }
            }
            Ok(inside)
        }
    }
}
