//! The parent→children assignment relation.
//!
//! A write-once map: each child has at most one parent, and an entry once
//! written is never changed or removed. Children absent from the relation
//! are unassigned, which is a valid outcome.
//!
//! Both directions are kept in `BTreeMap`s so that serialization is
//! deterministic: two runs over the same input produce byte-identical JSON.

use crate::error::{HierarchyError, Result};
use crate::object::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRelation {
    /// child → parent
    assignments: BTreeMap<ObjectId, ObjectId>,

    /// parent → children, in commit order
    children: BTreeMap<ObjectId, Vec<ObjectId>>,
}

impl AssignmentRelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a batch of children to `parent`.
    ///
    /// The batch is all-or-nothing: if any child already has a parent (or
    /// appears twice in the batch), nothing is written.
    pub fn commit(&mut self, parent: &ObjectId, children: Vec<ObjectId>) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }

        let mut batch: BTreeSet<&ObjectId> = BTreeSet::new();
        for child in &children {
            if let Some(existing) = self.assignments.get(child) {
                return Err(HierarchyError::AlreadyAssigned {
                    child: child.to_string(),
                    existing: existing.to_string(),
                    attempted: parent.to_string(),
                });
            }
            if !batch.insert(child) {
                return Err(HierarchyError::AlreadyAssigned {
                    child: child.to_string(),
                    existing: parent.to_string(),
                    attempted: parent.to_string(),
                });
            }
        }

        for child in &children {
            self.assignments.insert(child.clone(), parent.clone());
        }
        self.children
            .entry(parent.clone())
            .or_default()
            .extend(children);
        Ok(())
    }

    /// Parent of `child`, if assigned.
    pub fn parent_of(&self, child: &ObjectId) -> Option<&ObjectId> {
        self.assignments.get(child)
    }

    /// Children committed to `parent` (empty if none).
    pub fn children_of(&self, parent: &ObjectId) -> &[ObjectId] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of assigned children.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of parents with at least one child.
    pub fn parent_count(&self) -> usize {
        self.children.len()
    }

    /// `(child, parent)` pairs ordered by child id.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectId)> {
        self.assignments.iter()
    }

    /// `(parent, children)` ordered by parent id.
    pub fn parents(&self) -> impl Iterator<Item = (&ObjectId, &[ObjectId])> {
        self.children.iter().map(|(p, c)| (p, c.as_slice()))
    }
}
