//! Role partition and parent priority ordering.
//!
//! The order in which parents claim children is the whole conflict-resolution
//! policy: a child enclosed by two parents goes to whichever comes first.
//! Structural regions come first and the lowest-priority label comes last, so
//! small nested regions (vessels) cannot take detections that belong to the
//! enclosing tissue region.
//!
//! | mode       | labelled annotation               | unlabelled annotation | detection |
//! |------------|-----------------------------------|-----------------------|-----------|
//! | two-tier   | structural → `Parent(Structural)`, otherwise `Child` | `Child` | `Child` |
//! | three-tier | structural → `Parent(Structural)`, lowest → `Parent(Lowest)`, otherwise `Parent(General)` | `Child` | `Child` |

use crate::config::{HierarchyConfig, TierMode};
use crate::object::{GeometricObject, ObjectKind};
use serde::{Deserialize, Serialize};

/// Parent priority tier. Lower tiers claim children first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Structural = 0,
    General = 1,
    Lowest = 2,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Structural, Tier::General, Tier::Lowest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Structural => "structural",
            Tier::General => "general",
            Tier::Lowest => "lowest",
        }
    }
}

/// Role of an object in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parent(Tier),
    Child,
}

/// Role partition of one run's objects.
///
/// Positions refer to the run's object slice. A child's index into
/// `children` is its [`ChildSlot`](crate::index::ChildSlot).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Parent positions in processing order, with their tier.
    pub parents: Vec<(usize, Tier)>,
    /// Child candidate positions in input order.
    pub children: Vec<usize>,
}

/// Derives roles and the parent processing order from configuration.
#[derive(Debug, Clone)]
pub struct PriorityOrder {
    mode: TierMode,
    structural: Vec<String>,
    lowest: Option<String>,
}

impl PriorityOrder {
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            mode: config.mode,
            structural: config.structural_labels.clone(),
            lowest: config.lowest_priority_label.clone(),
        }
    }

    /// Role of an object with the given kind and classification.
    pub fn role_of(&self, kind: ObjectKind, classification: Option<&str>) -> Role {
        let label = match (kind, classification) {
            (ObjectKind::Annotation, Some(label)) => label,
            _ => return Role::Child,
        };

        if self.structural.iter().any(|s| s == label) {
            return Role::Parent(Tier::Structural);
        }

        match self.mode {
            TierMode::TwoTier => Role::Child,
            TierMode::ThreeTier if self.lowest.as_deref() == Some(label) => {
                Role::Parent(Tier::Lowest)
            }
            TierMode::ThreeTier => Role::Parent(Tier::General),
        }
    }

    /// Role of a loaded object.
    pub fn role(&self, object: &GeometricObject) -> Role {
        self.role_of(object.kind, object.label())
    }

    /// Positions of all parents in processing order, with their tier.
    ///
    /// Sorted by tier; the sort is stable so input order breaks ties.
    pub fn order(&self, objects: &[GeometricObject]) -> Vec<(usize, Tier)> {
        let mut parents: Vec<(usize, Tier)> = objects
            .iter()
            .enumerate()
            .filter_map(|(pos, o)| match self.role(o) {
                Role::Parent(tier) => Some((pos, tier)),
                Role::Child => None,
            })
            .collect();
        parents.sort_by_key(|&(_, tier)| tier);
        parents
    }

    /// Parents in processing order plus child candidates.
    pub fn partition(&self, objects: &[GeometricObject]) -> Partition {
        Partition {
            parents: self.order(objects),
            children: self.children(objects),
        }
    }

    /// Positions of all child candidates, in input order.
    pub fn children(&self, objects: &[GeometricObject]) -> Vec<usize> {
        objects
            .iter()
            .enumerate()
            .filter(|(_, o)| self.role(o) == Role::Child)
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepresentativePointPolicy;
    use crate::geometry::RegionGeometry;
    use crate::object::ObjectId;

    fn object(id: &str, kind: ObjectKind, label: Option<&str>) -> GeometricObject {
        let geometry = RegionGeometry::from_wkt(
            "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
            RepresentativePointPolicy::Centroid,
            true,
        )
        .unwrap();
        GeometricObject::new(ObjectId::new(id), kind, label.map(str::to_string), geometry)
    }

    #[test]
    fn test_three_tier_roles() {
        let order = PriorityOrder::new(&HierarchyConfig::annotations_detections());
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("Follicle")),
            Role::Parent(Tier::Structural)
        );
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("SmallVessel")),
            Role::Parent(Tier::Lowest)
        );
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("Necrosis")),
            Role::Parent(Tier::General)
        );
        assert_eq!(order.role_of(ObjectKind::Annotation, None), Role::Child);
        assert_eq!(
            order.role_of(ObjectKind::Detection, Some("Follicle")),
            Role::Child
        );
    }

    #[test]
    fn test_two_tier_roles() {
        let order = PriorityOrder::new(&HierarchyConfig::annotations_only());
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("PALS")),
            Role::Parent(Tier::Structural)
        );
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("SmallVessel")),
            Role::Child
        );
        assert_eq!(
            order.role_of(ObjectKind::Annotation, Some("Necrosis")),
            Role::Child
        );
    }

    #[test]
    fn test_order_is_tiered_and_stable() {
        let order = PriorityOrder::new(&HierarchyConfig::annotations_detections());
        let objects = vec![
            object("v1", ObjectKind::Annotation, Some("SmallVessel")),
            object("f1", ObjectKind::Annotation, Some("Follicle")),
            object("d1", ObjectKind::Detection, None),
            object("x1", ObjectKind::Annotation, Some("Necrosis")),
            object("p1", ObjectKind::Annotation, Some("PALS")),
            object("v2", ObjectKind::Annotation, Some("SmallVessel")),
            object("f2", ObjectKind::Annotation, Some("Follicle")),
        ];

        let ids: Vec<&str> = order
            .order(&objects)
            .into_iter()
            .map(|(pos, _)| objects[pos].id.as_str())
            .collect();

        assert_eq!(ids, vec!["f1", "p1", "f2", "x1", "v1", "v2"]);
        assert_eq!(order.children(&objects), vec![2]);

        let partition = order.partition(&objects);
        assert_eq!(partition.parents.len(), 6);
        assert_eq!(partition.parents[0], (1, Tier::Structural));
        assert_eq!(partition.parents[5], (5, Tier::Lowest));
    }
}
