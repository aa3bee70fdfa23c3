//! Shared fixtures for hierarchy integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use tissue_hierarchy::{
    CandidateIndex, ChildSlot, Envelope, GeometricObject, HierarchyConfig, ObjectRecord,
    ObjectSet, Partition, PriorityOrder, Result, SpatialIndex,
};

/// Axis-aligned square with lower-left corner `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> String {
    format!(
        "POLYGON(({x} {y}, {x1} {y}, {x1} {y1}, {x} {y1}, {x} {y}))",
        x1 = x + size,
        y1 = y + size
    )
}

/// Small square detection centred on `(cx, cy)`.
pub fn cell(id: &str, cx: f64, cy: f64) -> ObjectRecord {
    ObjectRecord::detection(id, square(cx - 0.25, cy - 0.25, 0.5))
}

/// Every label the default presets reference, so label validation passes.
pub fn label_anchors(x: f64) -> Vec<ObjectRecord> {
    ["RedPulp", "Trabeculae", "LargeVessel"]
        .iter()
        .enumerate()
        .map(|(i, label)| {
            ObjectRecord::annotation(
                format!("anchor-{label}"),
                label,
                square(x + i as f64 * 10.0, 1000.0, 5.0),
            )
        })
        .collect()
}

/// Deterministic linear congruential generator for layouts.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Dense random layout of overlapping parents of every tier plus detections.
pub fn crowded_section(seed: u64, parents: usize, cells: usize) -> Vec<ObjectRecord> {
    let labels = [
        "Follicle",
        "PALS",
        "RedPulp",
        "Trabeculae",
        "LargeVessel",
        "Necrosis",
        "SmallVessel",
    ];
    let mut rng = Lcg::new(seed);
    let mut records = Vec::with_capacity(parents + cells);

    for i in 0..parents {
        let x = rng.next_f64() * 80.0;
        let y = rng.next_f64() * 80.0;
        let size = 5.0 + rng.next_f64() * 30.0;
        records.push(ObjectRecord::annotation(
            format!("parent-{i}"),
            labels[i % labels.len()],
            square(x, y, size),
        ));
    }
    for i in 0..cells {
        let x = rng.next_f64() * 100.0;
        let y = rng.next_f64() * 100.0;
        records.push(cell(&format!("cell-{i}"), x, y));
    }
    records
}

/// Objects, partition and index for a hand-driven resolver run.
pub struct Prepared {
    pub objects: Vec<GeometricObject>,
    pub partition: Partition,
    pub index: SpatialIndex,
}

pub fn prepare(config: &HierarchyConfig, records: Vec<ObjectRecord>) -> Prepared {
    let (objects, skipped) = ObjectSet::load(records, config).into_parts();
    assert!(skipped.is_empty(), "unexpected skipped objects: {skipped:?}");
    let partition = PriorityOrder::new(config).partition(&objects);
    let index = SpatialIndex::bulk_load(
        partition
            .children
            .iter()
            .enumerate()
            .map(|(slot, &pos)| (*objects[pos].geometry.envelope(), slot)),
    );
    Prepared {
        objects,
        partition,
        index,
    }
}

/// Index wrapper that records every query and its result.
pub struct RecordingIndex<'a> {
    inner: &'a SpatialIndex,
    pub calls: RefCell<Vec<(Envelope, Vec<ChildSlot>)>>,
}

impl<'a> RecordingIndex<'a> {
    pub fn new(inner: &'a SpatialIndex) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl CandidateIndex for RecordingIndex<'_> {
    fn query(&self, envelope: &Envelope) -> Result<Vec<ChildSlot>> {
        let slots = self.inner.query(envelope)?;
        self.calls.borrow_mut().push((*envelope, slots.clone()));
        Ok(slots)
    }
}
