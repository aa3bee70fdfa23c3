//! Geometric objects and their loading.
//!
//! Upstream collaborators (pixel classifier, detector) hand over one
//! [`ObjectRecord`] per region. Loading turns records into immutable
//! [`GeometricObject`]s. A record that cannot be used (bad WKT, degenerate
//! geometry, duplicate id) is skipped and reported, never fatal.

use crate::config::HierarchyConfig;
use crate::error::HierarchyError;
use crate::geometry::{parse_wkt, GeometryType, RegionGeometry};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque object id, unique within one image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where an object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Region polygon drawn by a person or the pixel classifier.
    Annotation,
    /// Cell or vessel polygon produced by the detector.
    Detection,
}

/// Input record as produced by upstream collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    pub kind: ObjectKind,
    #[serde(default)]
    pub classification: Option<String>,
    pub wkt: String,
}

impl ObjectRecord {
    pub fn new(
        id: impl Into<String>,
        kind: ObjectKind,
        classification: Option<&str>,
        wkt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            classification: classification.map(str::to_string),
            wkt: wkt.into(),
        }
    }

    /// Annotation record with a label.
    pub fn annotation(id: impl Into<String>, label: &str, wkt: impl Into<String>) -> Self {
        Self::new(id, ObjectKind::Annotation, Some(label), wkt)
    }

    /// Unlabelled detection record.
    pub fn detection(id: impl Into<String>, wkt: impl Into<String>) -> Self {
        Self::new(id, ObjectKind::Detection, None, wkt)
    }
}

/// A loaded, immutable object.
#[derive(Debug, Clone)]
pub struct GeometricObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub classification: Option<String>,
    pub geometry: RegionGeometry,
}

impl GeometricObject {
    pub fn new(
        id: ObjectId,
        kind: ObjectKind,
        classification: Option<String>,
        geometry: RegionGeometry,
    ) -> Self {
        Self {
            id,
            kind,
            classification,
            geometry,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.classification.as_deref()
    }
}

/// An object excluded from the run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedObject {
    pub id: String,
    pub reason: String,
}

/// Statistics collected while loading.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadStats {
    /// Number of records seen.
    pub records_processed: u64,

    /// Number of objects loaded.
    pub objects_loaded: u64,

    /// Number of records skipped (parse errors, invalid geometry, duplicates).
    pub records_skipped: u64,

    /// Loaded single polygons.
    pub polygon_count: u64,

    /// Loaded multipolygons.
    pub multipolygon_count: u64,
}

/// The loaded objects of one run, in input order.
#[derive(Debug, Default)]
pub struct ObjectSet {
    objects: Vec<GeometricObject>,
    skipped: Vec<SkippedObject>,
    seen_ids: FxHashSet<ObjectId>,
    /// Annotation labels of every record seen, skipped ones included.
    labels: BTreeSet<String>,
    stats: LoadStats,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records, skipping (and recording) the unusable ones.
    pub fn load<I>(records: I, config: &HierarchyConfig) -> Self
    where
        I: IntoIterator<Item = ObjectRecord>,
    {
        let mut set = Self::new();
        for record in records {
            set.add_record(record, config);
        }
        set
    }

    /// Add one record. Returns `false` if it was skipped.
    pub fn add_record(&mut self, record: ObjectRecord, config: &HierarchyConfig) -> bool {
        self.stats.records_processed += 1;
        self.note_label(record.kind, record.classification.as_deref());

        let geom = match parse_wkt(&record.wkt) {
            Ok(g) => g,
            Err(e) => {
                self.skip(record.id, e);
                return false;
            }
        };
        let geom_type = GeometryType::from_geometry(&geom);

        let geometry =
            match RegionGeometry::new(geom, config.representative_point, config.check_validity) {
                Ok(g) => g,
                Err(e) => {
                    self.skip(record.id, e);
                    return false;
                }
            };

        let object = GeometricObject::new(
            ObjectId::new(record.id),
            record.kind,
            record.classification,
            geometry,
        );
        match self.push(object) {
            Ok(()) => {
                match geom_type {
                    GeometryType::MultiPolygon => self.stats.multipolygon_count += 1,
                    _ => self.stats.polygon_count += 1,
                }
                true
            }
            Err(id) => {
                self.skip(id.to_string(), HierarchyError::DuplicateId(id.to_string()));
                false
            }
        }
    }

    /// Add an already-built object. Rejects a duplicate id, returning it.
    pub fn push(&mut self, object: GeometricObject) -> std::result::Result<(), ObjectId> {
        self.note_label(object.kind, object.label());
        if !self.seen_ids.insert(object.id.clone()) {
            return Err(object.id);
        }
        self.stats.objects_loaded += 1;
        self.objects.push(object);
        Ok(())
    }

    fn note_label(&mut self, kind: ObjectKind, classification: Option<&str>) {
        if let (ObjectKind::Annotation, Some(label)) = (kind, classification) {
            if !self.labels.contains(label) {
                self.labels.insert(label.to_string());
            }
        }
    }

    fn skip(&mut self, id: String, error: HierarchyError) {
        self.stats.records_skipped += 1;
        tracing::debug!(
            object_id = %id,
            error = %error,
            "Skipping object"
        );
        self.skipped.push(SkippedObject {
            id,
            reason: error.to_string(),
        });
    }

    pub fn objects(&self) -> &[GeometricObject] {
        &self.objects
    }

    pub fn skipped(&self) -> &[SkippedObject] {
        &self.skipped
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Distinct annotation labels in the input.
    ///
    /// Counts every record seen, including skipped ones, so a region with
    /// broken geometry still marks its label as present. Detection labels
    /// never take a role and are not included.
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Split into objects and skipped records.
    pub fn into_parts(self) -> (Vec<GeometricObject>, Vec<SkippedObject>) {
        (self.objects, self.skipped)
    }
}
