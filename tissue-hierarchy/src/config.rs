//! Hierarchy assignment configuration types.
//!
//! The priority policy (which labels claim children first, which label is
//! processed last) is supplied here rather than hard-coded, so the same engine
//! serves different classification schemes.

use crate::error::{HierarchyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Labels treated as large anatomical regions in the spleen scheme.
pub const DEFAULT_STRUCTURAL_LABELS: [&str; 5] =
    ["Follicle", "PALS", "RedPulp", "Trabeculae", "LargeVessel"];

/// Small nested label processed last in the spleen scheme.
pub const DEFAULT_LOWEST_PRIORITY_LABEL: &str = "SmallVessel";

/// Parent/child partition mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierMode {
    /// Structural annotations are parents; every other object is a child.
    TwoTier,
    /// Every labelled annotation is a parent, ordered structural, general,
    /// lowest; detections are children.
    ThreeTier,
}

impl TierMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierMode::TwoTier => "two-tier",
            TierMode::ThreeTier => "three-tier",
        }
    }
}

impl std::str::FromStr for TierMode {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "two-tier" | "two_tier" | "2" => Ok(TierMode::TwoTier),
            "three-tier" | "three_tier" | "3" => Ok(TierMode::ThreeTier),
            other => Err(HierarchyError::Config(format!(
                "unknown mode '{}' (expected two-tier or three-tier)",
                other
            ))),
        }
    }
}

/// How a child's representative point is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentativePointPolicy {
    /// Plain geometric centroid. May fall outside strongly concave shapes.
    #[default]
    Centroid,
    /// Centroid, replaced by an interior point when the centroid lies outside
    /// the geometry.
    InteriorFallback,
}

/// Controls data parallelism inside a single parent's containment tests.
///
/// Parents themselves are always resolved sequentially.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Allow parallel containment tests.
    pub enabled: bool,

    /// Minimum number of unclaimed candidates for one parent before the
    /// containment tests are fanned out. Below this, a plain loop is cheaper.
    pub min_candidates: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_candidates: 256,
        }
    }
}

/// Configuration for one hierarchy assignment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Partition mode.
    pub mode: TierMode,

    /// Labels whose annotations claim children first.
    pub structural_labels: Vec<String>,

    /// Label whose annotations are processed last (three-tier) or treated
    /// as children (two-tier).
    pub lowest_priority_label: Option<String>,

    /// Representative point derivation for children.
    pub representative_point: RepresentativePointPolicy,

    /// Reject OGC-invalid geometry (self-intersections, bad rings).
    pub check_validity: bool,

    /// Downgrade "configured label absent from data" to a warning.
    pub allow_missing_labels: bool,

    /// Log progress every N parents (0 disables).
    pub progress_every: usize,

    /// Parallel containment testing.
    pub parallel: ParallelConfig,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self::annotations_detections()
    }
}

impl HierarchyConfig {
    /// Create a config with the given mode and labels, other fields defaulted.
    pub fn new<I, S>(mode: TierMode, structural_labels: I, lowest: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode,
            structural_labels: structural_labels.into_iter().map(Into::into).collect(),
            lowest_priority_label: lowest.map(str::to_string),
            representative_point: RepresentativePointPolicy::default(),
            check_validity: true,
            allow_missing_labels: false,
            parallel: ParallelConfig::default(),
            progress_every: 1000,
        }
    }

    /// Annotations-only hierarchy: structural regions adopt every other
    /// annotation (small vessels included) whose centroid they contain.
    pub fn annotations_only() -> Self {
        Self::new(
            TierMode::TwoTier,
            DEFAULT_STRUCTURAL_LABELS,
            Some(DEFAULT_LOWEST_PRIORITY_LABEL),
        )
    }

    /// Annotations-and-detections hierarchy: all labelled annotations adopt
    /// detections, structural regions first and small vessels last.
    pub fn annotations_detections() -> Self {
        Self::new(
            TierMode::ThreeTier,
            DEFAULT_STRUCTURAL_LABELS,
            Some(DEFAULT_LOWEST_PRIORITY_LABEL),
        )
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "annotations-only" => Some(Self::annotations_only()),
            "annotations-detections" => Some(Self::annotations_detections()),
            _ => None,
        }
    }

    /// Names accepted by [`HierarchyConfig::preset`].
    pub const PRESETS: [&'static str; 2] = ["annotations-only", "annotations-detections"];

    /// Parse from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HierarchyError::Config(format!("invalid config: {}", e)))
    }

    /// Render as TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| HierarchyError::Internal(format!("config serialization failed: {}", e)))
    }

    /// Set the partition mode.
    pub fn with_mode(mut self, mode: TierMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the representative point policy.
    pub fn with_representative_point(mut self, policy: RepresentativePointPolicy) -> Self {
        self.representative_point = policy;
        self
    }

    /// Enable or disable geometry validity checks.
    pub fn with_check_validity(mut self, check: bool) -> Self {
        self.check_validity = check;
        self
    }

    /// Tolerate configured labels that do not occur in the data.
    pub fn with_allow_missing_labels(mut self, allow: bool) -> Self {
        self.allow_missing_labels = allow;
        self
    }

    /// Set parallel containment configuration.
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set progress logging interval.
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    /// Is `label` one of the structural labels?
    pub fn is_structural(&self, label: &str) -> bool {
        self.structural_labels.iter().any(|l| l == label)
    }

    /// Is `label` the lowest-priority label?
    pub fn is_lowest(&self, label: &str) -> bool {
        self.lowest_priority_label.as_deref() == Some(label)
    }

    /// Check that the label configuration defines a total priority order.
    pub fn validate(&self) -> Result<()> {
        if self.structural_labels.is_empty() {
            return Err(HierarchyError::Config(
                "structural_labels must name at least one label".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for label in &self.structural_labels {
            if label.trim().is_empty() {
                return Err(HierarchyError::Config("structural label is blank".into()));
            }
            if !seen.insert(label.as_str()) {
                return Err(HierarchyError::Config(format!(
                    "structural label '{}' listed more than once",
                    label
                )));
            }
        }

        if let Some(lowest) = &self.lowest_priority_label {
            if lowest.trim().is_empty() {
                return Err(HierarchyError::Config(
                    "lowest_priority_label is blank".into(),
                ));
            }
            if seen.contains(lowest.as_str()) {
                return Err(HierarchyError::Config(format!(
                    "label '{}' is both structural and lowest-priority",
                    lowest
                )));
            }
        }

        Ok(())
    }

    /// Check every configured label against the labels present in the data.
    ///
    /// Missing labels are an error unless `allow_missing_labels` is set, in
    /// which case they are logged and returned.
    pub fn validate_against_labels(&self, present: &BTreeSet<String>) -> Result<Vec<String>> {
        let missing: Vec<String> = self
            .structural_labels
            .iter()
            .chain(self.lowest_priority_label.iter())
            .filter(|l| !present.contains(l.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(missing);
        }

        if self.allow_missing_labels {
            tracing::warn!(
                missing = ?missing,
                "Configured labels absent from data"
            );
            Ok(missing)
        } else {
            Err(HierarchyError::Config(format!(
                "configured labels absent from data: {}",
                missing.join(", ")
            )))
        }
    }
}
