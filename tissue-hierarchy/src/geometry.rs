//! Geometry adapter.
//!
//! This module provides:
//! - WKT parsing
//! - [`RegionGeometry`]: a polygon/multipolygon with cached envelope, area and
//!   representative point
//! - The exact point-in-polygon predicate used for assignment
//!
//! # Design
//!
//! Every object is queried many times during resolution (once per parent
//! whose envelope it overlaps), so the derived values are computed once at
//! load time and never recomputed. Geometry is immutable after construction.
//!
//! Containment is decided on a single representative point per child, not on
//! polygon overlap. With [`RepresentativePointPolicy::Centroid`] the point is
//! the plain centroid, which can fall outside a strongly concave shape; such a
//! child is then never contained by anything. `InteriorFallback` trades a
//! little load time for a point guaranteed to lie inside.

use crate::config::RepresentativePointPolicy;
use crate::error::{HierarchyError, Result};
use geo::{Area, BoundingRect, Centroid, Contains, CoordsIter, InteriorPoint, Validation};
use geo_types::{Geometry, MultiPolygon, Point, Rect};
use serde::{Deserialize, Serialize};

/// Geometry type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GeometryType {
    Point = 0,
    LineString = 1,
    Polygon = 2,
    MultiPoint = 3,
    MultiLineString = 4,
    MultiPolygon = 5,
    GeometryCollection = 6,
}

impl GeometryType {
    /// Classify a geo-types Geometry.
    pub fn from_geometry(geom: &Geometry<f64>) -> Self {
        match geom {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) | Geometry::Line(_) => GeometryType::LineString,
            Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
                GeometryType::Polygon
            }
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// Check if this is an areal type.
    pub fn is_polygonal(&self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }
}

/// Axis-aligned bounding box in image-plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create a new envelope.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Envelope of a geo-types Rect.
    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Check if this envelope intersects another. Touching edges count.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if this envelope contains a point (inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A polygonal region with cached derived values.
#[derive(Debug, Clone)]
pub struct RegionGeometry {
    shape: MultiPolygon<f64>,
    envelope: Envelope,
    representative: Point<f64>,
    area: f64,
}

impl RegionGeometry {
    /// Parse WKT and wrap the result.
    pub fn from_wkt(
        wkt: &str,
        policy: RepresentativePointPolicy,
        check_validity: bool,
    ) -> Result<Self> {
        Self::new(parse_wkt(wkt)?, policy, check_validity)
    }

    /// Wrap a parsed geometry, computing envelope, area and representative point.
    ///
    /// Only `Polygon` and `MultiPolygon` are accepted.
    pub fn new(
        geom: Geometry<f64>,
        policy: RepresentativePointPolicy,
        check_validity: bool,
    ) -> Result<Self> {
        let geom_type = GeometryType::from_geometry(&geom);
        let shape = match geom {
            Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            Geometry::MultiPolygon(mp) => mp,
            Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
            Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
            _ => {
                return Err(HierarchyError::InvalidGeometry(format!(
                    "expected Polygon or MultiPolygon, got {:?}",
                    geom_type
                )))
            }
        };

        if shape.0.iter().all(|p| p.exterior().0.is_empty()) {
            return Err(HierarchyError::InvalidGeometry("empty geometry".into()));
        }

        if shape.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(HierarchyError::InvalidGeometry(
                "non-finite coordinate".into(),
            ));
        }

        let area = shape.unsigned_area();
        if area.is_nan() || area <= 0.0 {
            return Err(HierarchyError::InvalidGeometry("zero-area geometry".into()));
        }

        if check_validity && !shape.is_valid() {
            return Err(HierarchyError::InvalidGeometry(
                "self-intersecting or malformed ring".into(),
            ));
        }

        let envelope = shape
            .bounding_rect()
            .map(Envelope::from_rect)
            .ok_or_else(|| HierarchyError::InvalidGeometry("no bounding box".into()))?;

        let centroid = shape
            .centroid()
            .ok_or_else(|| HierarchyError::InvalidGeometry("no centroid".into()))?;

        let representative = match policy {
            RepresentativePointPolicy::Centroid => centroid,
            RepresentativePointPolicy::InteriorFallback => {
                if shape.contains(&centroid) {
                    centroid
                } else {
                    shape.interior_point().unwrap_or(centroid)
                }
            }
        };

        Ok(Self {
            shape,
            envelope,
            representative,
            area,
        })
    }

    /// Axis-aligned bounding box.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Point used as this region's location when it is tested as a child.
    pub fn representative_point(&self) -> Point<f64> {
        self.representative
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Underlying shape.
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Exact point-in-polygon test. Points on the boundary are outside.
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        self.envelope.contains_point(point.x(), point.y()) && self.shape.contains(point)
    }
}

/// Exact containment of `point` by `parent`. No buffering or tolerance.
pub fn contains_point(parent: &RegionGeometry, point: &Point<f64>) -> bool {
    parent.contains_point(point)
}

/// Parse WKT string to geo-types Geometry.
pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt)
        .map_err(|e| HierarchyError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                HierarchyError::WktParse(format!("{:?}", e))
            })
        })
}
