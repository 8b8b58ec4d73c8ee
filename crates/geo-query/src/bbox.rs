//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::range::SpatialRange;

/// A geographic bounding box in degrees.
///
/// Longitudes run west to east, latitudes south to north. A box whose
/// `west` is greater than `east` crosses the antimeridian and is not a valid
/// query box; callers split it into two boxes first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Parse a bbox string: "west,south,east,north"
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            west: parse(parts[0])?,
            south: parse(parts[1])?,
            east: parse(parts[2])?,
            north: parse(parts[3])?,
        })
    }

    /// The west/east extent as a longitude range.
    pub fn longitude_range(&self) -> SpatialRange {
        SpatialRange::new(self.west, self.east)
    }

    /// The south/north extent as a latitude range.
    pub fn latitude_range(&self) -> SpatialRange {
        SpatialRange::new(self.south, self.north)
    }

    /// Width in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// True when the box collapses to a single position.
    pub fn is_point(&self) -> bool {
        self.west == self.east && self.south == self.north
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// True when the box wraps across the antimeridian (`west > east`).
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Check that the box is inside WGS84 bounds and inverted on neither axis.
    pub fn is_valid_geographic(&self) -> bool {
        let finite = [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.south <= self.north
            && self.west <= self.east
            && (-90.0..=90.0).contains(&self.south)
            && (-90.0..=90.0).contains(&self.north)
            && (-180.0..=360.0).contains(&self.west)
            && (-180.0..=360.0).contains(&self.east)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'west,south,east,north'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}
