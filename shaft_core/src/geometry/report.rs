//! Structured outputs of the geometry model: bound violations, limits and
//! placements. All of them are plain serializable records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::region::RegionKind;

/// Which constraint a subsection breaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Bound {
    /// Stack of subsections longer than the region span
    Span { available_mm: f64, required_mm: f64 },
    /// Subsection starts before the lower limit
    Lower { limit_mm: f64, actual_mm: f64 },
    /// Subsection ends past the upper limit
    Upper { limit_mm: f64, actual_mm: f64 },
    /// Length must be positive
    Length { value_mm: f64 },
    /// Diameter must be positive
    Diameter { value_mm: f64 },
}

/// A subsection that currently does not fit its region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundViolation {
    pub region: RegionKind,
    pub index: usize,
    pub bound: Bound,
}

/// Result of re-checking every subsection against its region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundsReport {
    pub violations: Vec<BoundViolation>,
}

impl BoundsReport {
    pub fn all_within(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one subsection
    pub fn for_subsection(&self, region: RegionKind, index: usize) -> impl Iterator<Item = &BoundViolation> {
        self.violations
            .iter()
            .filter(move |v| v.region == region && v.index == index)
    }
}

/// Outcome of a single subsection edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditReport {
    pub region: RegionKind,
    pub index: usize,
    /// False when the edit was refused and the model left unchanged
    pub accepted: bool,
    /// Every violation present in the model after the edit
    pub violations: Vec<BoundViolation>,
}

impl EditReport {
    /// Accepted and nothing in the model violates its bounds
    pub fn is_clean(&self) -> bool {
        self.accepted && self.violations.is_empty()
    }

    /// True if the edited subsection itself is flagged
    pub fn edited_is_flagged(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.region == self.region && v.index == self.index)
    }
}

/// Input bounds for one subsection slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsectionLimits {
    /// Exclusive lower length bound (mm)
    pub min_length_mm: f64,
    /// Inclusive upper length bound (mm), never negative
    pub max_length_mm: f64,
    /// Recommended minimum diameter from the strength calculation (mm)
    pub min_diameter_mm: f64,
}

/// Limits of one region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionLimits {
    /// Limits of each existing subsection, by index
    pub subsections: Vec<SubsectionLimits>,
    /// Limits for the next subsection to be appended (none for fixed-count regions)
    pub next: Option<SubsectionLimits>,
}

/// Limits of all regions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryLimits {
    pub regions: BTreeMap<RegionKind, RegionLimits>,
}

impl GeometryLimits {
    pub fn region(&self, region: RegionKind) -> Option<&RegionLimits> {
        self.regions.get(&region)
    }

    pub fn subsection(&self, region: RegionKind, index: usize) -> Option<&SubsectionLimits> {
        self.regions.get(&region).and_then(|r| r.subsections.get(index))
    }
}

/// Absolute placement of one subsection for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub index: usize,
    /// Left end (mm)
    pub start_mm: f64,
    pub length_mm: f64,
    pub diameter_mm: f64,
    /// Offset of the subsection axis from the shaft axis (eccentrics only)
    pub axis_offset_mm: f64,
}

impl Placement {
    pub fn end_mm(&self) -> f64 {
        self.start_mm + self.length_mm
    }
}

/// Named marker on the shaft axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlinePoint {
    pub label: String,
    pub z_mm: f64,
}

/// Placements of every valid subsection plus the marker outline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementSnapshot {
    pub regions: BTreeMap<RegionKind, Vec<Placement>>,
    pub outline: Vec<OutlinePoint>,
}

impl PlacementSnapshot {
    pub fn region(&self, region: RegionKind) -> &[Placement] {
        self.regions.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Largest placed diameter, used to offset dimension lines
    pub fn max_diameter_mm(&self) -> f64 {
        self.regions
            .values()
            .flatten()
            .map(|p| p.diameter_mm)
            .fold(0.0, f64::max)
    }

    pub fn placement_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}
