//! # Sectional Shaft Geometry
//!
//! [`GeometryModel`] owns the stepped-diameter layout of the input shaft.
//! It is bound to the [`ShaftFrame`] of the latest analysis and re-derives
//! spans, limits and placements from it after every edit.
//!
//! Region layout along the axis:
//!
//! ```text
//! 0 |<- Before ---| E1 |-- Between --| E2 | ... | En |--- After --->| L
//! ```
//!
//! Eccentric `i` is centred on the `i`-th load coordinate. The other regions
//! stack their subsections from the adjacent eccentric edge outward.
//!
//! Out-of-bound subsections are never clamped. They stay in the model,
//! are reported as [`BoundViolation`]s and are left out of the placements
//! until the user fixes them.
//!
//! ## Example
//! ```rust
//! use shaft_core::calculations::shaft_analysis::{analyze, ShaftLoadCase, ShaftMaterial};
//! use shaft_core::geometry::{GeometryModel, RegionKind};
//!
//! let case = ShaftLoadCase::simply_supported(
//!     500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0,
//!     ShaftMaterial::new("C45", 200.0, 2.0),
//! );
//! let result = analyze(&case).unwrap();
//! let mut model = GeometryModel::new(result.frame(&case));
//!
//! model.set_subsection_attributes(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
//! model.set_subsection_attributes(RegionKind::Eccentrics, 1, 16.0, 60.0).unwrap();
//!
//! let report = model.append_subsection(RegionKind::BeforeEccentrics, 40.0, 50.0).unwrap();
//! assert!(report.accepted);
//! assert_eq!(model.compute_placements().region(RegionKind::BeforeEccentrics).len(), 1);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::region::{Growth, RegionKind, RegionSpan, Subsection};
use super::report::{
    Bound, BoundViolation, BoundsReport, EditReport, GeometryLimits, OutlinePoint, Placement, PlacementSnapshot,
    RegionLimits, SubsectionLimits,
};
use crate::calculations::shaft_analysis::ShaftFrame;
use crate::errors::{CalcError, CalcResult};
use crate::piecewise::POSITION_TOLERANCE;

/// Persisted form of the subsection lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    /// Shared eccentric diameter (mm)
    #[serde(default)]
    pub eccentric_diameter_mm: Option<f64>,
    #[serde(default)]
    pub regions: BTreeMap<RegionKind, Vec<Subsection>>,
}

/// Owned, single-writer geometry of one shaft design.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryModel {
    frame: ShaftFrame,
    eccentric_diameter_mm: Option<f64>,
    regions: BTreeMap<RegionKind, Vec<Subsection>>,
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn half_length(sub: &Subsection) -> f64 {
    sub.occupied_mm() / 2.0
}

fn empty_regions(eccentrics: usize) -> BTreeMap<RegionKind, Vec<Subsection>> {
    RegionKind::ALL
        .into_iter()
        .map(|kind| {
            let subsections = if kind.has_fixed_count() {
                vec![Subsection::default(); eccentrics]
            } else {
                Vec::new()
            };
            (kind, subsections)
        })
        .collect()
}

impl GeometryModel {
    /// Fresh model with one undefined subsection per eccentric.
    pub fn new(frame: ShaftFrame) -> Self {
        let regions = empty_regions(frame.eccentric_positions_mm.len());
        GeometryModel {
            frame,
            eccentric_diameter_mm: None,
            regions,
        }
    }

    /// Rebuild a model from persisted subsection lists.
    ///
    /// The eccentric count of the snapshot must match the frame.
    pub fn restore(frame: ShaftFrame, snapshot: GeometrySnapshot) -> CalcResult<Self> {
        let mut model = GeometryModel::new(frame);
        let expected = model.frame.eccentric_positions_mm.len();
        for (kind, subsections) in snapshot.regions {
            if kind.has_fixed_count() && subsections.len() != expected {
                return Err(CalcError::invalid_input(
                    "geometry.regions.Eccentrics",
                    subsections.len().to_string(),
                    format!("Expected {} eccentric subsections", expected),
                ));
            }
            model.regions.insert(kind, subsections);
        }
        model.eccentric_diameter_mm = snapshot.eccentric_diameter_mm;
        model.sync_eccentric_diameter();
        Ok(model)
    }

    pub fn snapshot(&self) -> GeometrySnapshot {
        GeometrySnapshot {
            eccentric_diameter_mm: self.eccentric_diameter_mm,
            regions: self.regions.clone(),
        }
    }

    pub fn frame(&self) -> &ShaftFrame {
        &self.frame
    }

    pub fn eccentric_diameter_mm(&self) -> Option<f64> {
        self.eccentric_diameter_mm
    }

    /// Re-bind to the frame of a newer analysis.
    ///
    /// When the number of eccentrics changes the whole layout is discarded,
    /// otherwise every subsection is kept and re-checked.
    pub fn update_frame(&mut self, frame: ShaftFrame) -> BoundsReport {
        let old_count = self.frame.eccentric_positions_mm.len();
        let new_count = frame.eccentric_positions_mm.len();
        if old_count != new_count {
            debug!(old_count, new_count, "Eccentric count changed, rebuilding geometry");
            self.regions = empty_regions(new_count);
            self.eccentric_diameter_mm = None;
        }
        self.frame = frame;

        let report = self.validate_all_bounds();
        if !report.all_within() {
            warn!(
                violations = report.violations.len(),
                "Subsections no longer fit after frame update"
            );
        }
        report
    }

    pub fn subsections(&self, region: RegionKind) -> &[Subsection] {
        self.regions.get(&region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subsection_count(&self, region: RegionKind) -> usize {
        self.subsections(region).len()
    }

    /// True once every eccentric has a length and the shared diameter is set.
    pub fn eccentrics_defined(&self) -> bool {
        let eccentrics = self.subsections(RegionKind::Eccentrics);
        eccentrics.iter().all(|s| usable(s.length_mm).is_some())
            && (eccentrics.is_empty() || usable(self.eccentric_diameter_mm).is_some())
    }

    /// Whether the designer should offer adding another subsection.
    ///
    /// Other regions open only after the eccentrics are defined, and a new
    /// subsection is offered only when the last one is complete.
    pub fn can_add_subsection(&self, region: RegionKind) -> bool {
        if region.has_fixed_count() || !self.eccentrics_defined() {
            return false;
        }
        match self.subsections(region).last() {
            Some(last) => usable(last.length_mm).is_some() && usable(last.diameter_mm).is_some(),
            None => true,
        }
    }

    /// Append an undefined subsection and return its index.
    pub fn add_subsection(&mut self, region: RegionKind) -> CalcResult<usize> {
        let subsections = self.editable_region(region)?;
        subsections.push(Subsection::default());
        let index = subsections.len() - 1;
        debug!(%region, index, "Subsection added");
        Ok(index)
    }

    /// Append a subsection with both attributes set.
    ///
    /// The subsection is kept only if it fits; otherwise the region is left
    /// unchanged and the report carries the reason.
    pub fn append_subsection(&mut self, region: RegionKind, length_mm: f64, diameter_mm: f64) -> CalcResult<EditReport> {
        let index = self.subsection_count(region);
        let attribute_violations = attribute_violations(region, index, length_mm, diameter_mm);
        if !attribute_violations.is_empty() {
            self.editable_region(region)?;
            return Ok(self.refused(region, index, attribute_violations));
        }

        self.editable_region(region)?
            .push(Subsection::new(length_mm, diameter_mm));
        let report = self.validate_all_bounds();
        let own: Vec<BoundViolation> = report.for_subsection(region, index).copied().collect();
        if !own.is_empty() {
            self.editable_region(region)?.pop();
            return Ok(self.refused(region, index, own));
        }

        debug!(%region, index, length_mm, diameter_mm, "Subsection appended");
        Ok(EditReport {
            region,
            index,
            accepted: true,
            violations: report.violations,
        })
    }

    /// Set length and diameter of an existing subsection.
    ///
    /// Non-positive values are refused and not stored. Values that exceed
    /// the region are stored and flagged so the user can correct them.
    /// For eccentrics the diameter is the shared eccentric diameter.
    pub fn set_subsection_attributes(
        &mut self,
        region: RegionKind,
        index: usize,
        length_mm: f64,
        diameter_mm: f64,
    ) -> CalcResult<EditReport> {
        self.subsection_mut(region, index)?;
        let attribute_violations = attribute_violations(region, index, length_mm, diameter_mm);
        if !attribute_violations.is_empty() {
            return Ok(self.refused(region, index, attribute_violations));
        }

        *self.subsection_mut(region, index)? = Subsection::new(length_mm, diameter_mm);
        if region.has_fixed_count() {
            self.eccentric_diameter_mm = Some(diameter_mm);
            self.sync_eccentric_diameter();
        }

        let report = self.validate_all_bounds();
        if report.for_subsection(region, index).next().is_some() {
            warn!(%region, index, length_mm, "Subsection exceeds its region");
        }
        Ok(EditReport {
            region,
            index,
            accepted: true,
            violations: report.violations,
        })
    }

    /// Set the diameter shared by all eccentric subsections.
    pub fn set_eccentric_diameter(&mut self, diameter_mm: f64) -> CalcResult<BoundsReport> {
        if usable(Some(diameter_mm)).is_none() {
            return Err(CalcError::invalid_input(
                "eccentric_diameter_mm",
                diameter_mm.to_string(),
                "Eccentric diameter must be positive",
            ));
        }
        self.eccentric_diameter_mm = Some(diameter_mm);
        self.sync_eccentric_diameter();
        Ok(self.validate_all_bounds())
    }

    /// Remove a subsection; the following ones shift down by one index.
    pub fn remove_subsection(&mut self, region: RegionKind, index: usize) -> CalcResult<Subsection> {
        self.subsection_mut(region, index)?;
        let removed = self.editable_region(region)?.remove(index);
        debug!(%region, index, remaining = self.subsection_count(region), "Subsection removed");
        Ok(removed)
    }

    /// Interval currently available to a region.
    pub fn region_span(&self, region: RegionKind) -> RegionSpan {
        let shaft_end = self.frame.shaft_length_mm;
        let edges = self.eccentric_edges();
        let first = edges.first().copied();
        let last = edges.last().copied();
        let (start_mm, end_mm) = match region {
            RegionKind::Eccentrics => (0.0, shaft_end),
            RegionKind::BeforeEccentrics => (0.0, first.map(|e| e.0).unwrap_or(0.0)),
            RegionKind::BetweenEccentrics => match (edges.first(), edges.get(1)) {
                (Some(a), Some(b)) => (a.1, b.0),
                (Some(a), None) => (a.1, a.1),
                _ => (0.0, 0.0),
            },
            RegionKind::AfterEccentrics => (last.map(|e| e.1).unwrap_or(0.0), shaft_end),
        };
        RegionSpan {
            start_mm,
            end_mm,
            growth: region.growth(),
        }
    }

    /// Length and diameter bounds for every subsection slot.
    pub fn compute_limits(&self) -> GeometryLimits {
        let regions = RegionKind::ALL
            .into_iter()
            .map(|kind| {
                let limits = if kind.has_fixed_count() {
                    self.eccentric_limits()
                } else {
                    self.stacked_limits(kind)
                };
                (kind, limits)
            })
            .collect();
        GeometryLimits { regions }
    }

    /// Absolute placement of every complete, in-bounds subsection.
    pub fn compute_placements(&self) -> PlacementSnapshot {
        let bounds = self.validate_all_bounds();
        let mut regions = BTreeMap::new();

        let mut eccentrics = Vec::new();
        if let Some(diameter_mm) = usable(self.eccentric_diameter_mm) {
            for (index, (sub, center)) in self.eccentric_pairs().enumerate() {
                let Some(length_mm) = usable(sub.length_mm) else { continue };
                if bounds.for_subsection(RegionKind::Eccentrics, index).next().is_some() {
                    continue;
                }
                eccentrics.push(Placement {
                    index,
                    start_mm: center - length_mm / 2.0,
                    length_mm,
                    diameter_mm,
                    axis_offset_mm: self.eccentric_offset(index),
                });
            }
        }
        regions.insert(RegionKind::Eccentrics, eccentrics);

        for kind in RegionKind::ALL.into_iter().filter(|k| !k.has_fixed_count()) {
            let span = self.region_span(kind);
            let mut offset = 0.0;
            let mut placed = Vec::new();
            for (index, sub) in self.subsections(kind).iter().enumerate() {
                let (Some(length_mm), Some(diameter_mm)) = (usable(sub.length_mm), usable(sub.diameter_mm)) else {
                    continue;
                };
                if bounds.for_subsection(kind, index).next().is_some() {
                    continue;
                }
                let (start_mm, _) = span.place(offset, length_mm);
                offset += length_mm;
                placed.push(Placement {
                    index,
                    start_mm,
                    length_mm,
                    diameter_mm,
                    axis_offset_mm: 0.0,
                });
            }
            regions.insert(kind, placed);
        }

        let snapshot = PlacementSnapshot {
            outline: self.outline(&regions),
            regions,
        };
        debug!(
            placed = snapshot.placement_count(),
            flagged = bounds.violations.len(),
            "Placements computed"
        );
        snapshot
    }

    /// Check every subsection against its region.
    pub fn validate_all_bounds(&self) -> BoundsReport {
        let mut violations = Vec::new();
        self.check_eccentrics(&mut violations);
        for kind in RegionKind::ALL.into_iter().filter(|k| !k.has_fixed_count()) {
            self.check_stacked(kind, &mut violations);
        }
        BoundsReport { violations }
    }

    /// True when no subsection violates its bounds.
    pub fn meets_limits(&self) -> bool {
        self.validate_all_bounds().all_within()
    }

    // ========================================================================
    // Eccentric region
    // ========================================================================

    fn eccentric_pairs(&self) -> impl Iterator<Item = (&Subsection, f64)> {
        self.subsections(RegionKind::Eccentrics)
            .iter()
            .zip(self.frame.eccentric_positions_mm.iter().copied())
    }

    /// `(left, right)` edge of each eccentric; undefined ones are zero-width.
    fn eccentric_edges(&self) -> Vec<(f64, f64)> {
        self.eccentric_pairs()
            .map(|(sub, center)| {
                let half = half_length(sub);
                (center - half, center + half)
            })
            .collect()
    }

    /// Alternating `+e` / `-e` offset of the eccentric axis.
    fn eccentric_offset(&self, index: usize) -> f64 {
        if index % 2 == 0 {
            self.frame.eccentricity_mm
        } else {
            -self.frame.eccentricity_mm
        }
    }

    /// Axial room an eccentric may occupy: shaft ends and neighbour edges.
    fn eccentric_room(&self, index: usize) -> (f64, f64) {
        let edges = self.eccentric_edges();
        let lower = if index == 0 { 0.0 } else { edges[index - 1].1 };
        let upper = edges
            .get(index + 1)
            .map(|e| e.0)
            .unwrap_or(self.frame.shaft_length_mm);
        (lower, upper)
    }

    fn eccentric_limits(&self) -> RegionLimits {
        let subsections = self
            .eccentric_pairs()
            .enumerate()
            .map(|(index, (_, center))| {
                let (lower, upper) = self.eccentric_room(index);
                SubsectionLimits {
                    min_length_mm: 0.0,
                    max_length_mm: (2.0 * (center - lower).min(upper - center)).max(0.0),
                    min_diameter_mm: self.frame.eccentric_diameter_mm,
                }
            })
            .collect();
        RegionLimits {
            subsections,
            next: None,
        }
    }

    fn check_eccentrics(&self, violations: &mut Vec<BoundViolation>) {
        let region = RegionKind::Eccentrics;
        let diameter = self.eccentric_diameter_mm;
        for (index, (sub, center)) in self.eccentric_pairs().enumerate() {
            let mut flag = |bound| violations.push(BoundViolation { region, index, bound });
            if let Some(d) = diameter.filter(|_| usable(diameter).is_none()) {
                flag(Bound::Diameter { value_mm: d });
            }
            let Some(length) = sub.length_mm else { continue };
            if usable(Some(length)).is_none() {
                flag(Bound::Length { value_mm: length });
                continue;
            }
            let (lower, upper) = self.eccentric_room(index);
            let (start, end) = (center - length / 2.0, center + length / 2.0);
            if start < lower - POSITION_TOLERANCE {
                flag(Bound::Lower {
                    limit_mm: lower,
                    actual_mm: start,
                });
            }
            if end > upper + POSITION_TOLERANCE {
                flag(Bound::Upper {
                    limit_mm: upper,
                    actual_mm: end,
                });
            }
        }
    }

    // ========================================================================
    // Stacked regions
    // ========================================================================

    fn stacked_limits(&self, region: RegionKind) -> RegionLimits {
        let span = self.region_span(region);
        let available = span.available_mm();
        let min_diameter_mm = self.frame.required_diameter_between(span.start_mm, span.end_mm);
        let lengths: Vec<f64> = self
            .subsections(region)
            .iter()
            .map(Subsection::occupied_mm)
            .collect();
        let total: f64 = lengths.iter().sum();
        let limits = |others: f64| SubsectionLimits {
            min_length_mm: 0.0,
            max_length_mm: (available - others).max(0.0),
            min_diameter_mm,
        };
        RegionLimits {
            subsections: lengths.iter().map(|own| limits(total - own)).collect(),
            next: Some(limits(total)),
        }
    }

    fn check_stacked(&self, region: RegionKind, violations: &mut Vec<BoundViolation>) {
        let span = self.region_span(region);
        let available = span.available_mm();
        let mut cumulative = 0.0;
        for (index, sub) in self.subsections(region).iter().enumerate() {
            let mut flag = |bound| violations.push(BoundViolation { region, index, bound });
            if let Some(d) = sub.diameter_mm.filter(|d| usable(Some(*d)).is_none()) {
                flag(Bound::Diameter { value_mm: d });
            }
            let Some(length) = sub.length_mm else { continue };
            if usable(Some(length)).is_none() {
                flag(Bound::Length { value_mm: length });
                continue;
            }
            cumulative += length;
            if cumulative > available + POSITION_TOLERANCE {
                flag(Bound::Span {
                    available_mm: available,
                    required_mm: cumulative,
                });
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn outline(&self, regions: &BTreeMap<RegionKind, Vec<Placement>>) -> Vec<OutlinePoint> {
        let mut outline: Vec<OutlinePoint> = self
            .frame
            .key_coordinates
            .iter()
            .map(|k| OutlinePoint {
                label: k.label.clone(),
                z_mm: k.z_mm,
            })
            .collect();

        for placement in regions.get(&RegionKind::Eccentrics).into_iter().flatten() {
            let number = placement.index + 1;
            outline.push(OutlinePoint {
                label: format!("E{} left", number),
                z_mm: placement.start_mm,
            });
            outline.push(OutlinePoint {
                label: format!("E{} right", number),
                z_mm: placement.end_mm(),
            });
        }

        for kind in [RegionKind::BeforeEccentrics, RegionKind::AfterEccentrics] {
            let placed = regions.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
            let stack_length: f64 = placed.iter().map(|p| p.length_mm).sum();
            if stack_length > 0.0 {
                let span = self.region_span(kind);
                let (start, end) = span.place(0.0, stack_length);
                let z_mm = match span.growth {
                    Growth::Forward => end,
                    Growth::Backward => start,
                };
                outline.push(OutlinePoint {
                    label: format!("{} end", kind),
                    z_mm,
                });
            }
        }

        outline.sort_by(|a, b| a.z_mm.total_cmp(&b.z_mm));
        outline
    }

    fn refused(&self, region: RegionKind, index: usize, violations: Vec<BoundViolation>) -> EditReport {
        warn!(%region, index, ?violations, "Subsection edit refused");
        EditReport {
            region,
            index,
            accepted: false,
            violations,
        }
    }

    fn sync_eccentric_diameter(&mut self) {
        let diameter = self.eccentric_diameter_mm;
        if let Some(eccentrics) = self.regions.get_mut(&RegionKind::Eccentrics) {
            for sub in eccentrics {
                sub.diameter_mm = diameter;
            }
        }
    }

    /// Subsection list of a region whose count the user controls.
    fn editable_region(&mut self, region: RegionKind) -> CalcResult<&mut Vec<Subsection>> {
        if region.has_fixed_count() {
            return Err(CalcError::FixedSubsectionCount {
                region: region.to_string(),
            });
        }
        Ok(self.regions.entry(region).or_default())
    }

    fn subsection_mut(&mut self, region: RegionKind, index: usize) -> CalcResult<&mut Subsection> {
        let subsections = self.regions.entry(region).or_default();
        let count = subsections.len();
        subsections
            .get_mut(index)
            .ok_or_else(|| CalcError::SubsectionNotFound {
                region: region.to_string(),
                index,
                count,
            })
    }
}

fn attribute_violations(region: RegionKind, index: usize, length_mm: f64, diameter_mm: f64) -> Vec<BoundViolation> {
    let mut violations = Vec::new();
    if usable(Some(length_mm)).is_none() {
        violations.push(BoundViolation {
            region,
            index,
            bound: Bound::Length { value_mm: length_mm },
        });
    }
    if usable(Some(diameter_mm)).is_none() {
        violations.push(BoundViolation {
            region,
            index,
            bound: Bound::Diameter { value_mm: diameter_mm },
        });
    }
    violations
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn frame(positions: Vec<f64>) -> ShaftFrame {
        ShaftFrame {
            shaft_length_mm: 600.0,
            eccentric_positions_mm: positions,
            eccentric_diameter_mm: 50.0,
            eccentricity_mm: 1.5,
            key_coordinates: Vec::new(),
            diameter_profile: vec![(0.0, 30.0), (600.0, 30.0)],
        }
    }

    fn edits() -> impl Strategy<Value = Vec<(usize, f64)>> {
        prop::collection::vec((0_usize..3, 1.0_f64..200.0), 0..12)
    }

    fn build(eccentric_length: f64, edits: &[(usize, f64)]) -> GeometryModel {
        let mut model = GeometryModel::new(frame(vec![250.0, 350.0]));
        for index in 0..2 {
            model
                .set_subsection_attributes(RegionKind::Eccentrics, index, eccentric_length, 60.0)
                .unwrap();
        }
        let regions = [RegionKind::BeforeEccentrics, RegionKind::BetweenEccentrics, RegionKind::AfterEccentrics];
        for &(region, length) in edits {
            model.append_subsection(regions[region], length, 40.0).unwrap();
        }
        model
    }

    proptest! {
        #[test]
        fn placed_lengths_fit_their_span(eccentric_length in 1.0_f64..150.0, edits in edits()) {
            let model = build(eccentric_length, &edits);
            let placements = model.compute_placements();
            for kind in RegionKind::ALL.into_iter().filter(|k| !k.has_fixed_count()) {
                let placed: f64 = placements.region(kind).iter().map(|p| p.length_mm).sum();
                prop_assert!(placed <= model.region_span(kind).available_mm() + POSITION_TOLERANCE);
            }
            let limits = model.compute_limits();
            for region in limits.regions.values() {
                prop_assert!(region.subsections.iter().chain(region.next.iter()).all(|l| l.max_length_mm >= 0.0));
            }
        }

        #[test]
        fn placements_are_stable(eccentric_length in 1.0_f64..150.0, edits in edits()) {
            let model = build(eccentric_length, &edits);
            prop_assert_eq!(model.compute_placements(), model.compute_placements());
            prop_assert_eq!(model.compute_limits(), model.compute_limits());
        }
    }
}
