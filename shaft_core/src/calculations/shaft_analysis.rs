//! Input Shaft Beam Analysis
//!
//! Turns a [`ShaftLoadCase`] into support reactions, bending-moment, torque
//! and equivalent-moment distributions, and the minimum safe diameter along
//! the shaft axis.
//!
//! ## Supported Layouts
//! - Simply-supported shaft with one pair of cyclo-disc forces treated as a
//!   couple (supports at both shaft ends)
//! - Two supports at arbitrary coordinates carrying any number of cyclo-disc
//!   point loads
//!
//! ## Sign Convention
//! - Forces are signed, positive in the direction of the first reaction
//! - Bending moment `Mg(z) = Σ F_p (z - z_p)` over forces left of `z`
//! - Positions in mm, forces in N, moments in N·m
//!
//! ## Example
//! ```rust
//! use shaft_core::calculations::shaft_analysis::{analyze, ShaftLoadCase, ShaftMaterial};
//!
//! let case = ShaftLoadCase::simply_supported(
//!     500.0,   // L
//!     200.0,   // L1
//!     20.0,    // B
//!     0.0,     // x
//!     10_000.0, // F
//!     500.0,   // Mwe
//!     2.0,     // e
//!     ShaftMaterial::new("C45", 200.0, 2.0),
//! );
//!
//! let result = analyze(&case).unwrap();
//! assert!((result.reaction_a_n - 400.0).abs() < 1e-9);
//! println!("dsc = {:.2} mm, dec = {:.2} mm", result.shaft_diameter_mm, result.eccentric_diameter_mm);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::piecewise::{round_to, sample_grid, PiecewiseFunction, POSITION_TOLERANCE};
use crate::units::{Megapascals, Meters, Millimeters, NewtonMeters, NewtonMillimeters, Pascals};

/// Default number of uniform samples along the shaft
pub const DEFAULT_SAMPLE_POINTS: usize = 100;

/// Smallest accepted grid size
pub const MIN_SAMPLE_POINTS: usize = 2;

/// Largest accepted grid size
pub const MAX_SAMPLE_POINTS: usize = 10_000;

/// Largest accepted rounding precision
pub const MAX_DECIMALS: u32 = 12;

/// Shaft material as selected from a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftMaterial {
    /// Catalog designation (e.g., "C45")
    pub label: String,
    /// Fatigue limit for reversed bending Zgo (MPa)
    pub zgo_mpa: f64,
    /// Safety factor xz
    pub safety_factor: f64,
}

impl ShaftMaterial {
    pub fn new(label: impl Into<String>, zgo_mpa: f64, safety_factor: f64) -> Self {
        ShaftMaterial {
            label: label.into(),
            zgo_mpa,
            safety_factor,
        }
    }

    /// Permissible bending stress kgo = Zgo / xz (MPa)
    pub fn permissible_stress_mpa(&self) -> f64 {
        self.zgo_mpa / self.safety_factor
    }

    fn validate(&self) -> CalcResult<()> {
        if !(self.zgo_mpa.is_finite() && self.zgo_mpa > 0.0) {
            return Err(CalcError::invalid_input(
                "material.zgo_mpa",
                self.zgo_mpa.to_string(),
                "Fatigue limit must be positive",
            ));
        }
        if !(self.safety_factor.is_finite() && self.safety_factor > 0.0) {
            return Err(CalcError::invalid_input(
                "material.safety_factor",
                self.safety_factor.to_string(),
                "Safety factor must be positive",
            ));
        }
        Ok(())
    }
}

/// Point load applied by a cyclo-disc (signed, N)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Axial coordinate (mm from the shaft start)
    pub position_mm: f64,
    /// Signed force (N)
    pub force_n: f64,
}

impl PointLoad {
    pub fn new(position_mm: f64, force_n: f64) -> Self {
        PointLoad { position_mm, force_n }
    }
}

/// Cyclo-disc loads with alternating `F, -F, F, ...` forces.
pub fn cyclo_disc_loads(positions_mm: &[f64], force_n: f64) -> Vec<PointLoad> {
    positions_mm
        .iter()
        .enumerate()
        .map(|(i, &z)| PointLoad::new(z, if i % 2 == 0 { force_n } else { -force_n }))
        .collect()
}

/// How the shaft is supported and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SupportLayout {
    /// Supports at `z = 0` and `z = L`; discs at `L1` and `L2 = L1 + B + x`
    SimplySupported {
        /// L1: first cyclo-disc coordinate (mm)
        first_disc_mm: f64,
        /// B: cyclo-disc width (mm)
        disc_spacing_mm: f64,
        /// x: gap between the discs (mm)
        offset_mm: f64,
        /// F: cyclo-disc force (N)
        disc_force_n: f64,
    },
    /// Supports at `LA` and `LB` with point loads in between
    TwoSupport {
        support_a_mm: f64,
        support_b_mm: f64,
        loads: Vec<PointLoad>,
    },
}

/// The physical problem instance for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftLoadCase {
    /// User label (e.g., "Input shaft")
    #[serde(default)]
    pub label: String,
    /// L: overall shaft length (mm)
    pub shaft_length_mm: f64,
    pub layout: SupportLayout,
    /// Mwe: input torque (N·m)
    pub input_torque_nm: f64,
    /// e: eccentricity (mm)
    pub eccentricity_mm: f64,
    pub material: ShaftMaterial,
}

impl ShaftLoadCase {
    /// Simply-supported layout with two equal and opposite disc forces.
    #[allow(clippy::too_many_arguments)]
    pub fn simply_supported(
        shaft_length_mm: f64,
        first_disc_mm: f64,
        disc_spacing_mm: f64,
        offset_mm: f64,
        disc_force_n: f64,
        input_torque_nm: f64,
        eccentricity_mm: f64,
        material: ShaftMaterial,
    ) -> Self {
        ShaftLoadCase {
            label: String::new(),
            shaft_length_mm,
            layout: SupportLayout::SimplySupported {
                first_disc_mm,
                disc_spacing_mm,
                offset_mm,
                disc_force_n,
            },
            input_torque_nm,
            eccentricity_mm,
            material,
        }
    }

    /// Two-support layout with explicit point loads.
    pub fn two_support(
        shaft_length_mm: f64,
        support_a_mm: f64,
        support_b_mm: f64,
        loads: Vec<PointLoad>,
        input_torque_nm: f64,
        eccentricity_mm: f64,
        material: ShaftMaterial,
    ) -> Self {
        ShaftLoadCase {
            label: String::new(),
            shaft_length_mm,
            layout: SupportLayout::TwoSupport {
                support_a_mm,
                support_b_mm,
                loads,
            },
            input_torque_nm,
            eccentricity_mm,
            material,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Cyclo-disc (eccentric) coordinates in axial order.
    pub fn load_positions_mm(&self) -> Vec<f64> {
        match &self.layout {
            SupportLayout::SimplySupported {
                first_disc_mm,
                disc_spacing_mm,
                offset_mm,
                ..
            } => vec![*first_disc_mm, first_disc_mm + disc_spacing_mm + offset_mm],
            SupportLayout::TwoSupport { loads, .. } => loads.iter().map(|l| l.position_mm).collect(),
        }
    }

    /// Signed cyclo-disc forces in axial order (N).
    pub fn disc_forces_n(&self) -> Vec<f64> {
        match &self.layout {
            SupportLayout::SimplySupported { disc_force_n, .. } => vec![-disc_force_n, *disc_force_n],
            SupportLayout::TwoSupport { loads, .. } => loads.iter().map(|l| l.force_n).collect(),
        }
    }

    /// Support coordinates `(A, B)`
    pub fn support_positions_mm(&self) -> (f64, f64) {
        match &self.layout {
            SupportLayout::SimplySupported { .. } => (0.0, self.shaft_length_mm),
            SupportLayout::TwoSupport {
                support_a_mm,
                support_b_mm,
                ..
            } => (*support_a_mm, *support_b_mm),
        }
    }

    /// Validate the load case. Analysis is refused as a whole on failure.
    pub fn validate(&self) -> CalcResult<()> {
        let l = self.shaft_length_mm;
        require_finite("shaft_length_mm", l)?;
        if l == 0.0 {
            return Err(CalcError::degenerate_geometry("Shaft length L is zero"));
        }
        if l < 0.0 {
            return Err(CalcError::invalid_input(
                "shaft_length_mm",
                l.to_string(),
                "Shaft length must be positive",
            ));
        }
        require_finite("input_torque_nm", self.input_torque_nm)?;
        require_finite("eccentricity_mm", self.eccentricity_mm)?;
        if self.eccentricity_mm < 0.0 {
            return Err(CalcError::invalid_input(
                "eccentricity_mm",
                self.eccentricity_mm.to_string(),
                "Eccentricity cannot be negative",
            ));
        }
        self.material.validate()?;

        match &self.layout {
            SupportLayout::SimplySupported {
                first_disc_mm,
                disc_spacing_mm,
                offset_mm,
                disc_force_n,
            } => {
                require_finite("first_disc_mm", *first_disc_mm)?;
                require_finite("disc_spacing_mm", *disc_spacing_mm)?;
                require_finite("offset_mm", *offset_mm)?;
                require_finite("disc_force_n", *disc_force_n)?;
                let l1 = *first_disc_mm;
                let l2 = l1 + disc_spacing_mm + offset_mm;
                // Support A sits at z = 0
                if !(0.0 < l1 && l1 <= l2 && l2 <= l) {
                    return Err(CalcError::invalid_load_order(format!(
                        "Expected 0 < L1 <= L2 <= L, got L1 = {}, L2 = {}, L = {}",
                        l1, l2, l
                    )));
                }
            }
            SupportLayout::TwoSupport {
                support_a_mm,
                support_b_mm,
                loads,
            } => {
                require_finite("support_a_mm", *support_a_mm)?;
                require_finite("support_b_mm", *support_b_mm)?;
                for (i, load) in loads.iter().enumerate() {
                    require_finite(&format!("loads[{}].position_mm", i), load.position_mm)?;
                    require_finite(&format!("loads[{}].force_n", i), load.force_n)?;
                }
                let (la, lb) = (*support_a_mm, *support_b_mm);
                if la == lb {
                    return Err(CalcError::degenerate_geometry(format!(
                        "Support coordinates coincide (LA = LB = {})",
                        la
                    )));
                }
                if !(0.0 <= la && la < lb && lb <= l) {
                    return Err(CalcError::invalid_load_order(format!(
                        "Expected 0 <= LA < LB <= L, got LA = {}, LB = {}, L = {}",
                        la, lb, l
                    )));
                }
                if let Some(first) = loads.first() {
                    if first.position_mm <= la {
                        return Err(CalcError::invalid_load_order(format!(
                            "First load at {} must lie after support A at {}",
                            first.position_mm, la
                        )));
                    }
                }
                if loads.windows(2).any(|w| w[1].position_mm < w[0].position_mm) {
                    return Err(CalcError::invalid_load_order("Load coordinates must be non-decreasing"));
                }
                if let Some(last) = loads.last() {
                    if last.position_mm > lb {
                        return Err(CalcError::invalid_load_order(format!(
                            "Last load at {} lies beyond support B at {}",
                            last.position_mm, lb
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> CalcResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Value must be a finite number"))
    }
}

/// Analysis tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Uniform grid size along the shaft (key coordinates are added on top)
    pub sample_points: usize,
    /// Reduction factor k of the combined bending + torsion hypothesis
    pub reduction_factor: f64,
    /// Rounding precision applied at every sample
    pub decimals: u32,
}

impl AnalysisSettings {
    /// Reject settings read from a project file or the command line that the
    /// sampler cannot honour.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.reduction_factor.is_finite() && self.reduction_factor >= 0.0) {
            return Err(CalcError::invalid_input(
                "reduction_factor",
                self.reduction_factor.to_string(),
                "Reduction factor must be a non-negative number",
            ));
        }
        if !(MIN_SAMPLE_POINTS..=MAX_SAMPLE_POINTS).contains(&self.sample_points) {
            return Err(CalcError::invalid_input(
                "sample_points",
                self.sample_points.to_string(),
                format!("Sample points must be between {} and {}", MIN_SAMPLE_POINTS, MAX_SAMPLE_POINTS),
            ));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(CalcError::invalid_input(
                "decimals",
                self.decimals.to_string(),
                format!("Rounding precision must not exceed {} decimals", MAX_DECIMALS),
            ));
        }
        Ok(())
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            sample_points: DEFAULT_SAMPLE_POINTS,
            reduction_factor: 2.0 * 3f64.sqrt(),
            decimals: 2,
        }
    }
}

/// Named axial position where the moment/torque functions change definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCoordinate {
    pub label: String,
    pub z_mm: f64,
}

impl KeyCoordinate {
    pub fn new(label: impl Into<String>, z_mm: f64) -> Self {
        KeyCoordinate {
            label: label.into(),
            z_mm,
        }
    }
}

/// One axial sample of the diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentSample {
    /// z (mm)
    pub z_mm: f64,
    /// Mg (N·m)
    pub bending_nm: f64,
    /// Ms (N·m)
    pub torque_nm: f64,
    /// Mz (N·m)
    pub equivalent_nm: f64,
    /// d (mm)
    pub diameter_mm: f64,
}

/// Placement constraints handed from the analysis to the geometry model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaftFrame {
    pub shaft_length_mm: f64,
    /// Eccentric (cyclo-disc) centers in axial order
    pub eccentric_positions_mm: Vec<f64>,
    /// dec: minimum eccentric diameter
    pub eccentric_diameter_mm: f64,
    pub eccentricity_mm: f64,
    pub key_coordinates: Vec<KeyCoordinate>,
    /// (z, d) pairs of the required-diameter profile
    pub diameter_profile: Vec<(f64, f64)>,
}

impl ShaftFrame {
    /// Largest required diameter over `[start, end]` (mm).
    pub fn required_diameter_between(&self, start_mm: f64, end_mm: f64) -> f64 {
        let (a, b) = if start_mm <= end_mm { (start_mm, end_mm) } else { (end_mm, start_mm) };
        let inside = self
            .diameter_profile
            .iter()
            .filter(|(z, _)| *z >= a && *z <= b)
            .map(|(_, d)| *d);
        let ends = [self.interpolate_diameter(a), self.interpolate_diameter(b)];
        inside.chain(ends).fold(0.0, f64::max)
    }

    fn interpolate_diameter(&self, z: f64) -> f64 {
        let profile = &self.diameter_profile;
        match profile.iter().position(|(pz, _)| *pz >= z) {
            None => profile.last().map(|p| p.1).unwrap_or(0.0),
            Some(0) => profile.first().map(|p| p.1).unwrap_or(0.0),
            Some(i) => {
                let (z0, d0) = profile[i - 1];
                let (z1, d1) = profile[i];
                if (z1 - z0).abs() <= POSITION_TOLERANCE {
                    d1
                } else {
                    d0 + (d1 - d0) * (z - z0) / (z1 - z0)
                }
            }
        }
    }
}

/// Results of one analysis pass. Produced atomically, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub label: String,
    /// Ra: reaction at support A (N)
    pub reaction_a_n: f64,
    /// Rb: reaction at support B (N)
    pub reaction_b_n: f64,
    /// All signed forces acting on the shaft, reactions included, by position
    pub forces: Vec<PointLoad>,
    /// Samples ordered by strictly increasing z
    pub samples: Vec<MomentSample>,
    /// dsc: nominal shaft diameter = max(d) (mm)
    pub shaft_diameter_mm: f64,
    /// dec = dsc + 2e (mm)
    pub eccentric_diameter_mm: f64,
    /// kgo (MPa)
    pub permissible_stress_mpa: f64,
    /// max |Mg| (N·m)
    pub max_bending_nm: f64,
    /// max Mz (N·m)
    pub max_equivalent_nm: f64,
    pub key_coordinates: Vec<KeyCoordinate>,
}

impl AnalysisResult {
    /// Geometry constraints derived from this result.
    pub fn frame(&self, load_case: &ShaftLoadCase) -> ShaftFrame {
        ShaftFrame {
            shaft_length_mm: load_case.shaft_length_mm,
            eccentric_positions_mm: load_case.load_positions_mm(),
            eccentric_diameter_mm: self.eccentric_diameter_mm,
            eccentricity_mm: load_case.eccentricity_mm,
            key_coordinates: self.key_coordinates.clone(),
            diameter_profile: self.samples.iter().map(|s| (s.z_mm, s.diameter_mm)).collect(),
        }
    }

    /// Sample at an exact axial position, if present.
    pub fn sample_at(&self, z_mm: f64) -> Option<&MomentSample> {
        self.samples.iter().find(|s| (s.z_mm - z_mm).abs() <= POSITION_TOLERANCE)
    }
}

/// Minimum solid-shaft diameter for an equivalent moment (mm).
///
/// `d = (32 Mz / (π kgo))^(1/3)` with Mz in N·m and kgo converted to Pa.
pub fn minimum_diameter_mm(equivalent_nm: f64, permissible_stress_mpa: f64) -> f64 {
    let kgo: Pascals = Megapascals(permissible_stress_mpa).into();
    let d = Meters((32.0 * equivalent_nm / (PI * kgo.value())).cbrt());
    Millimeters::from(d).value()
}

/// Equivalent moment `sqrt(Mg² + (k/2 · Ms)²)` (N·m).
pub fn equivalent_moment_nm(bending_nm: f64, torque_nm: f64, reduction_factor: f64) -> f64 {
    (bending_nm.powi(2) + (reduction_factor / 2.0 * torque_nm).powi(2)).sqrt()
}

/// Analyze a load case with default settings.
pub fn analyze(load_case: &ShaftLoadCase) -> CalcResult<AnalysisResult> {
    analyze_with(load_case, &AnalysisSettings::default())
}

/// Analyze a load case.
///
/// All-or-nothing: an invalid load case yields an error and no partial result.
pub fn analyze_with(load_case: &ShaftLoadCase, settings: &AnalysisSettings) -> CalcResult<AnalysisResult> {
    load_case.validate()?;
    settings.validate()?;

    let length = load_case.shaft_length_mm;
    let statics = solve_statics(load_case);

    // N·mm -> N·m
    let scale = NewtonMeters::from(NewtonMillimeters(1.0)).value();
    let bending = PiecewiseFunction::from_point_forces(0.0, length, &statics.signed_forces, scale)?;
    let torque = torque_function(load_case)?;

    let key_points: Vec<f64> = statics.key_coordinates.iter().map(|k| k.z_mm).collect();
    let positions = sample_grid(0.0, length, settings.sample_points, &key_points);

    let kgo = load_case.material.permissible_stress_mpa();
    let decimals = settings.decimals;
    let samples: Vec<MomentSample> = positions
        .iter()
        .map(|&z| {
            let mg = round_to(bending.evaluate(z), decimals);
            let ms = round_to(torque.evaluate(z), decimals);
            let mz = round_to(equivalent_moment_nm(mg, ms, settings.reduction_factor), decimals);
            let d = round_to(minimum_diameter_mm(mz, kgo), decimals);
            MomentSample {
                z_mm: z,
                bending_nm: mg,
                torque_nm: ms,
                equivalent_nm: mz,
                diameter_mm: d,
            }
        })
        .collect();

    let shaft_diameter_mm = samples.iter().map(|s| s.diameter_mm).fold(0.0, f64::max);
    let max_bending_nm = samples.iter().map(|s| s.bending_nm.abs()).fold(0.0, f64::max);
    let max_equivalent_nm = samples.iter().map(|s| s.equivalent_nm).fold(0.0, f64::max);

    let mut forces: Vec<PointLoad> = statics
        .signed_forces
        .iter()
        .map(|&(z, f)| PointLoad::new(z, f))
        .collect();
    forces.sort_by(|a, b| a.position_mm.total_cmp(&b.position_mm));

    tracing::debug!(
        label = %load_case.label,
        samples = samples.len(),
        reaction_a_n = statics.reaction_a_n,
        reaction_b_n = statics.reaction_b_n,
        shaft_diameter_mm,
        "shaft analysis complete"
    );

    Ok(AnalysisResult {
        label: load_case.label.clone(),
        reaction_a_n: statics.reaction_a_n,
        reaction_b_n: statics.reaction_b_n,
        forces,
        samples,
        shaft_diameter_mm,
        eccentric_diameter_mm: shaft_diameter_mm + 2.0 * load_case.eccentricity_mm,
        permissible_stress_mpa: kgo,
        max_bending_nm,
        max_equivalent_nm,
        key_coordinates: statics.key_coordinates,
    })
}

/// Reactions, signed force list and key coordinates of a validated load case.
struct Statics {
    reaction_a_n: f64,
    reaction_b_n: f64,
    signed_forces: Vec<(f64, f64)>,
    key_coordinates: Vec<KeyCoordinate>,
}

fn solve_statics(load_case: &ShaftLoadCase) -> Statics {
    let length = load_case.shaft_length_mm;
    match &load_case.layout {
        SupportLayout::SimplySupported {
            first_disc_mm,
            disc_spacing_mm,
            offset_mm,
            disc_force_n,
        } => {
            let f = *disc_force_n;
            let l1 = *first_disc_mm;
            let l2 = l1 + disc_spacing_mm + offset_mm;

            // The disc forces form a couple F·(L2 - L1); the supports answer
            // with an equal and opposite couple over the full length.
            let reaction = f * (l2 - l1) / length;

            Statics {
                reaction_a_n: reaction,
                reaction_b_n: reaction,
                signed_forces: vec![(0.0, reaction), (l1, -f), (l2, f), (length, -reaction)],
                key_coordinates: vec![
                    KeyCoordinate::new("A", 0.0),
                    KeyCoordinate::new("L1", l1),
                    KeyCoordinate::new("L2", l2),
                    KeyCoordinate::new("B", length),
                ],
            }
        }
        SupportLayout::TwoSupport {
            support_a_mm,
            support_b_mm,
            loads,
        } => {
            let (la, lb) = (*support_a_mm, *support_b_mm);
            let total: f64 = loads.iter().map(|l| l.force_n).sum();
            let moment_about_a: f64 = loads.iter().map(|l| l.force_n * (l.position_mm - la)).sum();
            let rb = -moment_about_a / (lb - la);
            let ra = -total - rb;

            let mut signed_forces = vec![(la, ra)];
            signed_forces.extend(loads.iter().map(|l| (l.position_mm, l.force_n)));
            signed_forces.push((lb, rb));

            let mut key_coordinates = Vec::with_capacity(loads.len() + 4);
            if la > 0.0 {
                key_coordinates.push(KeyCoordinate::new("0", 0.0));
            }
            key_coordinates.push(KeyCoordinate::new("A", la));
            key_coordinates.extend(
                loads
                    .iter()
                    .enumerate()
                    .map(|(i, l)| KeyCoordinate::new(format!("L{}", i + 1), l.position_mm)),
            );
            key_coordinates.push(KeyCoordinate::new("B", lb));
            if lb < length {
                key_coordinates.push(KeyCoordinate::new("L", length));
            }

            Statics {
                reaction_a_n: ra,
                reaction_b_n: rb,
                signed_forces,
                key_coordinates,
            }
        }
    }
}

/// Ms(z): Mwe over the span of the cyclo-discs, zero elsewhere.
fn torque_function(load_case: &ShaftLoadCase) -> CalcResult<PiecewiseFunction> {
    let length = load_case.shaft_length_mm;
    let mwe = load_case.input_torque_nm;
    match &load_case.layout {
        SupportLayout::SimplySupported { first_disc_mm, .. } => {
            PiecewiseFunction::step(0.0, length, *first_disc_mm, length, mwe)
        }
        SupportLayout::TwoSupport { loads, .. } => match (loads.first(), loads.last()) {
            (Some(first), Some(last)) if loads.len() > 1 => {
                PiecewiseFunction::step(0.0, length, first.position_mm, last.position_mm, mwe)
            }
            (Some(only), _) => PiecewiseFunction::step(0.0, length, only.position_mm, length, mwe),
            _ => Ok(PiecewiseFunction::zero(0.0, length)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn material() -> ShaftMaterial {
        // kgo = 100 MPa
        ShaftMaterial::new("C45", 200.0, 2.0)
    }

    fn simple_case() -> ShaftLoadCase {
        ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, material())
    }

    fn two_support_case() -> ShaftLoadCase {
        ShaftLoadCase::two_support(
            400.0,
            0.0,
            400.0,
            cyclo_disc_loads(&[100.0, 300.0], 5_000.0),
            300.0,
            1.5,
            material(),
        )
    }

    #[test]
    fn test_simple_case_reactions() {
        let result = analyze(&simple_case()).unwrap();
        // L2 = 220, Ra = Rb = 10000 * 20 / 500
        assert!((result.reaction_a_n - 400.0).abs() < TOL);
        assert!((result.reaction_b_n - 400.0).abs() < TOL);
    }

    #[test]
    fn test_simple_case_moments() {
        let result = analyze(&simple_case()).unwrap();

        let at_l1 = result.sample_at(200.0).unwrap();
        assert_eq!(at_l1.bending_nm, 80.0);
        assert_eq!(at_l1.torque_nm, 500.0);

        let at_l2 = result.sample_at(220.0).unwrap();
        assert_eq!(at_l2.bending_nm, -112.0);
        assert_eq!(at_l2.equivalent_nm, 873.24);
        assert_eq!(at_l2.diameter_mm, 44.64);

        let at_end = result.sample_at(500.0).unwrap();
        assert_eq!(at_end.bending_nm, 0.0);

        let before = result.sample_at(0.0).unwrap();
        assert_eq!(before.torque_nm, 0.0);

        assert_eq!(result.shaft_diameter_mm, 44.64);
        assert!((result.eccentric_diameter_mm - 48.64).abs() < TOL);
        assert_eq!(result.max_bending_nm, 112.0);
    }

    #[test]
    fn test_two_support_reactions() {
        let result = analyze(&two_support_case()).unwrap();
        assert!((result.reaction_b_n - 2500.0).abs() < TOL);
        assert!((result.reaction_a_n + 2500.0).abs() < TOL);
    }

    #[test]
    fn test_two_support_equilibrium_with_offset_supports() {
        let case = ShaftLoadCase::two_support(
            600.0,
            50.0,
            520.0,
            cyclo_disc_loads(&[180.0, 230.0, 280.0], 3_000.0),
            120.0,
            1.0,
            material(),
        );
        let result = analyze(&case).unwrap();

        let sum: f64 = result.forces.iter().map(|f| f.force_n).sum();
        assert!(sum.abs() < 1e-6);
        let moment: f64 = result.forces.iter().map(|f| f.force_n * f.position_mm).sum();
        assert!(moment.abs() < 1e-6);

        // Nothing acts outside the supports
        assert_eq!(result.sample_at(0.0).unwrap().bending_nm, 0.0);
        assert_eq!(result.sample_at(600.0).unwrap().bending_nm, 0.0);
    }

    #[test]
    fn test_two_support_torque_spans_discs() {
        let result = analyze(&two_support_case()).unwrap();
        assert_eq!(result.sample_at(0.0).unwrap().torque_nm, 0.0);
        assert_eq!(result.sample_at(100.0).unwrap().torque_nm, 300.0);
        assert_eq!(result.sample_at(300.0).unwrap().torque_nm, 300.0);
        assert_eq!(result.sample_at(400.0).unwrap().torque_nm, 0.0);
    }

    #[test]
    fn test_last_disc_carries_torque() {
        // Rb = 6250 N, Mg(300) = 625 N·m, the largest bending moment
        let case = ShaftLoadCase::two_support(
            400.0,
            0.0,
            400.0,
            vec![PointLoad::new(50.0, 10_000.0), PointLoad::new(300.0, -10_000.0)],
            500.0,
            1.0,
            material(),
        );
        let fine = analyze(&case).unwrap();
        let at_last = fine.sample_at(300.0).unwrap();
        assert_eq!(at_last.bending_nm, 625.0);
        assert_eq!(at_last.torque_nm, 500.0);
        // sqrt(625² + (√3 · 500)²) = 1068
        assert_eq!(at_last.equivalent_nm, 1068.0);
        assert!((at_last.diameter_mm - 47.74).abs() < 1e-9);
        assert_eq!(fine.shaft_diameter_mm, at_last.diameter_mm);

        let settings = AnalysisSettings {
            sample_points: 50,
            ..AnalysisSettings::default()
        };
        let coarse = analyze_with(&case, &settings).unwrap();
        assert_eq!(coarse.shaft_diameter_mm, fine.shaft_diameter_mm);
    }

    #[test]
    fn test_key_coordinates_labels() {
        let result = analyze(&two_support_case()).unwrap();
        let labels: Vec<&str> = result.key_coordinates.iter().map(|k| k.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "L1", "L2", "B"]);

        let simple = analyze(&simple_case()).unwrap();
        let z: Vec<f64> = simple.key_coordinates.iter().map(|k| k.z_mm).collect();
        assert_eq!(z, vec![0.0, 200.0, 220.0, 500.0]);
    }

    #[test]
    fn test_samples_strictly_increasing_and_include_keys() {
        let result = analyze(&simple_case()).unwrap();
        assert!(result.samples.windows(2).all(|w| w[1].z_mm > w[0].z_mm));
        for key in &result.key_coordinates {
            let hits = result.samples.iter().filter(|s| s.z_mm == key.z_mm).count();
            assert_eq!(hits, 1, "key {} sampled {} times", key.label, hits);
        }
    }

    #[test]
    fn test_degenerate_supports() {
        let case = ShaftLoadCase::two_support(400.0, 100.0, 100.0, vec![], 0.0, 0.0, material());
        let err = analyze(&case).unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_GEOMETRY");
    }

    #[test]
    fn test_zero_length_is_degenerate() {
        let mut case = simple_case();
        case.shaft_length_mm = 0.0;
        assert_eq!(analyze(&case).unwrap_err().error_code(), "DEGENERATE_GEOMETRY");
    }

    #[test]
    fn test_load_order_violations() {
        // Disc beyond shaft end
        let case = ShaftLoadCase::simply_supported(200.0, 190.0, 20.0, 0.0, 1000.0, 10.0, 1.0, material());
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_LOAD_ORDER");

        // Loads out of order
        let case = ShaftLoadCase::two_support(
            400.0,
            0.0,
            400.0,
            vec![PointLoad::new(300.0, 1.0), PointLoad::new(100.0, -1.0)],
            0.0,
            0.0,
            material(),
        );
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_LOAD_ORDER");

        // Load on top of support A
        let case = ShaftLoadCase::two_support(400.0, 50.0, 400.0, cyclo_disc_loads(&[50.0], 1.0), 0.0, 0.0, material());
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_LOAD_ORDER");

        // Disc on top of support A
        let case = ShaftLoadCase::simply_supported(500.0, 0.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, material());
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_LOAD_ORDER");

        // Supports swapped
        let case = ShaftLoadCase::two_support(400.0, 300.0, 100.0, vec![], 0.0, 0.0, material());
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_LOAD_ORDER");
    }

    #[test]
    fn test_invalid_material() {
        let mut case = simple_case();
        case.material.safety_factor = 0.0;
        assert_eq!(analyze(&case).unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_zero_loads_produce_zero_outputs() {
        let case = ShaftLoadCase::two_support(400.0, 0.0, 400.0, vec![], 250.0, 1.0, material());
        let result = analyze(&case).unwrap();
        assert_eq!(result.reaction_a_n, 0.0);
        assert_eq!(result.reaction_b_n, 0.0);
        assert!(result.samples.iter().all(|s| s.bending_nm == 0.0 && s.torque_nm == 0.0));
        assert_eq!(result.shaft_diameter_mm, 0.0);
        assert!((result.eccentric_diameter_mm - 2.0).abs() < TOL);
    }

    #[test]
    fn test_zero_torque_and_force() {
        let case = ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 0.0, 0.0, 0.0, material());
        let result = analyze(&case).unwrap();
        assert_eq!(result.shaft_diameter_mm, 0.0);
        assert_eq!(result.max_equivalent_nm, 0.0);
    }

    #[test]
    fn test_sample_points_setting() {
        let settings = AnalysisSettings {
            sample_points: 50,
            ..AnalysisSettings::default()
        };
        let coarse = analyze_with(&simple_case(), &settings).unwrap();
        let fine = analyze(&simple_case()).unwrap();
        assert!(coarse.samples.len() < fine.samples.len());
        // Key coordinates carry the maximum, so dsc does not depend on the grid
        assert_eq!(coarse.shaft_diameter_mm, fine.shaft_diameter_mm);
    }

    #[test]
    fn test_settings_out_of_range() {
        for settings in [
            AnalysisSettings { sample_points: 1, ..AnalysisSettings::default() },
            AnalysisSettings { sample_points: MAX_SAMPLE_POINTS + 1, ..AnalysisSettings::default() },
            AnalysisSettings { decimals: MAX_DECIMALS + 1, ..AnalysisSettings::default() },
            AnalysisSettings { reduction_factor: f64::NAN, ..AnalysisSettings::default() },
        ] {
            let err = analyze_with(&simple_case(), &settings).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_INPUT");
        }

        let edge = AnalysisSettings {
            sample_points: MAX_SAMPLE_POINTS,
            decimals: MAX_DECIMALS,
            ..AnalysisSettings::default()
        };
        let result = analyze_with(&simple_case(), &edge).unwrap();
        assert!(result.samples.iter().all(|s| s.diameter_mm.is_finite()));
    }

    #[test]
    fn test_minimum_diameter_formula() {
        let d = round_to(minimum_diameter_mm(1000.0, 100.0), 2);
        assert_eq!(d, 46.7);
        assert_eq!(minimum_diameter_mm(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_frame_carries_constraints() {
        let case = simple_case();
        let result = analyze(&case).unwrap();
        let frame = result.frame(&case);
        assert_eq!(frame.eccentric_positions_mm, vec![200.0, 220.0]);
        assert_eq!(frame.shaft_length_mm, 500.0);
        assert_eq!(frame.diameter_profile.len(), result.samples.len());
        assert_eq!(frame.required_diameter_between(0.0, 500.0), result.shaft_diameter_mm);
        assert!(frame.required_diameter_between(0.0, 10.0) < result.shaft_diameter_mm);
    }

    #[test]
    fn test_load_case_serialization() {
        let case = two_support_case().with_label("Input shaft");
        let json = serde_json::to_string(&case).unwrap();
        assert!(json.contains("\"type\":\"TwoSupport\""));
        let roundtrip: ShaftLoadCase = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, case);
    }
}
