//! # Bearing Selection and Power Loss
//!
//! Follow-up calculations on top of a shaft analysis:
//!
//! - Required dynamic load capacity of the support bearings (loaded by the
//!   support reactions) and of the central bearings seated on the eccentrics
//!   (loaded by the cyclo-disc forces)
//! - Catalog filter bounds for bearings and rolling elements
//! - Rolling-element diameter estimate from bearing dimensions
//! - Rolling-friction power loss per bearing group
//!
//! Catalog rows are never fetched here. The caller passes the selected
//! dimensions and receives plain numbers back.
//!
//! ## Formulas
//!
//! ```text
//! L10 = 60 · Lh · n / 10^6                      [million revolutions]
//! C   = R · L10^(1/p) · ft / fd / 1000          [kN], p = 3
//! dw  ≈ 0.25 · (D - d)                          [mm]
//! N   = f · 0.001 · ω0 · (1 + (Dw + 2S)/dw) · (1 + e/rw1) · 4R/π   [W]
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::calculations::shaft_analysis::{AnalysisResult, ShaftLoadCase};
use crate::errors::{CalcError, CalcResult};
use crate::units::{Kilonewtons, Newtons};

/// Life exponent p used for the capacity estimate
pub const LIFE_EXPONENT: f64 = 3.0;

/// Life requirement for one bearing group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingLifeInput {
    /// Lh: required life (hours)
    pub life_hours: f64,
    /// fd: dynamic operating-conditions factor
    pub fd: f64,
    /// ft: temperature factor
    pub ft: f64,
}

impl Default for BearingLifeInput {
    fn default() -> Self {
        BearingLifeInput {
            life_hours: 10_000.0,
            fd: 1.0,
            ft: 1.0,
        }
    }
}

/// Dimensions of a bearing picked from a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingDimensions {
    /// Catalog code
    pub code: String,
    /// Dw: bore diameter (mm)
    pub bore_mm: f64,
    /// Dz: outer diameter (mm)
    pub outer_mm: f64,
    /// E: outer raceway diameter (mm), catalog field of eccentric bearings
    #[serde(default)]
    pub raceway_mm: Option<f64>,
    /// C: catalog dynamic capacity (kN)
    pub capacity_kn: f64,
    /// D: diameter of the selected rolling element (mm)
    #[serde(default)]
    pub rolling_element_mm: Option<f64>,
}

/// Operating data for the power-loss estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLossInput {
    /// ω0: angular velocity of the input shaft (rad/s)
    pub angular_velocity_rad_s: f64,
    /// f: rolling friction coefficient (mm)
    pub rolling_friction_mm: f64,
    /// rw1: pitch radius of the cyclo-disc (mm)
    pub pitch_radius_mm: f64,
}

/// Everything needed for the bearing calculations of one shaft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingInput {
    /// nwe: input shaft speed (rpm)
    pub speed_rpm: f64,
    pub support_life: BearingLifeInput,
    pub central_life: BearingLifeInput,
    /// Support bearing selected from the catalog, if any
    #[serde(default)]
    pub support: Option<BearingDimensions>,
    /// Central (eccentric) bearing selected from the catalog, if any
    #[serde(default)]
    pub central: Option<BearingDimensions>,
    #[serde(default)]
    pub power_loss: Option<PowerLossInput>,
}

/// Bounds used to filter a bearing catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogLimits {
    pub min_bore_mm: f64,
    pub min_capacity_kn: f64,
}

/// Bounds used to filter a rolling-element catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingElementLimits {
    pub estimate_mm: f64,
    pub min_mm: f64,
    pub max_mm: f64,
}

impl RollingElementLimits {
    fn around(estimate_mm: f64) -> Self {
        RollingElementLimits {
            estimate_mm,
            min_mm: estimate_mm.floor() - 1.0,
            max_mm: estimate_mm.ceil() + 1.0,
        }
    }
}

/// Loss of each bearing group (W).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLoss {
    pub support_a_w: f64,
    pub support_b_w: f64,
    pub eccentrics_w: f64,
    /// S of the support bearings (mm)
    pub support_spacing_mm: f64,
    /// S of the central bearings (mm)
    pub central_spacing_mm: f64,
}

impl PowerLoss {
    pub fn total_w(&self) -> f64 {
        self.support_a_w + self.support_b_w + self.eccentrics_w
    }
}

/// Results of the bearing calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingReport {
    /// L10 of the support bearings (million revolutions)
    pub support_life_mrev: f64,
    /// Cr: required capacity of the support bearings (kN)
    pub support_required_kn: f64,
    /// L10 of the central bearings (million revolutions)
    pub central_life_mrev: f64,
    /// Cc: required capacity of the central bearings (kN)
    pub central_required_kn: f64,
    pub support_catalog: CatalogLimits,
    pub central_catalog: CatalogLimits,
    pub support_rolling_element: Option<RollingElementLimits>,
    pub central_rolling_element: Option<RollingElementLimits>,
    pub power_loss: Option<PowerLoss>,
    /// Selected catalog entries that do not satisfy the limits
    pub warnings: Vec<String>,
}

/// Bearing life in million revolutions.
pub fn life_mrev(speed_rpm: f64, life_hours: f64) -> f64 {
    60.0 * life_hours * speed_rpm / 1_000_000.0
}

/// Required dynamic capacity (kN) for a radial load (N).
pub fn required_capacity_kn(load_n: f64, life_mrev: f64, life: &BearingLifeInput) -> f64 {
    let c = Newtons(load_n.abs() * life_mrev.powf(1.0 / LIFE_EXPONENT) * life.ft / life.fd);
    Kilonewtons::from(c).value()
}

/// Rolling-element diameter estimate `0.25 (outer - bore)` (mm).
pub fn rolling_element_estimate_mm(bore_mm: f64, outer_mm: f64) -> f64 {
    0.25 * (outer_mm - bore_mm)
}

/// Rolling-friction power loss of one bearing group (W).
pub fn power_loss_w(load_n: f64, bore_mm: f64, spacing_mm: f64, rolling_element_mm: f64, eccentricity_mm: f64, input: &PowerLossInput) -> f64 {
    input.rolling_friction_mm * 0.001
        * input.angular_velocity_rad_s
        * (1.0 + (bore_mm + 2.0 * spacing_mm) / rolling_element_mm)
        * (1.0 + eccentricity_mm / input.pitch_radius_mm)
        * 4.0
        * load_n.abs()
        / PI
}

fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"))
    }
}

impl BearingInput {
    /// Default lives and no catalog selection yet.
    pub fn new(speed_rpm: f64) -> Self {
        BearingInput {
            speed_rpm,
            support_life: BearingLifeInput::default(),
            central_life: BearingLifeInput::default(),
            support: None,
            central: None,
            power_loss: None,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("speed_rpm", self.speed_rpm)?;
        for (prefix, life) in [("support_life", &self.support_life), ("central_life", &self.central_life)] {
            require_positive(&format!("{}.life_hours", prefix), life.life_hours)?;
            require_positive(&format!("{}.fd", prefix), life.fd)?;
            require_positive(&format!("{}.ft", prefix), life.ft)?;
        }
        for (prefix, bearing) in [("support", &self.support), ("central", &self.central)] {
            if let Some(b) = bearing {
                require_positive(&format!("{}.bore_mm", prefix), b.bore_mm)?;
                require_positive(&format!("{}.outer_mm", prefix), b.outer_mm)?;
                if b.outer_mm <= b.bore_mm {
                    return Err(CalcError::invalid_input(
                        format!("{}.outer_mm", prefix),
                        b.outer_mm.to_string(),
                        "Outer diameter must exceed the bore",
                    ));
                }
                if let Some(d) = b.rolling_element_mm {
                    require_positive(&format!("{}.rolling_element_mm", prefix), d)?;
                }
            }
        }
        if let Some(loss) = &self.power_loss {
            require_positive("power_loss.pitch_radius_mm", loss.pitch_radius_mm)?;
            if !(loss.angular_velocity_rad_s.is_finite() && loss.rolling_friction_mm.is_finite()) {
                return Err(CalcError::invalid_input(
                    "power_loss",
                    format!("{:?}", loss),
                    "Angular velocity and friction must be finite",
                ));
            }
        }
        Ok(())
    }
}

/// Run the bearing calculations for an analysed shaft.
pub fn calculate(load_case: &ShaftLoadCase, analysis: &AnalysisResult, input: &BearingInput) -> CalcResult<BearingReport> {
    input.validate()?;

    let support_load = analysis.reaction_a_n.abs().max(analysis.reaction_b_n.abs());
    let disc_forces = load_case.disc_forces_n();
    let disc_load = disc_forces.iter().map(|f| f.abs()).fold(0.0, f64::max);

    let support_life_mrev = life_mrev(input.speed_rpm, input.support_life.life_hours);
    let central_life_mrev = life_mrev(input.speed_rpm, input.central_life.life_hours);
    let support_required_kn = required_capacity_kn(support_load, support_life_mrev, &input.support_life);
    let central_required_kn = required_capacity_kn(disc_load, central_life_mrev, &input.central_life);

    let support_catalog = CatalogLimits {
        min_bore_mm: analysis.shaft_diameter_mm,
        min_capacity_kn: support_required_kn,
    };
    let central_catalog = CatalogLimits {
        min_bore_mm: analysis.eccentric_diameter_mm,
        min_capacity_kn: central_required_kn,
    };

    let mut warnings = Vec::new();
    check_selection("support", input.support.as_ref(), &support_catalog, &mut warnings);
    check_selection("central", input.central.as_ref(), &central_catalog, &mut warnings);

    let support_rolling_element = input
        .support
        .as_ref()
        .map(|b| RollingElementLimits::around(rolling_element_estimate_mm(b.bore_mm, b.outer_mm)));
    let central_rolling_element = input
        .central
        .as_ref()
        .map(|b| RollingElementLimits::around(rolling_element_estimate_mm(b.bore_mm, b.raceway_mm.unwrap_or(b.outer_mm))));

    let power_loss = match (&input.power_loss, &input.support, &input.central) {
        (Some(loss), Some(support), Some(central)) => {
            match (support.rolling_element_mm, central.rolling_element_mm) {
                (Some(support_dw), Some(central_dw)) => {
                    let e = load_case.eccentricity_mm;
                    let support_spacing_mm = support_dw / 2.0;
                    let central_spacing_mm = 0.15 * (central.outer_mm - central.bore_mm);
                    Some(PowerLoss {
                        support_a_w: power_loss_w(analysis.reaction_a_n, support.bore_mm, support_spacing_mm, support_dw, e, loss),
                        support_b_w: power_loss_w(analysis.reaction_b_n, support.bore_mm, support_spacing_mm, support_dw, e, loss),
                        eccentrics_w: power_loss_w(disc_load, central.bore_mm, central_spacing_mm, central_dw, e, loss),
                        support_spacing_mm,
                        central_spacing_mm,
                    })
                }
                _ => None,
            }
        }
        _ => None,
    };

    for warning in &warnings {
        tracing::warn!(%warning, "bearing selection does not meet limits");
    }

    Ok(BearingReport {
        support_life_mrev,
        support_required_kn,
        central_life_mrev,
        central_required_kn,
        support_catalog,
        central_catalog,
        support_rolling_element,
        central_rolling_element,
        power_loss,
        warnings,
    })
}

fn check_selection(group: &str, selected: Option<&BearingDimensions>, limits: &CatalogLimits, warnings: &mut Vec<String>) {
    let Some(bearing) = selected else {
        return;
    };
    if bearing.bore_mm < limits.min_bore_mm {
        warnings.push(format!(
            "{} bearing {}: bore {:.2} mm below required {:.2} mm",
            group, bearing.code, bearing.bore_mm, limits.min_bore_mm
        ));
    }
    if bearing.capacity_kn < limits.min_capacity_kn {
        warnings.push(format!(
            "{} bearing {}: capacity {:.2} kN below required {:.2} kN",
            group, bearing.code, bearing.capacity_kn, limits.min_capacity_kn
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::shaft_analysis::{analyze, ShaftMaterial};

    fn case() -> ShaftLoadCase {
        ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, ShaftMaterial::new("C45", 200.0, 2.0))
    }

    fn input() -> BearingInput {
        BearingInput {
            speed_rpm: 1000.0,
            support_life: BearingLifeInput::default(),
            central_life: BearingLifeInput::default(),
            support: None,
            central: None,
            power_loss: None,
        }
    }

    #[test]
    fn test_life_and_capacity() {
        // 60 * 10000 * 1000 / 1e6 = 600 Mrev
        assert_eq!(life_mrev(1000.0, 10_000.0), 600.0);
        let c = required_capacity_kn(1000.0, 1000.0, &BearingLifeInput::default());
        assert!((c - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_element_estimate() {
        assert_eq!(rolling_element_estimate_mm(20.0, 52.0), 8.0);
        let limits = RollingElementLimits::around(7.5);
        assert_eq!((limits.min_mm, limits.max_mm), (6.0, 9.0));
    }

    #[test]
    fn test_report_without_selection() {
        let case = case();
        let analysis = analyze(&case).unwrap();
        let report = calculate(&case, &analysis, &input()).unwrap();

        let expected = 400.0 * 600f64.cbrt() / 1000.0;
        assert!((report.support_required_kn - expected).abs() < 1e-9);
        assert!((report.central_required_kn - 10.0 * 600f64.cbrt()).abs() < 1e-9);
        assert_eq!(report.support_catalog.min_bore_mm, analysis.shaft_diameter_mm);
        assert_eq!(report.central_catalog.min_bore_mm, analysis.eccentric_diameter_mm);
        assert!(report.power_loss.is_none());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_power_loss_with_selection() {
        let case = case();
        let analysis = analyze(&case).unwrap();
        let mut input = input();
        input.support = Some(BearingDimensions {
            code: "6210".into(),
            bore_mm: 50.0,
            outer_mm: 90.0,
            raceway_mm: None,
            capacity_kn: 35.1,
            rolling_element_mm: Some(10.0),
        });
        input.central = Some(BearingDimensions {
            code: "NJ 2210".into(),
            bore_mm: 40.0,
            outer_mm: 90.0,
            raceway_mm: Some(78.5),
            capacity_kn: 100.0,
            rolling_element_mm: Some(9.0),
        });
        input.power_loss = Some(PowerLossInput {
            angular_velocity_rad_s: 100.0,
            rolling_friction_mm: 0.05,
            pitch_radius_mm: 50.0,
        });

        let report = calculate(&case, &analysis, &input).unwrap();
        let loss = report.power_loss.unwrap();

        // S = dw/2 = 5; (1 + (50 + 10)/10) = 7; (1 + 2/50) = 1.04
        let expected_a = 0.05 * 0.001 * 100.0 * 7.0 * 1.04 * 4.0 * 400.0 / PI;
        assert!((loss.support_a_w - expected_a).abs() < 1e-9);
        assert_eq!(loss.support_a_w, loss.support_b_w);
        assert!((loss.central_spacing_mm - 7.5).abs() < 1e-12);
        assert!(loss.eccentrics_w > loss.support_a_w);
        // Central group carries the single disc force F = 10 kN:
        // (1 + (40 + 2 * 7.5)/9) = 64/9
        let expected_eccentrics = 0.05 * 0.001 * 100.0 * (64.0 / 9.0) * 1.04 * 4.0 * 10_000.0 / PI;
        assert!((loss.eccentrics_w - expected_eccentrics).abs() < 1e-9);
        assert!((loss.total_w() - (loss.support_a_w + loss.support_b_w + loss.eccentrics_w)).abs() < 1e-12);

        // Central estimate uses the raceway diameter
        let central = report.central_rolling_element.unwrap();
        assert!((central.estimate_mm - 9.625).abs() < 1e-12);

        // 40 mm bore is below dec
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("NJ 2210"));
    }

    #[test]
    fn test_invalid_speed() {
        let case = case();
        let analysis = analyze(&case).unwrap();
        let mut input = input();
        input.speed_rpm = 0.0;
        assert_eq!(calculate(&case, &analysis, &input).unwrap_err().error_code(), "INVALID_INPUT");
    }
}
