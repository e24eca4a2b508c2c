//! # Unit Types
//!
//! Lightweight newtype wrappers for the SI units used by the shaft engine,
//! plus a units metadata table for display.
//!
//! Input and result records keep plain `f64` fields with unit-suffixed names
//! (`length_mm`, `force_n`, `torque_nm`); the unit never travels with the
//! runtime value. The newtypes are used where a conversion happens, so the
//! factor lives in one place.
//!
//! ## Units
//!
//! - Length: millimeters (mm), meters (m)
//! - Force: newtons (N), kilonewtons (kN)
//! - Moment: newton-millimeters (N·mm), newton-meters (N·m)
//! - Stress: megapascals (MPa), pascals (Pa)
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::units::{NewtonMeters, NewtonMillimeters, Quantity};
//!
//! let moment: NewtonMeters = NewtonMillimeters(2_500.0).into();
//! assert_eq!(moment.0, 2.5);
//! assert_eq!(Quantity::BendingMoment.unit(), "N·m");
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilonewtons(pub f64);

impl From<Newtons> for Kilonewtons {
    fn from(n: Newtons) -> Self {
        Kilonewtons(n.0 / 1000.0)
    }
}

impl From<Kilonewtons> for Newtons {
    fn from(kn: Kilonewtons) -> Self {
        Newtons(kn.0 * 1000.0)
    }
}

// ============================================================================
// Moment Units
// ============================================================================

/// Moment in newton-millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimeters(pub f64);

/// Moment in newton-meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

impl From<NewtonMillimeters> for NewtonMeters {
    fn from(nmm: NewtonMillimeters) -> Self {
        NewtonMeters(nmm.0 / 1000.0)
    }
}

impl From<NewtonMeters> for NewtonMillimeters {
    fn from(nm: NewtonMeters) -> Self {
        NewtonMillimeters(nm.0 * 1000.0)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megapascals(pub f64);

/// Stress in pascals (N/m²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pascals(pub f64);

impl From<Megapascals> for Pascals {
    fn from(mpa: Megapascals) -> Self {
        Pascals(mpa.0 * 1_000_000.0)
    }
}

impl From<Pascals> for Megapascals {
    fn from(pa: Pascals) -> Self {
        Megapascals(pa.0 / 1_000_000.0)
    }
}

// ============================================================================
// Arithmetic Implementations
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Meters);
impl_arithmetic!(Newtons);
impl_arithmetic!(Kilonewtons);
impl_arithmetic!(NewtonMillimeters);
impl_arithmetic!(NewtonMeters);
impl_arithmetic!(Megapascals);
impl_arithmetic!(Pascals);

// ============================================================================
// Units Metadata
// ============================================================================

/// Displayable quantities produced or consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quantity {
    AxialPosition,
    Force,
    Reaction,
    BendingMoment,
    Torque,
    EquivalentMoment,
    Diameter,
    Stress,
    LoadCapacity,
    PowerLoss,
}

impl Quantity {
    /// Display unit
    pub fn unit(self) -> &'static str {
        match self {
            Quantity::AxialPosition | Quantity::Diameter => "mm",
            Quantity::Force | Quantity::Reaction => "N",
            Quantity::BendingMoment | Quantity::Torque | Quantity::EquivalentMoment => "N·m",
            Quantity::Stress => "MPa",
            Quantity::LoadCapacity => "kN",
            Quantity::PowerLoss => "W",
        }
    }

    /// Conventional symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Quantity::AxialPosition => "z",
            Quantity::Force => "F",
            Quantity::Reaction => "R",
            Quantity::BendingMoment => "Mg",
            Quantity::Torque => "Ms",
            Quantity::EquivalentMoment => "Mz",
            Quantity::Diameter => "d",
            Quantity::Stress => "kgo",
            Quantity::LoadCapacity => "C",
            Quantity::PowerLoss => "N",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Quantity::AxialPosition => "Axial position along the shaft",
            Quantity::Force => "Point load",
            Quantity::Reaction => "Support reaction",
            Quantity::BendingMoment => "Bending moment",
            Quantity::Torque => "Torque",
            Quantity::EquivalentMoment => "Equivalent moment",
            Quantity::Diameter => "Minimum shaft diameter",
            Quantity::Stress => "Permissible bending stress",
            Quantity::LoadCapacity => "Required dynamic load capacity",
            Quantity::PowerLoss => "Bearing power loss",
        }
    }

    /// Column header such as `Mg [N·m]`
    pub fn header(self) -> String {
        format!("{} [{}]", self.symbol(), self.unit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moment_conversion() {
        let nm: NewtonMeters = NewtonMillimeters(1_250_000.0).into();
        assert_eq!(nm.0, 1250.0);
        let back: NewtonMillimeters = nm.into();
        assert_eq!(back.0, 1_250_000.0);
    }

    #[test]
    fn test_length_and_stress_conversion() {
        let mm: Millimeters = Meters(0.025).into();
        assert!((mm.0 - 25.0).abs() < 1e-12);
        let pa: Pascals = Megapascals(120.0).into();
        assert_eq!(pa.0, 120_000_000.0);
        let kn: Kilonewtons = Newtons(4_000.0).into();
        assert_eq!(kn.0, 4.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Millimeters(10.0);
        let b = Millimeters(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).value(), 20.0);
        assert_eq!((a / 2.0).value(), 5.0);
    }

    #[test]
    fn test_serialization_is_transparent() {
        let json = serde_json::to_string(&NewtonMeters(12.5)).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn test_quantity_table() {
        assert_eq!(Quantity::Diameter.header(), "d [mm]");
        assert_eq!(Quantity::EquivalentMoment.unit(), "N·m");
        assert_eq!(Quantity::PowerLoss.symbol(), "N");
    }
}
