//! Shaft regions and their subsections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// The four longitudinal zones of the input shaft, in designer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionKind {
    /// Eccentric-carrying zone; one subsection per cyclo-disc
    Eccentrics,
    /// From the first eccentric toward the shaft start
    BeforeEccentrics,
    /// Gap between the first two eccentrics
    BetweenEccentrics,
    /// From the last eccentric toward the shaft end
    AfterEccentrics,
}

impl RegionKind {
    pub const ALL: [RegionKind; 4] = [
        RegionKind::Eccentrics,
        RegionKind::BeforeEccentrics,
        RegionKind::BetweenEccentrics,
        RegionKind::AfterEccentrics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Eccentrics => "Eccentrics",
            RegionKind::BeforeEccentrics => "BeforeEccentrics",
            RegionKind::BetweenEccentrics => "BetweenEccentrics",
            RegionKind::AfterEccentrics => "AfterEccentrics",
        }
    }

    /// Subsection count dictated by the load case rather than the user
    pub fn has_fixed_count(self) -> bool {
        matches!(self, RegionKind::Eccentrics)
    }

    /// Direction in which subsections are stacked from the region anchor
    pub fn growth(self) -> Growth {
        match self {
            RegionKind::BeforeEccentrics => Growth::Backward,
            _ => Growth::Forward,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RegionKind {
    type Err = CalcError;

    /// Accepts the region name in any case, with or without `-`/`_`/spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        RegionKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_lowercase() == normalized)
            .ok_or_else(|| CalcError::UnknownRegion { name: s.to_string() })
    }
}

/// Direction of subsection stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Growth {
    /// Increasing z from the span start
    Forward,
    /// Decreasing z from the span end
    Backward,
}

/// A user-defined stepped-diameter segment.
///
/// Values stay `None` until the user enters them; an undefined subsection
/// takes no axial room and is never placed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Subsection {
    pub length_mm: Option<f64>,
    pub diameter_mm: Option<f64>,
}

impl Subsection {
    pub fn new(length_mm: f64, diameter_mm: f64) -> Self {
        Subsection {
            length_mm: Some(length_mm),
            diameter_mm: Some(diameter_mm),
        }
    }

    /// Axial room taken by the subsection (mm); undefined or unusable
    /// lengths take none.
    pub fn occupied_mm(&self) -> f64 {
        self.length_mm.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
    }
}

/// Axial interval available to a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionSpan {
    pub start_mm: f64,
    pub end_mm: f64,
    pub growth: Growth,
}

impl RegionSpan {
    /// Available length, never negative
    pub fn available_mm(&self) -> f64 {
        (self.end_mm - self.start_mm).max(0.0)
    }

    /// Fixed coordinate the first subsection is attached to
    pub fn anchor_mm(&self) -> f64 {
        match self.growth {
            Growth::Forward => self.start_mm,
            Growth::Backward => self.end_mm,
        }
    }

    /// `(start, end)` of a subsection whose stack begins `offset` from the anchor.
    pub fn place(&self, offset_mm: f64, length_mm: f64) -> (f64, f64) {
        match self.growth {
            Growth::Forward => {
                let start = self.anchor_mm() + offset_mm;
                (start, start + length_mm)
            }
            Growth::Backward => {
                let end = self.anchor_mm() - offset_mm;
                (end - length_mm, end)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_names_parse() {
        assert_eq!("Eccentrics".parse::<RegionKind>().unwrap(), RegionKind::Eccentrics);
        assert_eq!("before-eccentrics".parse::<RegionKind>().unwrap(), RegionKind::BeforeEccentrics);
        assert_eq!("between_eccentrics".parse::<RegionKind>().unwrap(), RegionKind::BetweenEccentrics);
        assert_eq!("After Eccentrics".parse::<RegionKind>().unwrap(), RegionKind::AfterEccentrics);

        let err = "Journal".parse::<RegionKind>().unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_REGION");
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in RegionKind::ALL {
            assert_eq!(kind.to_string().parse::<RegionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_span_placement() {
        let forward = RegionSpan { start_mm: 100.0, end_mm: 200.0, growth: Growth::Forward };
        assert_eq!(forward.place(10.0, 20.0), (110.0, 130.0));

        let backward = RegionSpan { start_mm: 0.0, end_mm: 190.0, growth: Growth::Backward };
        assert_eq!(backward.anchor_mm(), 190.0);
        assert_eq!(backward.place(10.0, 20.0), (160.0, 180.0));
    }

    #[test]
    fn test_negative_span_clamps_to_zero() {
        let span = RegionSpan { start_mm: 50.0, end_mm: 40.0, growth: Growth::Forward };
        assert_eq!(span.available_mm(), 0.0);
    }

    #[test]
    fn test_undefined_subsection_takes_no_room() {
        assert_eq!(Subsection::default().occupied_mm(), 0.0);
        assert_eq!(Subsection::new(12.5, 30.0).occupied_mm(), 12.5);
        assert_eq!(Subsection::new(-3.0, 30.0).occupied_mm(), 0.0);
    }
}
