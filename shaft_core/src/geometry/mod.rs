//! # Shaft Geometry
//!
//! Stepped-diameter layout of the input shaft, constrained by the latest
//! analysis.
//!
//! - [`region`] - shaft regions, subsections and axial spans
//! - [`model`] - the editable [`GeometryModel`]
//! - [`report`] - limits, placements and bound violations

pub mod model;
pub mod region;
pub mod report;

pub use model::{GeometryModel, GeometrySnapshot};
pub use region::{Growth, RegionKind, RegionSpan, Subsection};
pub use report::{
    Bound, BoundViolation, BoundsReport, EditReport, GeometryLimits, OutlinePoint, Placement, PlacementSnapshot,
    RegionLimits, SubsectionLimits,
};
