//! # Shaft Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` / load case - input parameters (JSON-serializable)
//! - `*Result` / report - calculation results (JSON-serializable)
//! - a pure function from the first to the second returning `CalcResult`
//!
//! ## Available Calculations
//!
//! - [`shaft_analysis`] - Reactions, moment diagrams and minimum diameters
//! - [`bearings`] - Bearing capacity, catalog limits and power loss

pub mod bearings;
pub mod shaft_analysis;

// Re-export commonly used types
pub use bearings::{BearingInput, BearingReport};
pub use shaft_analysis::{
    analyze, analyze_with, AnalysisResult, AnalysisSettings, MomentSample, PointLoad, ShaftFrame, ShaftLoadCase,
    ShaftMaterial, SupportLayout,
};
