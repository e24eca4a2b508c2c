//! # shaft_core - Cycloidal Drive Input Shaft Engine
//!
//! `shaft_core` computes and lays out the eccentric input shaft of a
//! cycloidal reducer. All inputs and outputs are plain JSON-serializable
//! records, so any front end (terminal, GUI, scripts) can drive it.
//!
//! ## Pipeline
//!
//! ```text
//! ShaftLoadCase --analyze--> AnalysisResult --frame--> GeometryModel
//!                                   |                        |
//!                                   +--> bearings            +--> limits / placements
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use shaft_core::calculations::shaft_analysis::{analyze, ShaftLoadCase, ShaftMaterial};
//!
//! let case = ShaftLoadCase::simply_supported(
//!     500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0,
//!     ShaftMaterial::new("C45", 200.0, 2.0),
//! );
//! let result = analyze(&case).unwrap();
//! assert!(result.eccentric_diameter_mm > result.shaft_diameter_mm);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - beam analysis and bearing calculations
//! - [`geometry`] - sectional shaft geometry model
//! - [`session`] - input change / edit sequencing
//! - [`project`] - project container, metadata, and settings
//! - [`file_io`] - file operations with atomic saves and locking
//! - [`piecewise`] - piecewise functions and sampling grids
//! - [`units`] - unit wrappers and display metadata
//! - [`errors`] - structured error types

pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod geometry;
pub mod piecewise;
pub mod project;
pub mod session;
pub mod units;

pub use errors::{CalcError, CalcResult};
pub use file_io::{load_project, save_project, FileLock};
pub use geometry::{GeometryModel, RegionKind};
pub use project::{ProjectMetadata, ProjectSettings, ShaftProject};
pub use session::DesignSession;
