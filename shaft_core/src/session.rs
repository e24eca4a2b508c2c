//! # Design Session
//!
//! Sequences one shaft design: every input change re-runs the analysis and
//! re-binds the geometry model to the new result, in that order.
//!
//! ```text
//! on_inputs_changed(case) -> analyze -> GeometryModel::update_frame
//! on_subsection_edited(..) -> GeometryModel::set_subsection_attributes
//! ```
//!
//! A refused load case leaves the previous analysis and geometry in place
//! but blocks [`DesignSession::can_proceed`] until the inputs are fixed.
//!
//! ## Example
//! ```rust
//! use shaft_core::calculations::shaft_analysis::{ShaftLoadCase, ShaftMaterial};
//! use shaft_core::geometry::RegionKind;
//! use shaft_core::session::DesignSession;
//!
//! let mut session = DesignSession::default();
//! let case = ShaftLoadCase::simply_supported(
//!     500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0,
//!     ShaftMaterial::new("C45", 200.0, 2.0),
//! );
//! let result = session.on_inputs_changed(case).unwrap();
//! assert!(result.shaft_diameter_mm > 0.0);
//!
//! let report = session.on_subsection_edited(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
//! assert!(report.accepted);
//! assert!(!session.can_proceed());
//! ```

use tracing::{debug, warn};

use crate::calculations::bearings::{self, BearingInput, BearingReport};
use crate::calculations::shaft_analysis::{analyze_with, AnalysisResult, AnalysisSettings, ShaftLoadCase};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::{EditReport, GeometryModel, GeometrySnapshot, RegionKind};

/// Single-owner state of one design pass.
#[derive(Debug, Clone, Default)]
pub struct DesignSession {
    settings: AnalysisSettings,
    load_case: Option<ShaftLoadCase>,
    analysis: Option<AnalysisResult>,
    geometry: Option<GeometryModel>,
    rejected: Option<CalcError>,
}

impl DesignSession {
    pub fn new(settings: AnalysisSettings) -> Self {
        DesignSession {
            settings,
            ..Default::default()
        }
    }

    /// Rebuild a session from a saved load case and geometry.
    pub fn restore(settings: AnalysisSettings, load_case: ShaftLoadCase, geometry: GeometrySnapshot) -> CalcResult<Self> {
        let analysis = analyze_with(&load_case, &settings)?;
        let model = GeometryModel::restore(analysis.frame(&load_case), geometry)?;
        Ok(DesignSession {
            settings,
            load_case: Some(load_case),
            analysis: Some(analysis),
            geometry: Some(model),
            rejected: None,
        })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Load case of the current analysis.
    pub fn load_case(&self) -> Option<&ShaftLoadCase> {
        self.load_case.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn geometry(&self) -> Option<&GeometryModel> {
        self.geometry.as_ref()
    }

    pub fn geometry_mut(&mut self) -> Option<&mut GeometryModel> {
        self.geometry.as_mut()
    }

    /// Error of the most recent refused load case, if the inputs are still invalid.
    pub fn rejected_inputs(&self) -> Option<&CalcError> {
        self.rejected.as_ref()
    }

    /// Re-run the analysis for new inputs.
    ///
    /// On failure the previous result and geometry stay available.
    pub fn on_inputs_changed(&mut self, load_case: ShaftLoadCase) -> CalcResult<&AnalysisResult> {
        let result = match analyze_with(&load_case, &self.settings) {
            Ok(result) => result,
            Err(err) => {
                warn!(label = %load_case.label, code = err.error_code(), "Load case refused: {}", err);
                self.rejected = Some(err.clone());
                return Err(err);
            }
        };

        let frame = result.frame(&load_case);
        if let Some(model) = self.geometry.as_mut() {
            model.update_frame(frame);
        } else {
            self.geometry = Some(GeometryModel::new(frame));
        }
        debug!(
            dsc = result.shaft_diameter_mm,
            dec = result.eccentric_diameter_mm,
            "Inputs applied"
        );

        self.rejected = None;
        self.load_case = Some(load_case);
        Ok(&*self.analysis.insert(result))
    }

    /// Change the analysis settings and re-run the current load case.
    pub fn set_settings(&mut self, settings: AnalysisSettings) -> CalcResult<()> {
        self.settings = settings;
        if let Some(case) = self.load_case.clone() {
            self.on_inputs_changed(case)?;
        }
        Ok(())
    }

    /// Apply a subsection edit to the geometry.
    pub fn on_subsection_edited(
        &mut self,
        region: RegionKind,
        index: usize,
        length_mm: f64,
        diameter_mm: f64,
    ) -> CalcResult<EditReport> {
        self.require_geometry()?
            .set_subsection_attributes(region, index, length_mm, diameter_mm)
    }

    /// Add a subsection with values in one step; refused if it does not fit.
    pub fn on_subsection_appended(&mut self, region: RegionKind, length_mm: f64, diameter_mm: f64) -> CalcResult<EditReport> {
        self.require_geometry()?
            .append_subsection(region, length_mm, diameter_mm)
    }

    pub fn on_subsection_removed(&mut self, region: RegionKind, index: usize) -> CalcResult<()> {
        self.require_geometry()?.remove_subsection(region, index)?;
        Ok(())
    }

    /// True when the latest inputs were accepted and the shaft layout is
    /// complete and within bounds.
    pub fn can_proceed(&self) -> bool {
        if self.rejected.is_some() || self.analysis.is_none() {
            return false;
        }
        self.geometry
            .as_ref()
            .map(|g| g.eccentrics_defined() && g.meets_limits())
            .unwrap_or(false)
    }

    /// Bearing calculation on top of the current analysis.
    pub fn bearings(&self, input: &BearingInput) -> CalcResult<BearingReport> {
        match (&self.load_case, &self.analysis) {
            (Some(case), Some(analysis)) => bearings::calculate(case, analysis, input),
            _ => Err(no_analysis()),
        }
    }

    fn require_geometry(&mut self) -> CalcResult<&mut GeometryModel> {
        self.geometry.as_mut().ok_or_else(no_analysis)
    }
}

fn no_analysis() -> CalcError {
    CalcError::invalid_input("load_case", "none", "No valid analysis available yet")
}
