//! # Project Data Structures
//!
//! [`ShaftProject`] is the root container of one input-shaft design.
//! Projects serialize to `.csd` (cyclo shaft design) files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! ShaftProject
//! ├── meta: ProjectMetadata (schema version, id, designer, timestamps)
//! ├── settings: ProjectSettings (analysis sampling and rounding)
//! ├── load_case: Option<ShaftLoadCase>
//! ├── geometry: GeometrySnapshot (subsection lists)
//! └── bearings: Option<BearingInput>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::project::ShaftProject;
//!
//! let project = ShaftProject::new("Jane Designer", "CD-042");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("CD-042"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::bearings::BearingInput;
use crate::calculations::shaft_analysis::{AnalysisSettings, ShaftLoadCase};
use crate::errors::{CalcError, CalcResult};
use crate::geometry::GeometrySnapshot;
use crate::session::DesignSession;

/// Current schema version for .csd files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaftProject {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: ProjectSettings,

    /// Last accepted load case
    #[serde(default)]
    pub load_case: Option<ShaftLoadCase>,

    #[serde(default)]
    pub geometry: GeometrySnapshot,

    #[serde(default)]
    pub bearings: Option<BearingInput>,
}

impl ShaftProject {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shaft_core::project::ShaftProject;
    ///
    /// let project = ShaftProject::new("John Doe", "CD-001");
    /// assert_eq!(project.meta.designer, "John Doe");
    /// assert!(project.load_case.is_none());
    /// ```
    pub fn new(designer: impl Into<String>, job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        ShaftProject {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                designer: designer.into(),
                job_id: job_id.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            load_case: None,
            geometry: GeometrySnapshot::default(),
            bearings: None,
        }
    }

    /// Replace the load case.
    ///
    /// The stored geometry stays as is; it is re-checked against the new
    /// load case when a session is opened.
    pub fn set_load_case(&mut self, load_case: ShaftLoadCase) {
        self.load_case = Some(load_case);
        self.touch();
    }

    pub fn set_bearings(&mut self, bearings: BearingInput) {
        self.bearings = Some(bearings);
        self.touch();
    }

    /// Store the accepted state of a session.
    pub fn capture(&mut self, session: &DesignSession) {
        self.settings.analysis = session.settings().clone();
        if let Some(case) = session.load_case() {
            self.load_case = Some(case.clone());
        }
        if let Some(geometry) = session.geometry() {
            self.geometry = geometry.snapshot();
        }
        self.touch();
    }

    /// Open a design session on the stored load case and geometry.
    pub fn open_session(&self) -> CalcResult<DesignSession> {
        let load_case = self.load_case.clone().ok_or_else(|| {
            CalcError::invalid_input("load_case", "none", "Project has no load case")
        })?;
        DesignSession::restore(self.settings.analysis.clone(), load_case, self.geometry.clone())
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for ShaftProject {
    fn default() -> Self {
        ShaftProject::new("", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Stable project identifier
    pub id: Uuid,

    /// Name of the responsible designer
    pub designer: String,

    /// Job/project number
    pub job_id: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Project-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::shaft_analysis::ShaftMaterial;
    use crate::geometry::RegionKind;

    fn simple_case() -> ShaftLoadCase {
        ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, ShaftMaterial::new("C45", 200.0, 2.0))
    }

    #[test]
    fn test_project_creation() {
        let project = ShaftProject::new("John Doe", "CD-001");
        assert_eq!(project.meta.designer, "John Doe");
        assert_eq!(project.meta.job_id, "CD-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.analysis.sample_points, 100);
    }

    #[test]
    fn test_project_ids_are_unique() {
        assert_ne!(ShaftProject::default().meta.id, ShaftProject::default().meta.id);
    }

    #[test]
    fn test_project_serialization() {
        let mut project = ShaftProject::new("Jane Designer", "CD-042");
        project.set_load_case(simple_case().with_label("Input shaft"));
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Jane Designer"));
        assert!(json.contains("SimplySupported"));

        let roundtrip: ShaftProject = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.meta.id, project.meta.id);
        assert_eq!(roundtrip.load_case, project.load_case);
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let project = ShaftProject::new("A", "B");
        let json = serde_json::json!({ "meta": project.meta }).to_string();
        let parsed: ShaftProject = serde_json::from_str(&json).unwrap();
        assert!(parsed.load_case.is_none());
        assert_eq!(parsed.settings, ProjectSettings::default());
    }

    #[test]
    fn test_capture_and_reopen_session() {
        let mut session = DesignSession::default();
        session.on_inputs_changed(simple_case()).unwrap();
        session.on_subsection_edited(RegionKind::Eccentrics, 0, 16.0, 60.0).unwrap();
        session.on_subsection_edited(RegionKind::Eccentrics, 1, 16.0, 60.0).unwrap();
        session
            .on_subsection_appended(RegionKind::BeforeEccentrics, 40.0, 45.0)
            .unwrap();

        let mut project = ShaftProject::new("Designer", "CD-7");
        project.capture(&session);

        let reopened = project.open_session().unwrap();
        assert_eq!(reopened.geometry(), session.geometry());
        assert!(reopened.can_proceed());
    }

    #[test]
    fn test_open_session_without_load_case() {
        let err = ShaftProject::default().open_session().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
