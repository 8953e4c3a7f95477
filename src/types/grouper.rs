//! Input/output shapes for the MS-DRG grouper (§4.4).

use serde::{Deserialize, Serialize};

use super::common::{DrgType, Sex};

/// Clinical input to [`crate::grouper::assign_drg`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrouperInput {
    pub principal_diagnosis: String,
    #[serde(default)]
    pub secondary_diagnoses: Vec<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    pub age: u32,
    pub sex: Sex,
    #[serde(default)]
    pub discharge_status: Option<String>,
    #[serde(default)]
    pub length_of_stay: Option<u32>,
}

/// Sentinel MS-DRG code returned when the case cannot be grouped.
pub const UNGROUPABLE: &str = "UNGROUPABLE";

/// The version tag stamped on every [`GrouperOutput`], identifying the
/// grouping-rule data generation in effect.
pub const GROUPING_VERSION: &str = "fy2026-core-v1";

/// Result of classifying a case into an MS-DRG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrouperOutput {
    /// The assigned MS-DRG code, or [`UNGROUPABLE`].
    pub ms_drg: String,
    pub description: String,
    pub mdc: String,
    pub mdc_description: String,
    pub drg_type: DrgType,
    pub has_mcc: bool,
    pub has_cc: bool,
    pub mcc_list: Vec<String>,
    pub cc_list: Vec<String>,
    pub relative_weight: f64,
    pub geometric_mean_los: f64,
    pub arithmetic_mean_los: f64,
    pub grouping_version: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl GrouperOutput {
    /// Build the sentinel UNGROUPABLE output carrying the given error message.
    pub fn ungroupable(error: impl Into<String>) -> Self {
        Self {
            ms_drg: UNGROUPABLE.to_string(),
            description: "Case could not be grouped to an MS-DRG".to_string(),
            mdc: "00".to_string(),
            mdc_description: String::new(),
            drg_type: DrgType::PreMdc,
            has_mcc: false,
            has_cc: false,
            mcc_list: Vec::new(),
            cc_list: Vec::new(),
            relative_weight: 0.0,
            geometric_mean_los: 0.0,
            arithmetic_mean_los: 0.0,
            grouping_version: GROUPING_VERSION.to_string(),
            warnings: Vec::new(),
            errors: vec![error.into()],
        }
    }

    pub fn is_groupable(&self) -> bool {
        self.ms_drg != UNGROUPABLE
    }
}
